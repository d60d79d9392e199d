//! # Application Layer
//!
//! Orchestration on top of the infrastructure: the execution engine and the
//! sandboxed workspace tool surface.

pub mod executor;
pub mod workspace_tools;

//! # Interface Layer
//!
//! The user-facing surface: CLI command handlers and the console progress
//! sink.

pub mod commands;
pub mod sink;

//! # Infrastructure Layer
//!
//! Everything that touches the outside world: the workspace filesystem,
//! subprocess execution, CLI output parsing, installation and settings.

pub mod command;
pub mod installer;
pub mod marketplace;
pub mod output;
pub mod process;
pub mod server;
pub mod settings;
pub mod stream;
pub mod workspace;

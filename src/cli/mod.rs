//! Command-line interface module
//!
//! Provides launcher argument parsing and the bundled sample program.

pub mod args;
pub mod commands;

pub use args::{parse_args, Args};
pub use commands::{execute_command, sample_registry};

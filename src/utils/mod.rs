//! Utility modules for common functionality
//!
//! Provides help, usage and error text rendering.

pub mod format;

pub use format::HelpFormatter;

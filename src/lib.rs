//! # sigflag
//!
//! Builds command-line interfaces from annotated function declarations.
//! Each command function lists its parameters with a type expression, an
//! optional help string and optional constraint metadata. The engine turns
//! those declarations into `--flag` options, coerces and validates the
//! tokens supplied at invocation time, and calls the function with typed
//! arguments.
//!
//! ## Features
//!
//! - Scalar types (`int`, `float`, `str`, `bool`, `bytes`, `Path`) and
//!   homogeneous containers (`list[T]`, `tuple[T, ...]`, `set[T]`)
//! - Numeric bounds and length constraints checked after coercion
//! - Nested command groups with argparse-style help and usage errors
//! - Declaration mistakes reported before any command runs
//!
//! ## Example
//!
//! ```no_run
//! use sigflag::config::Config;
//! use sigflag::core::{Arg, BoundArguments, Dispatcher, Function, Param, Registry};
//!
//! let mut registry = Registry::new()?;
//! registry.base(&["ops"], "Arithmetic operations.")?;
//! registry.cmd(
//!     &["ops", "add"],
//!     Function::new("add", |args: &BoundArguments| {
//!         println!("{}", args.get::<i64>("x")? + args.get::<i64>("y")?);
//!         Ok(())
//!     })
//!     .param(Param::new("x", Arg::new("int")))
//!     .param(Param::new("y", Arg::new("int")).default(1)),
//! )?;
//!
//! let argv: Vec<String> = std::env::args().skip(1).collect();
//! let code = Dispatcher::new(registry, Config::default()).dispatch(&argv)?;
//! std::process::exit(code);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging on stderr with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

//! Command dispatch
//!
//! Walks the command tree from the root group, following positional names
//! until a leaf is reached, then binds the remaining tokens and invokes the
//! leaf's handler.

use crate::config::Config;
use crate::core::binder::{bind, is_help_flag, Binding};
use crate::core::registry::{CommandNode, Registry};
use crate::error::BindError;
use crate::utils::format::HelpFormatter;
use anyhow::Context;
use std::io::{self, Write};
use tracing::{debug, instrument};

/// Routes an argument vector to a registered command
///
/// Owns the registry, so no commands can be declared once dispatching starts.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    config: Config,
}

/// Where the walk over the command tree stopped
enum Resolution<'r> {
    Leaf(&'r CommandNode, usize),
    Help(&'r CommandNode),
    Unknown(&'r CommandNode, BindError),
}

impl Dispatcher {
    #[must_use]
    pub const fn new(registry: Registry, config: Config) -> Self {
        Self { registry, config }
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatch `argv` (without the program name) using stdout and stderr
    pub fn dispatch(&self, argv: &[String]) -> anyhow::Result<i32> {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.dispatch_to(argv, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Dispatch `argv`, writing help to `out` and usage errors to `err`
    ///
    /// Returns the exit code. An error returned by the handler is passed
    /// through unchanged.
    #[instrument(skip(self, out, err))]
    pub fn dispatch_to(
        &self,
        argv: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> anyhow::Result<i32> {
        let config = self.config();
        let formatter = HelpFormatter::new(config);

        let (leaf, consumed) = match self.resolve(argv) {
            Resolution::Leaf(leaf, consumed) => (leaf, consumed),
            Resolution::Help(node) => {
                debug!("Showing help for '{}'", formatter.command_path(node));
                write!(out, "{}", formatter.help(node)).context("Failed to write help")?;
                return Ok(0);
            }
            Resolution::Unknown(node, error) => {
                write!(err, "{}", formatter.errors(node, &[error]))
                    .context("Failed to write usage error")?;
                return Ok(config.usage_exit_code);
            }
        };

        let tokens = &argv[consumed..];
        let arguments = match bind(leaf, tokens) {
            Ok(Binding::Bound(arguments)) => arguments,
            Ok(Binding::Help) => {
                write!(out, "{}", formatter.help(leaf)).context("Failed to write help")?;
                return Ok(0);
            }
            Err(mut errors) => {
                if !config.report_all_errors {
                    errors.truncate(1);
                }
                write!(err, "{}", formatter.errors(leaf, &errors))
                    .context("Failed to write usage error")?;
                return Ok(config.usage_exit_code);
            }
        };

        let Some(handler) = leaf.handler() else {
            anyhow::bail!("'{}' has no handler", formatter.command_path(leaf));
        };

        debug!("Running '{}'", formatter.command_path(leaf));
        handler(&arguments)?;
        Ok(0)
    }

    fn resolve<'r>(&'r self, argv: &[String]) -> Resolution<'r> {
        let mut node = self.registry().root();

        for (index, token) in argv.iter().enumerate() {
            if is_help_flag(token) {
                return Resolution::Help(node);
            }

            let Some(child) = node.child(token) else {
                let choices = node
                    .children()
                    .iter()
                    .map(|child| format!("'{}'", child.name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                debug!("Unknown command '{}'", token);
                return Resolution::Unknown(
                    node,
                    BindError::UnknownCommand {
                        name: token.clone(),
                        choices,
                    },
                );
            };

            if child.is_leaf() {
                debug!("Resolved leaf '{}'", child.path().join(" "));
                return Resolution::Leaf(child, index + 1);
            }
            node = child;
        }

        Resolution::Help(node)
    }
}

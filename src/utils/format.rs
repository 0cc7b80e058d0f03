//! Help, usage and error text
//!
//! Renders argparse-style output for groups and leaves.

use crate::config::Config;
use crate::core::registry::CommandNode;
use crate::core::signature::ParameterSpec;
use crate::error::BindError;
use std::fmt::Write;

const HELP_FLAG: &str = "-h, --help";
const HELP_TEXT: &str = "show this help message and exit";

/// Formatter for help screens and usage errors
#[derive(Debug, Clone, Copy)]
pub struct HelpFormatter<'a> {
    config: &'a Config,
}

impl<'a> HelpFormatter<'a> {
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Program name followed by the node's path, e.g. `prog ops add`
    pub fn command_path(&self, node: &CommandNode) -> String {
        std::iter::once(self.config.prog.as_str())
            .chain(node.path().iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn usage(&self, node: &CommandNode) -> String {
        let mut usage = format!("usage: {} [-h]", self.command_path(node));
        if node.is_leaf() {
            for param in node.params() {
                let flag = flag_usage(param);
                if param.is_required() {
                    let _ = write!(usage, " {flag}");
                } else {
                    let _ = write!(usage, " [{flag}]");
                }
            }
        } else {
            usage.push_str(" <command> ...");
        }
        usage
    }

    /// Full help screen for a group or leaf
    pub fn help(&self, node: &CommandNode) -> String {
        let mut out = self.usage(node);
        out.push('\n');

        let description = match (node.help(), node.path().is_empty()) {
            ("", true) => self.config.description.as_deref().unwrap_or(""),
            (help, _) => help,
        };
        if !description.trim().is_empty() {
            let _ = write!(out, "\n{}\n", description.trim());
        }

        if !node.is_leaf() && !node.children().is_empty() {
            out.push_str("\ncommands:\n");
            let rows: Vec<(String, String)> = node
                .children()
                .iter()
                .map(|child| (child.name().to_string(), child.summary().to_string()))
                .collect();
            write_rows(&mut out, &rows);
        }

        out.push_str("\noptions:\n");
        let mut rows = vec![(HELP_FLAG.to_string(), HELP_TEXT.to_string())];
        rows.extend(
            node.params()
                .iter()
                .map(|param| (flag_usage(param), option_help(param))),
        );
        write_rows(&mut out, &rows);

        if node.path().is_empty() {
            if let Some(epilog) = self.config.epilog.as_deref().filter(|e| !e.trim().is_empty()) {
                let _ = write!(out, "\n{}\n", epilog.trim());
            }
        }

        out
    }

    /// Usage line followed by one scoped line per binding error
    pub fn errors(&self, node: &CommandNode, errors: &[BindError]) -> String {
        let path = self.command_path(node);
        let mut out = self.usage(node);
        out.push('\n');
        for error in errors {
            let _ = writeln!(out, "{path}: error: {error}");
        }
        out
    }
}

/// Flag with its metavar, e.g. `--x X` or `--v V [V ...]`
fn flag_usage(param: &ParameterSpec) -> String {
    let metavar = param.name().to_uppercase().replace('-', "_");
    if param.shape().is_container() {
        format!("{} {metavar} [{metavar} ...]", param.flag())
    } else {
        format!("{} {metavar}", param.flag())
    }
}

/// Help text with the default spliced in before any trailing period
fn option_help(param: &ParameterSpec) -> String {
    let help = param.help().trim();
    let Some(default) = param.default() else {
        return help.to_string();
    };

    let note = format!("(default: {default})");
    match help.strip_suffix('.') {
        Some(stem) => format!("{stem} {note}."),
        None if help.is_empty() => note,
        None => format!("{help} {note}"),
    }
}

fn write_rows(out: &mut String, rows: &[(String, String)]) {
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    for (left, right) in rows {
        if right.is_empty() {
            let _ = writeln!(out, "  {left}");
        } else {
            let _ = writeln!(out, "  {left:<width$}  {right}");
        }
    }
}

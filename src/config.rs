//! Configuration management for the command engine
//!
//! Centralizes program-wide options and provides validation.

use crate::{cli::Args, error::DeclarationError};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Program name shown in usage lines and error prefixes
    pub prog: String,
    /// Root help text used when the root group has none of its own
    pub description: Option<String>,
    /// Text appended to the root group's help
    pub epilog: Option<String>,
    /// Reject leaves whose parent groups were not declared with `base`
    pub require_declared_groups: bool,
    /// Report every binding error instead of only the first
    pub report_all_errors: bool,
    /// Exit code for usage errors
    pub usage_exit_code: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            prog: "sigflag".to_string(),
            description: None,
            epilog: None,
            require_declared_groups: false,
            report_all_errors: true,
            usage_exit_code: 2,
        }
    }
}

impl Config {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Result<Self, DeclarationError> {
        let config = Self {
            debug: args.debug,
            prog: args.prog.clone(),
            description: Some(args.description.clone()).filter(|text| !text.trim().is_empty()),
            epilog: args.epilog.clone().filter(|text| !text.trim().is_empty()),
            require_declared_groups: args.strict_groups,
            report_all_errors: !args.first_error_only,
            ..Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DeclarationError> {
        if self.prog.trim().is_empty() {
            return Err(DeclarationError::config("program name must not be empty"));
        }

        if self.prog.chars().any(char::is_whitespace) {
            return Err(DeclarationError::config(format!(
                "program name must not contain whitespace: '{}'",
                self.prog
            )));
        }

        if self.usage_exit_code == 0 {
            return Err(DeclarationError::config(
                "usage exit code must be non-zero",
            ));
        }

        Ok(())
    }

    /// Builder-style override of the program name
    pub fn with_prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = prog.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.usage_exit_code, 2);
        assert!(config.report_all_errors);
    }

    #[test]
    fn test_from_args() {
        let args = Args::try_parse_from([
            "sigflag",
            "--prog",
            "calc",
            "--strict-groups",
            "--first-error-only",
            "ops",
        ])
        .unwrap();
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.prog, "calc");
        assert!(config.require_declared_groups);
        assert!(!config.report_all_errors);
        assert_eq!(config.description.as_deref(), Some("Run the bundled sample commands."));
        assert_eq!(config.epilog, None);

        let args =
            Args::try_parse_from(["sigflag", "--description", " ", "--epilog", "Bye."]).unwrap();
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.description, None);
        assert_eq!(config.epilog.as_deref(), Some("Bye."));
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::default().with_prog("").validate().is_err());
        assert!(Config::default().with_prog("my prog").validate().is_err());

        let config = Config {
            usage_exit_code: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DeclarationError::Config { .. })
        ));
    }
}

//! Error types for the command engine
//!
//! Declaration errors are configuration mistakes made by the program author
//! and are always fatal. Bind errors are mistakes made by the person running
//! the program and are reported through the help formatter.

use crate::core::resolver::Arity;
use crate::core::types::ScalarKind;
use thiserror::Error;

/// Errors raised while declaring commands, parameters and configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeclarationError {
    /// The same leaf path was registered twice
    #[error("Duplicate command: '{path}' is already registered")]
    DuplicateCommand { path: String },

    /// A group and a leaf claim the same path, or a leaf would get children
    #[error("Command path conflict at '{path}': {message}")]
    PathConflict { path: String, message: String },

    /// Strict mode requires every parent group to be declared first
    #[error(
        "Missing base command for '{path}'. You must declare the group '{path}' \
         before declaring nested commands."
    )]
    MissingGroup { path: String },

    /// The declared type has no coercion routine
    #[error("Unsupported type '{type_name}' for parameter '{param}': {reason}")]
    UnsupportedType {
        param: String,
        type_name: String,
        reason: String,
    },

    /// A constraint does not fit the declared shape or contradicts another one
    #[error("Invalid constraint for parameter '{param}': {message}")]
    Constraint { param: String, message: String },

    /// A parameter was not wrapped in the flag marker
    #[error("Parameter '{param}' of '{function}' must be declared with `Arg` to bind a flag")]
    NotBindable { function: String, param: String },

    /// A default value does not fit its parameter
    #[error("Invalid default for parameter '{param}': {message}")]
    InvalidDefault { param: String, message: String },

    /// A command or parameter name is malformed
    #[error("Invalid name '{name}': {message}")]
    InvalidName { name: String, message: String },

    /// Engine configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl DeclarationError {
    /// Create a new duplicate command error
    pub fn duplicate_command(path: impl Into<String>) -> Self {
        Self::DuplicateCommand { path: path.into() }
    }

    /// Create a new path conflict error
    pub fn path_conflict(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PathConflict {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new missing group error
    pub fn missing_group(path: impl Into<String>) -> Self {
        Self::MissingGroup { path: path.into() }
    }

    /// Create a new unsupported type error
    pub fn unsupported_type(
        param: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            param: param.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new constraint error
    pub fn constraint(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a new non-bindable parameter error
    pub fn not_bindable(function: impl Into<String>, param: impl Into<String>) -> Self {
        Self::NotBindable {
            function: function.into(),
            param: param.into(),
        }
    }

    /// Create a new invalid default error
    pub fn invalid_default(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefault {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid name error
    pub fn invalid_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Errors raised while matching command-line tokens against a command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    /// No child command with this name under the current group
    #[error("unknown command '{name}' (choose from {choices})")]
    UnknownCommand { name: String, choices: String },

    /// A flag that the command does not declare
    #[error("unrecognized argument: {flag}")]
    UnknownFlag { flag: String },

    /// A value that does not follow any flag
    #[error("unexpected argument '{token}'")]
    UnexpectedArgument { token: String },

    /// A required flag was not supplied
    #[error("the following argument is required: {flag}")]
    MissingFlag { flag: String },

    /// A flag was given too few or too many values
    #[error("argument {flag}: expected {expected}, got {found}")]
    WrongArity {
        flag: String,
        expected: Arity,
        found: usize,
    },

    /// A raw token could not be converted to the declared kind
    #[error("argument {flag}: invalid {expected} value: '{token}'")]
    Coercion {
        flag: String,
        token: String,
        tokens: Vec<String>,
        expected: ScalarKind,
    },

    /// A coerced value failed one of its constraints
    #[error("argument {flag}: {message}")]
    Constraint { flag: String, message: String },
}

impl BindError {
    /// The flag this error is scoped to, if any
    pub fn flag(&self) -> Option<&str> {
        match self {
            Self::UnknownFlag { flag }
            | Self::MissingFlag { flag }
            | Self::WrongArity { flag, .. }
            | Self::Coercion { flag, .. }
            | Self::Constraint { flag, .. } => Some(flag),
            Self::UnknownCommand { .. } | Self::UnexpectedArgument { .. } => None,
        }
    }
}

/// Errors raised when a handler reads its bound arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("no bound argument named '{0}'")]
    Missing(String),

    #[error("argument '{name}' holds a {found} value, not {expected}")]
    Mismatch {
        name: String,
        found: &'static str,
        expected: &'static str,
    },
}

/// Result type alias for declaration-time operations
pub type Result<T> = std::result::Result<T, DeclarationError>;

//! Error types for parsing operations.
//!
//! Every failure a parse can produce is an [`EngineError`]. Each error maps to
//! a stable [`ErrorCode`] so callers can compare outcomes of different parses
//! without matching on message text.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing an argument vector.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected by the command-line parser, or a help/version display
    /// request.
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// A mandatory option has no value after resolution.
    #[error("required option '{flags}' not specified for `{command}`")]
    MissingMandatoryOption { command: String, flags: String },

    /// The matched command's action reported a failure.
    #[error("action for `{command}` failed: {message}")]
    Action { command: String, message: String },

    /// A parsed value could not be read back.
    #[error("failed to read `{id}` from matches: {message}")]
    Matches { id: String, message: String },

    /// The parser selected a subcommand the grammar does not declare.
    #[error("unknown subcommand `{0}`")]
    UnknownSubcommand(String),
}

impl EngineError {
    /// Returns the stable code identifying this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(err) => ErrorCode::from_clap(err),
            Self::MissingMandatoryOption { .. } => ErrorCode::MissingMandatoryOption,
            Self::Action { .. } => ErrorCode::ActionFailed,
            Self::Matches { .. } | Self::UnknownSubcommand(_) => ErrorCode::Internal,
        }
    }

    /// Returns `true` when the "error" is a help or version display request
    /// rather than a failure.
    pub fn is_display_request(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::HelpDisplayed | ErrorCode::VersionDisplayed
        )
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(err) => err.exit_code(),
            _ => 1,
        }
    }
}

/// Stable classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Help output was requested.
    HelpDisplayed,
    /// Version output was requested.
    VersionDisplayed,
    /// An option (or an excess positional value) was not recognised.
    UnknownArgument,
    /// A subcommand name was not recognised.
    UnknownCommand,
    /// A value failed coercion or has the wrong number of values.
    InvalidArgument,
    /// A value is not one of the permitted choices.
    InvalidChoice,
    /// An option that requires a value was given without one.
    MissingOptionArgument,
    /// Two conflicting options were both given.
    ConflictingOption,
    /// A required positional argument is missing.
    MissingArgument,
    /// A subcommand is required but none was given.
    MissingSubcommand,
    /// A mandatory option has no value.
    MissingMandatoryOption,
    /// The matched command's action failed.
    ActionFailed,
    /// Any other failure.
    Internal,
}

impl ErrorCode {
    /// Classifies a clap error.
    ///
    /// clap reports both a rejected choice and an option left without its
    /// value as `InvalidValue`; the latter carries an empty offending value.
    fn from_clap(err: &clap::Error) -> Self {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Self::HelpDisplayed
            }
            ErrorKind::DisplayVersion => Self::VersionDisplayed,
            ErrorKind::UnknownArgument => Self::UnknownArgument,
            ErrorKind::InvalidSubcommand => Self::UnknownCommand,
            ErrorKind::InvalidValue if names_rejected_value(err) => Self::InvalidChoice,
            ErrorKind::InvalidValue => Self::MissingOptionArgument,
            ErrorKind::ValueValidation
            | ErrorKind::NoEquals
            | ErrorKind::TooManyValues
            | ErrorKind::TooFewValues
            | ErrorKind::WrongNumberOfValues
            | ErrorKind::InvalidUtf8 => Self::InvalidArgument,
            ErrorKind::ArgumentConflict => Self::ConflictingOption,
            ErrorKind::MissingRequiredArgument => Self::MissingArgument,
            ErrorKind::MissingSubcommand => Self::MissingSubcommand,
            _ => Self::Internal,
        }
    }
}

fn names_rejected_value(err: &clap::Error) -> bool {
    matches!(
        err.get(ContextKind::InvalidValue),
        Some(ContextValue::String(value)) if !value.is_empty()
    )
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HelpDisplayed => write!(f, "help_displayed"),
            Self::VersionDisplayed => write!(f, "version_displayed"),
            Self::UnknownArgument => write!(f, "unknown_argument"),
            Self::UnknownCommand => write!(f, "unknown_command"),
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::InvalidChoice => write!(f, "invalid_choice"),
            Self::MissingOptionArgument => write!(f, "missing_option_argument"),
            Self::ConflictingOption => write!(f, "conflicting_option"),
            Self::MissingArgument => write!(f, "missing_argument"),
            Self::MissingSubcommand => write!(f, "missing_subcommand"),
            Self::MissingMandatoryOption => write!(f, "missing_mandatory_option"),
            Self::ActionFailed => write!(f, "action_failed"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Convenience alias for results with [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

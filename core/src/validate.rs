//! Grammar validation.
//!
//! Validates structural invariants of a command tree before it is indexed,
//! catching errors such as duplicate flags, invalid flag formats, dangling
//! option references and misordered positional arguments before they reach
//! the parser.
//!
//! # Examples
//!
//! ```
//! use partial_parse_core::*;
//!
//! let root = CommandNode::new("git")
//!     .with_option(OptionSpec::flag(Some("-v"), Some("--verbose")));
//! assert!(validate_command(&root).is_ok());
//!
//! // Invalid: short flag missing leading dash
//! let bad = CommandNode::new("git")
//!     .with_option(OptionSpec::flag(Some("v"), Some("--verbose")));
//! assert!(validate_command(&bad).is_err());
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{ArgumentSpec, CommandNode, OptionSpec};

/// Grammar construction errors.
///
/// Each variant describes a specific structural problem. The `Display` impl
/// provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Flag text could not be parsed.
    #[error("invalid flag syntax: {0}")]
    InvalidFlagSyntax(String),
    /// Short flag is not a dash followed by one character.
    #[error("invalid short flag format: {0}")]
    InvalidShortFlag(String),
    /// Long flag does not start with `--` or is too short.
    #[error("invalid long flag format: {0}")]
    InvalidLongFlag(String),
    /// An option has neither short nor long form.
    #[error("option must define short or long form")]
    MissingFlagName,
    /// Two options in the same command share a flag.
    #[error("duplicate flag in command `{command}`: {flag}")]
    DuplicateFlag { command: String, flag: String },
    /// Two options share a key without being a positive/negated pair.
    #[error("duplicate option key in command `{command}`: {key}")]
    DuplicateOptionKey { command: String, key: String },
    /// A `--no-` option declared a value or repetition.
    #[error("negated option cannot take a value or repeat: {0}")]
    InvalidNegation(String),
    /// Two subcommands of one command share a name or alias.
    #[error("duplicate subcommand in `{command}`: {name}")]
    DuplicateSubcommand { command: String, name: String },
    /// The default subcommand is not a child of the command.
    #[error("default subcommand `{name}` is not a subcommand of `{command}`")]
    UnknownDefaultSubcommand { command: String, name: String },
    /// A conflict refers to a key no option in the command declares.
    #[error("option `{option}` conflicts with unknown key `{key}`")]
    UnknownConflictKey { option: String, key: String },
    /// An implication targets a key no option in the command declares.
    #[error("option `{option}` implies unknown key `{key}`")]
    UnknownImpliedKey { option: String, key: String },
    /// Positional arguments are declared in an order the parser cannot
    /// honour (required after optional, or a variadic that is not last).
    #[error("invalid argument order in `{command}` at `{argument}`")]
    InvalidArgumentOrder { command: String, argument: String },
    /// Two positional arguments of one command share a name.
    #[error("duplicate argument in `{command}`: {name}")]
    DuplicateArgument { command: String, name: String },
    /// The version flag reuses an option flag or a help flag.
    #[error("version flag of `{command}` clashes with {flag}")]
    VersionFlagClash { command: String, flag: String },
    /// Malformed JSON grammar document.
    #[error("JSON error: {0}")]
    Json(String),
}

/// Validates a command tree.
///
/// Checks every command for an empty name, invalid or duplicate flags,
/// duplicate keys, misused negation, dangling conflict and implication keys,
/// a version flag reusing an option or help flag, duplicate or misordered
/// arguments, duplicate subcommands and an unknown default subcommand.
///
/// # Errors
///
/// Returns the first problem found, depth-first.
///
/// # Examples
///
/// ```
/// use partial_parse_core::*;
///
/// let root = CommandNode::new("shop").with_option(
///     OptionSpec::flag(None, Some("--cash")).conflicts_with("creditCard"),
/// );
/// assert_eq!(
///     validate_command(&root),
///     Err(GrammarError::UnknownConflictKey {
///         option: "--cash".into(),
///         key: "creditCard".into(),
///     })
/// );
/// ```
pub fn validate_command(command: &CommandNode) -> Result<(), GrammarError> {
    if command.name.trim().is_empty() {
        return Err(GrammarError::EmptyCommandName);
    }

    validate_options(command)?;
    validate_version(command)?;
    validate_arguments(command)?;
    validate_subcommands(command)?;

    for sub in &command.subcommands {
        validate_command(sub)?;
    }
    Ok(())
}

fn validate_options(command: &CommandNode) -> Result<(), GrammarError> {
    let mut seen_flags = HashSet::new();
    // key -> (has positive, has negative)
    let mut keys: HashMap<String, (bool, bool)> = HashMap::new();

    for option in &command.options {
        validate_flags(option)?;

        for flag in option.short.iter().chain(option.long.iter()) {
            if !seen_flags.insert(flag.as_str()) {
                return Err(GrammarError::DuplicateFlag {
                    command: command.name.clone(),
                    flag: flag.clone(),
                });
            }
        }

        if option.negate && (option.arity.takes_value() || option.arity.is_repeatable()) {
            return Err(GrammarError::InvalidNegation(option.flags()));
        }

        let polarity = keys.entry(option.key()).or_default();
        let slot = if option.negate {
            &mut polarity.1
        } else {
            &mut polarity.0
        };
        if *slot {
            return Err(GrammarError::DuplicateOptionKey {
                command: command.name.clone(),
                key: option.key(),
            });
        }
        *slot = true;
    }

    for option in &command.options {
        let label = option.long.clone().or_else(|| option.short.clone()).unwrap_or_default();
        if let Some(key) = option.conflicts.iter().find(|k| !keys.contains_key(*k)) {
            return Err(GrammarError::UnknownConflictKey {
                option: label,
                key: key.clone(),
            });
        }
        if let Some(key) = option.implies.keys().find(|k| !keys.contains_key(*k)) {
            return Err(GrammarError::UnknownImpliedKey {
                option: label,
                key: key.clone(),
            });
        }
    }

    Ok(())
}

fn validate_flags(option: &OptionSpec) -> Result<(), GrammarError> {
    if option.short.is_none() && option.long.is_none() {
        return Err(GrammarError::MissingFlagName);
    }

    if let Some(short) = &option.short {
        if !short.starts_with('-') || short.starts_with("--") || short.chars().count() != 2 {
            return Err(GrammarError::InvalidShortFlag(short.clone()));
        }
    }

    if let Some(long) = &option.long {
        if !long.starts_with("--") || long.len() < 3 {
            return Err(GrammarError::InvalidLongFlag(long.clone()));
        }
    }

    Ok(())
}

fn validate_version(command: &CommandNode) -> Result<(), GrammarError> {
    let Some(version) = &command.settings.version else {
        return Ok(());
    };

    let taken = command
        .options
        .iter()
        .flat_map(|o| o.short.iter().chain(o.long.iter()))
        .map(String::as_str)
        .chain(["-h", "--help"]);
    for flag in taken {
        if version.short.as_deref() == Some(flag) || version.long.as_deref() == Some(flag) {
            return Err(GrammarError::VersionFlagClash {
                command: command.name.clone(),
                flag: flag.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_arguments(command: &CommandNode) -> Result<(), GrammarError> {
    let mut seen_optional = false;
    let mut names = HashSet::new();
    let count = command.arguments.len();

    for (index, argument) in command.arguments.iter().enumerate() {
        if !names.insert(argument.name.as_str()) {
            return Err(GrammarError::DuplicateArgument {
                command: command.name.clone(),
                name: argument.name.clone(),
            });
        }

        let misordered = (argument.required && seen_optional)
            || (argument.variadic && index + 1 != count);
        if misordered {
            return Err(invalid_order(command, argument));
        }
        seen_optional |= !argument.required;
    }

    Ok(())
}

fn invalid_order(command: &CommandNode, argument: &ArgumentSpec) -> GrammarError {
    GrammarError::InvalidArgumentOrder {
        command: command.name.clone(),
        argument: argument.name.clone(),
    }
}

fn validate_subcommands(command: &CommandNode) -> Result<(), GrammarError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for sub in &command.subcommands {
        for name in std::iter::once(&sub.name).chain(sub.aliases.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(GrammarError::DuplicateSubcommand {
                    command: command.name.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    if let Some(name) = &command.settings.default_subcommand {
        if command.find_subcommand(name).is_none() {
            return Err(GrammarError::UnknownDefaultSubcommand {
                command: command.name.clone(),
                name: name.clone(),
            });
        }
    }

    Ok(())
}

//! Parse configuration and the configuration-sourced option layer.
//!
//! [`ParseConfig`] controls how an argument vector is interpreted and carries
//! [`ConfigValues`]: option values supplied by the application's own
//! configuration (a settings file, a profile) that take precedence over
//! declared defaults but yield to environment variables and the command line.
//!
//! # Example YAML
//!
//! ```yaml
//! pizza:
//!   cheese: mozzarella
//! pizza order:
//!   quantity: 2
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use partial_parse_core::{OptionValue, OptionValues};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or saving [`ConfigValues`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How the first elements of an argument vector are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgvStyle {
    /// `argv[0]` is the program name and is skipped.
    #[default]
    Program,
    /// Every element is a user argument.
    User,
}

impl ArgvStyle {
    /// Number of leading elements that are not user arguments.
    pub fn skip(self) -> usize {
        match self {
            Self::Program => 1,
            Self::User => 0,
        }
    }
}

/// Option values from the application's configuration layer.
///
/// Keyed by command qualified name (`"git remote add"`), then by option key.
/// Keys a command does not declare are ignored by the parser.
///
/// # Examples
///
/// ```
/// use partial_parse_engine::ConfigValues;
///
/// let values = ConfigValues::default()
///     .with_value("pizza", "cheese", "mozzarella")
///     .with_value("pizza order", "quantity", 2_i64);
///
/// assert_eq!(
///     values.get("pizza", "cheese").and_then(|v| v.as_str()),
///     Some("mozzarella")
/// );
/// assert!(values.get("pizza", "size").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigValues(BTreeMap<String, OptionValues>);

impl ConfigValues {
    /// Sets `key` for the command named `command`.
    pub fn set(&mut self, command: &str, key: &str, value: impl Into<OptionValue>) {
        self.0
            .entry(command.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn with_value(mut self, command: &str, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(command, key, value);
        self
    }

    pub fn get(&self, command: &str, key: &str) -> Option<&OptionValue> {
        self.0.get(command).and_then(|values| values.get(key))
    }

    /// Returns every value configured for `command`.
    pub fn for_command(&self, command: &str) -> Option<&OptionValues> {
        self.0.get(command)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|values| values.is_empty())
    }

    /// Loads values from a YAML file, or JSON when the extension is `.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`]/[`ConfigError::Json`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let values = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(values)
    }

    /// Saves values as YAML, or JSON when the extension is `.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written, or
    /// [`ConfigError::Yaml`]/[`ConfigError::Json`] if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Settings for one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub argv_style: ArgvStyle,
    pub config_values: ConfigValues,
}

impl ParseConfig {
    /// Treats every element of the argument vector as a user argument.
    pub fn user_args() -> Self {
        Self {
            argv_style: ArgvStyle::User,
            ..Self::default()
        }
    }

    pub fn with_config_values(mut self, values: ConfigValues) -> Self {
        self.config_values = values;
        self
    }
}

//! Conversion of raw command-line values into [`OptionValue`]s.
//!
//! [`OptionValueParser`] plugs an option's choices and coercer into clap so
//! that invalid values are rejected during tokenization, with the same error
//! kinds clap uses for its own value parsers.

use std::ffi::OsStr;

use clap::builder::{PossibleValue, TypedValueParser};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use partial_parse_core::{ArgumentSpec, Coercer, OptionArity, OptionSpec, OptionValue};

/// Placeholder clap inserts when an optional-value option is given bare.
///
/// A NUL byte cannot occur in a real argument, so it never collides with
/// user input.
pub(crate) const BARE_VALUE: &str = "\0";

/// A value as parsed by [`OptionValueParser`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedValue {
    pub value: OptionValue,
    /// The option was given without a value.
    pub bare: bool,
}

/// Value parser honouring an option's choices, coercer and preset.
#[derive(Debug, Clone)]
pub(crate) struct OptionValueParser {
    choices: Vec<String>,
    coercer: Option<Coercer>,
    preset: Option<OptionValue>,
}

impl OptionValueParser {
    pub fn for_option(option: &OptionSpec) -> Self {
        let preset = match &option.arity {
            OptionArity::OptionalValue { preset, .. } => preset.clone(),
            OptionArity::Flag { .. } | OptionArity::RequiredValue { .. } => None,
        };
        Self {
            choices: option.choices.clone(),
            coercer: option.coercer.clone(),
            preset,
        }
    }

    pub fn for_argument(argument: &ArgumentSpec) -> Self {
        Self {
            choices: argument.choices.clone(),
            coercer: argument.coercer.clone(),
            preset: None,
        }
    }

    fn bare(&self, cmd: &clap::Command, arg: Option<&clap::Arg>) -> Result<ParsedValue, clap::Error> {
        let value = match &self.preset {
            Some(OptionValue::String(raw)) => self.coerce(cmd, arg, raw)?,
            Some(preset) => preset.clone(),
            None => OptionValue::Bool(true),
        };
        Ok(ParsedValue { value, bare: true })
    }

    fn coerce(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        raw: &str,
    ) -> Result<OptionValue, clap::Error> {
        match &self.coercer {
            Some(coercer) => coercer.coerce(raw).map_err(|message| {
                invalid(cmd, ErrorKind::ValueValidation, arg, raw, &message)
            }),
            None => Ok(OptionValue::from(raw)),
        }
    }
}

impl TypedValueParser for OptionValueParser {
    type Value = ParsedValue;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let raw = value.to_str().ok_or_else(|| {
            invalid(cmd, ErrorKind::InvalidUtf8, arg, &value.to_string_lossy(), "invalid UTF-8")
        })?;

        if raw == BARE_VALUE {
            return self.bare(cmd, arg);
        }

        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == raw) {
            let message = format!("Allowed choices are {}.", self.choices.join(", "));
            let mut err = invalid(cmd, ErrorKind::InvalidValue, arg, raw, &message);
            err.insert(ContextKind::InvalidValue, ContextValue::String(raw.to_string()));
            return Err(err);
        }

        Ok(ParsedValue {
            value: self.coerce(cmd, arg, raw)?,
            bare: false,
        })
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        if self.choices.is_empty() {
            return None;
        }
        Some(Box::new(
            self.choices.iter().map(|c| PossibleValue::new(c.clone())),
        ))
    }
}

fn invalid(
    cmd: &clap::Command,
    kind: ErrorKind,
    arg: Option<&clap::Arg>,
    raw: &str,
    message: &str,
) -> clap::Error {
    let target = arg.map(ToString::to_string).unwrap_or_else(|| "...".to_string());
    clap::Error::raw(
        kind,
        format!("invalid value '{raw}' for '{target}': {message}\n"),
    )
    .with_cmd(cmd)
}

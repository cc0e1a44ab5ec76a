//! Grammar type definitions for hierarchical command-line interfaces.
//!
//! This module defines the declarative data model an application uses to
//! describe its commands: options with their arity, defaults, environment
//! sources and relationships, positional arguments, per-command settings and
//! the nested command tree. The serializable parts round-trip through JSON and
//! YAML; coercers and actions are runtime-only and skipped by serde.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::flags::{FlagSyntax, ValuePlaceholder, attribute_key};
use crate::grammar::{CommandId, Grammar};
use crate::validate::GrammarError;

/// Version of the [`GrammarSettings`] contract.
///
/// Bumped whenever a field is added to or removed from the settings struct so
/// that copies made field-by-field (such as shadow grammars) are revisited.
pub const GRAMMAR_SETTINGS_VERSION: u32 = 1;

/// A resolved option or argument value.
///
/// Absence of a value is not a variant: a key that was never bound is simply
/// missing from the map holding the values.
///
/// # Examples
///
/// ```
/// use partial_parse_core::OptionValue;
///
/// assert_eq!(OptionValue::from("blue"), OptionValue::String("blue".into()));
/// assert_eq!(OptionValue::from(false).as_bool(), Some(false));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<OptionValue>),
}

impl OptionValue {
    /// Returns the boolean payload, if this is a [`OptionValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a [`OptionValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", rendered.join(","))
            }
        }
    }
}

/// Source that produced a bound option value.
///
/// Ordered by precedence: a later variant in the list never overrides an
/// earlier one except for [`ValueSource::Implied`], which only fills keys that
/// have no custom value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Given on the command line.
    Cli,
    /// Read from the option's environment variable.
    Env,
    /// Supplied by the caller's configuration layer.
    Config,
    /// The option's declared default.
    Default,
    /// Set by another option's implication.
    Implied,
}

impl ValueSource {
    /// Returns `true` for sources the user actually chose (not a default or
    /// an implication).
    pub fn is_custom(self) -> bool {
        !matches!(self, Self::Default | Self::Implied)
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env => write!(f, "env"),
            Self::Config => write!(f, "config"),
            Self::Default => write!(f, "default"),
            Self::Implied => write!(f, "implied"),
        }
    }
}

/// Resolved option values of one command, keyed by canonical option key.
pub type OptionValues = BTreeMap<String, OptionValue>;

/// Provenance of each resolved option value, keyed by canonical option key.
pub type OptionSources = BTreeMap<String, ValueSource>;

type CoerceFn = dyn Fn(&str) -> Result<OptionValue, String> + Send + Sync;

/// Custom conversion and validation of a raw command-line value.
///
/// Returning `Err` rejects the value; the message is reported by the parser.
///
/// # Examples
///
/// ```
/// use partial_parse_core::{Coercer, OptionValue};
///
/// let parse = Coercer::integer();
/// assert_eq!(parse.coerce("42"), Ok(OptionValue::Int(42)));
/// assert!(parse.coerce("forty-two").is_err());
/// ```
#[derive(Clone)]
pub struct Coercer(Arc<CoerceFn>);

impl Coercer {
    pub fn new(f: impl Fn(&str) -> Result<OptionValue, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Parses a base-10 integer.
    pub fn integer() -> Self {
        Self::new(|raw| {
            raw.trim()
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| "Not a number.".to_string())
        })
    }

    /// Parses a floating point number.
    pub fn float() -> Self {
        Self::new(|raw| {
            raw.trim()
                .parse::<f64>()
                .map(OptionValue::Float)
                .map_err(|_| "Not a number.".to_string())
        })
    }

    /// Splits the value on `separator` into a list of strings.
    pub fn list(separator: char) -> Self {
        Self::new(move |raw| {
            Ok(OptionValue::List(
                raw.split(separator).map(OptionValue::from).collect(),
            ))
        })
    }

    pub fn coerce(&self, raw: &str) -> Result<OptionValue, String> {
        (self.0)(raw)
    }
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Coercer(..)")
    }
}

/// Arity class of an option: how many values it takes, and whether it may
/// be given more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptionArity {
    /// No value (`--verbose`). Repeatable flags count occurrences.
    Flag {
        #[serde(default)]
        repeatable: bool,
    },
    /// Exactly one value per occurrence (`--port <number>`).
    RequiredValue {
        value_name: String,
        #[serde(default)]
        repeatable: bool,
    },
    /// A value may follow (`--cheese [type]`). Without one, the option binds
    /// `preset`, or `true` when there is no preset.
    OptionalValue {
        value_name: String,
        #[serde(default)]
        repeatable: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset: Option<OptionValue>,
    },
}

impl OptionArity {
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Flag { .. })
    }

    pub fn is_repeatable(&self) -> bool {
        match self {
            Self::Flag { repeatable }
            | Self::RequiredValue { repeatable, .. }
            | Self::OptionalValue { repeatable, .. } => *repeatable,
        }
    }

    fn set_repeatable(&mut self, value: bool) {
        match self {
            Self::Flag { repeatable }
            | Self::RequiredValue { repeatable, .. }
            | Self::OptionalValue { repeatable, .. } => *repeatable = value,
        }
    }
}

/// Declaration of a command option.
///
/// Build one from usage-style flag syntax (`"-c, --cheese <type>"`) with
/// [`OptionSpec::parse`], or explicitly with [`flag`](OptionSpec::flag),
/// [`required_value`](OptionSpec::required_value) and
/// [`optional_value`](OptionSpec::optional_value), then chain builder
/// methods.
///
/// # Examples
///
/// ```
/// use partial_parse_core::{OptionArity, OptionSpec};
///
/// let cheese = OptionSpec::parse("-c, --cheese <type>")
///     .unwrap()
///     .with_description("Add the specified type of cheese")
///     .with_default("blue");
/// assert_eq!(cheese.key(), "cheese");
/// assert!(cheese.arity.takes_value());
///
/// let no_sauce = OptionSpec::parse("--no-sauce").unwrap();
/// assert!(no_sauce.negate);
/// assert_eq!(no_sauce.key(), "sauce");
///
/// let verbose = OptionSpec::flag(Some("-v"), Some("--verbose")).repeatable();
/// assert_eq!(verbose.arity, OptionArity::Flag { repeatable: true });
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Short form (e.g. "-c")
    pub short: Option<String>,
    /// Long form (e.g. "--cheese", or "--no-cheese" when negated)
    pub long: Option<String>,
    /// Whether this is the `--no-` form of a boolean option
    #[serde(default)]
    pub negate: bool,
    pub description: Option<String>,
    pub arity: OptionArity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
    /// Label shown for the default in help output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,
    #[serde(skip)]
    pub coercer: Option<Coercer>,
    /// Permitted raw values (empty = unrestricted)
    #[serde(default)]
    pub choices: Vec<String>,
    /// Keys of options that may not be combined with this one
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Values set on other keys when this option is given
    #[serde(default)]
    pub implies: BTreeMap<String, OptionValue>,
    /// Environment variable providing a value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    /// Whether a normal parse fails when the option has no value
    #[serde(default)]
    pub mandatory: bool,
    /// Whether the option is left out of help output
    #[serde(default)]
    pub hidden: bool,
}

impl OptionSpec {
    fn with_arity(short: Option<&str>, long: Option<&str>, arity: OptionArity) -> Self {
        Self {
            short: short.map(String::from),
            long: long.map(String::from),
            negate: long.is_some_and(|l| l.starts_with("--no-")) && !arity.takes_value(),
            description: None,
            arity,
            default: None,
            default_description: None,
            coercer: None,
            choices: Vec::new(),
            conflicts: Vec::new(),
            implies: BTreeMap::new(),
            env: None,
            mandatory: false,
            hidden: false,
        }
    }

    /// Creates a boolean flag. A long form starting with `--no-` declares
    /// the negated form.
    pub fn flag(short: Option<&str>, long: Option<&str>) -> Self {
        Self::with_arity(short, long, OptionArity::Flag { repeatable: false })
    }

    /// Creates an option that requires a value.
    pub fn required_value(short: Option<&str>, long: Option<&str>, value_name: &str) -> Self {
        Self::with_arity(
            short,
            long,
            OptionArity::RequiredValue {
                value_name: value_name.to_string(),
                repeatable: false,
            },
        )
    }

    /// Creates an option whose value may be omitted.
    pub fn optional_value(short: Option<&str>, long: Option<&str>, value_name: &str) -> Self {
        Self::with_arity(
            short,
            long,
            OptionArity::OptionalValue {
                value_name: value_name.to_string(),
                repeatable: false,
                preset: None,
            },
        )
    }

    /// Parses flag syntax such as `"-c, --cheese <type>"`,
    /// `"-l, --letter [value...]"` or `"--no-cheese"`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidFlagSyntax`] when the text has no
    /// recognisable flag or carries stray tokens.
    pub fn parse(flags: &str) -> Result<Self, GrammarError> {
        let syntax = FlagSyntax::parse(flags)?;
        let arity = match syntax.value {
            None => OptionArity::Flag { repeatable: false },
            Some(ValuePlaceholder {
                name,
                required: true,
                variadic,
            }) => OptionArity::RequiredValue {
                value_name: name,
                repeatable: variadic,
            },
            Some(ValuePlaceholder {
                name,
                required: false,
                variadic,
            }) => OptionArity::OptionalValue {
                value_name: name,
                repeatable: variadic,
                preset: None,
            },
        };
        let mut spec = Self::with_arity(syntax.short.as_deref(), syntax.long.as_deref(), arity);
        spec.negate = syntax.negate;
        Ok(spec)
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Allows the option to occur more than once (counting flag, or a value
    /// list).
    pub fn repeatable(mut self) -> Self {
        self.arity.set_repeatable(true);
        self
    }

    pub fn with_default(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_default_description(mut self, label: &str) -> Self {
        self.default_description = Some(label.to_string());
        self
    }

    /// Sets the value bound when an optional-value option is given bare.
    /// Has no effect on other arities.
    pub fn with_preset(mut self, value: impl Into<OptionValue>) -> Self {
        if let OptionArity::OptionalValue { preset, .. } = &mut self.arity {
            *preset = Some(value.into());
        }
        self
    }

    pub fn with_coercer(mut self, coercer: Coercer) -> Self {
        self.coercer = Some(coercer);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn conflicts_with(mut self, key: &str) -> Self {
        self.conflicts.push(key.to_string());
        self
    }

    pub fn implies(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.implies.insert(key.to_string(), value.into());
        self
    }

    pub fn with_env(mut self, var: &str) -> Self {
        self.env = Some(var.to_string());
        self
    }

    /// Marks the option as required for a normal parse.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Returns the flag name without leading dashes (long form preferred).
    ///
    /// Unique within a command, so it doubles as the parser's argument id.
    pub fn name(&self) -> &str {
        match (&self.long, &self.short) {
            (Some(long), _) => long.trim_start_matches("--"),
            (None, Some(short)) => short.trim_start_matches('-'),
            (None, None) => "",
        }
    }

    /// Returns the canonical attribute key the option's value is stored
    /// under: the camel-cased name, with a negation's `no-` prefix removed.
    pub fn key(&self) -> String {
        attribute_key(self.name(), self.negate)
    }

    /// Returns the short form as a character, if any.
    pub fn short_char(&self) -> Option<char> {
        self.short
            .as_deref()
            .and_then(|s| s.strip_prefix('-'))
            .and_then(|s| s.chars().next())
    }

    /// Returns the long form without its leading `--`.
    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref().map(|l| l.trim_start_matches("--"))
    }

    /// Renders the flags the way they are declared, e.g. `-c, --cheese <type>`.
    pub fn flags(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(self.short.iter().cloned());
        parts.extend(self.long.iter().cloned());
        let mut rendered = parts.join(", ");
        match &self.arity {
            OptionArity::Flag { .. } => {}
            OptionArity::RequiredValue {
                value_name,
                repeatable,
            } => {
                let dots = if *repeatable { "..." } else { "" };
                rendered.push_str(&format!(" <{value_name}{dots}>"));
            }
            OptionArity::OptionalValue {
                value_name,
                repeatable,
                ..
            } => {
                let dots = if *repeatable { "..." } else { "" };
                rendered.push_str(&format!(" [{value_name}{dots}]"));
            }
        }
        rendered
    }

    /// Checks if this option matches a given flag string (short or long form).
    pub fn matches(&self, flag: &str) -> bool {
        self.short.as_deref() == Some(flag) || self.long.as_deref() == Some(flag)
    }
}

/// Declaration of a positional argument.
///
/// # Examples
///
/// ```
/// use partial_parse_core::ArgumentSpec;
///
/// let file = ArgumentSpec::parse("<file>").unwrap();
/// assert!(file.required);
///
/// let rest = ArgumentSpec::parse("[args...]").unwrap();
/// assert!(!rest.required);
/// assert!(rest.variadic);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    /// Whether the argument collects all remaining values
    #[serde(default)]
    pub variadic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(skip)]
    pub coercer: Option<Coercer>,
}

impl ArgumentSpec {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            required: true,
            variadic: false,
            default: None,
            default_description: None,
            choices: Vec::new(),
            coercer: None,
        }
    }

    pub fn optional(name: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// Parses `<name>`, `[name]` or their variadic `...` forms.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidFlagSyntax`] for anything else.
    pub fn parse(syntax: &str) -> Result<Self, GrammarError> {
        let placeholder = ValuePlaceholder::parse(syntax.trim())
            .ok_or_else(|| GrammarError::InvalidFlagSyntax(syntax.to_string()))?;
        Ok(Self {
            required: placeholder.required,
            variadic: placeholder.variadic,
            ..Self::required(&placeholder.name)
        })
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<OptionValue>, label: Option<&str>) -> Self {
        self.default = Some(value.into());
        self.default_description = label.map(String::from);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_coercer(mut self, coercer: Coercer) -> Self {
        self.coercer = Some(coercer);
        self
    }
}

/// Where a command writes help and error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Help to stdout, errors to stderr.
    #[default]
    Stdio,
    /// Nothing is written.
    Silent,
}

/// What a failed parse does after reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Terminate the process with the error's exit code.
    #[default]
    Exit,
    /// Hand the structured error back to the caller.
    Return,
}

/// A version flag and the version it reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFlag {
    pub version: String,
    pub short: Option<String>,
    pub long: Option<String>,
    pub description: Option<String>,
}

impl VersionFlag {
    /// Uses the conventional `-V, --version` flags.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            short: Some("-V".to_string()),
            long: Some("--version".to_string()),
            description: None,
        }
    }

    /// Uses custom flag syntax, e.g. `"-v, --VERSION"`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidFlagSyntax`] when `flags` is not a
    /// plain flag.
    pub fn with_flags(version: &str, flags: &str) -> Result<Self, GrammarError> {
        let syntax = FlagSyntax::parse(flags)?;
        if syntax.value.is_some() || syntax.negate {
            return Err(GrammarError::InvalidFlagSyntax(flags.to_string()));
        }
        Ok(Self {
            version: version.to_string(),
            short: syntax.short,
            long: syntax.long,
            description: None,
        })
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Returns `true` for the conventional `-V, --version` pair.
    pub fn is_conventional(&self) -> bool {
        self.short.as_deref() == Some("-V") && self.long.as_deref() == Some("--version")
    }
}

/// Behavioural settings of one command.
///
/// Every field is plain data so that copies of a grammar can be made
/// field-by-field. See [`GRAMMAR_SETTINGS_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarSettings {
    /// Whether `-cvalue` binds `value` to an optional-value short option.
    pub combine_flag_and_optional_value: bool,
    /// Whether unrecognised options are accepted instead of rejected.
    pub allow_unknown_options: bool,
    /// Whether more positional values than declared are accepted.
    pub allow_excess_arguments: bool,
    /// Whether this command's options are only recognised before a
    /// subcommand name.
    pub positional_options: bool,
    /// Whether everything after the first positional value is passed through
    /// untouched.
    pub pass_through_options: bool,
    /// Child selected when no child is named on the command line.
    pub default_subcommand: Option<String>,
    pub version: Option<VersionFlag>,
    pub output: OutputMode,
    pub on_error: ErrorMode,
}

impl Default for GrammarSettings {
    fn default() -> Self {
        Self {
            combine_flag_and_optional_value: true,
            allow_unknown_options: false,
            allow_excess_arguments: false,
            positional_options: false,
            pass_through_options: false,
            default_subcommand: None,
            version: None,
            output: OutputMode::Stdio,
            on_error: ErrorMode::Exit,
        }
    }
}

/// The command a parse resolved to, with the whole chain leading to it.
///
/// Handed to actions. `chain` runs from the root to the matched command.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub grammar: &'a Grammar,
    pub chain: &'a [ResolvedCommand],
}

impl<'a> Invocation<'a> {
    /// Returns the matched command's resolution.
    pub fn command(&self) -> Option<&'a ResolvedCommand> {
        self.chain.last()
    }

    /// Returns option values merged across the chain, nearer commands
    /// taking precedence over their ancestors.
    pub fn options_with_globals(&self) -> OptionValues {
        let mut merged = OptionValues::new();
        for resolved in self.chain {
            merged.extend(resolved.options.clone());
        }
        merged
    }
}

/// Option values and positional arguments resolved for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommand {
    pub command: CommandId,
    pub options: OptionValues,
    pub sources: OptionSources,
    /// One entry per declared argument, `None` when not given and without
    /// default.
    pub arguments: Vec<Option<OptionValue>>,
}

type ActionFn = dyn Fn(&Invocation<'_>) -> Result<(), String> + Send + Sync;

/// Handler run when a command is the one a parse resolves to.
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    pub fn new(f: impl Fn(&Invocation<'_>) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// An action that does nothing.
    pub fn noop() -> Self {
        Self::new(|_| Ok(()))
    }

    pub fn call(&self, invocation: &Invocation<'_>) -> Result<(), String> {
        (self.0)(invocation)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// Declaration of a command and, recursively, its subcommands.
///
/// # Examples
///
/// ```
/// use partial_parse_core::{CommandNode, OptionSpec};
///
/// let root = CommandNode::new("pizza")
///     .with_option(OptionSpec::parse("-s, --size <size>").unwrap().mandatory())
///     .with_subcommand(
///         CommandNode::new("order")
///             .with_alias("o")
///             .with_option(OptionSpec::parse("--no-sauce").unwrap()),
///     );
///
/// assert_eq!(root.find_subcommand("o").unwrap().name, "order");
/// assert!(root.find_option("--size").is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandNode {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    /// Nested subcommands. Empty on nodes stored inside a [`Grammar`], which
    /// tracks children itself.
    #[serde(default)]
    pub subcommands: Vec<CommandNode>,
    #[serde(default)]
    pub settings: GrammarSettings,
    #[serde(skip)]
    pub action: Option<Action>,
}

impl CommandNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_subcommand(mut self, sub: CommandNode) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Adds a subcommand and makes it the one selected when no child is
    /// named on the command line.
    pub fn with_default_subcommand(mut self, sub: CommandNode) -> Self {
        self.settings.default_subcommand = Some(sub.name.clone());
        self.subcommands.push(sub);
        self
    }

    pub fn with_settings(mut self, settings: GrammarSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_version(mut self, version: VersionFlag) -> Self {
        self.settings.version = Some(version);
        self
    }

    pub fn allow_unknown_options(mut self) -> Self {
        self.settings.allow_unknown_options = true;
        self
    }

    pub fn allow_excess_arguments(mut self) -> Self {
        self.settings.allow_excess_arguments = true;
        self
    }

    pub fn positional_options(mut self) -> Self {
        self.settings.positional_options = true;
        self
    }

    /// Passes everything after the first positional value through
    /// untouched. Implies positional options.
    pub fn pass_through_options(mut self) -> Self {
        self.settings.pass_through_options = true;
        self.settings.positional_options = true;
        self
    }

    /// Returns parse failures to the caller instead of exiting.
    pub fn exit_override(mut self) -> Self {
        self.settings.on_error = ErrorMode::Return;
        self
    }

    /// Suppresses help and error output.
    pub fn silent(mut self) -> Self {
        self.settings.output = OutputMode::Silent;
        self
    }

    pub fn with_action(
        mut self,
        f: impl Fn(&Invocation<'_>) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Action::new(f));
        self
    }

    /// Returns `true` if `name` is this command's name or one of its
    /// aliases.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Finds a direct subcommand by name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandNode> {
        self.subcommands.iter().find(|s| s.is_named(name))
    }

    /// Finds an option by short or long form.
    pub fn find_option(&self, flag: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.matches(flag))
    }

    /// Returns the options sharing `key` (a positive option and its negation
    /// share one key).
    pub fn options_for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a OptionSpec> {
        self.options.iter().filter(move |o| o.key() == key)
    }

    /// Returns `true` if both a positive and a negated option declare `key`.
    pub fn is_dual_key(&self, key: &str) -> bool {
        let mut positive = false;
        let mut negative = false;
        for option in self.options_for_key(key) {
            if option.negate {
                negative = true;
            } else {
                positive = true;
            }
        }
        positive && negative
    }
}

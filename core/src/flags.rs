//! Flag syntax parsing and canonical key derivation.
//!
//! Options are declared with the familiar `-c, --cheese <type>` notation:
//! an optional short form, an optional long form, and an optional value
//! placeholder where `<...>` marks a required value, `[...]` an optional one
//! and a trailing `...` a repeatable one. A long form starting with `--no-`
//! declares the negated form of a boolean option.

use std::sync::LazyLock;

use regex::Regex;

use crate::validate::GrammarError;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<([^<>\[\]]+?)(\.\.\.)?>|\[([^<>\[\]]+?)(\.\.\.)?\])$")
        .expect("static regex must compile")
});
static SHORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[^-\s]$").expect("static regex must compile"));
static LONG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--[A-Za-z0-9][-A-Za-z0-9_.]*$").expect("static regex must compile")
});

/// Value placeholder of an option or positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePlaceholder {
    pub name: String,
    /// `<name>` (true) or `[name]` (false)
    pub required: bool,
    /// Trailing `...`
    pub variadic: bool,
}

impl ValuePlaceholder {
    /// Parses `<name>`, `[name]`, `<name...>` or `[name...]`.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = PLACEHOLDER_RE.captures(token)?;
        if let Some(name) = caps.get(1) {
            return Some(Self {
                name: name.as_str().to_string(),
                required: true,
                variadic: caps.get(2).is_some(),
            });
        }
        caps.get(3).map(|name| Self {
            name: name.as_str().to_string(),
            required: false,
            variadic: caps.get(4).is_some(),
        })
    }
}

/// Parsed form of an option's flag declaration.
///
/// # Examples
///
/// ```
/// use partial_parse_core::FlagSyntax;
///
/// let syntax = FlagSyntax::parse("-n, --number <value...>").unwrap();
/// assert_eq!(syntax.short.as_deref(), Some("-n"));
/// assert_eq!(syntax.long.as_deref(), Some("--number"));
/// assert!(syntax.value.unwrap().variadic);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSyntax {
    pub short: Option<String>,
    pub long: Option<String>,
    pub negate: bool,
    pub value: Option<ValuePlaceholder>,
}

impl FlagSyntax {
    /// Parses a flag declaration. Flags may be separated by commas, spaces
    /// or `|`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidFlagSyntax`] when no flag is present,
    /// a form is repeated, or a token is not a flag or placeholder.
    pub fn parse(flags: &str) -> Result<Self, GrammarError> {
        let invalid = || GrammarError::InvalidFlagSyntax(flags.to_string());
        let mut syntax = Self {
            short: None,
            long: None,
            negate: false,
            value: None,
        };

        let tokens = flags
            .split(|c: char| c == ',' || c == '|' || c.is_whitespace())
            .filter(|t| !t.is_empty());
        for token in tokens {
            if syntax.value.is_some() {
                // Nothing may follow the placeholder.
                return Err(invalid());
            }
            if LONG_RE.is_match(token) {
                if syntax.long.is_some() {
                    return Err(invalid());
                }
                syntax.long = Some(token.to_string());
            } else if SHORT_RE.is_match(token) {
                if syntax.short.is_some() || syntax.long.is_some() {
                    return Err(invalid());
                }
                syntax.short = Some(token.to_string());
            } else if let Some(placeholder) = ValuePlaceholder::parse(token) {
                syntax.value = Some(placeholder);
            } else {
                return Err(invalid());
            }
        }

        if syntax.short.is_none() && syntax.long.is_none() {
            return Err(invalid());
        }
        syntax.negate = syntax.value.is_none()
            && syntax
                .long
                .as_deref()
                .is_some_and(|l| l.starts_with("--no-"));
        Ok(syntax)
    }
}

/// Converts a dash-separated flag name to camel case
/// (`option-a` → `optionA`).
///
/// # Examples
///
/// ```
/// use partial_parse_core::camel_case;
///
/// assert_eq!(camel_case("option-a"), "optionA");
/// assert_eq!(camel_case("dry-run"), "dryRun");
/// assert_eq!(camel_case("VERSION"), "VERSION");
/// ```
pub fn camel_case(name: &str) -> String {
    let mut words = name.split('-').filter(|w| !w.is_empty());
    let mut out = words.next().unwrap_or_default().to_string();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Derives the key an option's value is stored under from its flag name
/// (without dashes). Negated names lose their `no-` prefix first.
pub fn attribute_key(name: &str, negate: bool) -> String {
    let name = if negate {
        name.strip_prefix("no-").unwrap_or(name)
    } else {
        name
    };
    camel_case(name)
}

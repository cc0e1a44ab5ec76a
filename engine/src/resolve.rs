//! Resolution of clap matches into option values and their provenance.
//!
//! For each command in the matched chain, values are layered in precedence
//! order: declared defaults, then the configuration layer, then environment
//! variables, then the command line. Implications are applied last and only
//! fill keys the user did not set.

use clap::ArgMatches;
use clap::parser::ValueSource as ClapSource;
use partial_parse_core::{
    CommandId, CommandNode, Grammar, OptionArity, OptionSources, OptionSpec, OptionValue,
    OptionValues, ResolvedCommand, ValueSource,
};
use tracing::debug;

use crate::compile::{argument_id, uses_clap_env};
use crate::config::ParseConfig;
use crate::error::{EngineError, Result};
use crate::value::ParsedValue;

/// Values bound for one command, with the source of each.
#[derive(Debug, Default)]
struct Bindings {
    options: OptionValues,
    sources: OptionSources,
}

impl Bindings {
    fn set(&mut self, key: String, value: OptionValue, source: ValueSource) {
        self.options.insert(key.clone(), value);
        self.sources.insert(key, source);
    }

    /// A value the user chose, as opposed to a default or an implication.
    fn has_custom(&self, key: &str) -> bool {
        self.sources.get(key).is_some_and(|source| source.is_custom())
    }
}

/// Resolves the options and arguments of command `id` from its matches.
pub(crate) fn resolve_command(
    grammar: &Grammar,
    id: CommandId,
    matches: &ArgMatches,
    config: &ParseConfig,
) -> Result<ResolvedCommand> {
    let node = grammar.command(id);
    let qualified = grammar.qualified_name(id);
    let mut bindings = Bindings::default();

    apply_defaults(node, &mut bindings);

    if let Some(values) = config.config_values.for_command(&qualified) {
        for (key, value) in values {
            if node.options_for_key(key).next().is_some() {
                bindings.set(key.clone(), value.clone(), ValueSource::Config);
            } else {
                debug!(command = %qualified, key = %key, "Ignoring undeclared config key");
            }
        }
    }

    let mut given = Vec::new();
    for option in &node.options {
        if let Some((value, source)) = read_option(option, matches)? {
            given.push((option.key(), value, source));
        } else if let Some(value) = env_flag(option) {
            given.push((option.key(), value, ValueSource::Env));
        }
    }
    // The command line overrides the environment, whatever the option order.
    given.sort_by_key(|(_, _, source)| *source == ValueSource::Cli);
    for (key, value, source) in given {
        bindings.set(key, value, source);
    }

    apply_implications(node, &mut bindings);

    let arguments = node
        .arguments
        .iter()
        .map(|argument| -> Result<Option<OptionValue>> {
            let arg_id = argument_id(argument);
            let value = if argument.variadic {
                many(matches, &arg_id)?.map(|values| {
                    OptionValue::List(values.into_iter().map(|v| v.value).collect())
                })
            } else {
                one(matches, &arg_id)?.map(|v| v.value)
            };
            Ok(value
                .or_else(|| argument.default.clone())
                .or_else(|| argument.variadic.then(|| OptionValue::List(Vec::new()))))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        command = %qualified,
        options = bindings.options.len(),
        arguments = arguments.len(),
        "Resolved command"
    );

    Ok(ResolvedCommand {
        command: id,
        options: bindings.options,
        sources: bindings.sources,
        arguments,
    })
}

/// Declared defaults. A negated option without a positive counterpart
/// defaults to `true`.
fn apply_defaults(node: &CommandNode, bindings: &mut Bindings) {
    for option in &node.options {
        let key = option.key();
        if option.negate {
            if !node.is_dual_key(&key) {
                let value = option.default.clone().unwrap_or(OptionValue::Bool(true));
                bindings.set(key, value, ValueSource::Default);
            }
        } else if let Some(default) = &option.default {
            bindings.set(key, default.clone(), ValueSource::Default);
        }
    }
}

/// Options with a custom value set their implied keys unless those were
/// chosen by the user too. For a negation pair only the polarity that
/// produced the value implies.
fn apply_implications(node: &CommandNode, bindings: &mut Bindings) {
    let implying: Vec<&OptionSpec> = node
        .options
        .iter()
        .filter(|option| !option.implies.is_empty())
        .filter(|option| {
            let key = option.key();
            let Some(value) = bindings.options.get(&key) else {
                return false;
            };
            if !bindings.has_custom(&key) {
                return false;
            }
            !node.is_dual_key(&key) || option.negate == (*value == OptionValue::Bool(false))
        })
        .collect();

    for option in implying {
        for (key, value) in &option.implies {
            if !bindings.has_custom(key) {
                bindings.set(key.clone(), value.clone(), ValueSource::Implied);
            }
        }
    }
}

/// Reads an option given on the command line or through clap's env support.
fn read_option(option: &OptionSpec, matches: &ArgMatches) -> Result<Option<(OptionValue, ValueSource)>> {
    let id = option.name();
    let source = match matches.value_source(id) {
        Some(ClapSource::CommandLine) => ValueSource::Cli,
        Some(ClapSource::EnvVariable) => ValueSource::Env,
        _ => return Ok(None),
    };

    let value = match &option.arity {
        OptionArity::Flag { repeatable: false } => Some(OptionValue::Bool(!option.negate)),
        OptionArity::Flag { repeatable: true } => matches
            .try_get_one::<u8>(id)
            .map_err(|e| matches_error(id, e))?
            .map(|count| OptionValue::Int(i64::from(*count))),
        OptionArity::RequiredValue {
            repeatable: false, ..
        }
        | OptionArity::OptionalValue {
            repeatable: false, ..
        } => one(matches, id)?.map(|v| v.value),
        OptionArity::RequiredValue {
            repeatable: true, ..
        } => many(matches, id)?
            .map(|values| OptionValue::List(values.into_iter().map(|v| v.value).collect())),
        OptionArity::OptionalValue {
            repeatable: true, ..
        } => many(matches, id)?.map(collect_optional),
    };

    Ok(value.map(|value| (value, source)))
}

/// A repeatable optional-value option given only bare binds its preset (or
/// `true`); otherwise the given values form a list.
fn collect_optional(values: Vec<ParsedValue>) -> OptionValue {
    if values.iter().all(|v| v.bare) {
        if let Some(last) = values.into_iter().last() {
            return last.value;
        }
        return OptionValue::List(Vec::new());
    }
    OptionValue::List(
        values
            .into_iter()
            .filter(|v| !v.bare)
            .map(|v| v.value)
            .collect(),
    )
}

/// Boolean flags bound to an environment variable count as given whenever
/// the variable is set.
fn env_flag(option: &OptionSpec) -> Option<OptionValue> {
    if uses_clap_env(option) {
        return None;
    }
    let var = option.env.as_deref()?;
    std::env::var_os(var)?;
    match option.arity {
        OptionArity::Flag { repeatable: true } => Some(OptionValue::Int(1)),
        _ => Some(OptionValue::Bool(!option.negate)),
    }
}

fn one(matches: &ArgMatches, id: &str) -> Result<Option<ParsedValue>> {
    Ok(matches
        .try_get_one::<ParsedValue>(id)
        .map_err(|e| matches_error(id, e))?
        .cloned())
}

fn many(matches: &ArgMatches, id: &str) -> Result<Option<Vec<ParsedValue>>> {
    Ok(matches
        .try_get_many::<ParsedValue>(id)
        .map_err(|e| matches_error(id, e))?
        .map(|values| values.cloned().collect()))
}

fn matches_error(id: &str, err: clap::parser::MatchesError) -> EngineError {
    EngineError::Matches {
        id: id.to_string(),
        message: err.to_string(),
    }
}

/// Fails when a mandatory option of any command in `chain` has no value.
/// Commands are checked from the matched command up to the root.
pub(crate) fn check_mandatory(grammar: &Grammar, chain: &[ResolvedCommand]) -> Result<()> {
    for resolved in chain.iter().rev() {
        let node = grammar.command(resolved.command);
        let missing = node
            .options
            .iter()
            .find(|option| option.mandatory && !resolved.options.contains_key(&option.key()));
        if let Some(option) = missing {
            return Err(EngineError::MissingMandatoryOption {
                command: grammar.qualified_name(resolved.command),
                flags: option.flags(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(value: &str, bare: bool) -> ParsedValue {
        ParsedValue {
            value: OptionValue::from(value),
            bare,
        }
    }

    #[test]
    fn test_collect_optional_bare_only() {
        let value = collect_optional(vec![ParsedValue {
            value: OptionValue::Bool(true),
            bare: true,
        }]);
        assert_eq!(value, OptionValue::Bool(true));
    }

    #[test]
    fn test_collect_optional_drops_bare_entries() {
        let value = collect_optional(vec![parsed("a", false), parsed("x", true), parsed("b", false)]);
        assert_eq!(value, OptionValue::from(vec!["a", "b"]));
    }

    #[test]
    fn test_negated_only_default_is_true() {
        let node = CommandNode::new("pizza")
            .with_option(OptionSpec::parse("--no-sauce").unwrap())
            .with_option(OptionSpec::parse("-c, --cheese <type>").unwrap())
            .with_option(OptionSpec::parse("--no-cheese").unwrap());
        let mut bindings = Bindings::default();

        apply_defaults(&node, &mut bindings);

        assert_eq!(bindings.options.get("sauce"), Some(&OptionValue::Bool(true)));
        assert_eq!(bindings.sources.get("sauce"), Some(&ValueSource::Default));
        assert!(!bindings.options.contains_key("cheese"));
    }

    #[test]
    fn test_implications_respect_custom_values() {
        let node = CommandNode::new("log")
            .with_option(OptionSpec::parse("--quiet").unwrap().implies("logLevel", "off"))
            .with_option(OptionSpec::parse("--log-level <level>").unwrap().with_default("info"));
        let mut bindings = Bindings::default();
        apply_defaults(&node, &mut bindings);
        bindings.set("quiet".into(), OptionValue::Bool(true), ValueSource::Cli);

        apply_implications(&node, &mut bindings);
        assert_eq!(bindings.options["logLevel"], OptionValue::from("off"));
        assert_eq!(bindings.sources["logLevel"], ValueSource::Implied);

        bindings.set("logLevel".into(), OptionValue::from("warning"), ValueSource::Cli);
        apply_implications(&node, &mut bindings);
        assert_eq!(bindings.options["logLevel"], OptionValue::from("warning"));
    }

    #[test]
    fn test_only_producing_polarity_implies() {
        let node = CommandNode::new("pizza")
            .with_option(
                OptionSpec::parse("-c, --cheese <type>")
                    .unwrap()
                    .implies("dairy", true),
            )
            .with_option(OptionSpec::parse("--no-cheese").unwrap().implies("dairy", false))
            .with_option(OptionSpec::parse("--dairy").unwrap());
        let mut bindings = Bindings::default();
        bindings.set("cheese".into(), OptionValue::Bool(false), ValueSource::Cli);

        apply_implications(&node, &mut bindings);

        assert_eq!(bindings.options["dairy"], OptionValue::Bool(false));
    }
}

//! Dry-run resolution of command lines.
//!
//! [`partial_parse`] answers, for a [`Grammar`] and an argument vector, which
//! command would run, which option values every command on the way would
//! receive (and from where), and which options are still unset. No action
//! runs, a missing mandatory option is not an error, and the grammar is never
//! modified. This lets an interactive front end prompt for what is missing
//! before doing a real parse.
//!
//! Internally the grammar is mirrored into a relaxed [`ShadowTree`] and the
//! engine parses that mirror while an observer records what it resolves.
//!
//! # Example
//!
//! ```
//! use partial_parse::partial_parse;
//! use partial_parse_core::{CommandNode, Grammar, OptionSpec, OptionValue};
//!
//! let grammar = Grammar::new(
//!     CommandNode::new("root")
//!         .with_option(OptionSpec::parse("-a, --option-a <value>").unwrap().mandatory())
//!         .with_subcommand(
//!             CommandNode::new("child")
//!                 .with_option(OptionSpec::parse("-b, --option-b <value>").unwrap().mandatory())
//!                 .with_option(OptionSpec::parse("-c, --option-c <value>").unwrap().mandatory())
//!                 .with_action(|_| Ok(())),
//!         ),
//! )
//! .unwrap();
//! let child = grammar.find(&["child"]).unwrap();
//!
//! let result = partial_parse(&grammar, ["program", "child", "--option-b", "value2"]).unwrap();
//!
//! assert_eq!(result.matched_command, Some(child));
//! assert_eq!(result.provided_options[&child]["optionB"], OptionValue::from("value2"));
//! assert!(result.missing_options[&child].contains("optionC"));
//! assert!(result.missing_options[&grammar.root()].contains("optionA"));
//! ```

mod missing;
mod session;
mod shadow;

use indexmap::IndexMap;
use partial_parse_core::{CommandId, Grammar, OptionSources, OptionValues};
use partial_parse_engine::{EngineError, ParseConfig, parse};
use serde::Serialize;
use tracing::debug;

pub use missing::{MissingOptions, find_missing_options};
pub use shadow::{Correspondence, ShadowTree};

use session::InterceptionSession;

/// Option values captured per real command.
pub type ProvidedOptions = IndexMap<CommandId, OptionValues>;

/// Source of each captured value, per real command.
pub type ProvidedOptionsSources = IndexMap<CommandId, OptionSources>;

/// What a partial parse found. Commands are identified by their id in the
/// grammar that was parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialParseResult {
    /// The command whose action a real parse would run.
    pub matched_command: Option<CommandId>,
    pub provided_options: ProvidedOptions,
    pub provided_options_sources: ProvidedOptionsSources,
    /// Unset option keys of the matched command and its ancestors, leaf
    /// first. Empty when nothing matched.
    pub missing_options: MissingOptions,
}

/// Partially parses `argv`, whose first element is the program name.
///
/// # Errors
///
/// Returns the [`EngineError`] a real parse would return, except that a
/// missing mandatory option is reported in
/// [`missing_options`](PartialParseResult::missing_options) instead. Help and
/// version requests are errors too; nothing is printed.
pub fn partial_parse<I, S>(grammar: &Grammar, argv: I) -> Result<PartialParseResult, EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    partial_parse_with_config(grammar, argv, &ParseConfig::default())
}

/// Like [`partial_parse`], with an explicit argv style and configuration
/// layer.
///
/// # Errors
///
/// See [`partial_parse`].
pub fn partial_parse_with_config<I, S>(
    grammar: &Grammar,
    argv: I,
    config: &ParseConfig,
) -> Result<PartialParseResult, EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let shadow = ShadowTree::build(grammar);
    let mut session = InterceptionSession::new(&shadow.correspondence);

    parse(&shadow.grammar, argv, config, &mut session)?;

    let missing_options = match session.matched_command {
        Some(matched) => find_missing_options(grammar, matched, &session.provided_options),
        None => MissingOptions::new(),
    };
    debug!(
        matched = ?session.matched_command.map(|id| grammar.qualified_name(id)),
        commands = session.provided_options.len(),
        "Partial parse complete"
    );

    Ok(PartialParseResult {
        matched_command: session.matched_command,
        provided_options: session.provided_options,
        provided_options_sources: session.provided_sources,
        missing_options,
    })
}

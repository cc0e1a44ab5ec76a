//! Parse entry points.

use partial_parse_core::{
    CommandId, ErrorMode, Grammar, Invocation, OutputMode, ResolvedCommand,
};
use tracing::{debug, warn};

use crate::argv::prepare;
use crate::compile::compile;
use crate::config::ParseConfig;
use crate::error::{EngineError, Result};
use crate::observer::{ActionDispatcher, ResolutionObserver};
use crate::resolve::{check_mandatory, resolve_command};

/// The commands a successful parse resolved, from the root down to the
/// matched command.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub chain: Vec<ResolvedCommand>,
}

impl ParseOutcome {
    /// Returns the command where resolution stopped.
    pub fn matched(&self) -> Option<&ResolvedCommand> {
        self.chain.last()
    }

    /// Returns the resolution of `command`, if it is part of the chain.
    pub fn resolved(&self, command: CommandId) -> Option<&ResolvedCommand> {
        self.chain.iter().find(|r| r.command == command)
    }

    pub fn invocation<'a>(&'a self, grammar: &'a Grammar) -> Invocation<'a> {
        Invocation {
            grammar,
            chain: &self.chain,
        }
    }
}

/// Parses `argv` against `grammar`, reporting each resolution step to
/// `observer`. No action runs unless the observer runs it.
///
/// On failure the root command's settings decide whether the error is
/// printed ([`OutputMode::Stdio`]) and whether the process exits
/// ([`ErrorMode::Exit`]) instead of returning it.
///
/// # Errors
///
/// Returns an [`EngineError`] when clap rejects the arguments (including
/// help and version display requests), a mandatory option is missing, or the
/// observer fails.
///
/// # Examples
///
/// ```
/// use partial_parse_core::{CommandNode, Grammar, OptionSpec, OptionValue, ValueSource};
/// use partial_parse_engine::{ActionDispatcher, ParseConfig, parse};
///
/// let grammar = Grammar::new(
///     CommandNode::new("pizza")
///         .exit_override()
///         .silent()
///         .with_option(OptionSpec::parse("-c, --cheese <type>").unwrap().with_default("blue")),
/// )
/// .unwrap();
///
/// let outcome = parse(
///     &grammar,
///     ["pizza", "--cheese", "stilton"],
///     &ParseConfig::default(),
///     &mut ActionDispatcher,
/// )
/// .unwrap();
///
/// let matched = outcome.matched().unwrap();
/// assert_eq!(matched.options["cheese"], OptionValue::from("stilton"));
/// assert_eq!(matched.sources["cheese"], ValueSource::Cli);
/// ```
pub fn parse<I, S>(
    grammar: &Grammar,
    argv: I,
    config: &ParseConfig,
    observer: &mut dyn ResolutionObserver,
) -> Result<ParseOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = argv
        .into_iter()
        .skip(config.argv_style.skip())
        .map(|arg| arg.as_ref().to_string())
        .collect();

    parse_args(grammar, args, config, observer).map_err(|err| report(grammar, err))
}

/// Parses `argv` and runs the matched command's action.
///
/// # Errors
///
/// See [`parse`]; additionally [`EngineError::Action`] when the action
/// fails.
pub fn run<I, S>(grammar: &Grammar, argv: I, config: &ParseConfig) -> Result<ParseOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse(grammar, argv, config, &mut ActionDispatcher)
}

fn parse_args(
    grammar: &Grammar,
    args: Vec<String>,
    config: &ParseConfig,
    observer: &mut dyn ResolutionObserver,
) -> Result<ParseOutcome> {
    let args = prepare(grammar, args);
    debug!(command = %grammar.command(grammar.root()).name, args = ?args, "Parsing");

    let matches = compile(grammar).try_get_matches_from(args)?;

    let mut id = grammar.root();
    let mut matches = &matches;
    let mut current = resolve_command(grammar, id, matches, config)?;
    let mut chain = Vec::new();

    while let Some((name, sub_matches)) = matches.subcommand() {
        let child = grammar
            .find_child(id, name)
            .ok_or_else(|| EngineError::UnknownSubcommand(name.to_string()))?;
        let resolved = resolve_command(grammar, child, sub_matches, config)?;
        observer.on_descend(grammar, &current, &resolved);
        chain.push(std::mem::replace(&mut current, resolved));
        id = child;
        matches = sub_matches;
    }
    chain.push(current);

    check_mandatory(grammar, &chain)?;
    debug!(
        matched = %grammar.qualified_name(id),
        depth = chain.len(),
        "Resolved command chain"
    );

    observer.on_terminal(&Invocation {
        grammar,
        chain: &chain,
    })?;

    Ok(ParseOutcome { chain })
}

fn report(grammar: &Grammar, err: EngineError) -> EngineError {
    let settings = &grammar.command(grammar.root()).settings;
    debug!(code = %err.code(), "Parse failed");

    if settings.output == OutputMode::Stdio {
        match &err {
            EngineError::Parse(parse_err) => {
                if let Err(io_err) = parse_err.print() {
                    warn!(error = %io_err, "Failed to print parse error");
                }
            }
            other => eprintln!("error: {other}"),
        }
    }

    if settings.on_error == ErrorMode::Exit {
        std::process::exit(err.exit_code());
    }
    err
}

//! Integration tests for the partial-parse-engine crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use partial_parse_core::{
    ArgumentSpec, Coercer, CommandId, CommandNode, Grammar, GrammarSettings, Invocation,
    OptionSpec, OptionValue, ResolvedCommand, ValueSource, VersionFlag,
};
use partial_parse_engine::{
    ConfigValues, EngineError, ErrorCode, ParseConfig, ParseOutcome, ResolutionObserver, parse,
    run,
};

/// Builds a grammar that returns errors silently instead of exiting.
fn quiet(root: CommandNode) -> Grammar {
    Grammar::new(root.exit_override().silent()).unwrap()
}

fn option(flags: &str) -> OptionSpec {
    OptionSpec::parse(flags).unwrap()
}

fn run_line(grammar: &Grammar, line: &str) -> Result<ParseOutcome, EngineError> {
    run(grammar, line.split_whitespace(), &ParseConfig::user_args())
}

fn matched(outcome: &ParseOutcome) -> &ResolvedCommand {
    outcome.matched().unwrap()
}

fn error_code(grammar: &Grammar, line: &str) -> ErrorCode {
    run_line(grammar, line).unwrap_err().code()
}

// ============================================================================
// Option arity
// ============================================================================

#[test]
fn test_required_value_and_default() {
    let grammar = quiet(
        CommandNode::new("pizza")
            .with_option(
                option("-c, --cheese <type>")
                    .with_description("Add the specified type of cheese")
                    .with_default("blue"),
            )
            .with_option(option("-s, --size <size>")),
    );

    let outcome = run_line(&grammar, "").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["cheese"], OptionValue::from("blue"));
    assert_eq!(resolved.sources["cheese"], ValueSource::Default);
    assert!(!resolved.options.contains_key("size"));

    let outcome = run_line(&grammar, "--cheese stilton -s large").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["cheese"], OptionValue::from("stilton"));
    assert_eq!(resolved.sources["cheese"], ValueSource::Cli);
    assert_eq!(resolved.options["size"], OptionValue::from("large"));
}

#[test]
fn test_repeated_singular_option_last_wins() {
    let grammar = quiet(CommandNode::new("pizza").with_option(option("-c, --cheese <type>")));

    let outcome = run_line(&grammar, "-c brie --cheese feta").unwrap();
    assert_eq!(matched(&outcome).options["cheese"], OptionValue::from("feta"));
}

#[test]
fn test_optional_value_with_preset() {
    let grammar = quiet(
        CommandNode::new("donate")
            .with_option(
                option("--donate [amount]")
                    .with_preset("20")
                    .with_coercer(Coercer::float()),
            )
            .with_option(option("-c, --cheese [type]")),
    );

    let outcome = run_line(&grammar, "--donate").unwrap();
    assert_eq!(matched(&outcome).options["donate"], OptionValue::Float(20.0));

    let outcome = run_line(&grammar, "--donate 30.50 --cheese").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["donate"], OptionValue::Float(30.5));
    assert_eq!(resolved.options["cheese"], OptionValue::Bool(true));

    let outcome = run_line(&grammar, "").unwrap();
    assert!(matched(&outcome).options.is_empty());
}

#[test]
fn test_repeatable_options() {
    let grammar = quiet(
        CommandNode::new("variadic")
            .with_option(option("-v, --verbose").repeatable())
            .with_option(option("-n, --number <value...>"))
            .with_option(option("-l, --letter [value...]")),
    );

    let outcome = run_line(&grammar, "-vvv -n 1 2 3 --letter a b c").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["verbose"], OptionValue::Int(3));
    assert_eq!(resolved.options["number"], OptionValue::from(vec!["1", "2", "3"]));
    assert_eq!(resolved.options["letter"], OptionValue::from(vec!["a", "b", "c"]));

    let outcome = run_line(&grammar, "--letter=A -n80").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["letter"], OptionValue::from(vec!["A"]));
    assert_eq!(resolved.options["number"], OptionValue::from(vec!["80"]));

    let outcome = run_line(&grammar, "--letter -n 1 -n 2 3").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["letter"], OptionValue::Bool(true));
    assert_eq!(resolved.options["number"], OptionValue::from(vec!["1", "2", "3"]));
}

#[test]
fn test_combined_optional_value() {
    let build = |combine: bool| {
        quiet(
            CommandNode::new("pizza")
                .with_settings(GrammarSettings {
                    combine_flag_and_optional_value: combine,
                    ..GrammarSettings::default()
                })
                .with_option(option("-c, --cheese [type]"))
                .with_option(option("-b, --bacon")),
        )
    };

    let outcome = run_line(&build(true), "-cb").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["cheese"], OptionValue::from("b"));
    assert!(!resolved.options.contains_key("bacon"));

    let outcome = run_line(&build(false), "-cb").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["cheese"], OptionValue::Bool(true));
    assert_eq!(resolved.options["bacon"], OptionValue::Bool(true));
}

// ============================================================================
// Negation, choices, coercion, conflicts, implications
// ============================================================================

#[test]
fn test_negated_only_option() {
    let grammar = quiet(CommandNode::new("pizza").with_option(option("--no-sauce")));

    let outcome = run_line(&grammar, "").unwrap();
    assert_eq!(matched(&outcome).options["sauce"], OptionValue::Bool(true));
    assert_eq!(matched(&outcome).sources["sauce"], ValueSource::Default);

    let outcome = run_line(&grammar, "--no-sauce").unwrap();
    assert_eq!(matched(&outcome).options["sauce"], OptionValue::Bool(false));
    assert_eq!(matched(&outcome).sources["sauce"], ValueSource::Cli);
}

#[test]
fn test_negation_pair_last_one_wins() {
    let grammar = quiet(
        CommandNode::new("pizza")
            .with_option(option("-c, --cheese <type>"))
            .with_option(option("--no-cheese")),
    );

    let outcome = run_line(&grammar, "").unwrap();
    assert!(!matched(&outcome).options.contains_key("cheese"));

    let outcome = run_line(&grammar, "--cheese brie --no-cheese").unwrap();
    assert_eq!(matched(&outcome).options["cheese"], OptionValue::Bool(false));

    let outcome = run_line(&grammar, "--no-cheese --cheese brie").unwrap();
    assert_eq!(matched(&outcome).options["cheese"], OptionValue::from("brie"));
}

#[test]
fn test_choices_and_coercion_errors() {
    let grammar = quiet(
        CommandNode::new("extra")
            .with_option(option("-d, --drink <size>").with_choices(["small", "medium", "large"]))
            .with_option(option("-i, --integer <number>").with_coercer(Coercer::integer())),
    );

    assert_eq!(error_code(&grammar, "--drink huge"), ErrorCode::InvalidChoice);
    assert_eq!(error_code(&grammar, "-i abc"), ErrorCode::InvalidArgument);
    assert_eq!(error_code(&grammar, "--drink"), ErrorCode::MissingOptionArgument);
    assert_eq!(error_code(&grammar, "-d small -i"), ErrorCode::MissingOptionArgument);

    let outcome = run_line(&grammar, "--drink small -i 100").unwrap();
    assert_eq!(matched(&outcome).options["drink"], OptionValue::from("small"));
    assert_eq!(matched(&outcome).options["integer"], OptionValue::Int(100));
}

#[test]
fn test_conflicting_options() {
    let grammar = quiet(
        CommandNode::new("shop").with_subcommand(
            CommandNode::new("pay")
                .with_option(option("--cash").conflicts_with("creditCard"))
                .with_option(option("--credit-card")),
        ),
    );

    assert!(run_line(&grammar, "pay --cash").is_ok());
    assert_eq!(
        error_code(&grammar, "pay --cash --credit-card"),
        ErrorCode::ConflictingOption
    );
}

#[test]
fn test_implied_values() {
    let grammar = quiet(
        CommandNode::new("implies")
            .with_option(option("--quiet").implies("logLevel", "off"))
            .with_option(
                option("--log-level <level>")
                    .with_choices(["info", "warning", "error", "off"])
                    .with_default("info"),
            )
            .with_option(option("-c, --cheese <type>").implies("dairy", true))
            .with_option(option("--no-cheese").implies("dairy", false))
            .with_option(option("--dairy")),
    );

    let outcome = run_line(&grammar, "--quiet").unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["logLevel"], OptionValue::from("off"));
    assert_eq!(resolved.sources["logLevel"], ValueSource::Implied);

    let outcome = run_line(&grammar, "--log-level=warning --quiet").unwrap();
    assert_eq!(matched(&outcome).options["logLevel"], OptionValue::from("warning"));

    let outcome = run_line(&grammar, "--cheese=cheddar").unwrap();
    assert_eq!(matched(&outcome).options["dairy"], OptionValue::Bool(true));

    let outcome = run_line(&grammar, "--no-cheese").unwrap();
    assert_eq!(matched(&outcome).options["dairy"], OptionValue::Bool(false));
}

#[test]
fn test_mandatory_option() {
    let grammar = quiet(
        CommandNode::new("pizza")
            .with_option(option("-c, --cheese <type>").mandatory())
            .with_option(option("--no-cheese")),
    );

    let err = run_line(&grammar, "").unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingMandatoryOption);
    assert!(err.to_string().contains("--cheese <type>"));

    assert!(run_line(&grammar, "-c brie").is_ok());
    // A negation still gives the key a value.
    assert!(run_line(&grammar, "--no-cheese").is_ok());
}

// ============================================================================
// Value sources
// ============================================================================

#[test]
fn test_env_config_and_cli_precedence() {
    const PORT_VAR: &str = "PARTIAL_PARSE_ENGINE_TEST_PORT";
    let grammar = quiet(
        CommandNode::new("serve").with_option(
            option("-p, --port <number>")
                .with_default(80_i64)
                .with_env(PORT_VAR),
        ),
    );
    let config = ParseConfig::user_args()
        .with_config_values(ConfigValues::default().with_value("serve", "port", "7000"));

    let outcome = parse(&grammar, Vec::<String>::new(), &config, &mut NoopObserver).unwrap();
    assert_eq!(matched(&outcome).options["port"], OptionValue::from("7000"));
    assert_eq!(matched(&outcome).sources["port"], ValueSource::Config);

    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var(PORT_VAR, "8080") };

    let outcome = parse(&grammar, Vec::<String>::new(), &config, &mut NoopObserver).unwrap();
    assert_eq!(matched(&outcome).options["port"], OptionValue::from("8080"));
    assert_eq!(matched(&outcome).sources["port"], ValueSource::Env);

    let outcome = parse(&grammar, ["-p", "9000"], &config, &mut NoopObserver).unwrap();
    assert_eq!(matched(&outcome).options["port"], OptionValue::from("9000"));
    assert_eq!(matched(&outcome).sources["port"], ValueSource::Cli);

    // SAFETY: as above.
    unsafe { std::env::remove_var(PORT_VAR) };

    let outcome = run_line(&grammar, "").unwrap();
    assert_eq!(matched(&outcome).options["port"], OptionValue::Int(80));
    assert_eq!(matched(&outcome).sources["port"], ValueSource::Default);
}

#[test]
fn test_env_flag_counts_as_given() {
    const DEBUG_VAR: &str = "PARTIAL_PARSE_ENGINE_TEST_DEBUG";
    let grammar = quiet(CommandNode::new("app").with_option(option("-d, --debug").with_env(DEBUG_VAR)));

    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var(DEBUG_VAR, "yes") };
    let outcome = run_line(&grammar, "").unwrap();
    // SAFETY: as above.
    unsafe { std::env::remove_var(DEBUG_VAR) };

    assert_eq!(matched(&outcome).options["debug"], OptionValue::Bool(true));
    assert_eq!(matched(&outcome).sources["debug"], ValueSource::Env);
}

#[test]
fn test_config_values_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("values.yml");
    ConfigValues::default()
        .with_value("pizza order", "quantity", 3_i64)
        .with_value("pizza order", "unknown", true)
        .save(&path)
        .unwrap();

    let grammar = quiet(
        CommandNode::new("pizza").with_subcommand(
            CommandNode::new("order").with_option(option("-q, --quantity <n>")),
        ),
    );
    let config = ParseConfig::user_args().with_config_values(ConfigValues::load(&path).unwrap());

    let outcome = parse(&grammar, ["order"], &config, &mut NoopObserver).unwrap();
    let resolved = matched(&outcome);
    assert_eq!(resolved.options["quantity"], OptionValue::Int(3));
    assert_eq!(resolved.sources["quantity"], ValueSource::Config);
    assert!(!resolved.options.contains_key("unknown"));
}

// ============================================================================
// Commands and arguments
// ============================================================================

#[test]
fn test_aliases_and_arguments() {
    let grammar = quiet(
        CommandNode::new("alias").with_subcommand(
            CommandNode::new("print")
                .with_alias("p")
                .with_alias("pr")
                .with_alias("display")
                .with_argument(ArgumentSpec::required("file")),
        ),
    );
    let print = grammar.find(&["print"]).unwrap();

    for line in ["print file", "pr file", "display file"] {
        let outcome = run_line(&grammar, line).unwrap();
        assert_eq!(matched(&outcome).command, print);
        assert_eq!(matched(&outcome).arguments, vec![Some(OptionValue::from("file"))]);
    }
    assert_eq!(error_code(&grammar, "print"), ErrorCode::MissingArgument);
}

#[test]
fn test_argument_choices_and_defaults() {
    let grammar = quiet(
        CommandNode::new("arguments-extra")
            .with_argument(
                ArgumentSpec::parse("<drink-size>")
                    .unwrap()
                    .with_description("drink cup size")
                    .with_choices(["small", "medium", "large"]),
            )
            .with_argument(
                ArgumentSpec::parse("[timeout]")
                    .unwrap()
                    .with_default(60_i64, Some("one minute")),
            ),
    );

    assert_eq!(error_code(&grammar, "huge"), ErrorCode::InvalidChoice);

    let outcome = run_line(&grammar, "small").unwrap();
    assert_eq!(
        matched(&outcome).arguments,
        vec![Some(OptionValue::from("small")), Some(OptionValue::Int(60))]
    );
}

#[test]
fn test_excess_arguments() {
    let strict = quiet(CommandNode::new("cat").with_argument(ArgumentSpec::required("file")));
    assert_eq!(error_code(&strict, "a b"), ErrorCode::UnknownArgument);

    let tolerant = quiet(
        CommandNode::new("cat")
            .allow_excess_arguments()
            .with_argument(ArgumentSpec::required("file")),
    );
    let outcome = run_line(&tolerant, "a b").unwrap();
    assert_eq!(matched(&outcome).arguments, vec![Some(OptionValue::from("a"))]);
}

#[test]
fn test_default_subcommand() {
    let grammar = quiet(
        CommandNode::new("site")
            .with_subcommand(CommandNode::new("build"))
            .with_subcommand(CommandNode::new("deploy"))
            .with_default_subcommand(
                CommandNode::new("serve").with_option(option("-p,--port <port_number>")),
            ),
    );
    let build = grammar.find(&["build"]).unwrap();
    let serve = grammar.find(&["serve"]).unwrap();

    assert_eq!(matched(&run_line(&grammar, "build").unwrap()).command, build);
    assert_eq!(matched(&run_line(&grammar, "").unwrap()).command, serve);

    for line in ["serve -p 8080", "-p 8080"] {
        let outcome = run_line(&grammar, line).unwrap();
        assert_eq!(matched(&outcome).command, serve);
        assert_eq!(matched(&outcome).options["port"], OptionValue::from("8080"));
    }
}

#[test]
fn test_missing_and_unknown_subcommand() {
    let grammar = quiet(
        CommandNode::new("heat")
            .with_subcommand(CommandNode::new("jug"))
            .with_subcommand(CommandNode::new("pot")),
    );

    assert_eq!(error_code(&grammar, ""), ErrorCode::MissingSubcommand);
    assert_eq!(error_code(&grammar, "kettle"), ErrorCode::UnknownCommand);
    assert!(run_line(&grammar, "jug").is_ok());
}

#[test]
fn test_global_options_after_subcommand() {
    let grammar = quiet(
        CommandNode::new("git")
            .with_option(option("-v, --verbose"))
            .with_subcommand(CommandNode::new("status").with_action(|_| Ok(()))),
    );

    let outcome = run_line(&grammar, "status -v").unwrap();
    assert_eq!(outcome.chain[0].options["verbose"], OptionValue::Bool(true));
    assert!(outcome.chain[1].options.is_empty());
}

#[test]
fn test_positional_options() {
    let grammar = quiet(
        CommandNode::new("positional-options")
            .positional_options()
            .with_option(option("-p, --progress"))
            .with_subcommand(
                CommandNode::new("upload")
                    .with_argument(ArgumentSpec::required("file"))
                    .with_option(option("-p, --port <number>").with_default("80")),
            ),
    );

    let outcome = run_line(&grammar, "upload test.js").unwrap();
    assert!(outcome.chain[0].options.is_empty());
    assert_eq!(outcome.chain[1].options["port"], OptionValue::from("80"));

    let outcome = run_line(&grammar, "-p upload -p 8080 test.js").unwrap();
    assert_eq!(outcome.chain[0].options["progress"], OptionValue::Bool(true));
    assert_eq!(outcome.chain[1].options["port"], OptionValue::from("8080"));
    assert_eq!(outcome.chain[1].arguments, vec![Some(OptionValue::from("test.js"))]);
}

#[test]
fn test_pass_through_options() {
    let grammar = quiet(
        CommandNode::new("pass-through-options")
            .with_argument(ArgumentSpec::parse("<utility>").unwrap())
            .with_argument(ArgumentSpec::parse("[args...]").unwrap())
            .pass_through_options()
            .with_option(option("-d, --dry-run")),
    );

    let outcome = run_line(&grammar, "git --version").unwrap();
    assert_eq!(
        matched(&outcome).arguments,
        vec![
            Some(OptionValue::from("git")),
            Some(OptionValue::from(vec!["--version"]))
        ]
    );

    let outcome = run_line(&grammar, "--dry-run git checkout -b new-branch").unwrap();
    assert_eq!(matched(&outcome).options["dryRun"], OptionValue::Bool(true));
    assert_eq!(
        matched(&outcome).arguments[1],
        Some(OptionValue::from(vec!["checkout", "-b", "new-branch"]))
    );

    let outcome = run_line(&grammar, "git push --dry-run").unwrap();
    assert!(!matched(&outcome).options.contains_key("dryRun"));

    let outcome = run_line(&grammar, "git").unwrap();
    assert_eq!(matched(&outcome).arguments[1], Some(OptionValue::List(Vec::new())));
}

// ============================================================================
// Help, version and error routing
// ============================================================================

#[test]
fn test_help_is_a_display_request() {
    let grammar = quiet(CommandNode::new("help"));
    let err = run_line(&grammar, "--help").unwrap_err();

    assert_eq!(err.code(), ErrorCode::HelpDisplayed);
    assert!(err.is_display_request());
    assert_eq!(err.exit_code(), 0);
}

#[test]
fn test_custom_version_flags() {
    let grammar = quiet(
        CommandNode::new("custom-version").with_version(
            VersionFlag::with_flags("0.0.1", "-v, --VERSION")
                .unwrap()
                .with_description("new version message"),
        ),
    );

    assert_eq!(error_code(&grammar, "-v"), ErrorCode::VersionDisplayed);
    assert_eq!(error_code(&grammar, "--VERSION"), ErrorCode::VersionDisplayed);
    assert_eq!(error_code(&grammar, "--version"), ErrorCode::UnknownArgument);
}

// ============================================================================
// Actions and observers
// ============================================================================

struct NoopObserver;

impl ResolutionObserver for NoopObserver {
    fn on_descend(&mut self, _: &Grammar, _: &ResolvedCommand, _: &ResolvedCommand) {}

    fn on_terminal(&mut self, _: &Invocation<'_>) -> partial_parse_engine::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    descents: Vec<(CommandId, CommandId)>,
    terminal: Option<CommandId>,
}

impl ResolutionObserver for Recorder {
    fn on_descend(&mut self, _: &Grammar, parent: &ResolvedCommand, child: &ResolvedCommand) {
        self.descents.push((parent.command, child.command));
    }

    fn on_terminal(&mut self, invocation: &Invocation<'_>) -> partial_parse_engine::Result<()> {
        self.terminal = invocation.command().map(|r| r.command);
        Ok(())
    }
}

fn drinks(calls: &Arc<AtomicUsize>) -> Grammar {
    let counter = Arc::clone(calls);
    quiet(
        CommandNode::new("drinks")
            .with_subcommand(
                CommandNode::new("brew")
                    .with_subcommand(CommandNode::new("tea").with_action(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }))
                    .with_subcommand(
                        CommandNode::new("coffee").with_action(|_| Err("out of beans".to_string())),
                    ),
            ),
    )
}

#[test]
fn test_observer_sees_each_descent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let grammar = drinks(&calls);
    let brew = grammar.find(&["brew"]).unwrap();
    let tea = grammar.find(&["brew", "tea"]).unwrap();
    let mut recorder = Recorder::default();

    let outcome = parse(&grammar, ["brew", "tea"], &ParseConfig::user_args(), &mut recorder).unwrap();

    assert_eq!(recorder.descents, vec![(grammar.root(), brew), (brew, tea)]);
    assert_eq!(recorder.terminal, Some(tea));
    assert_eq!(outcome.chain.len(), 3);
    // Only the dispatcher runs actions.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_run_invokes_matched_action() {
    let calls = Arc::new(AtomicUsize::new(0));
    let grammar = drinks(&calls);

    run_line(&grammar, "brew tea").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let err = run_line(&grammar, "brew coffee").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ActionFailed);
    assert!(err.to_string().contains("out of beans"));
}

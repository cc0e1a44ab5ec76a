//! Compilation of a [`Grammar`] into a `clap::Command` tree.
//!
//! Each command node becomes a `clap::Command` and each option an `Arg` whose
//! id is the option's [`name`](OptionSpec::name). Declared defaults are not
//! handed to clap; they are applied during resolution so that provenance can
//! tell a default from a value the user gave.
//!
//! Options of a command are also accepted after one of its subcommand names
//! (see [`global_mask`]), with three exceptions that stay local to their own
//! command: both halves of a positive/negated pair, options taking part in
//! a conflict, and the version flag. `root child --no-cheese` is therefore an
//! unknown argument where `root --no-cheese child` is not. clap resolves
//! overrides and conflicts within one command's matches only, so these
//! options could not keep their last-wins and conflict semantics once
//! propagated.

use std::collections::HashSet;

use clap::{Arg, ArgAction, Command};
use partial_parse_core::{ArgumentSpec, CommandId, CommandNode, Grammar, OptionArity, OptionSpec};

use crate::value::{BARE_VALUE, OptionValueParser};

/// Arg id of a node's version flag.
pub(crate) const VERSION_ID: &str = "@version";

/// Arg id of the hidden positional collecting excess or unknown arguments.
pub(crate) const REST_ID: &str = "@rest";

/// Returns the arg id of a positional argument.
///
/// Option ids are flag names, which never contain `<`, so the two cannot
/// collide.
pub(crate) fn argument_id(argument: &ArgumentSpec) -> String {
    format!("<{}>", argument.name)
}

/// Returns `true` if `option` must be given a value by clap's `env` support.
///
/// Flags read their environment variable during resolution instead: any
/// value of the variable counts as the flag being given, where clap would
/// parse it as a boolean.
pub(crate) fn uses_clap_env(option: &OptionSpec) -> bool {
    option.env.is_some() && option.arity.takes_value()
}

/// Builds the clap command tree for `grammar`.
///
/// The root is built with `no_binary_name`, so the argument vector passed to
/// clap must already have its program name removed.
pub fn compile(grammar: &Grammar) -> Command {
    compile_node(grammar, grammar.root()).no_binary_name(true)
}

/// Returns, per option of `id` in declaration order, whether the option is
/// also recognised after a subcommand name.
///
/// Options stay local in positional-options mode, when they take part in a
/// conflict or a negation pair, and when a descendant reuses their id or one
/// of their flags.
pub(crate) fn global_mask(grammar: &Grammar, id: CommandId) -> Vec<bool> {
    let node = grammar.command(id);
    if node.settings.positional_options {
        return vec![false; node.options.len()];
    }

    let reserved = descendant_flags(grammar, id);
    let conflict_targets: HashSet<&str> = node
        .options
        .iter()
        .flat_map(|o| o.conflicts.iter().map(String::as_str))
        .collect();

    node.options
        .iter()
        .map(|option| {
            let key = option.key();
            option.conflicts.is_empty()
                && !conflict_targets.contains(key.as_str())
                && !node.is_dual_key(&key)
                && !reserved.collides(option)
        })
        .collect()
}

fn compile_node(grammar: &Grammar, id: CommandId) -> Command {
    let node = grammar.command(id);
    let globals = global_mask(grammar, id);

    let mut cmd = Command::new(node.name.clone())
        .aliases(node.aliases.clone())
        .args_override_self(true)
        .disable_help_subcommand(true);
    if let Some(description) = &node.description {
        cmd = cmd.about(description.clone());
    }
    if declares_help(node) {
        cmd = cmd.disable_help_flag(true);
    }

    for (option, global) in node.options.iter().zip(globals) {
        cmd = cmd.arg(compile_option(node, option).global(global));
    }

    cmd = compile_arguments(node, cmd);

    if let Some(version) = &node.settings.version {
        let mut arg = Arg::new(VERSION_ID)
            .action(ArgAction::Version)
            .help(
                version
                    .description
                    .clone()
                    .unwrap_or_else(|| "output the version number".to_string()),
            );
        if let Some(short) = version.short.as_deref().and_then(short_char) {
            arg = arg.short(short);
        }
        if let Some(long) = version.long.as_deref() {
            arg = arg.long(long.trim_start_matches("--").to_string());
        }
        cmd = cmd
            .version(version.version.clone())
            .disable_version_flag(true)
            .arg(arg);
    }

    let children = grammar.children(id);
    if !children.is_empty() && node.action.is_none() && node.settings.default_subcommand.is_none() {
        cmd = cmd.subcommand_required(true);
    }
    for child in children {
        cmd = cmd.subcommand(compile_node(grammar, *child));
    }

    cmd
}

fn compile_option(node: &CommandNode, option: &OptionSpec) -> Arg {
    let mut arg = Arg::new(option.name().to_string()).hide(option.hidden);
    if let Some(short) = option.short_char() {
        arg = arg.short(short);
    }
    if let Some(long) = option.long_name() {
        arg = arg.long(long.to_string());
    }
    if let Some(help) = help_text(option.description.as_deref(), default_label(option)) {
        arg = arg.help(help);
    }

    arg = match &option.arity {
        OptionArity::Flag { repeatable: false } => arg.action(ArgAction::SetTrue),
        OptionArity::Flag { repeatable: true } => arg.action(ArgAction::Count),
        OptionArity::RequiredValue {
            value_name,
            repeatable,
        } => {
            let arg = arg.value_name(value_name.clone());
            if *repeatable {
                arg.action(ArgAction::Append).num_args(1..)
            } else {
                arg.action(ArgAction::Set).num_args(1)
            }
        }
        OptionArity::OptionalValue {
            value_name,
            repeatable,
            ..
        } => {
            let arg = arg
                .value_name(value_name.clone())
                .default_missing_value(BARE_VALUE);
            if *repeatable {
                arg.action(ArgAction::Append).num_args(0..)
            } else {
                arg.action(ArgAction::Set).num_args(0..=1)
            }
        }
    };
    if option.arity.takes_value() {
        arg = arg.value_parser(OptionValueParser::for_option(option));
    }

    if uses_clap_env(option) {
        if let Some(env) = &option.env {
            arg = arg.env(env.clone());
        }
    }

    let conflicts: Vec<String> = option
        .conflicts
        .iter()
        .flat_map(|key| node.options_for_key(key))
        .map(|o| o.name().to_string())
        .collect();
    if !conflicts.is_empty() {
        arg = arg.conflicts_with_all(conflicts);
    }

    let key = option.key();
    for twin in node.options_for_key(&key) {
        if twin.negate != option.negate {
            arg = arg.overrides_with(twin.name().to_string());
        }
    }

    arg
}

fn compile_arguments(node: &CommandNode, mut cmd: Command) -> Command {
    let settings = &node.settings;
    let has_variadic = node.arguments.iter().any(|a| a.variadic);

    for argument in &node.arguments {
        let mut arg = Arg::new(argument_id(argument))
            .value_name(argument.name.clone())
            .required(argument.required)
            .value_parser(OptionValueParser::for_argument(argument));
        if let Some(help) = help_text(
            argument.description.as_deref(),
            argument
                .default_description
                .clone()
                .or_else(|| argument.default.as_ref().map(ToString::to_string)),
        ) {
            arg = arg.help(help);
        }
        arg = if argument.variadic {
            arg.action(ArgAction::Append)
                .num_args(1..)
                .allow_hyphen_values(settings.allow_unknown_options)
        } else {
            arg.action(ArgAction::Set)
        };
        cmd = cmd.arg(arg);
    }

    let tolerant = settings.allow_excess_arguments || settings.allow_unknown_options;
    if tolerant && !has_variadic {
        cmd = cmd.arg(
            Arg::new(REST_ID)
                .action(ArgAction::Append)
                .num_args(1..)
                .hide(true)
                .allow_hyphen_values(settings.allow_unknown_options),
        );
    }

    cmd
}

fn default_label(option: &OptionSpec) -> Option<String> {
    option
        .default_description
        .clone()
        .or_else(|| option.default.as_ref().map(ToString::to_string))
}

fn help_text(description: Option<&str>, default: Option<String>) -> Option<String> {
    match (description, default) {
        (Some(desc), Some(default)) => Some(format!("{desc} (default: {default})")),
        (None, Some(default)) => Some(format!("(default: {default})")),
        (Some(desc), None) => Some(desc.to_string()),
        (None, None) => None,
    }
}

pub(crate) fn short_char(flag: &str) -> Option<char> {
    flag.strip_prefix('-').and_then(|s| s.chars().next())
}

pub(crate) fn declares_help(node: &CommandNode) -> bool {
    node.options
        .iter()
        .any(|o| o.short.as_deref() == Some("-h") || o.long.as_deref() == Some("--help"))
}

/// Flag ids and forms used anywhere below a command, plus clap's reserved
/// help and version forms. A global option may not reuse any of them.
struct ReservedFlags {
    ids: HashSet<String>,
    shorts: HashSet<char>,
    longs: HashSet<String>,
}

impl ReservedFlags {
    fn collides(&self, option: &OptionSpec) -> bool {
        self.ids.contains(option.name())
            || option.short_char().is_some_and(|c| self.shorts.contains(&c))
            || option.long_name().is_some_and(|l| self.longs.contains(l))
    }
}

fn descendant_flags(grammar: &Grammar, id: CommandId) -> ReservedFlags {
    let mut reserved = ReservedFlags {
        ids: HashSet::from(["help".to_string(), "version".to_string()]),
        shorts: HashSet::from(['h', 'V']),
        longs: HashSet::from(["help".to_string(), "version".to_string()]),
    };

    let mut stack: Vec<CommandId> = grammar.children(id).to_vec();
    while let Some(current) = stack.pop() {
        let node = grammar.command(current);
        for option in &node.options {
            reserved.ids.insert(option.name().to_string());
            reserved.shorts.extend(option.short_char());
            reserved.longs.extend(option.long_name().map(String::from));
        }
        if let Some(version) = &node.settings.version {
            reserved.shorts.extend(version.short.as_deref().and_then(short_char));
            reserved
                .longs
                .extend(version.long.as_deref().map(|l| l.trim_start_matches("--").to_string()));
        }
        stack.extend_from_slice(grammar.children(current));
    }

    reserved
}

//! Argument vector preparation.
//!
//! Clap has no notion of a default subcommand, of pass-through options, or of
//! keeping an optional value apart from a combined short flag. This pass walks
//! the argument vector one command level at a time, the way the parser will,
//! and rewrites it so that clap sees an equivalent explicit form:
//!
//! - the default subcommand's name is inserted at the first token the current
//!   command cannot consume itself, unless that token names a child or asks
//!   for help or version output;
//! - in pass-through mode, `--` is inserted after the first operand so the
//!   rest reaches the command's arguments untouched;
//! - with combined optional values disabled, `-cvalue` is split into `-c` and
//!   `-value`.

use std::collections::VecDeque;

use partial_parse_core::{CommandId, Grammar, OptionArity, OptionSpec};
use tracing::debug;

use crate::compile::{declares_help, global_mask, short_char};

/// How many of the following tokens an option consumes as values.
enum Values {
    None,
    One,
    Optional,
    Many,
}

fn values_of(option: &OptionSpec) -> Values {
    match &option.arity {
        OptionArity::Flag { .. } => Values::None,
        OptionArity::RequiredValue {
            repeatable: false, ..
        } => Values::One,
        OptionArity::OptionalValue {
            repeatable: false, ..
        } => Values::Optional,
        OptionArity::RequiredValue {
            repeatable: true, ..
        }
        | OptionArity::OptionalValue {
            repeatable: true, ..
        } => Values::Many,
    }
}

fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Options recognised while scanning one command level.
struct Scope<'g> {
    grammar: &'g Grammar,
    node: CommandId,
    options: Vec<&'g OptionSpec>,
}

impl<'g> Scope<'g> {
    fn new(grammar: &'g Grammar, node: CommandId, inherited: Vec<&'g OptionSpec>) -> Self {
        let mut options: Vec<&OptionSpec> = grammar.command(node).options.iter().collect();
        options.extend(inherited);
        Self {
            grammar,
            node,
            options,
        }
    }

    /// Options of this level that remain recognised below it.
    fn passed_down(&self) -> Vec<&'g OptionSpec> {
        let own = &self.grammar.command(self.node).options;
        let globals = global_mask(self.grammar, self.node);
        let mut passed: Vec<&OptionSpec> = own
            .iter()
            .zip(globals)
            .filter_map(|(option, global)| global.then_some(option))
            .collect();
        passed.extend(self.options.iter().skip(own.len()).copied());
        passed
    }

    fn long(&self, name: &str) -> Option<&'g OptionSpec> {
        self.options
            .iter()
            .copied()
            .find(|o| o.long_name() == Some(name))
    }

    fn short(&self, c: char) -> Option<&'g OptionSpec> {
        self.options
            .iter()
            .copied()
            .find(|o| o.short_char() == Some(c))
    }

    fn is_display_request(&self, token: &str) -> bool {
        let node = self.grammar.command(self.node);
        if !declares_help(node) && (token == "-h" || token == "--help") {
            return true;
        }
        node.settings.version.as_ref().is_some_and(|version| {
            version.long.as_deref() == Some(token) || version.short.as_deref() == Some(token)
        })
    }
}

/// Rewrites user arguments (program name already removed) for clap.
pub(crate) fn prepare(grammar: &Grammar, args: Vec<String>) -> Vec<String> {
    let mut tokens: VecDeque<String> = args.into();
    let mut out = Vec::with_capacity(tokens.len() + 2);
    let mut scope = Scope::new(grammar, grammar.root(), Vec::new());

    loop {
        match scan_level(&scope, &mut tokens, &mut out) {
            Some(child) => {
                let inherited = scope.passed_down();
                scope = Scope::new(grammar, child, inherited);
            }
            None => break,
        }
    }

    out
}

/// Copies the tokens of one command level to `out`. Returns the child to
/// continue with, if any.
fn scan_level(
    scope: &Scope<'_>,
    tokens: &mut VecDeque<String>,
    out: &mut Vec<String>,
) -> Option<CommandId> {
    let grammar = scope.grammar;
    let node = grammar.command(scope.node);
    let default = grammar.default_subcommand(scope.node);
    let descend_default = |out: &mut Vec<String>, at: &str| {
        let child = default?;
        debug!(
            command = %grammar.qualified_name(scope.node),
            default = %grammar.command(child).name,
            at,
            "Selecting default subcommand"
        );
        out.push(grammar.command(child).name.clone());
        Some(child)
    };

    while let Some(token) = tokens.pop_front() {
        if token == "--" {
            if let Some(child) = descend_default(out, "--") {
                tokens.push_front(token);
                return Some(child);
            }
            out.push(token);
            out.extend(tokens.drain(..));
            return None;
        }

        if scope.is_display_request(&token) {
            out.push(token);
            out.extend(tokens.drain(..));
            return None;
        }

        let known = match token.strip_prefix("--") {
            Some(body) => {
                let name = body.split_once('=').map_or(body, |(name, _)| name);
                scope.long(name).map(|option| (option, body.contains('=')))
            }
            None if looks_like_flag(&token) => short_char(&token)
                .and_then(|c| scope.short(c))
                .map(|option| (option, false)),
            None => None,
        };

        if let Some((option, inline)) = known {
            if token.starts_with("--") {
                out.push(token);
                if !inline {
                    take_values(option, tokens, out);
                }
            } else {
                scan_short_cluster(scope, token, tokens, out);
            }
            continue;
        }

        if !looks_like_flag(&token) {
            if let Some(child) = grammar.find_child(scope.node, &token) {
                out.push(token);
                return Some(child);
            }
        }

        // Unknown options and operands belong to the default subcommand.
        if let Some(child) = descend_default(out, &token) {
            tokens.push_front(token);
            return Some(child);
        }

        let operand = !looks_like_flag(&token);
        out.push(token);
        if operand && node.settings.pass_through_options && !tokens.is_empty() {
            out.push("--".to_string());
            out.extend(tokens.drain(..));
            return None;
        }
    }

    descend_default(out, "end of input")
}

/// Handles `-abc` style clusters. Flags may be combined; the first option
/// taking a value consumes the rest of the cluster or the following tokens.
fn scan_short_cluster(
    scope: &Scope<'_>,
    token: String,
    tokens: &mut VecDeque<String>,
    out: &mut Vec<String>,
) {
    let combine = scope
        .grammar
        .command(scope.node)
        .settings
        .combine_flag_and_optional_value;
    let body = &token[1..];

    for (index, c) in body.char_indices() {
        let Some(option) = scope.short(c) else {
            break;
        };
        if !option.arity.takes_value() {
            continue;
        }

        let rest = &body[index + c.len_utf8()..];
        if rest.is_empty() {
            out.push(token.clone());
            take_values(option, tokens, out);
            return;
        }
        let optional = matches!(option.arity, OptionArity::OptionalValue { .. });
        if optional && !combine {
            out.push(format!("-{}", &body[..index + c.len_utf8()]));
            tokens.push_front(format!("-{rest}"));
            return;
        }
        out.push(token.clone());
        return;
    }

    out.push(token);
}

fn take_values(option: &OptionSpec, tokens: &mut VecDeque<String>, out: &mut Vec<String>) {
    match values_of(option) {
        Values::None => {}
        Values::One => {
            // A required value is taken even when it looks like a flag.
            if tokens.front().is_some_and(|next| next != "--") {
                out.extend(tokens.pop_front());
            }
        }
        Values::Optional => {
            take_operand(tokens, out);
        }
        Values::Many => while take_operand(tokens, out) {},
    }
}

fn take_operand(tokens: &mut VecDeque<String>, out: &mut Vec<String>) -> bool {
    match tokens.front() {
        Some(next) if !looks_like_flag(next) && next != "--" => {
            out.extend(tokens.pop_front());
            true
        }
        _ => false,
    }
}

//! Relaxed copies of a grammar for dry-run parsing.
//!
//! A [`ShadowTree`] mirrors every command of a real [`Grammar`] with the same
//! names, aliases, arguments, settings and options, except that no option is
//! mandatory, output is silenced and errors are returned instead of exiting.
//! Every shadow command carries a no-op action, so resolution may stop at any
//! command and the observer decides what happens there. The real grammar is
//! only borrowed.

use std::collections::HashMap;

use partial_parse_core::{
    Action, CommandId, CommandNode, ErrorMode, Grammar, GrammarSettings, OptionArity, OptionSpec,
    OutputMode,
};
use tracing::debug;

/// Maps each shadow command to the real command it mirrors.
#[derive(Debug, Clone, Default)]
pub struct Correspondence {
    to_real: HashMap<CommandId, CommandId>,
}

impl Correspondence {
    pub fn insert(&mut self, shadow: CommandId, real: CommandId) {
        self.to_real.insert(shadow, real);
    }

    /// Returns the real command mirrored by `shadow`.
    pub fn real(&self, shadow: CommandId) -> Option<CommandId> {
        self.to_real.get(&shadow).copied()
    }

    pub fn len(&self) -> usize {
        self.to_real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_real.is_empty()
    }
}

/// A disposable relaxed mirror of a grammar.
///
/// # Examples
///
/// ```
/// use partial_parse::ShadowTree;
/// use partial_parse_core::{CommandNode, Grammar, OptionSpec};
///
/// let real = Grammar::new(
///     CommandNode::new("pizza")
///         .with_option(OptionSpec::parse("-s, --size <size>").unwrap().mandatory())
///         .with_subcommand(CommandNode::new("order")),
/// )
/// .unwrap();
///
/// let shadow = ShadowTree::build(&real);
/// assert_eq!(shadow.grammar.len(), real.len());
/// assert!(!shadow.grammar.command(shadow.grammar.root()).options[0].mandatory);
/// assert_eq!(shadow.correspondence.real(shadow.grammar.root()), Some(real.root()));
/// ```
#[derive(Debug, Clone)]
pub struct ShadowTree {
    pub grammar: Grammar,
    pub correspondence: Correspondence,
}

impl ShadowTree {
    /// Mirrors `real`, depth-first from its root.
    pub fn build(real: &Grammar) -> Self {
        let root = real.root();
        let mut grammar = Grammar::with_root(shadow_node(real.command(root)));
        let shadow_root = grammar.root();
        let mut correspondence = Correspondence::default();
        correspondence.insert(shadow_root, root);
        mirror_children(real, root, &mut grammar, shadow_root, &mut correspondence);

        debug!(
            root = %real.command(root).name,
            commands = correspondence.len(),
            "Built shadow grammar"
        );

        Self {
            grammar,
            correspondence,
        }
    }
}

fn mirror_children(
    real: &Grammar,
    real_parent: CommandId,
    shadow: &mut Grammar,
    shadow_parent: CommandId,
    correspondence: &mut Correspondence,
) {
    for &real_child in real.children(real_parent) {
        let shadow_child = shadow.attach(shadow_parent, shadow_node(real.command(real_child)));
        correspondence.insert(shadow_child, real_child);
        mirror_children(real, real_child, shadow, shadow_child, correspondence);
    }
}

fn shadow_node(real: &CommandNode) -> CommandNode {
    CommandNode {
        name: real.name.clone(),
        aliases: real.aliases.clone(),
        description: real.description.clone(),
        arguments: real.arguments.clone(),
        options: real.options.iter().map(shadow_option).collect(),
        subcommands: Vec::new(),
        settings: shadow_settings(&real.settings),
        action: Some(Action::noop()),
    }
}

fn shadow_settings(real: &GrammarSettings) -> GrammarSettings {
    GrammarSettings {
        combine_flag_and_optional_value: real.combine_flag_and_optional_value,
        allow_unknown_options: real.allow_unknown_options,
        allow_excess_arguments: real.allow_excess_arguments,
        positional_options: real.positional_options,
        pass_through_options: real.pass_through_options,
        default_subcommand: real.default_subcommand.clone(),
        version: real.version.clone(),
        output: OutputMode::Silent,
        on_error: ErrorMode::Return,
    }
}

fn shadow_option(real: &OptionSpec) -> OptionSpec {
    let arity = match &real.arity {
        OptionArity::Flag { repeatable } => OptionArity::Flag {
            repeatable: *repeatable,
        },
        OptionArity::RequiredValue {
            value_name,
            repeatable,
        } => OptionArity::RequiredValue {
            value_name: value_name.clone(),
            repeatable: *repeatable,
        },
        OptionArity::OptionalValue {
            value_name,
            repeatable,
            preset,
        } => OptionArity::OptionalValue {
            value_name: value_name.clone(),
            repeatable: *repeatable,
            preset: preset.clone(),
        },
    };

    OptionSpec {
        short: real.short.clone(),
        long: real.long.clone(),
        negate: real.negate,
        description: real.description.clone(),
        arity,
        default: real.default.clone(),
        default_description: real.default_description.clone(),
        coercer: real.coercer.clone(),
        choices: real.choices.clone(),
        conflicts: real.conflicts.clone(),
        implies: real.implies.clone(),
        env: real.env.clone(),
        mandatory: false,
        hidden: real.hidden,
    }
}

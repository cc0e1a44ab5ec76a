//! Missing-option resolution along an ancestor chain.

use indexmap::{IndexMap, IndexSet};
use partial_parse_core::{CommandId, Grammar};

use crate::ProvidedOptions;

/// Option keys without a value, per command, from the matched command up to
/// the root.
pub type MissingOptions = IndexMap<CommandId, IndexSet<String>>;

/// Lists, for `command` and each of its ancestors, the declared option keys
/// that have no value in `provided`.
///
/// A stored `false`, `0` or empty string counts as a value. Keys are listed in
/// declaration order, once per positive/negated pair.
///
/// # Examples
///
/// ```
/// use partial_parse::{ProvidedOptions, find_missing_options};
/// use partial_parse_core::{CommandNode, Grammar, OptionSpec, OptionValue, OptionValues};
///
/// let grammar = Grammar::new(
///     CommandNode::new("root")
///         .with_option(OptionSpec::parse("-a, --option-a <value>").unwrap().mandatory())
///         .with_subcommand(
///             CommandNode::new("child")
///                 .with_option(OptionSpec::parse("-b, --option-b <value>").unwrap()),
///         ),
/// )
/// .unwrap();
/// let child = grammar.find(&["child"]).unwrap();
///
/// let mut provided = ProvidedOptions::new();
/// provided.insert(grammar.root(), OptionValues::new());
/// provided.insert(
///     child,
///     OptionValues::from([("optionB".to_string(), OptionValue::from("value2"))]),
/// );
///
/// let missing = find_missing_options(&grammar, child, &provided);
/// assert_eq!(missing.keys().copied().collect::<Vec<_>>(), [child, grammar.root()]);
/// assert!(missing[&child].is_empty());
/// assert!(missing[&grammar.root()].contains("optionA"));
/// ```
pub fn find_missing_options(
    grammar: &Grammar,
    command: CommandId,
    provided: &ProvidedOptions,
) -> MissingOptions {
    grammar
        .ancestors(command)
        .map(|id| {
            let values = provided.get(&id);
            let missing = grammar
                .command(id)
                .options
                .iter()
                .map(|option| option.key())
                .filter(|key| !values.is_some_and(|values| values.contains_key(key)))
                .collect();
            (id, missing)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use partial_parse_core::{CommandNode, OptionSpec, OptionValue, OptionValues};

    use super::*;

    fn values(pairs: &[(&str, OptionValue)]) -> OptionValues {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_falsy_values_count_as_provided() {
        let grammar = Grammar::new(
            CommandNode::new("pizza")
                .with_option(OptionSpec::parse("-c, --cheese <type>").unwrap())
                .with_option(OptionSpec::parse("--no-cheese").unwrap())
                .with_option(OptionSpec::parse("-q, --quantity <n>").unwrap())
                .with_option(OptionSpec::parse("--note <text>").unwrap())
                .with_option(OptionSpec::parse("--size <size>").unwrap()),
        )
        .unwrap();
        let mut provided = ProvidedOptions::new();
        provided.insert(
            grammar.root(),
            values(&[
                ("cheese", OptionValue::Bool(false)),
                ("quantity", OptionValue::Int(0)),
                ("note", OptionValue::from("")),
            ]),
        );

        let missing = find_missing_options(&grammar, grammar.root(), &provided);

        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[&grammar.root()].iter().collect::<Vec<_>>(),
            ["size"]
        );
    }

    #[test]
    fn test_negation_pair_contributes_one_key() {
        let grammar = Grammar::new(
            CommandNode::new("pizza")
                .with_option(OptionSpec::parse("--no-sauce").unwrap())
                .with_option(OptionSpec::parse("--sauce <kind>").unwrap())
                .with_option(OptionSpec::parse("--extra-cheese").unwrap()),
        )
        .unwrap();

        let missing = find_missing_options(&grammar, grammar.root(), &ProvidedOptions::new());

        assert_eq!(
            missing[&grammar.root()].iter().collect::<Vec<_>>(),
            ["sauce", "extraCheese"]
        );
    }

    #[test]
    fn test_leaf_to_root_order() {
        let grammar = Grammar::new(
            CommandNode::new("root")
                .with_option(OptionSpec::parse("--option-a <value>").unwrap())
                .with_subcommand(
                    CommandNode::new("child")
                        .with_option(OptionSpec::parse("--option-b <value>").unwrap())
                        .with_subcommand(
                            CommandNode::new("grandchild")
                                .with_option(OptionSpec::parse("--option-c <value>").unwrap()),
                        ),
                ),
        )
        .unwrap();
        let child = grammar.find(&["child"]).unwrap();
        let grandchild = grammar.find(&["child", "grandchild"]).unwrap();

        let missing = find_missing_options(&grammar, grandchild, &ProvidedOptions::new());

        assert_eq!(
            missing.keys().copied().collect::<Vec<_>>(),
            [grandchild, child, grammar.root()]
        );
        assert!(missing[&child].contains("optionB"));
    }
}

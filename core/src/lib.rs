//! Grammar model for hierarchical command-line interfaces.
//!
//! This crate defines the declarative types an application uses to describe
//! its command tree:
//!
//! - [`CommandNode`]: a command with options, positional arguments,
//!   behavioural settings, an optional action and nested subcommands.
//! - [`OptionSpec`]: an option with short/long forms, arity, default,
//!   environment source, choices, conflicts and implications.
//! - [`ArgumentSpec`]: a positional argument.
//! - [`Grammar`]: a validated, indexed command tree addressed by
//!   [`CommandId`], with parent/child navigation.
//!
//! Validation ([`validate_command`]) catches structural errors such as
//! duplicate flags, invalid flag formats and dangling option references
//! before a grammar is handed to a parser.
//!
//! # Example
//!
//! ```
//! use partial_parse_core::*;
//!
//! let grammar = Grammar::new(
//!     CommandNode::new("pizza")
//!         .with_option(
//!             OptionSpec::parse("-c, --cheese <type>")
//!                 .unwrap()
//!                 .with_description("Add the specified type of cheese")
//!                 .with_default("mozzarella"),
//!         )
//!         .with_option(OptionSpec::parse("--no-cheese").unwrap())
//!         .with_subcommand(CommandNode::new("order").with_alias("o")),
//! )
//! .unwrap();
//!
//! let order = grammar.find(&["o"]).unwrap();
//! assert_eq!(grammar.qualified_name(order), "pizza order");
//! assert!(grammar.command(grammar.root()).is_dual_key("cheese"));
//! ```

mod flags;
mod grammar;
mod types;
mod validate;

pub use flags::{FlagSyntax, ValuePlaceholder, attribute_key, camel_case};
pub use grammar::{CommandId, Grammar};
pub use types::*;
pub use validate::{GrammarError, validate_command};

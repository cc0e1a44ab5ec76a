//! Parsing engine for partial-parse command grammars.
//!
//! This crate runs a [`Grammar`] over an argument vector using `clap` for
//! tokenization, value checks, conflicts, environment lookup and help/version
//! output. On top of clap it adds what the grammar model needs:
//!
//! - default-subcommand selection and pass-through options (see the argv
//!   preparation pass);
//! - value resolution with provenance: default < configuration layer <
//!   environment < command line, then implications;
//! - the mandatory-option check;
//! - [`ResolutionObserver`], notified before each descent into a subcommand
//!   and at the command where resolution stops.
//!
//! # Main entry points
//!
//! - [`parse`]: resolve without running anything but the observer.
//! - [`run`]: resolve and run the matched command's action.
//! - [`compile`]: the `clap::Command` a grammar compiles to, e.g. to render
//!   help.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use partial_parse_core::{CommandNode, Grammar, OptionSpec, OptionValue};
//! use partial_parse_engine::{ParseConfig, run};
//!
//! let seen = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&seen);
//! let grammar = Grammar::new(
//!     CommandNode::new("shop")
//!         .exit_override()
//!         .silent()
//!         .with_subcommand(
//!             CommandNode::new("pay")
//!                 .with_option(OptionSpec::parse("--cash").unwrap())
//!                 .with_action(move |invocation| {
//!                     let options = invocation.options_with_globals();
//!                     *sink.lock().unwrap() = options.get("cash").cloned();
//!                     Ok(())
//!                 }),
//!         ),
//! )
//! .unwrap();
//!
//! run(&grammar, ["shop", "pay", "--cash"], &ParseConfig::default()).unwrap();
//! assert_eq!(*seen.lock().unwrap(), Some(OptionValue::Bool(true)));
//! ```
//!
//! [`Grammar`]: partial_parse_core::Grammar

mod argv;
mod compile;
pub mod config;
pub mod error;
mod observer;
mod parse;
mod resolve;
mod value;

pub use compile::compile;
pub use config::{ArgvStyle, ConfigError, ConfigValues, ParseConfig};
pub use error::{EngineError, ErrorCode, Result};
pub use observer::{ActionDispatcher, ResolutionObserver};
pub use parse::{ParseOutcome, parse, run};

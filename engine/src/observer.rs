//! Hooks into command resolution.
//!
//! A [`ResolutionObserver`] is told about every step of a parse: each
//! transition from a resolved command into its matched child, and the final
//! command where resolution stops. The engine never runs actions itself; the
//! [`ActionDispatcher`] observer does, which is what makes a parse "real".

use partial_parse_core::{Grammar, Invocation, ResolvedCommand};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Receives resolution events during a parse.
pub trait ResolutionObserver {
    /// Called just before control passes from `parent` to its matched
    /// subcommand `child`. Both are fully resolved.
    fn on_descend(&mut self, grammar: &Grammar, parent: &ResolvedCommand, child: &ResolvedCommand);

    /// Called once, at the command where resolution terminates, after the
    /// mandatory-option check.
    ///
    /// # Errors
    ///
    /// An error aborts the parse and is returned to the caller.
    fn on_terminal(&mut self, invocation: &Invocation<'_>) -> Result<()>;
}

/// Runs the matched command's action, if it has one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionDispatcher;

impl ResolutionObserver for ActionDispatcher {
    fn on_descend(&mut self, grammar: &Grammar, parent: &ResolvedCommand, child: &ResolvedCommand) {
        debug!(
            from = %grammar.qualified_name(parent.command),
            to = %grammar.command(child.command).name,
            "Descending"
        );
    }

    fn on_terminal(&mut self, invocation: &Invocation<'_>) -> Result<()> {
        let Some(resolved) = invocation.command() else {
            return Ok(());
        };
        let grammar = invocation.grammar;
        let Some(action) = &grammar.command(resolved.command).action else {
            return Ok(());
        };

        action
            .call(invocation)
            .map_err(|message| EngineError::Action {
                command: grammar.qualified_name(resolved.command),
                message,
            })
    }
}

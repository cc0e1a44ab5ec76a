//! Capture of resolution state during a shadow parse.

use partial_parse_core::{CommandId, Grammar, Invocation, ResolvedCommand};
use partial_parse_engine::{ResolutionObserver, Result};
use tracing::{debug, warn};

use crate::shadow::Correspondence;
use crate::{ProvidedOptions, ProvidedOptionsSources};

/// Per-call observer recording what the engine resolved, keyed by real
/// command. A later snapshot of the same command replaces an earlier one.
#[derive(Debug)]
pub(crate) struct InterceptionSession<'a> {
    correspondence: &'a Correspondence,
    pub(crate) provided_options: ProvidedOptions,
    pub(crate) provided_sources: ProvidedOptionsSources,
    pub(crate) matched_command: Option<CommandId>,
}

impl<'a> InterceptionSession<'a> {
    pub(crate) fn new(correspondence: &'a Correspondence) -> Self {
        Self {
            correspondence,
            provided_options: ProvidedOptions::new(),
            provided_sources: ProvidedOptionsSources::new(),
            matched_command: None,
        }
    }

    fn snapshot(&mut self, resolved: &ResolvedCommand) -> Option<CommandId> {
        let Some(real) = self.correspondence.real(resolved.command) else {
            warn!(shadow = %resolved.command, "Shadow command has no real counterpart");
            return None;
        };
        debug!(command = %real, options = resolved.options.len(), "Captured options");
        self.provided_options.insert(real, resolved.options.clone());
        self.provided_sources.insert(real, resolved.sources.clone());
        Some(real)
    }
}

impl ResolutionObserver for InterceptionSession<'_> {
    fn on_descend(&mut self, _grammar: &Grammar, parent: &ResolvedCommand, child: &ResolvedCommand) {
        self.snapshot(parent);
        self.snapshot(child);
    }

    fn on_terminal(&mut self, invocation: &Invocation<'_>) -> Result<()> {
        if let Some(resolved) = invocation.command() {
            self.matched_command = self.snapshot(resolved);
        }
        Ok(())
    }
}

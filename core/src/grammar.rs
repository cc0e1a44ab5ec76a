//! Indexed, read-only view of a command tree.
//!
//! A [`Grammar`] is built once from a root [`CommandNode`]. Each command gets
//! a [`CommandId`]; the grammar remembers every command's parent and ordered
//! children, so callers can walk the hierarchy in both directions without the
//! nodes owning each other.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CommandNode;
use crate::validate::{GrammarError, validate_command};

/// Identifier of a command inside one [`Grammar`].
///
/// Ids are only meaningful for the grammar that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(usize);

impl CommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    node: CommandNode,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
}

/// A validated command tree with parent/child navigation.
///
/// # Examples
///
/// ```
/// use partial_parse_core::{CommandNode, Grammar};
///
/// let grammar = Grammar::new(
///     CommandNode::new("git").with_subcommand(
///         CommandNode::new("remote").with_subcommand(CommandNode::new("add")),
///     ),
/// )
/// .unwrap();
///
/// let add = grammar.find(&["remote", "add"]).unwrap();
/// assert_eq!(grammar.qualified_name(add), "git remote add");
/// assert_eq!(grammar.ancestors(add).count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Grammar {
    entries: Vec<Entry>,
}

impl Grammar {
    /// Validates `root` and indexes it, depth-first.
    ///
    /// # Errors
    ///
    /// Returns the first [`GrammarError`] found by validation.
    pub fn new(root: CommandNode) -> Result<Self, GrammarError> {
        validate_command(&root)?;
        let mut root = root;
        let subcommands = std::mem::take(&mut root.subcommands);
        let mut grammar = Self::with_root(root);
        let root_id = grammar.root();
        grammar.attach_all(root_id, subcommands);
        Ok(grammar)
    }

    /// Parses a JSON command tree and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Json`] for malformed JSON, otherwise any
    /// validation error.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let root: CommandNode =
            serde_json::from_str(json).map_err(|e| GrammarError::Json(e.to_string()))?;
        Self::new(root)
    }

    /// Starts a grammar from a single root command without validating it.
    ///
    /// Any `subcommands` on `root` are dropped; add children with
    /// [`attach`](Grammar::attach). Intended for building derived grammars
    /// from an already validated one.
    pub fn with_root(mut root: CommandNode) -> Self {
        root.subcommands.clear();
        Self {
            entries: vec![Entry {
                node: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Adds `node` as the last child of `parent` and returns its id.
    ///
    /// Any `subcommands` on `node` are dropped.
    pub fn attach(&mut self, parent: CommandId, mut node: CommandNode) -> CommandId {
        node.subcommands.clear();
        let id = CommandId(self.entries.len());
        self.entries.push(Entry {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.entries[parent.0].children.push(id);
        id
    }

    fn attach_all(&mut self, parent: CommandId, subcommands: Vec<CommandNode>) {
        for mut sub in subcommands {
            let nested = std::mem::take(&mut sub.subcommands);
            let id = self.attach(parent, sub);
            self.attach_all(id, nested);
        }
    }

    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the command declaration. Its `subcommands` are always empty;
    /// use [`children`](Grammar::children).
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different grammar and is out of range.
    pub fn command(&self, id: CommandId) -> &CommandNode {
        &self.entries[id.0].node
    }

    /// Returns the command declaration, or `None` for an id this grammar
    /// did not issue.
    pub fn get(&self, id: CommandId) -> Option<&CommandNode> {
        self.entries.get(id.0).map(|e| &e.node)
    }

    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.entries.get(id.0).and_then(|e| e.parent)
    }

    pub fn children(&self, id: CommandId) -> &[CommandId] {
        self.entries
            .get(id.0)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    /// Iterates from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: CommandId) -> impl Iterator<Item = CommandId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), move |current| {
            self.parent(*current)
        })
    }

    /// Iterates over every command id, depth-first from the root.
    pub fn ids(&self) -> impl Iterator<Item = CommandId> + '_ {
        (0..self.entries.len()).map(CommandId)
    }

    /// Finds a direct child by name or alias.
    pub fn find_child(&self, parent: CommandId, name: &str) -> Option<CommandId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.command(*child).is_named(name))
    }

    /// Follows `path` (names or aliases) down from the root.
    pub fn find(&self, path: &[&str]) -> Option<CommandId> {
        path.iter()
            .try_fold(self.root(), |current, name| self.find_child(current, name))
    }

    /// Returns the child selected when no child is named on the command line.
    pub fn default_subcommand(&self, id: CommandId) -> Option<CommandId> {
        let name = self.get(id)?.settings.default_subcommand.as_deref()?;
        self.find_child(id, name)
    }

    /// Returns the command names from the root down to `id`.
    pub fn path(&self, id: CommandId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .map(|a| self.command(a).name.as_str())
            .collect();
        names.reverse();
        names
    }

    /// Returns the space-joined [`path`](Grammar::path), e.g. `"git remote add"`.
    pub fn qualified_name(&self, id: CommandId) -> String {
        self.path(id).join(" ")
    }
}

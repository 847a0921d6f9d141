//! Evaluation context: inherited property values of a node.

use std::collections::BTreeMap;
use std::fmt;

use generational_arena::Index;
use itertools::Itertools;
use tracing::instrument;

use crate::domain::arena::TreeArena;
use crate::domain::error::DomainResult;

/// Property name to value mapping used when evaluating a condition.
///
/// Built fresh for every evaluation. The first value recorded for a name wins,
/// which during an upward walk means the nearest declaring ancestor shadows
/// farther ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name -> value` unless `name` is already present.
    ///
    /// Returns true if the value was recorded.
    pub fn insert_if_absent(&mut self, name: &str, value: &str) -> bool {
        if self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_string(), value.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    /// Collect pairs in order; earlier pairs shadow later ones with the same name.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            let (k, v) = (k.into(), v.into());
            ctx.insert_if_absent(&k, &v);
        }
        ctx
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.values
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .join(", ")
        )
    }
}

/// Build the context for `node` by walking its ancestors up to the root.
///
/// Starts at the parent of `node`; the node's own declaration is not part of its
/// context. Recomputed on every call since the tree may change between calls.
#[instrument(level = "trace", skip(tree))]
pub fn resolve_context(tree: &TreeArena, node: Index) -> DomainResult<Context> {
    let mut ctx = Context::new();
    for ancestor in tree.ancestors(node)? {
        if let Some(decl) = tree.get_node(ancestor).and_then(|n| n.data.property.as_ref()) {
            ctx.insert_if_absent(&decl.name, &decl.value);
        }
    }
    Ok(ctx)
}

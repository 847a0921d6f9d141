//! Change trigger
//!
//! Entry point for external edits (checkboxes, text fields, context menu
//! actions). Writes the new value and re-runs visibility propagation.

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::services::visibility::{PropagationReport, VisibilityService};
use crate::application::ApplicationResult;
use crate::domain::{DomainError, TreeArena};

/// How much of the tree is re-evaluated after a property change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeScope {
    /// The subtree rooted at the changed node. Contexts only contain ancestors,
    /// so no node outside this subtree can see the changed declaration.
    #[default]
    Subtree,
    /// The whole document.
    Document,
}

impl fmt::Display for ChangeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeScope::Subtree => write!(f, "subtree"),
            ChangeScope::Document => write!(f, "document"),
        }
    }
}

/// Display flag edit: explicit on, explicit off, or drop the setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSetting {
    Show,
    Hide,
    Inherit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTrigger {
    visibility: VisibilityService,
    scope: ChangeScope,
}

impl ChangeTrigger {
    pub fn new(visibility: VisibilityService, scope: ChangeScope) -> Self {
        Self { visibility, scope }
    }

    /// Write `new_value` into the property declared on `node` and re-evaluate.
    ///
    /// A value that does not fit the declared type is rejected and the
    /// declaration is left unchanged. If propagation fails the previous
    /// value is restored.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn on_property_change(
        &self,
        tree: &mut TreeArena,
        node: Index,
        new_value: &str,
    ) -> ApplicationResult<PropagationReport> {
        let data = &mut tree.node_mut(node)?.data;
        let Some(decl) = data.property.as_mut() else {
            return Err(DomainError::MissingPropertyDeclaration(data.id.clone()).into());
        };
        decl.check_value(new_value)?;
        debug!("{}: {} -> {}", decl.name, decl.value, new_value);
        let previous = std::mem::replace(&mut decl.value, new_value.to_string());

        let scope = match self.scope {
            ChangeScope::Subtree => node,
            ChangeScope::Document => tree.root().unwrap_or(node),
        };
        self.visibility.propagate(tree, scope).inspect_err(|e| {
            warn!("propagation failed, restoring previous value: {}", e);
            if let Some(decl) = tree
                .get_node_mut(node)
                .and_then(|n| n.data.property.as_mut())
            {
                decl.value = previous;
            }
        })
    }

    /// Set, clear or inherit display flag `flag` on `node` and re-evaluate its subtree.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn set_display_flag(
        &self,
        tree: &mut TreeArena,
        node: Index,
        flag: &str,
        setting: FlagSetting,
    ) -> ApplicationResult<PropagationReport> {
        let flags = &mut tree.node_mut(node)?.data.flags;
        let previous = match setting {
            FlagSetting::Show => flags.insert(flag.to_string(), true),
            FlagSetting::Hide => flags.insert(flag.to_string(), false),
            FlagSetting::Inherit => flags.remove(flag),
        };
        self.visibility.propagate(tree, node).inspect_err(|e| {
            warn!("propagation failed, restoring flag {}: {}", flag, e);
            if let Some(n) = tree.get_node_mut(node) {
                match previous {
                    Some(value) => n.data.flags.insert(flag.to_string(), value),
                    None => n.data.flags.remove(flag),
                };
            }
        })
    }
}

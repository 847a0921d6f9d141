use std::collections::{BTreeMap, HashMap};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Brackets, Group, PropertyDecl};
use crate::domain::error::{DomainError, DomainResult};

/// Annotations carried by a document node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    /// Unique identifier within the tree
    pub id: String,
    /// Property visible to descendants
    pub property: Option<PropertyDecl>,
    /// Condition deciding whether this node is shown
    pub conditional: Option<String>,
    /// Condition deciding whether the enclosing marks are shown
    pub brackets: Option<Brackets>,
    /// Present if the children are mutually exclusive alternatives
    pub group: Option<Group>,
    /// Explicit display flags; absent names inherit from ancestors
    pub flags: BTreeMap<String, bool>,
    /// Presentation state written by the visibility pass
    pub hidden: bool,
}

impl NodeData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.property = Some(property);
        self
    }

    pub fn with_conditional(mut self, conditional: impl Into<String>) -> Self {
        self.conditional = Some(conditional.into());
        self
    }

    pub fn with_brackets(mut self, brackets: Brackets) -> Self {
        self.brackets = Some(brackets);
        self
    }

    pub fn with_group(mut self) -> Self {
        self.group = Some(Group::default());
        self
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in document order
    pub children: Vec<Index>,
}

/// Arena-based document tree.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// The root doubles as the sentinel where ancestor walks stop.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    ids: HashMap<String, Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `parent`, or as root when `parent` is None.
    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> DomainResult<Index> {
        if self.ids.contains_key(&data.id) {
            return Err(DomainError::DuplicateNodeId(data.id));
        }
        match parent {
            Some(parent_idx) if !self.arena.contains(parent_idx) => {
                return Err(DomainError::NodeNotFound(format!(
                    "parent of {}",
                    data.id
                )));
            }
            None if self.root.is_some() => {
                return Err(DomainError::DetachedNode(data.id));
            }
            _ => {}
        }

        let id = data.id.clone();
        let node_idx = self.arena.insert(TreeNode {
            data,
            parent,
            children: Vec::new(),
        });
        self.ids.insert(id, node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.root = Some(node_idx),
        }

        Ok(node_idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    /// Look up a node, failing if the index is stale.
    pub fn node(&self, idx: Index) -> DomainResult<&TreeNode> {
        self.arena
            .get(idx)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", idx)))
    }

    pub fn node_mut(&mut self, idx: Index) -> DomainResult<&mut TreeNode> {
        self.arena
            .get_mut(idx)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", idx)))
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Find a node by id.
    pub fn find(&self, id: &str) -> DomainResult<Index> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal of the whole tree.
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order traversal of the subtree rooted at `idx` (including `idx`).
    pub fn iter_subtree(&self, idx: Index) -> TreeIterator {
        TreeIterator::new(self, Some(idx))
    }

    /// Ancestors of `idx`, nearest first, ending with the root.
    ///
    /// Fails if a parent link is stale, if the chain ends anywhere but the
    /// root, or if it is longer than the tree (cycle).
    #[instrument(level = "trace", skip(self))]
    pub fn ancestors(&self, idx: Index) -> DomainResult<Vec<Index>> {
        let start = self.node(idx)?;
        let mut chain = Vec::new();
        let mut current_idx = idx;
        let mut parent = start.parent;

        while let Some(parent_idx) = parent {
            if chain.len() >= self.arena.len() {
                return Err(DomainError::CycleDetected(start.data.id.clone()));
            }
            let node = self
                .get_node(parent_idx)
                .ok_or_else(|| DomainError::DetachedNode(start.data.id.clone()))?;
            chain.push(parent_idx);
            current_idx = parent_idx;
            parent = node.parent;
        }

        if Some(current_idx) != self.root {
            return Err(DomainError::DetachedNode(start.data.id.clone()));
        }
        Ok(chain)
    }

    /// Nearest explicit setting of display flag `name` on `idx` or its ancestors.
    #[instrument(level = "trace", skip(self))]
    pub fn resolve_flag(&self, idx: Index, name: &str) -> DomainResult<Option<bool>> {
        let own = self.node(idx)?.data.flags.get(name).copied();
        if own.is_some() {
            return Ok(own);
        }
        for ancestor in self.ancestors(idx)? {
            if let Some(&value) = self.node(ancestor)?.data.flags.get(name) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, start: Option<Index>) -> Self {
        Self {
            arena,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

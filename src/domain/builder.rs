//! Tree builder: turns a nested node description into a [`TreeArena`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::{Brackets, Group, PropertyDecl, PropertyType};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::expr::Expr;

/// Nested description of a document node as handed over by a producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub property: Option<PropertySpec>,
    pub conditional: Option<String>,
    pub brackets: Option<BracketsSpec>,
    pub group: bool,
    pub flags: BTreeMap<String, bool>,
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub value: ScalarSpec,
    pub description: Option<String>,
}

/// Property values may be written as TOML strings, booleans or integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarSpec {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for ScalarSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarSpec::Bool(b) => write!(f, "{}", b),
            ScalarSpec::Int(i) => write!(f, "{}", i),
            ScalarSpec::Str(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BracketsSpec {
    pub condition: String,
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
}

fn default_open() -> String {
    "(".to_string()
}

fn default_close() -> String {
    ")".to_string()
}

/// Constructs document trees from [`NodeSpec`] descriptions.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    strict_expressions: bool,
    used_ids: HashSet<String>,
    next_auto_id: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject malformed conditions at build time instead of at evaluation time.
    pub fn strict_expressions(mut self, strict: bool) -> Self {
        self.strict_expressions = strict;
        self
    }

    /// Build a tree rooted at `spec`. Children keep their document order.
    #[instrument(level = "debug", skip_all)]
    pub fn build(&mut self, spec: &NodeSpec) -> DomainResult<TreeArena> {
        self.used_ids.clear();
        self.next_auto_id = 0;
        collect_ids(spec, &mut self.used_ids);

        let mut tree = TreeArena::new();
        let mut stack: Vec<(&NodeSpec, Option<Index>)> = vec![(spec, None)];

        while let Some((current, parent_idx)) = stack.pop() {
            let data = self.node_data(current)?;
            let current_idx = tree.insert_node(data, parent_idx)?;

            // Reverse so the first child is popped first
            for child in current.children.iter().rev() {
                stack.push((child, Some(current_idx)));
            }
        }

        debug!("built tree with {} nodes", tree.len());
        Ok(tree)
    }

    fn node_data(&mut self, spec: &NodeSpec) -> DomainResult<NodeData> {
        let id = match &spec.id {
            Some(id) => id.clone(),
            None => self.auto_id(),
        };

        let property = spec
            .property
            .as_ref()
            .map(|p| {
                let decl = PropertyDecl::new(&p.name, p.kind, &p.value.to_string())?;
                Ok::<_, DomainError>(match &p.description {
                    Some(d) => decl.with_description(d.clone()),
                    None => decl,
                })
            })
            .transpose()?;

        let brackets = spec
            .brackets
            .as_ref()
            .map(|b| Brackets::new(b.condition.clone(), b.open.clone(), b.close.clone()));

        if self.strict_expressions {
            if let Some(cond) = &spec.conditional {
                Expr::parse(cond)?;
            }
            if let Some(b) = &brackets {
                Expr::parse(&b.condition)?;
            }
        }

        Ok(NodeData {
            id,
            property,
            conditional: spec.conditional.clone(),
            brackets,
            group: spec.group.then(Group::default),
            flags: spec.flags.clone(),
            hidden: false,
        })
    }

    fn auto_id(&mut self) -> String {
        loop {
            let candidate = format!("node-{}", self.next_auto_id);
            self.next_auto_id += 1;
            if self.used_ids.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn collect_ids(spec: &NodeSpec, ids: &mut HashSet<String>) {
    if let Some(id) = &spec.id {
        ids.insert(id.clone());
    }
    for child in &spec.children {
        collect_ids(child, ids);
    }
}

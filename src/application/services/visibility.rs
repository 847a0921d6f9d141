//! Visibility propagation
//!
//! Applies condition results to every annotated node in a scope: hides or
//! shows conditional nodes, selects one alternative per group, and elides or
//! restores bracket marks.

use std::collections::HashSet;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{
    resolve_context, ComparisonPolicy, DomainError, DomainResult, Expr, Selection, TreeArena,
};

/// Summary of one propagation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Conditions evaluated (node, group alternative and bracket conditions)
    pub evaluated: usize,
    /// Distinct nodes whose presentation state changed
    pub changed: usize,
    /// Nodes left untouched because a condition was malformed
    pub skipped: Vec<SkippedNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNode {
    pub id: String,
    pub reason: String,
}

/// State change computed in the read-only phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Visibility { idx: Index, visible: bool },
    Selection { idx: Index, selection: Selection },
    Brackets { idx: Index, visible: bool },
}

/// Outcome of evaluating one condition: a verdict, or the parse error of a malformed one.
type Verdict = Result<bool, DomainError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityService {
    policy: ComparisonPolicy,
}

impl VisibilityService {
    pub fn new(policy: ComparisonPolicy) -> Self {
        Self { policy }
    }

    /// Re-evaluate every annotated node in the subtree rooted at `scope`.
    ///
    /// Decisions are computed for a snapshot of the scope first and applied
    /// afterwards, so the walk never observes its own writes. A broken ancestor
    /// chain aborts the pass before anything is written.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn propagate(&self, tree: &mut TreeArena, scope: Index) -> ApplicationResult<PropagationReport> {
        let (decisions, mut report) = self.plan(tree, scope)?;
        report.changed = apply(tree, &decisions)?;
        debug!(
            "propagate: evaluated={} changed={} skipped={}",
            report.evaluated,
            report.changed,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Re-evaluate the whole tree.
    pub fn propagate_all(&self, tree: &mut TreeArena) -> ApplicationResult<PropagationReport> {
        match tree.root() {
            Some(root) => self.propagate(tree, root),
            None => Ok(PropagationReport::default()),
        }
    }

    fn plan(&self, tree: &TreeArena, scope: Index) -> DomainResult<(Vec<Decision>, PropagationReport)> {
        tree.node(scope)?;
        let snapshot: Vec<Index> = tree.iter_subtree(scope).map(|(idx, _)| idx).collect();
        let mut decisions = Vec::new();
        let mut report = PropagationReport::default();

        for idx in snapshot {
            let node = tree.node(idx)?;

            if let Some(cond) = &node.data.conditional {
                report.evaluated += 1;
                match self.evaluate_at(tree, idx, cond)? {
                    Ok(visible) => decisions.push(Decision::Visibility { idx, visible }),
                    Err(e) => skip(&mut report, &node.data.id, e),
                }
            }

            if node.data.group.is_some() {
                match self.select_alternative(tree, idx, &mut report)? {
                    Ok(selection) => decisions.push(Decision::Selection { idx, selection }),
                    Err(e) => skip(&mut report, &node.data.id, e),
                }
            }

            if let Some(brackets) = &node.data.brackets {
                report.evaluated += 1;
                match self.evaluate_at(tree, idx, &brackets.condition)? {
                    Ok(visible) => decisions.push(Decision::Brackets { idx, visible }),
                    Err(e) => skip(&mut report, &node.data.id, e),
                }
            }
        }

        Ok((decisions, report))
    }

    // First child whose condition holds; children without a condition always qualify.
    fn select_alternative(
        &self,
        tree: &TreeArena,
        group: Index,
        report: &mut PropagationReport,
    ) -> DomainResult<Result<Selection, DomainError>> {
        for (i, &child) in tree.node(group)?.children.iter().enumerate() {
            let Some(cond) = &tree.node(child)?.data.conditional else {
                return Ok(Ok(Selection::Child(i)));
            };
            report.evaluated += 1;
            match self.evaluate_at(tree, child, cond)? {
                Ok(true) => return Ok(Ok(Selection::Child(i))),
                Ok(false) => {}
                Err(e) => return Ok(Err(e)),
            }
        }
        Ok(Ok(Selection::Placeholder))
    }

    // Outer error: the tree is broken. Inner error: the condition is malformed.
    fn evaluate_at(&self, tree: &TreeArena, idx: Index, src: &str) -> DomainResult<Verdict> {
        let ctx = resolve_context(tree, idx)?;
        Ok(Expr::parse(src).map(|expr| expr.evaluate(&ctx, self.policy)))
    }
}

fn skip(report: &mut PropagationReport, id: &str, error: DomainError) {
    warn!("skipping {}: {}", id, error);
    report.skipped.push(SkippedNode {
        id: id.to_string(),
        reason: error.to_string(),
    });
}

/// Returns the number of distinct nodes whose state changed.
fn apply(tree: &mut TreeArena, decisions: &[Decision]) -> DomainResult<usize> {
    let mut changed = HashSet::new();
    for decision in decisions {
        let (idx, updated) = match *decision {
            Decision::Visibility { idx, visible } => {
                let data = &mut tree.node_mut(idx)?.data;
                let before = data.hidden;
                data.hidden = !visible;
                (idx, before != data.hidden)
            }
            Decision::Selection { idx, selection } => {
                let updated = match tree.node_mut(idx)?.data.group.as_mut() {
                    Some(group) if group.selection != Some(selection) => {
                        group.selection = Some(selection);
                        true
                    }
                    _ => false,
                };
                (idx, updated)
            }
            Decision::Brackets { idx, visible } => {
                let updated = tree
                    .node_mut(idx)?
                    .data
                    .brackets
                    .as_mut()
                    .is_some_and(|b| b.apply(visible));
                (idx, updated)
            }
        };
        if updated {
            changed.insert(idx);
        }
    }
    Ok(changed.len())
}

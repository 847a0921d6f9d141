//! Text rendering of document trees with their presentation state.

use generational_arena::Index;
use termtree::Tree;

use crate::domain::{NodeData, Selection, TreeArena};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for TreeArena {
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root_idx) = self.root() else {
            return Tree::new("Empty tree".to_string());
        };

        fn build_tree(arena: &TreeArena, node_idx: Index) -> Tree<String> {
            let Some(node) = arena.get_node(node_idx) else {
                return Tree::new(format!("<missing {:?}>", node_idx));
            };
            let mut tree = Tree::new(describe(&node.data, node.children.len()));
            for &child_idx in &node.children {
                tree.push(build_tree(arena, child_idx));
            }
            tree
        }

        build_tree(self, root_idx)
    }
}

/// One-line summary: id followed by annotations and presentation state.
pub fn describe(data: &NodeData, child_count: usize) -> String {
    let mut parts = vec![data.id.clone()];
    if let Some(decl) = &data.property {
        parts.push(format!("{{{}}}", decl));
    }
    if let Some(cond) = &data.conditional {
        parts.push(format!("if {}", cond));
    }
    if let Some(group) = &data.group {
        parts.push(match group.selection {
            Some(Selection::Placeholder) => {
                format!("group -> placeholder #{}", Selection::Placeholder.index(child_count))
            }
            Some(Selection::Child(i)) => format!("group -> #{}", i),
            None => "group -> ?".to_string(),
        });
    }
    if let Some(b) = &data.brackets {
        if b.is_suppressed() {
            parts.push(format!("brackets elided ({}…{}) if {}", b.shadow_open, b.shadow_close, b.condition));
        } else {
            parts.push(format!("brackets {}…{} if {}", b.open, b.close, b.condition));
        }
    }
    for (flag, on) in &data.flags {
        parts.push(format!("{}={}", flag, if *on { "show" } else { "hide" }));
    }
    if data.hidden {
        parts.push("[hidden]".to_string());
    }
    parts.join(" ")
}

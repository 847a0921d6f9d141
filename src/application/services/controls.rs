//! Input control descriptors for declared properties.
//!
//! Hosts render one control per declaration and route edits back through
//! [`ChangeTrigger::on_property_change`](super::trigger::ChangeTrigger::on_property_change).

use crate::domain::{PropertyType, TreeArena};

const STRING_FIELD_SIZE: usize = 15;
const INTEGER_FIELD_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox { checked: bool },
    TextField { value: String, size: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyControl {
    /// Node carrying the declaration
    pub node_id: String,
    pub name: String,
    /// Description if given, property name otherwise
    pub label: String,
    pub kind: ControlKind,
}

/// One control per property declaration, in document order.
pub fn property_controls(tree: &TreeArena) -> Vec<PropertyControl> {
    tree.iter()
        .filter_map(|(_, node)| {
            let decl = node.data.property.as_ref()?;
            let kind = match decl.kind {
                PropertyType::Boolean => ControlKind::Checkbox {
                    checked: decl.value == "true",
                },
                PropertyType::String => ControlKind::TextField {
                    value: decl.value.clone(),
                    size: STRING_FIELD_SIZE,
                },
                PropertyType::Integer => ControlKind::TextField {
                    value: decl.value.clone(),
                    size: INTEGER_FIELD_SIZE,
                },
            };
            Some(PropertyControl {
                node_id: node.data.id.clone(),
                name: decl.name.clone(),
                label: decl.description.clone().unwrap_or_else(|| decl.name.clone()),
                kind,
            })
        })
        .collect()
}

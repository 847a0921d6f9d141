//! Domain entities: typed node annotations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Type of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Boolean,
    String,
    Integer,
}

impl PropertyType {
    /// Check that `value` is acceptable for this type.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            PropertyType::Boolean => value == "true" || value == "false",
            PropertyType::String => true,
            // Stored verbatim, so surrounding whitespace would never match `=`
            PropertyType::Integer => value.trim() == value && value.parse::<i64>().is_ok(),
        }
    }
}

impl FromStr for PropertyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "boolean" => Ok(PropertyType::Boolean),
            "string" => Ok(PropertyType::String),
            "integer" => Ok(PropertyType::Integer),
            other => Err(DomainError::InvalidPropertyType(other.to_string())),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Boolean => write!(f, "boolean"),
            PropertyType::String => write!(f, "string"),
            PropertyType::Integer => write!(f, "integer"),
        }
    }
}

/// A named value declared on a node and visible to its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub kind: PropertyType,
    /// Always held as a string, the way input controls deliver it
    pub value: String,
    /// Human-readable label for the input control
    pub description: Option<String>,
}

impl PropertyDecl {
    /// Create a declaration, validating `value` against `kind`.
    pub fn new(name: &str, kind: PropertyType, value: &str) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidPropertyDeclaration(
                "empty property name".to_string(),
            ));
        }
        let decl = Self {
            name: name.to_string(),
            kind,
            value: String::new(),
            description: None,
        };
        decl.check_value(value)?;
        Ok(Self {
            value: value.to_string(),
            ..decl
        })
    }

    /// Parse the `name:type` declaration form.
    ///
    /// `verbose:boolean` declares a boolean property `verbose`.
    pub fn parse(declaration: &str, value: &str) -> DomainResult<Self> {
        let (name, kind) = declaration.split_once(':').ok_or_else(|| {
            DomainError::InvalidPropertyDeclaration(format!(
                "expected `name:type`, got `{}`",
                declaration
            ))
        })?;
        Self::new(name, kind.parse()?, value)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn check_value(&self, value: &str) -> DomainResult<()> {
        if self.kind.accepts(value) {
            Ok(())
        } else {
            Err(DomainError::InvalidPropertyValue {
                name: self.name.clone(),
                kind: self.kind.to_string(),
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Display for PropertyDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.name, self.kind, self.value)
    }
}

/// Which alternative of a group is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 0-based index of the selected child
    Child(usize),
    /// No child qualified; the empty placeholder after the last child is shown
    Placeholder,
}

impl Selection {
    /// 0-based index, the placeholder occupying the slot after the last child.
    pub fn index(self, child_count: usize) -> usize {
        match self {
            Selection::Child(i) => i,
            Selection::Placeholder => child_count,
        }
    }
}

/// Marks a node whose children are mutually exclusive alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// None until the first evaluation pass
    pub selection: Option<Selection>,
}

/// Conditional enclosing marks around a node's content.
///
/// While suppressed, the marks live in the shadow fields and the visible
/// marks are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brackets {
    pub condition: String,
    pub open: String,
    pub close: String,
    pub shadow_open: String,
    pub shadow_close: String,
}

impl Brackets {
    pub fn new(condition: impl Into<String>, open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            open: open.into(),
            close: close.into(),
            shadow_open: String::new(),
            shadow_close: String::new(),
        }
    }

    pub fn is_suppressed(&self) -> bool {
        !self.shadow_open.is_empty() || !self.shadow_close.is_empty()
    }

    /// Move visible marks into the shadow fields. Returns true if anything moved.
    pub fn suppress(&mut self) -> bool {
        let mut changed = false;
        if !self.open.is_empty() {
            self.shadow_open = std::mem::take(&mut self.open);
            changed = true;
        }
        if !self.close.is_empty() {
            self.shadow_close = std::mem::take(&mut self.close);
            changed = true;
        }
        changed
    }

    /// Move shadowed marks back. Returns true if anything moved.
    pub fn restore(&mut self) -> bool {
        let mut changed = false;
        if !self.shadow_open.is_empty() {
            self.open = std::mem::take(&mut self.shadow_open);
            changed = true;
        }
        if !self.shadow_close.is_empty() {
            self.close = std::mem::take(&mut self.shadow_close);
            changed = true;
        }
        changed
    }

    pub fn apply(&mut self, visible: bool) -> bool {
        if visible {
            self.restore()
        } else {
            self.suppress()
        }
    }
}

//! Domain layer: document model, condition language, context resolution
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod context;
pub mod entities;
pub mod error;
pub mod expr;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::{NodeSpec, TreeBuilder};
pub use context::{resolve_context, Context};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use expr::{evaluate, evaluate_with, ComparisonPolicy, Expr};

//! jobad: conditional visibility for annotated documents.
//!
//! Nodes of a document tree declare typed properties and carry boolean
//! conditions over the properties in scope. Evaluating the document hides
//! or shows conditional nodes, picks one alternative per group, and elides
//! or restores bracket marks. Changing a property re-evaluates what it can
//! affect.
//!
//! Layers, innermost first:
//! - [`domain`]: expressions, tree arena, context resolution
//! - [`application`]: propagation, change trigger, document loading
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

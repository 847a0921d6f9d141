//! Application services

pub mod controls;
pub mod document;
pub mod trigger;
pub mod visibility;

pub use controls::{property_controls, ControlKind, PropertyControl};
pub use document::DocumentService;
pub use trigger::{ChangeScope, ChangeTrigger, FlagSetting};
pub use visibility::{PropagationReport, SkippedNode, VisibilityService};

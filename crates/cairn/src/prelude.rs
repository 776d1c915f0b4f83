//! Convenience re-exports: `use cairn::prelude::*` for the common items.

pub use crate::blueprint::{
    ComponentBlueprint, ComponentRegistry, Diagnostic, DiagnosticKind, EntityBlueprint,
    FromProperty, Materializer, load_blueprint, save_blueprint,
};
pub use crate::components::{PhysicsBody, PhysicsType};
pub use crate::ecs::{
    Commands, Component, ComponentState, ComponentUpdates, Entity, EntityKind, EntityState,
    GameEntity, HookContext, NodeId, PendingChanges, Schedule, System, TransformKind, World,
};
pub use crate::error::{
    BlueprintError, ConversionError, HierarchyError, MaterializeError, PropertyError,
};
pub use crate::impl_structural_property;
pub use crate::math::{Rect, Vec2};
#[cfg(feature = "diagnostics")]
pub use crate::diag::{HierarchySnapshot, WorldStats};

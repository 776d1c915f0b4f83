//! # Entity Runtime
//!
//! Entities here are objects, not rows: each one owns an ordered list of
//! boxed components, a transform node in the world's hierarchy and a kind.
//! The interesting part is the lifecycle protocol (spawn order, deferred
//! removal, exactly-once hooks), not storage layout.
//!
//! ## Module Overview
//!
//! - [`entity`]: Generational entity handles
//! - [`hierarchy`]: Arena transform tree with eager world-transform propagation
//! - [`component`]: `Component` / `EntityKind` traits and hook context
//! - [`commands`]: Deferred edits issued from hooks
//! - [`registry`]: Active-entity list and its frame-boundary queues
//! - [`world`]: The entity manager owning all of the above
//! - [`system`]: `System` trait and the `Schedule` frame driver

pub mod commands;
pub mod component;
pub mod entity;
pub mod hierarchy;
pub mod registry;
pub mod system;
pub mod world;

pub use commands::{Command, Commands};
pub use component::{Component, ComponentState, EntityKind, GameEntity, HookContext};
pub use entity::Entity;
pub use hierarchy::{NodeId, TransformKind, TransformNode, TransformTree};
pub use registry::{ActiveRegistry, PendingChanges};
pub use system::{ComponentUpdates, Schedule, System};
pub use world::{EntityState, World};

//! # Cairn: Blueprint-Driven Entity Runtime
//!
//! The runtime core of a small 2D game engine: entities built from JSON
//! blueprints, a parent/child transform hierarchy, and a lifecycle protocol
//! (spawn, start, update, destroy) that stays consistent across whole
//! entity trees.
//!
//! ```text
//! EntityBlueprint ──Materializer──► built entities ──World::spawn──► active
//!   (JSON file)      + ComponentRegistry    (no hooks)     (on_start, queued)
//! ```
//!
//! Start with `use cairn::prelude::*`, create a [`World`](ecs::World) and a
//! [`ComponentRegistry`](blueprint::ComponentRegistry), then drive frames
//! with a [`Schedule`](ecs::Schedule).

pub mod blueprint;
pub mod components;
pub mod ecs;
pub mod error;
pub mod math;
pub mod prelude;

#[cfg(feature = "diagnostics")]
pub mod diag;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

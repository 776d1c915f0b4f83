//! # Components: Behaviour Attached to Entities
//!
//! A [`Component`] is a unit of data and behaviour owned by exactly one
//! entity. The world calls its lifecycle hooks in a fixed order:
//!
//! ```text
//!  Created ──on_start──► Started ──on_destroy──► Destroyed
//!     │                    │  ▲                     ▲
//!     │                    └──┘ on_update /         │
//!     │                         on_trigger /        │
//!     │                         on_collision        │
//!     └────────── destroyed before spawn (no hook) ─┘
//! ```
//!
//! Each slot tracks its component's [`ComponentState`], which is how the
//! world guarantees `on_start` and `on_destroy` fire exactly once, and that
//! nothing is updated before it started.
//!
//! Entities themselves also have a type: an [`EntityKind`]. Most entities
//! are plain [`GameEntity`]s, but game code can define its own kinds (a
//! `Player`, a `LevelRoot`) with an `on_init` hook and find them again with
//! [`World::entity_by_kind`](super::world::World::entity_by_kind).

use std::any::Any;

use crate::ecs::commands::Commands;
use crate::ecs::hierarchy::{NodeId, TransformNode, TransformTree};
use crate::ecs::Entity;
use crate::math::Vec2;

/// Upcast helper so trait objects can be downcast to their concrete type.
///
/// Blanket-implemented for every `'static` type; never implement it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What the world hands to a lifecycle hook.
pub struct HookContext<'w> {
    entity: Entity,
    node: NodeId,
    tree: &'w TransformTree,
    /// Deferred edits, applied after the current dispatch pass.
    pub commands: &'w mut Commands,
}

impl<'w> HookContext<'w> {
    pub(crate) fn new(
        entity: Entity,
        node: NodeId,
        tree: &'w TransformTree,
        commands: &'w mut Commands,
    ) -> Self {
        Self {
            entity,
            node,
            tree,
            commands,
        }
    }

    /// The entity whose hook is running.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The entity's transform node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn transforms(&self) -> &TransformTree {
        self.tree
    }

    pub fn transform(&self) -> Option<&TransformNode> {
        self.tree.get(self.node)
    }

    pub fn world_position(&self) -> Vec2 {
        self.transform().map(TransformNode::world_position).unwrap_or_default()
    }

    pub fn world_size(&self) -> Vec2 {
        self.transform().map(TransformNode::world_size).unwrap_or(Vec2::ONE)
    }

    /// Queue this entity for destruction once the current pass ends.
    pub fn destroy_self(&mut self) {
        self.commands.destroy(self.entity);
    }
}

/// A unit of behaviour attached to an entity.
///
/// Every hook has an empty default, so a pure data component is just
/// `impl Component for Health {}`.
pub trait Component: AsAny {
    /// The owning entity was attached to the world. Fires once.
    fn on_start(&mut self, _cx: &mut HookContext<'_>) {}

    /// Once per frame while the entity is active.
    fn on_update(&mut self, _cx: &mut HookContext<'_>, _delta: f32) {}

    /// The owning entity is being destroyed. Fires once.
    fn on_destroy(&mut self, _cx: &mut HookContext<'_>) {}

    /// The owning entity's trigger collider overlapped `other`.
    fn on_trigger(&mut self, _cx: &mut HookContext<'_>, _other: Entity) {}

    /// The owning entity's collider touched `other`.
    fn on_collision(&mut self, _cx: &mut HookContext<'_>, _other: Entity) {}

    /// A one-line summary of the component's state for the debug tree.
    fn debug_stats(&self) -> String {
        String::new()
    }
}

impl<'a> dyn Component + 'a {
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Where a component is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Created,
    Started,
    Destroyed,
}

/// A component together with its owner, display name and lifecycle state.
pub(crate) struct ComponentSlot {
    pub owner: Entity,
    /// Registered type name, or the short Rust type name.
    pub name: String,
    pub state: ComponentState,
    pub component: Box<dyn Component>,
}

impl ComponentSlot {
    pub fn new(owner: Entity, name: String, component: Box<dyn Component>) -> Self {
        Self {
            owner,
            name,
            state: ComponentState::Created,
            component,
        }
    }

    pub fn start(&mut self, cx: &mut HookContext<'_>) {
        if self.state == ComponentState::Created {
            self.component.on_start(cx);
            self.state = ComponentState::Started;
        }
    }

    pub fn update(&mut self, cx: &mut HookContext<'_>, delta: f32) {
        if self.state == ComponentState::Started {
            self.component.on_update(cx, delta);
        }
    }

    /// A component that never started goes straight to `Destroyed` without
    /// its hook.
    pub fn destroy(&mut self, cx: &mut HookContext<'_>) {
        if self.state == ComponentState::Started {
            self.component.on_destroy(cx);
        }
        self.state = ComponentState::Destroyed;
    }

    pub fn trigger(&mut self, cx: &mut HookContext<'_>, other: Entity) {
        if self.state == ComponentState::Started {
            self.component.on_trigger(cx, other);
        }
    }

    pub fn collision(&mut self, cx: &mut HookContext<'_>, other: Entity) {
        if self.state == ComponentState::Started {
            self.component.on_collision(cx, other);
        }
    }
}

/// The concrete type of an entity.
pub trait EntityKind: AsAny {
    /// Runs once when the entity is spawned, before any component starts.
    fn on_init(&mut self, _cx: &mut HookContext<'_>) {}
}

impl<'a> dyn EntityKind + 'a {
    pub fn is<T: EntityKind>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: EntityKind>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// The plain entity kind. Blueprints always materialize into this.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GameEntity;

impl EntityKind for GameEntity {}

//! # Active Registry: What the Frame Loop Updates
//!
//! The frame loop iterates the list of active entities every frame. Spawning
//! or destroying while that iteration is running would invalidate it, so
//! both go through queues:
//!
//! ```text
//!   spawn_entity ──► to_add ────┐
//!                               ├── apply_pending (frame boundary) ──► active
//!   destroy_entity ► to_remove ─┘
//! ```
//!
//! The queues are append-only between boundaries. [`ActiveRegistry::apply`]
//! is the only place `active` changes.

use crate::ecs::Entity;

/// The outcome of one frame-boundary application.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingChanges {
    /// Entities that became active, in queue order.
    pub added: Vec<Entity>,
    /// Entities that left the registry, in queue order.
    pub removed: Vec<Entity>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Active entities plus the queues feeding them.
#[derive(Debug, Default)]
pub struct ActiveRegistry {
    active: Vec<Entity>,
    to_add: Vec<Entity>,
    to_remove: Vec<Entity>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active entities in activation order.
    pub fn active(&self) -> &[Entity] {
        &self.active
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.active.contains(&entity)
    }

    pub fn pending_additions(&self) -> &[Entity] {
        &self.to_add
    }

    pub fn pending_removals(&self) -> &[Entity] {
        &self.to_remove
    }

    pub fn queue_add(&mut self, entity: Entity) {
        self.to_add.push(entity);
    }

    pub fn queue_remove(&mut self, entity: Entity) {
        if !self.to_remove.contains(&entity) {
            self.to_remove.push(entity);
        }
    }

    /// Move the queues into the active list. Additions land first, so an
    /// entity spawned and destroyed in the same frame ends up removed.
    ///
    /// `removed` lists every queued removal, active or not: the caller still
    /// has to tear those entities down structurally.
    pub fn apply(&mut self) -> PendingChanges {
        let mut changes = PendingChanges::default();

        for entity in std::mem::take(&mut self.to_add) {
            if !self.active.contains(&entity) {
                self.active.push(entity);
                changes.added.push(entity);
            }
        }

        let removals = std::mem::take(&mut self.to_remove);
        if !removals.is_empty() {
            self.active.retain(|e| !removals.contains(e));
        }
        changes.removed = removals;
        changes
    }
}

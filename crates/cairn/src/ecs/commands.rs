//! Deferred world edits requested from inside lifecycle hooks.
//!
//! Hooks run while the world is busy dispatching to components, so they
//! cannot destroy entities directly. They push requests into [`Commands`]
//! instead; the world drains the queue once the dispatch pass is over (see
//! [`World::apply_commands`](super::world::World::apply_commands)).

use crate::ecs::Entity;

/// A queued world edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the destroy cascade for this entity.
    Destroy(Entity),
}

/// Queue of [`Command`]s, applied in the order they were issued.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that `entity` (and its descendants) be destroyed.
    pub fn destroy(&mut self, entity: Entity) {
        self.queue.push(Command::Destroy(entity));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

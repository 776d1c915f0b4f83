//! # Entity Handles
//!
//! An [`Entity`] is a small copyable handle. The entity's actual data (name,
//! transform node, components) lives in the [`World`](super::world::World);
//! the handle is only the key used to look it up.
//!
//! ## Generations
//!
//! Entities are removed at frame boundaries and their slots get recycled. A
//! component that remembered `other: Entity` from an old collision must not
//! suddenly point at whatever was spawned into the same slot afterwards, so
//! every slot carries a generation counter:
//!
//! ```text
//! Entity { index: 3, generation: 0 }  ← "Rock", destroyed at frame 12
//! Entity { index: 3, generation: 1 }  ← "Chip", spawned at frame 13
//! ```
//!
//! Lookups compare both numbers, so the stale "Rock" handle resolves to
//! nothing instead of to "Chip".

use std::fmt;

/// A handle to an entity in a [`World`](super::world::World).
///
/// Handles are created by [`World::create_entity`](super::world::World::create_entity)
/// and stay valid until the entity is structurally removed by
/// [`World::apply_pending`](super::world::World::apply_pending).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Slot index, recycled after removal.
    pub(crate) index: u32,
    /// Bumped every time the slot is recycled.
    pub(crate) generation: u32,
}

impl Entity {
    /// Raw slot index. Useful for diagnostics and debug output.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation. Useful for diagnostics.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity handles and recycles freed slots.
///
/// ```text
/// generations: [1, 0, 0]   ← one counter per slot ever handed out
/// free_list:   [0]         ← slot 0 was freed and can be reused
/// ```
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Hand out a handle, reusing a freed slot when one is available.
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            Entity {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Free a handle's slot. Returns `false` if the handle was already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.generations[entity.index as usize] += 1;
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.index as usize)
            .is_some_and(|&generation| generation == entity.generation)
    }

    /// Number of handles currently alive.
    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free_list.len()
    }

    /// Number of freed slots waiting for reuse.
    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn free_count(&self) -> usize {
        self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handles_are_sequential() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!((a.index, a.generation), (0, 0));
        assert_eq!((b.index, b.generation), (1, 0));
    }

    #[test]
    fn recycled_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let rock = alloc.allocate();
        assert!(alloc.deallocate(rock));
        let chip = alloc.allocate();
        assert_eq!(chip.index, rock.index);
        assert_eq!(chip.generation, 1);
        assert!(!alloc.is_alive(rock));
        assert!(alloc.is_alive(chip));
    }

    #[test]
    fn stale_handle_cannot_be_freed_twice() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.free_count(), 1);
    }

    #[test]
    fn alive_count_tracks_frees() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let _b = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        alloc.deallocate(a);
        assert_eq!(alloc.alive_count(), 1);
    }

    #[test]
    fn unknown_index_is_not_alive() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.is_alive(Entity {
            index: 7,
            generation: 0
        }));
    }
}

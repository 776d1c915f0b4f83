//! Diagnostics: world counters and a serializable hierarchy snapshot.
//!
//! Enabled by the `diagnostics` feature (on by default). Both snapshots are
//! plain data with `Serialize`, so a tool can dump them as JSON:
//!
//! ```ignore
//! let stats = world.stats();
//! log::info!("{} entities, {} spawned last frame", stats.entity_count, stats.spawned_last_frame);
//! std::fs::write("hierarchy.json", world.hierarchy_snapshot().to_json()?)?;
//! ```

use serde::Serialize;

use crate::ecs::hierarchy::NodeId;
use crate::ecs::{ComponentState, World};
use crate::math::Vec2;

// ── World counters ───────────────────────────────────────────────────────

/// Entity and registry counts, plus what the last frame boundary did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    /// Live entities, spawned or not.
    pub entity_count: usize,
    pub active_count: usize,
    pub pending_additions: usize,
    pub pending_removals: usize,
    /// Transform nodes, the world root included.
    pub transform_nodes: usize,
    /// Entity slots waiting to be reused.
    pub free_slots: usize,
    /// Spawns between the last two frame boundaries.
    pub spawned_last_frame: u32,
    /// Destroys between the last two frame boundaries.
    pub destroyed_last_frame: u32,
}

// ── Hierarchy snapshot ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct HierarchySnapshot {
    /// Subtrees attached directly to the world root.
    pub roots: Vec<EntitySnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub generation: u32,
    pub name: String,
    pub active: bool,
    pub world_position: Vec2,
    pub world_size: Vec2,
    pub components: Vec<ComponentSnapshot>,
    pub children: Vec<EntitySnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentSnapshot {
    pub name: String,
    pub started: bool,
    /// The component's `debug_stats()` line.
    pub stats: String,
}

impl HierarchySnapshot {
    /// Total number of entities in the snapshot.
    pub fn len(&self) -> usize {
        fn count(e: &EntitySnapshot) -> usize {
            1 + e.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl World {
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            entity_count: self.entity_count(),
            active_count: self.active_entities().len(),
            pending_additions: self.pending_additions().len(),
            pending_removals: self.pending_removals().len(),
            transform_nodes: self.transforms().len(),
            free_slots: self.free_slots(),
            spawned_last_frame: self.last_frame.spawned,
            destroyed_last_frame: self.last_frame.destroyed,
        }
    }

    /// Everything attached below the world root, as nested snapshots.
    pub fn hierarchy_snapshot(&self) -> HierarchySnapshot {
        let roots = self
            .transforms()
            .children(self.root())
            .iter()
            .filter_map(|&node| self.snapshot_node(node))
            .collect();
        HierarchySnapshot { roots }
    }

    fn snapshot_node(&self, node_id: NodeId) -> Option<EntitySnapshot> {
        let node = self.transforms().get(node_id)?;
        let entity = node.owner()?;

        let components = self
            .component_states(entity)
            .into_iter()
            .zip(self.components(entity))
            .map(|((name, state), component)| ComponentSnapshot {
                name: name.to_string(),
                started: state == ComponentState::Started,
                stats: component.debug_stats(),
            })
            .collect();

        Some(EntitySnapshot {
            id: entity.index(),
            generation: entity.generation(),
            name: self.name(entity).unwrap_or_default().to_string(),
            active: self.is_active(entity),
            world_position: node.world_position(),
            world_size: node.world_size(),
            components,
            children: node
                .children()
                .iter()
                .filter_map(|&child| self.snapshot_node(child))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PhysicsBody;

    #[test]
    fn stats_follow_frame_boundaries() {
        let mut world = World::new();
        let a = world.create_entity("a");
        let b = world.create_entity("b");
        world.attach_child(a, b).unwrap();
        world.spawn(a);

        let before = world.stats();
        assert_eq!(before.entity_count, 2);
        assert_eq!(before.pending_additions, 2);
        assert_eq!(before.spawned_last_frame, 0);

        world.apply_pending();
        let after = world.stats();
        assert_eq!(after.active_count, 2);
        assert_eq!(after.spawned_last_frame, 2);
        assert_eq!(after.transform_nodes, 3);

        world.destroy_entity(a);
        world.apply_pending();
        let torn_down = world.stats();
        assert_eq!(torn_down.destroyed_last_frame, 2);
        assert_eq!(torn_down.spawned_last_frame, 0);
        assert_eq!(torn_down.entity_count, 0);
        assert_eq!(torn_down.free_slots, 2);
    }

    #[test]
    fn snapshot_mirrors_hierarchy() {
        let mut world = World::new();
        let rock = world.create_entity("Rock");
        let chip = world.create_entity("Chip");
        world.set_local(chip, Vec2::new(1.0, 1.0), Vec2::ONE);
        world.add_component(rock, PhysicsBody::default());
        world.attach_child(rock, chip).unwrap();
        world.spawn_at(rock, Vec2::new(10.0, 5.0));
        world.create_entity("unspawned");

        let snapshot = world.hierarchy_snapshot();
        assert_eq!(snapshot.len(), 2);
        let root = &snapshot.roots[0];
        assert_eq!(root.name, "Rock");
        assert!(!root.active);
        assert_eq!(root.components[0].name, "PhysicsBody");
        assert!(root.components[0].started);
        assert!(root.components[0].stats.contains("mass: 1"));
        assert_eq!(root.children[0].world_position, Vec2::new(11.0, 6.0));

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"Chip\""));
    }
}

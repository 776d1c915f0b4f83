//! # World: The Entity Manager
//!
//! The [`World`] is the single context object that owns everything at
//! runtime: entity records, the transform tree, the active registry and the
//! deferred command queue. Nothing in cairn is global; construct a world at
//! startup and drop it at teardown (or at the end of a test).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ World                                                    │
//! │                                                          │
//! │  allocator ── generational Entity handles                │
//! │  records: HashMap<u32, EntityRecord>                     │
//! │    name, kind, node, components (ordered), state         │
//! │  tree: TransformTree ── arena of nodes, world root       │
//! │  registry: ActiveRegistry ── active + to_add/to_remove   │
//! │  commands: Commands ── destroys requested by hooks       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! create_entity / Materializer   Built      structure only, no hooks
//! spawn_entity                   Spawned    attached, on_init, on_start
//!                                           children spawned depth-first
//!                                           queued for activation
//! apply_pending                             joins the active list
//! update_components                         on_update every frame
//! destroy_entity                 Destroyed  on_destroy, children first
//!                                           queued for removal
//! apply_pending                             record, node and handle freed
//! ```
//!
//! The active list only changes inside [`World::apply_pending`], which the
//! frame loop calls at frame boundaries. Everything else appends to queues.

use std::collections::HashMap;

use crate::ecs::commands::{Command, Commands};
use crate::ecs::component::{
    Component, ComponentSlot, ComponentState, EntityKind, GameEntity, HookContext,
};
use crate::ecs::entity::{Entity, EntityAllocator};
use crate::ecs::hierarchy::{NodeId, TransformKind, TransformNode, TransformTree};
use crate::ecs::registry::{ActiveRegistry, PendingChanges};
use crate::error::HierarchyError;
use crate::math::Vec2;

/// Where an entity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Constructed but not attached to the world.
    Built,
    /// Attached to the world and started.
    Spawned,
    /// Destroy hooks have run; removal happens at the next frame boundary.
    Destroyed,
}

struct EntityRecord {
    name: String,
    kind: Box<dyn EntityKind>,
    node: NodeId,
    components: Vec<ComponentSlot>,
    state: EntityState,
}

/// Per-boundary counters (diagnostics only).
#[cfg(feature = "diagnostics")]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FrameCounters {
    pub spawned: u32,
    pub destroyed: u32,
}

/// The runtime context owning all entities and the transform hierarchy.
pub struct World {
    allocator: EntityAllocator,
    records: HashMap<u32, EntityRecord>,
    tree: TransformTree,
    registry: ActiveRegistry,
    commands: Commands,
    /// Counters accumulating since the last frame boundary.
    #[cfg(feature = "diagnostics")]
    pub(crate) current_frame: FrameCounters,
    /// Counters of the frame that ended at the last boundary.
    #[cfg(feature = "diagnostics")]
    pub(crate) last_frame: FrameCounters,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            records: HashMap::new(),
            tree: TransformTree::new(),
            registry: ActiveRegistry::new(),
            commands: Commands::new(),
            #[cfg(feature = "diagnostics")]
            current_frame: FrameCounters::default(),
            #[cfg(feature = "diagnostics")]
            last_frame: FrameCounters::default(),
        }
    }

    fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.records.get(&entity.index)
    }

    fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.records.get_mut(&entity.index)
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create a plain [`GameEntity`] with a spatial transform at the origin.
    ///
    /// The entity is built but not spawned: no hooks run until
    /// [`spawn_entity`](Self::spawn_entity).
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        self.insert_entity(name.into(), Box::new(GameEntity), TransformKind::Spatial)
    }

    /// Create an entity of a custom [`EntityKind`].
    pub fn create_entity_with_kind(
        &mut self,
        name: impl Into<String>,
        kind: impl EntityKind,
    ) -> Entity {
        self.insert_entity(name.into(), Box::new(kind), TransformKind::Spatial)
    }

    /// Create a plain entity with an anchored UI transform.
    pub fn create_ui_entity(&mut self, name: impl Into<String>, anchor: Vec2) -> Entity {
        self.insert_entity(name.into(), Box::new(GameEntity), TransformKind::anchored(anchor))
    }

    fn insert_entity(
        &mut self,
        name: String,
        kind: Box<dyn EntityKind>,
        transform: TransformKind,
    ) -> Entity {
        let entity = self.allocator.allocate();
        let node = self.tree.insert(Some(entity), transform, Vec2::ZERO, Vec2::ONE);
        self.records.insert(
            entity.index,
            EntityRecord {
                name,
                kind,
                node,
                components: Vec::new(),
                state: EntityState::Built,
            },
        );
        entity
    }

    /// Attach a component. The component's owner is `entity` from now on.
    ///
    /// Components added to an already spawned entity start immediately.
    /// Returns `false` if the entity is dead or destroyed.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> bool {
        let name = short_type_name(std::any::type_name::<C>());
        self.add_boxed_component(entity, name, Box::new(component))
    }

    /// Attach an already boxed component under a display name.
    pub fn add_boxed_component(
        &mut self,
        entity: Entity,
        name: impl Into<String>,
        component: Box<dyn Component>,
    ) -> bool {
        let Some(record) = self.record_mut(entity) else {
            return false;
        };
        if record.state == EntityState::Destroyed {
            log::warn!("Cannot add a component to destroyed entity {entity:?}");
            return false;
        }
        let spawned = record.state == EntityState::Spawned;
        record.components.push(ComponentSlot::new(entity, name.into(), component));

        if spawned {
            let index = record.components.len() - 1;
            self.dispatch_slot(entity, index, |slot, cx| slot.start(cx));
            self.apply_commands();
        }
        true
    }

    /// Link `child`'s transform under `parent`'s without spawning anything.
    ///
    /// Used to assemble entity graphs before they are spawned.
    pub fn attach_child(&mut self, parent: Entity, child: Entity) -> Result<(), HierarchyError> {
        let parent_node = self.node_of(parent).ok_or(HierarchyError::MissingEntity(parent))?;
        let child_node = self.node_of(child).ok_or(HierarchyError::MissingEntity(child))?;
        self.tree.add_child(parent_node, child_node)
    }

    // ── Spawning ─────────────────────────────────────────────────────

    /// Spawn at the entity's current local position and size, under the
    /// world root.
    pub fn spawn(&mut self, entity: Entity) -> bool {
        let Some(node) = self.transform(entity) else {
            return false;
        };
        let (position, size) = (node.local_position(), node.local_size());
        self.spawn_entity(entity, position, size, None)
    }

    /// Spawn at `position` with unit size, under the world root.
    pub fn spawn_at(&mut self, entity: Entity, position: Vec2) -> bool {
        self.spawn_entity(entity, position, Vec2::ONE, None)
    }

    /// Attach a built entity to the world and start it.
    ///
    /// 1. local position/size are set and the node's owner is refreshed,
    /// 2. the node is attached under `parent` (or the world root),
    /// 3. the entity kind's `on_init` runs, then every component's
    ///    `on_start` in insertion order,
    /// 4. children already linked under the node are spawned depth-first
    ///    with their own local values, so no child starts before its parent,
    /// 5. the entity is queued for activation.
    ///
    /// `parent` must be the world root or the node of a spawned entity that
    /// is still attached under the root. Destroys requested by `on_init` or
    /// `on_start` hooks are applied before this returns.
    ///
    /// Returns `false` (and changes nothing) for dead, destroyed or already
    /// spawned entities, and for a parent that fails the check above.
    pub fn spawn_entity(
        &mut self,
        entity: Entity,
        position: Vec2,
        size: Vec2,
        parent: Option<NodeId>,
    ) -> bool {
        let spawned = self.spawn_tree(entity, position, size, parent);
        if spawned {
            self.apply_commands();
        }
        spawned
    }

    fn spawn_tree(
        &mut self,
        entity: Entity,
        position: Vec2,
        size: Vec2,
        parent: Option<NodeId>,
    ) -> bool {
        let Some(record) = self.record(entity) else {
            log::warn!("Cannot spawn dead entity {entity:?}");
            return false;
        };
        if record.state != EntityState::Built {
            log::warn!("Cannot spawn '{}' ({entity:?}): it is {:?}", record.name, record.state);
            return false;
        }
        let node = record.node;
        let parent = parent.unwrap_or(self.tree.root());
        if let Err(err) = self.check_spawn_parent(node, parent) {
            log::warn!("Cannot spawn {entity:?}: {err}");
            return false;
        }

        self.tree.set_local(node, position, size);
        self.tree.set_owner(node, entity);
        if let Err(err) = self.tree.add_child(parent, node) {
            log::warn!("Cannot spawn {entity:?}: {err}");
            return false;
        }
        if let Some(record) = self.record_mut(entity) {
            record.state = EntityState::Spawned;
        }

        self.init_kind(entity);
        self.dispatch(entity, |slot, cx| slot.start(cx));

        let children: Vec<NodeId> = self.tree.children(node).to_vec();
        for child_node in children {
            let Some(child) = self.tree.get(child_node) else {
                continue;
            };
            let Some(owner) = child.owner() else {
                continue;
            };
            let (child_position, child_size) = (child.local_position(), child.local_size());
            self.spawn_tree(owner, child_position, child_size, Some(node));
        }

        self.registry.queue_add(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.current_frame.spawned += 1;
        }
        log::debug!("Spawned {entity:?} '{}'", self.name(entity).unwrap_or_default());
        true
    }

    /// A spawn parent must hang off the world root and, unless it is the
    /// root, belong to a spawned entity.
    fn check_spawn_parent(&self, node: NodeId, parent: NodeId) -> Result<(), HierarchyError> {
        if !self.tree.contains(parent) {
            return Err(HierarchyError::MissingNode(parent));
        }
        if !self.tree.is_ancestor_or_self(self.tree.root(), parent) {
            return Err(HierarchyError::Detached(parent));
        }
        if let Some(owner) = self
            .tree
            .owner(parent)
            .filter(|&owner| self.state(owner) != Some(EntityState::Spawned))
        {
            return Err(HierarchyError::NotSpawned(owner));
        }
        if self.tree.is_ancestor_or_self(node, parent) {
            return Err(HierarchyError::Cycle {
                parent,
                child: node,
            });
        }
        Ok(())
    }

    // ── Destruction ──────────────────────────────────────────────────

    /// Run the destroy cascade for `entity`.
    ///
    /// Every component's `on_destroy` fires (insertion order), then every
    /// child entity is destroyed the same way, then the entity is queued for
    /// removal. Structural removal waits for [`apply_pending`](Self::apply_pending).
    /// Destroys requested by the `on_destroy` hooks are applied before this
    /// returns.
    ///
    /// Returns `false` for dead or already destroyed entities; hooks never
    /// fire twice.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let destroyed = self.destroy_tree(entity);
        if destroyed {
            self.apply_commands();
        }
        destroyed
    }

    fn destroy_tree(&mut self, entity: Entity) -> bool {
        let Some(record) = self.record_mut(entity) else {
            return false;
        };
        if record.state == EntityState::Destroyed {
            return false;
        }
        record.state = EntityState::Destroyed;
        let node = record.node;

        self.dispatch(entity, |slot, cx| slot.destroy(cx));

        let children: Vec<Entity> = self
            .tree
            .children(node)
            .iter()
            .filter_map(|&child| self.tree.owner(child))
            .collect();
        for child in children {
            self.destroy_tree(child);
        }

        self.registry.queue_remove(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.current_frame.destroyed += 1;
        }
        log::debug!("Destroyed {entity:?} '{}'", self.name(entity).unwrap_or_default());
        true
    }

    /// Destroy every entity and apply the removals right away.
    ///
    /// Meant for teardown, not for use while a frame is in progress.
    pub fn clear(&mut self) {
        let mut all: Vec<Entity> = self
            .records
            .values()
            .filter_map(|record| self.tree.owner(record.node))
            .collect();
        all.sort_by_key(|e| e.index);
        for entity in all {
            self.destroy_entity(entity);
        }
        self.apply_commands();
        self.apply_pending();
    }

    // ── Frame loop contract ──────────────────────────────────────────

    /// Frame boundary: activate queued spawns, then tear down queued
    /// removals (record, transform node and handle are freed).
    pub fn apply_pending(&mut self) -> PendingChanges {
        let changes = self.registry.apply();
        for &entity in &changes.removed {
            self.remove_entity(entity);
        }

        #[cfg(feature = "diagnostics")]
        {
            self.last_frame = std::mem::take(&mut self.current_frame);
        }
        changes
    }

    fn remove_entity(&mut self, entity: Entity) {
        if !self.allocator.is_alive(entity) {
            return;
        }
        if let Some(record) = self.records.remove(&entity.index) {
            self.tree.remove(record.node);
        }
        self.allocator.deallocate(entity);
    }

    /// Call `on_update` on every started component of every active entity.
    ///
    /// Iterates a snapshot of the active list. Entities destroyed during the
    /// pass are skipped from then on; destroy requests issued by hooks are
    /// applied after the pass.
    pub fn update_components(&mut self, delta: f32) {
        let snapshot = self.registry.active().to_vec();
        for entity in snapshot {
            if self.state(entity) != Some(EntityState::Spawned) {
                continue;
            }
            self.dispatch(entity, |slot, cx| slot.update(cx, delta));
        }
        self.apply_commands();
    }

    /// Deliver a trigger overlap between `entity` and `other` to `entity`'s
    /// components.
    pub fn notify_trigger(&mut self, entity: Entity, other: Entity) {
        if self.state(entity) == Some(EntityState::Spawned) {
            self.dispatch(entity, |slot, cx| slot.trigger(cx, other));
            self.apply_commands();
        }
    }

    /// Deliver a collision between `entity` and `other` to `entity`'s
    /// components.
    pub fn notify_collision(&mut self, entity: Entity, other: Entity) {
        if self.state(entity) == Some(EntityState::Spawned) {
            self.dispatch(entity, |slot, cx| slot.collision(cx, other));
            self.apply_commands();
        }
    }

    /// Apply every queued [`Command`]. Returns how many were applied.
    pub fn apply_commands(&mut self) -> usize {
        let mut applied = 0;
        while !self.commands.is_empty() {
            for command in self.commands.drain() {
                match command {
                    Command::Destroy(entity) => {
                        self.destroy_tree(entity);
                    }
                }
                applied += 1;
            }
        }
        applied
    }

    /// Queue of deferred commands, for code outside hooks that wants the
    /// same deferred behaviour.
    pub fn commands(&mut self) -> &mut Commands {
        &mut self.commands
    }

    pub fn active_entities(&self) -> &[Entity] {
        self.registry.active()
    }

    pub fn pending_additions(&self) -> &[Entity] {
        self.registry.pending_additions()
    }

    pub fn pending_removals(&self) -> &[Entity] {
        self.registry.pending_removals()
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.registry.is_active(entity)
    }

    // ── Hook dispatch ────────────────────────────────────────────────

    fn dispatch(
        &mut self,
        entity: Entity,
        mut f: impl FnMut(&mut ComponentSlot, &mut HookContext<'_>),
    ) {
        if !self.allocator.is_alive(entity) {
            return;
        }
        let Some(record) = self.records.get_mut(&entity.index) else {
            return;
        };
        let mut cx = HookContext::new(entity, record.node, &self.tree, &mut self.commands);
        for slot in &mut record.components {
            debug_assert_eq!(slot.owner, entity);
            f(slot, &mut cx);
        }
    }

    fn dispatch_slot(
        &mut self,
        entity: Entity,
        index: usize,
        f: impl FnOnce(&mut ComponentSlot, &mut HookContext<'_>),
    ) {
        let Some(record) = self.records.get_mut(&entity.index) else {
            return;
        };
        let mut cx = HookContext::new(entity, record.node, &self.tree, &mut self.commands);
        if let Some(slot) = record.components.get_mut(index) {
            f(slot, &mut cx);
        }
    }

    fn init_kind(&mut self, entity: Entity) {
        let Some(record) = self.records.get_mut(&entity.index) else {
            return;
        };
        let mut cx = HookContext::new(entity, record.node, &self.tree, &mut self.commands);
        record.kind.on_init(&mut cx);
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.record(entity).is_some()
    }

    /// Number of live entities, spawned or not.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn free_slots(&self) -> usize {
        self.allocator.free_count()
    }

    pub fn state(&self, entity: Entity) -> Option<EntityState> {
        self.record(entity).map(|r| r.state)
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.record(entity).map(|r| r.name.as_str())
    }

    /// Find a live, not destroyed entity by name: active entities first,
    /// then those waiting for activation.
    pub fn try_named(&self, name: &str) -> Option<Entity> {
        self.registry
            .active()
            .iter()
            .chain(self.registry.pending_additions())
            .copied()
            .find(|&e| {
                self.record(e)
                    .is_some_and(|r| r.state != EntityState::Destroyed && r.name == name)
            })
    }

    /// The first active entity whose kind is exactly `K`.
    pub fn entity_by_kind<K: EntityKind>(&self) -> Option<Entity> {
        self.registry
            .active()
            .iter()
            .copied()
            .find(|&e| self.record(e).is_some_and(|r| r.kind.as_ref().is::<K>()))
    }

    pub fn kind<K: EntityKind>(&self, entity: Entity) -> Option<&K> {
        self.record(entity)?.kind.as_ref().downcast_ref::<K>()
    }

    /// The first component of type `T` on `entity`.
    pub fn component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.record(entity)?
            .components
            .iter()
            .find_map(|slot| slot.component.as_ref().downcast_ref::<T>())
    }

    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.record_mut(entity)?
            .components
            .iter_mut()
            .find_map(|slot| slot.component.as_mut().downcast_mut::<T>())
    }

    /// All components of `entity` in insertion order.
    pub fn components(
        &self,
        entity: Entity,
    ) -> impl Iterator<Item = &(dyn Component + 'static)> + '_ {
        self.record(entity)
            .into_iter()
            .flat_map(|r| r.components.iter().map(|slot| slot.component.as_ref()))
    }

    /// Display names and lifecycle states of `entity`'s components.
    pub fn component_states(&self, entity: Entity) -> Vec<(&str, ComponentState)> {
        self.record(entity)
            .map(|r| r.components.iter().map(|s| (s.name.as_str(), s.state)).collect())
            .unwrap_or_default()
    }

    // ── Transforms ───────────────────────────────────────────────────

    /// The world root node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn transforms(&self) -> &TransformTree {
        &self.tree
    }

    pub fn node_of(&self, entity: Entity) -> Option<NodeId> {
        self.record(entity).map(|r| r.node)
    }

    pub fn transform(&self, entity: Entity) -> Option<&TransformNode> {
        self.tree.get(self.node_of(entity)?)
    }

    pub fn world_position(&self, entity: Entity) -> Option<Vec2> {
        self.transform(entity).map(TransformNode::world_position)
    }

    pub fn world_size(&self, entity: Entity) -> Option<Vec2> {
        self.transform(entity).map(TransformNode::world_size)
    }

    /// The entity owning the parent node, if the parent is not the root.
    pub fn parent_of(&self, entity: Entity) -> Option<Entity> {
        let parent = self.tree.parent(self.node_of(entity)?)?;
        self.tree.owner(parent)
    }

    /// Entities owning `entity`'s child nodes, in order.
    pub fn children_of(&self, entity: Entity) -> Vec<Entity> {
        let Some(node) = self.node_of(entity) else {
            return Vec::new();
        };
        self.tree
            .children(node)
            .iter()
            .filter_map(|&c| self.tree.owner(c))
            .collect()
    }

    pub fn set_local(&mut self, entity: Entity, position: Vec2, size: Vec2) -> bool {
        match self.node_of(entity) {
            Some(node) => self.tree.set_local(node, position, size),
            None => false,
        }
    }

    pub fn set_local_position(&mut self, entity: Entity, position: Vec2) -> bool {
        match self.node_of(entity) {
            Some(node) => self.tree.set_local_position(node, position),
            None => false,
        }
    }

    pub fn set_anchor(&mut self, entity: Entity, anchor: Vec2) -> bool {
        match self.node_of(entity) {
            Some(node) => self.tree.set_anchor(node, anchor),
            None => false,
        }
    }

    // ── Debug output ─────────────────────────────────────────────────

    /// Indented dump of everything attached below the world root: names,
    /// world transforms and each component's `debug_stats`.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .tree
            .children(self.tree.root())
            .iter()
            .rev()
            .map(|&n| (n, 0))
            .collect();

        while let Some((node_id, depth)) = stack.pop() {
            let Some(node) = self.tree.get(node_id) else {
                continue;
            };
            let indent = "  ".repeat(depth);
            let record = node.owner().and_then(|e| self.record(e).map(|r| (e, r)));
            match record {
                Some((entity, record)) => {
                    let p = node.world_position();
                    let s = node.world_size();
                    out.push_str(&format!(
                        "{indent}{} ({entity}) pos=({}, {}) size=({}, {})\n",
                        record.name, p.x, p.y, s.x, s.y
                    ));
                    for slot in &record.components {
                        let stats = slot.component.debug_stats();
                        if stats.is_empty() {
                            out.push_str(&format!("{indent}  - {}\n", slot.name));
                        } else {
                            out.push_str(&format!("{indent}  - {}: {stats}\n", slot.name));
                        }
                    }
                }
                None => out.push_str(&format!("{indent}<node {}>\n", node_id.0)),
            }
            for &child in node.children().iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path from a type name (`game::combat::Health` → `Health`).
pub(crate) fn short_type_name(full: &str) -> String {
    if let Some(angle) = full.find('<') {
        let prefix = &full[..angle];
        let short_prefix = prefix.rsplit("::").next().unwrap_or(prefix);
        let inner = &full[angle + 1..full.len() - 1];
        format!("{}<{}>", short_prefix, short_type_name(inner))
    } else {
        full.rsplit("::").next().unwrap_or(full).to_string()
    }
}

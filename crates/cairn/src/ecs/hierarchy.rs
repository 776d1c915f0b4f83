//! # Transform Hierarchy: Parent/Child Spatial Nodes
//!
//! Every entity owns exactly one [`TransformNode`]. Nodes live in an arena
//! ([`TransformTree`]) and refer to each other by [`NodeId`], so a child can
//! point at its parent (and back at its owning [`Entity`]) without any
//! reference cycles or shared ownership.
//!
//! ## Composition
//!
//! ```text
//! world_position(child) = world_position(parent) + local_position(child)
//! world_size(child)     = world_size(parent)     * local_size(child)
//! ```
//!
//! A node without a parent composes against the identity (position 0,
//! size 1), so its world values equal its local values. The tree's root
//! node sits at the origin with size 1; spawned entities hang below it.
//!
//! Rotation is not part of the model: blueprints carry a rotation value, but
//! nothing composes it.
//!
//! ## Propagation
//!
//! World values are cached on each node and refreshed eagerly: every edit
//! (re-parenting, moving, resizing) walks the affected subtree breadth-first,
//! parents before children, so a cached value is never stale when read.
//! [`TransformTree::compute_world_transform`] recomputes from scratch by
//! walking the parent chain; tests use it to check the cache.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tree = TransformTree::new();
//! let rock = tree.insert(None, TransformKind::Spatial, Vec2::new(10.0, 5.0), Vec2::ONE);
//! let chip = tree.insert(None, TransformKind::Spatial, Vec2::new(1.0, 1.0), Vec2::ONE);
//! tree.add_child(tree.root(), rock)?;
//! tree.add_child(rock, chip)?;
//! assert_eq!(tree.get(chip).unwrap().world_position(), Vec2::new(11.0, 6.0));
//! ```

use std::collections::VecDeque;

use crate::ecs::Entity;
use crate::error::HierarchyError;
use crate::math::{Rect, Vec2};

/// Index of a node inside a [`TransformTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// The two flavours of transform node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformKind {
    /// A plain game-world transform.
    Spatial,
    /// A UI transform aligned by a normalized anchor (0.0–1.0 per axis).
    Anchored { anchor: Vec2 },
}

impl TransformKind {
    /// A UI transform with its anchor clamped into the unit square.
    pub fn anchored(anchor: Vec2) -> Self {
        Self::Anchored {
            anchor: anchor.clamp(Vec2::ZERO, Vec2::ONE),
        }
    }
}

/// One spatial node of the hierarchy.
#[derive(Debug, Clone)]
pub struct TransformNode {
    owner: Option<Entity>,
    kind: TransformKind,
    local_position: Vec2,
    local_size: Vec2,
    world_position: Vec2,
    world_size: Vec2,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TransformNode {
    /// The entity this node belongs to. `None` for the world root.
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn local_position(&self) -> Vec2 {
        self.local_position
    }

    pub fn local_size(&self) -> Vec2 {
        self.local_size
    }

    pub fn world_position(&self) -> Vec2 {
        self.world_position
    }

    pub fn world_size(&self) -> Vec2 {
        self.world_size
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The alignment point used for [`bounds`](Self::bounds). Spatial nodes
    /// are centered.
    pub fn anchor(&self) -> Vec2 {
        match self.kind {
            TransformKind::Spatial => Vec2::splat(0.5),
            TransformKind::Anchored { anchor } => anchor,
        }
    }

    /// World-space rectangle covered by this node, placed so that its anchor
    /// point sits on the world position.
    pub fn bounds(&self) -> Rect {
        Rect::from_pivot(self.world_position, self.world_size, self.anchor())
    }
}

/// Compose a local transform against a parent's world transform.
fn compose(
    parent_world: Option<(Vec2, Vec2)>,
    local_position: Vec2,
    local_size: Vec2,
) -> (Vec2, Vec2) {
    let (parent_position, parent_size) = parent_world.unwrap_or((Vec2::ZERO, Vec2::ONE));
    (parent_position + local_position, parent_size * local_size)
}

/// Arena of transform nodes with a permanent world root.
pub struct TransformTree {
    nodes: Vec<Option<TransformNode>>,
    free: Vec<u32>,
    root: NodeId,
}

impl TransformTree {
    /// An empty tree holding only the world root at the origin.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.insert(None, TransformKind::Spatial, Vec2::ZERO, Vec2::ONE);
        tree
    }

    /// The world root every spawned entity ultimately hangs from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&TransformNode> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut TransformNode> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Children of `id` in insertion order. Empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn owner(&self, id: NodeId) -> Option<Entity> {
        self.get(id)?.owner
    }

    /// All descendants of `id` in breadth-first order (`id` excluded).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.children(id).to_vec();
        let mut i = 0;
        while i < out.len() {
            let next = self.children(out[i]).to_vec();
            out.extend(next);
            i += 1;
        }
        out
    }

    /// Insert a detached node. Its world values equal its local values until
    /// it is attached somewhere.
    pub fn insert(
        &mut self,
        owner: Option<Entity>,
        kind: TransformKind,
        local_position: Vec2,
        local_size: Vec2,
    ) -> NodeId {
        let node = TransformNode {
            owner,
            kind,
            local_position,
            local_size,
            world_position: local_position,
            world_size: local_size,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            self.nodes[index as usize] = Some(node);
            NodeId(index)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() as u32 - 1)
        }
    }

    pub(crate) fn set_owner(&mut self, id: NodeId, owner: Entity) {
        if let Some(node) = self.get_mut(id) {
            node.owner = Some(owner);
        }
    }

    /// Remove a node from the arena. Its children become detached roots.
    ///
    /// The world root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Option<TransformNode> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        self.detach(id);
        let node = self.nodes.get_mut(id.0 as usize)?.take()?;
        self.free.push(id.0);
        for &child in &node.children {
            if let Some(child_node) = self.get_mut(child) {
                child_node.parent = None;
            }
            self.refresh(child);
        }
        Some(node)
    }

    /// Returns `true` if `ancestor` is `node` itself or sits on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Append `child` to `parent`'s children.
    ///
    /// Adding a child that is already there is a no-op. A child that belongs
    /// to another parent is moved. The moved subtree's world values are
    /// refreshed.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HierarchyError> {
        if !self.contains(parent) {
            return Err(HierarchyError::MissingNode(parent));
        }
        if !self.contains(child) {
            return Err(HierarchyError::MissingNode(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(HierarchyError::Cycle { parent, child });
        }

        let already_linked =
            self.parent(child) == Some(parent) && self.children(parent).contains(&child);
        if already_linked {
            return Ok(());
        }

        self.detach(child);
        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = Some(parent);
        }
        if let Some(parent_node) = self.get_mut(parent) {
            if !parent_node.children.contains(&child) {
                parent_node.children.push(child);
            }
        }
        self.refresh(child);
        Ok(())
    }

    /// Unlink `id` from its parent. Does nothing for parentless nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
        self.refresh(id);
    }

    /// Set local position and size together.
    pub fn set_local(&mut self, id: NodeId, position: Vec2, size: Vec2) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        node.local_position = position;
        node.local_size = size;
        self.refresh(id);
        true
    }

    pub fn set_local_position(&mut self, id: NodeId, position: Vec2) -> bool {
        let Some(size) = self.get(id).map(|n| n.local_size) else {
            return false;
        };
        self.set_local(id, position, size)
    }

    pub fn set_local_size(&mut self, id: NodeId, size: Vec2) -> bool {
        let Some(position) = self.get(id).map(|n| n.local_position) else {
            return false;
        };
        self.set_local(id, position, size)
    }

    /// Move the anchor of a UI node (clamped into the unit square).
    ///
    /// Returns `false` for spatial nodes and unknown ids.
    pub fn set_anchor(&mut self, id: NodeId, anchor: Vec2) -> bool {
        match self.get_mut(id) {
            Some(node) if matches!(node.kind, TransformKind::Anchored { .. }) => {
                node.kind = TransformKind::anchored(anchor);
                true
            }
            _ => false,
        }
    }

    /// Recompute `(world_position, world_size)` of `id` from the local values
    /// along its parent chain, ignoring cached world values.
    pub fn compute_world_transform(&self, id: NodeId) -> Option<(Vec2, Vec2)> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            chain.push(node);
            current = node.parent;
        }

        let mut world = None;
        for node in chain.iter().rev() {
            world = Some(compose(world, node.local_position, node.local_size));
        }
        world
    }

    /// Refresh cached world values for `id` and everything below it.
    ///
    /// Breadth-first, so every parent is refreshed before its children.
    fn refresh(&mut self, id: NodeId) {
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let parent_world = self
                .parent(current)
                .and_then(|p| self.get(p))
                .map(|p| (p.world_position, p.world_size));

            let Some(node) = self.get_mut(current) else {
                continue;
            };
            let (position, size) = compose(parent_world, node.local_position, node.local_size);
            node.world_position = position;
            node.world_size = size;
            queue.extend(node.children.iter().copied());
        }
    }
}

impl Default for TransformTree {
    fn default() -> Self {
        Self::new()
    }
}

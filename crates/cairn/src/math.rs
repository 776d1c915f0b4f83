//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. Everything in cairn is 2D, so [`Vec2`] is the
//! workhorse: positions, sizes, velocities and UI anchors all use it.

pub use glam::Vec2;

/// An axis-aligned rectangle in world space.
///
/// Produced by [`TransformNode::bounds`](crate::ecs::hierarchy::TransformNode::bounds)
/// from a node's world position, world size and anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Build a rectangle of `size` whose `anchor` point (normalized, 0.0–1.0
    /// on each axis) sits at `pivot`.
    ///
    /// An anchor of (0,0) puts the pivot on the `min` corner, (1,1) on the
    /// `max` corner and (0.5,0.5) in the center.
    pub fn from_pivot(pivot: Vec2, size: Vec2, anchor: Vec2) -> Self {
        let min = pivot - anchor * size;
        Self {
            min,
            max: min + size,
        }
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Center point.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns `true` if `point` lies inside the rectangle (edges included).
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

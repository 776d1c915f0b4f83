//! Physics state for a moving entity.
//!
//! Only data lives here. Integrating velocities and resolving collisions is
//! the job of a physics system, which reports contacts back through
//! [`World::notify_collision`](crate::ecs::World::notify_collision).

use serde::{Deserialize, Serialize};

use crate::blueprint::ComponentRegistry;
use crate::ecs::Component;
use crate::math::Vec2;

/// How the physics step treats a body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsType {
    /// Moved by forces and collisions.
    #[default]
    Dynamic,
    /// Moved only by its own velocity; used for triggers.
    Kinematic,
}

crate::impl_structural_property!(PhysicsType);

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    pub physics_type: PhysicsType,
    pub mass: f32,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub drag_x: f32,
    pub drag_y: f32,
    /// Share of velocity kept per bounce, 0 to 1.
    pub elasticity: f32,
    /// Constant acceleration, screen-space (y down).
    pub gravity: Vec2,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            physics_type: PhysicsType::Dynamic,
            mass: 1.0,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag_x: 0.0,
            drag_y: 0.0,
            elasticity: 0.0,
            gravity: Vec2::new(0.0, 9.82),
        }
    }
}

impl PhysicsBody {
    /// Accelerate by `force / mass`. A massless body is given a mass of 1.
    pub fn add_force(&mut self, force: Vec2) {
        if self.mass == 0.0 {
            self.mass = 1.0;
        }
        self.acceleration += force / self.mass;
    }
}

impl Component for PhysicsBody {
    fn debug_stats(&self) -> String {
        format!(
            "velocity: ({}, {}), mass: {}, drag: {}, {}, elasticity: {}",
            self.velocity.x, self.velocity.y, self.mass, self.drag_x, self.drag_y, self.elasticity
        )
    }
}

pub(super) fn register(registry: &mut ComponentRegistry) {
    registry
        .register::<PhysicsBody>("PhysicsBody")
        .alias("physics.PhysicsBody")
        .field("physics_type", |b: &mut PhysicsBody| &mut b.physics_type)
        .field("mass", |b: &mut PhysicsBody| &mut b.mass)
        .field("velocity", |b: &mut PhysicsBody| &mut b.velocity)
        .field("acceleration", |b: &mut PhysicsBody| &mut b.acceleration)
        .field("drag_x", |b: &mut PhysicsBody| &mut b.drag_x)
        .field("drag_y", |b: &mut PhysicsBody| &mut b.drag_y)
        .field("elasticity", |b: &mut PhysicsBody| &mut b.elasticity)
        .field("gravity", |b: &mut PhysicsBody| &mut b.gravity)
        .property("force", |b: &mut PhysicsBody, force: Vec2| b.add_force(force));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let body = PhysicsBody::default();
        assert_eq!(body.mass, 1.0);
        assert_eq!(body.gravity, Vec2::new(0.0, 9.82));
        assert_eq!(body.physics_type, PhysicsType::Dynamic);
    }

    #[test]
    fn force_scales_with_mass() {
        let mut body = PhysicsBody {
            mass: 2.0,
            ..Default::default()
        };
        body.add_force(Vec2::new(4.0, 0.0));
        body.add_force(Vec2::new(0.0, 2.0));
        assert_eq!(body.acceleration, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn massless_bodies_get_unit_mass() {
        let mut body = PhysicsBody {
            mass: 0.0,
            ..Default::default()
        };
        body.add_force(Vec2::new(3.0, 0.0));
        assert_eq!(body.mass, 1.0);
        assert_eq!(body.acceleration, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn debug_stats_line() {
        let body = PhysicsBody {
            velocity: Vec2::new(1.0, 0.0),
            mass: 3.0,
            ..Default::default()
        };
        assert_eq!(
            body.debug_stats(),
            "velocity: (1, 0), mass: 3, drag: 0, 0, elasticity: 0"
        );
    }

    #[test]
    fn registered_members_bind() {
        let registry = ComponentRegistry::with_builtins();
        let mut component = registry.create("PhysicsBody").unwrap();
        registry.bind("PhysicsBody", component.as_mut(), "gravity", &json!([0, -1])).unwrap();
        registry
            .bind("PhysicsBody", component.as_mut(), "physics_type", &json!("kinematic"))
            .unwrap();
        registry.bind("PhysicsBody", component.as_mut(), "force", &json!([2, 0])).unwrap();

        let body = component.as_ref().downcast_ref::<PhysicsBody>().unwrap();
        assert_eq!(body.gravity, Vec2::new(0.0, -1.0));
        assert_eq!(body.physics_type, PhysicsType::Kinematic);
        assert_eq!(body.acceleration, Vec2::new(2.0, 0.0));
    }
}

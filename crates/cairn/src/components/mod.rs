//! Components that ship with cairn and are registered by
//! [`ComponentRegistry::with_builtins`].

mod physics_body;

pub use physics_body::{PhysicsBody, PhysicsType};

use crate::blueprint::ComponentRegistry;

/// Register every built-in component with `registry`.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    physics_body::register(registry);
}

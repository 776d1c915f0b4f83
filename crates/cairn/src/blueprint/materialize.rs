//! # Materializer: Blueprints to Live Entities
//!
//! Turns an [`EntityBlueprint`] tree into a graph of built (not yet spawned)
//! entities inside a [`World`]. No lifecycle hook runs here; spawning the
//! returned root is a separate step.
//!
//! ```text
//! materialize(bp)
//!   │
//!   ├─ 1. resolve components      registry.create + registry.bind per property
//!   │      unknown type ─────────► Err(UnknownComponentType), nothing created
//!   │      bad property ─────────► diagnostic, property skipped
//!   ├─ 2. create entity           name, local position/size, Spatial node
//!   ├─ 3. attach components       in blueprint order
//!   └─ 4. children                materialize(child), link under this node
//!          failing child ────────► diagnostic, child skipped, siblings continue
//! ```
//!
//! Every problem is logged and kept in [`Materializer::diagnostics`], so a
//! level designer can see everything that went wrong in one pass.

use std::fmt;

use crate::blueprint::model::EntityBlueprint;
use crate::blueprint::registry::ComponentRegistry;
use crate::ecs::hierarchy::NodeId;
use crate::ecs::{Component, Entity, World};
use crate::error::{MaterializeError, PropertyError};

/// Something that went wrong while materializing one entity.
#[derive(Debug)]
pub struct Diagnostic {
    /// Name of the blueprint the problem belongs to.
    pub entity: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug)]
pub enum DiagnosticKind {
    /// The entity (and its subtree) was not created.
    Aborted(MaterializeError),
    /// One property was skipped; the component was still attached.
    Property(PropertyError),
}

impl Diagnostic {
    pub fn is_abort(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Aborted(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::Aborted(err) => write!(f, "'{}' skipped: {err}", self.entity),
            DiagnosticKind::Property(err) => write!(f, "'{}': {err}", self.entity),
        }
    }
}

/// Builds entity graphs from blueprints using a [`ComponentRegistry`].
pub struct Materializer<'r> {
    registry: &'r ComponentRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> Materializer<'r> {
    pub fn new(registry: &'r ComponentRegistry) -> Self {
        Self {
            registry,
            diagnostics: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        self.registry
    }

    /// Everything reported since creation or the last
    /// [`take_diagnostics`](Self::take_diagnostics).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Build `blueprint` and its children as unspawned entities.
    ///
    /// Returns the root entity. Fails only if one of the root's own
    /// components names an unregistered type; failing children are skipped.
    pub fn materialize(
        &mut self,
        world: &mut World,
        blueprint: &EntityBlueprint,
    ) -> Result<Entity, MaterializeError> {
        let components = self.resolve_components(blueprint)?;

        let entity = world.create_entity(blueprint.name.clone());
        world.set_local(entity, blueprint.position, blueprint.size);
        for (name, component) in components {
            world.add_boxed_component(entity, name, component);
        }

        for child in &blueprint.children {
            // A failed child has already been reported.
            let Ok(child_entity) = self.materialize(world, child) else {
                log::warn!("Skipping child '{}' of '{}'", child.name, blueprint.name);
                continue;
            };
            if let Err(err) = world.attach_child(entity, child_entity) {
                log::warn!("Cannot link '{}' under '{}': {err}", child.name, blueprint.name);
            }
        }

        log::debug!(
            "Materialized '{}' ({entity}) with {} component(s)",
            blueprint.name,
            blueprint.components.len()
        );
        Ok(entity)
    }

    /// Materialize several root blueprints. A failure never stops the others.
    pub fn materialize_all(
        &mut self,
        world: &mut World,
        blueprints: &[EntityBlueprint],
    ) -> Vec<Result<Entity, MaterializeError>> {
        blueprints.iter().map(|bp| self.materialize(world, bp)).collect()
    }

    /// Materialize, then spawn at the blueprint's local values under
    /// `parent` (or the world root).
    ///
    /// If the world rejects the parent, the freshly built entities are
    /// destroyed (removed at the next frame boundary) and the rejection is
    /// reported like any other abort.
    pub fn spawn(
        &mut self,
        world: &mut World,
        blueprint: &EntityBlueprint,
        parent: Option<NodeId>,
    ) -> Result<Entity, MaterializeError> {
        let entity = self.materialize(world, blueprint)?;
        if world.spawn_entity(entity, blueprint.position, blueprint.size, parent) {
            return Ok(entity);
        }

        world.destroy_entity(entity);
        let err = MaterializeError::SpawnRejected {
            entity: blueprint.name.clone(),
        };
        log::error!("{err}");
        self.report(blueprint, DiagnosticKind::Aborted(err.clone()));
        Err(err)
    }

    /// Create and configure every component before anything is allocated in
    /// the world, so an unknown type leaves no trace.
    fn resolve_components(
        &mut self,
        blueprint: &EntityBlueprint,
    ) -> Result<Vec<(String, Box<dyn Component>)>, MaterializeError> {
        let mut resolved = Vec::with_capacity(blueprint.components.len());

        for descriptor in &blueprint.components {
            let type_name = descriptor.component_type.as_str();
            let Some(mut component) = self.registry.create(type_name) else {
                let err = MaterializeError::UnknownComponentType {
                    entity: blueprint.name.clone(),
                    component_type: type_name.to_string(),
                };
                log::error!("{err}");
                self.report(blueprint, DiagnosticKind::Aborted(err.clone()));
                return Err(err);
            };

            for (property, value) in &descriptor.properties {
                let bound = self.registry.bind(type_name, component.as_mut(), property, value);
                if let Err(err) = bound {
                    log::warn!("'{}': skipping property: {err}", blueprint.name);
                    self.report(blueprint, DiagnosticKind::Property(err));
                }
            }

            let name = self.registry.canonical_name(type_name).unwrap_or(type_name);
            resolved.push((name.to_string(), component));
        }
        Ok(resolved)
    }

    fn report(&mut self, blueprint: &EntityBlueprint, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic {
            entity: blueprint.name.clone(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::model::ComponentBlueprint;
    use crate::components::PhysicsBody;
    use crate::ecs::EntityState;
    use crate::math::Vec2;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 0.001, "{a:?} != {b:?}");
    }

    fn physics(mass: f64, velocity: Vec2) -> ComponentBlueprint {
        ComponentBlueprint::new("PhysicsBody")
            .with_property("mass", mass)
            .with_vec2("velocity", velocity)
    }

    fn rock() -> EntityBlueprint {
        EntityBlueprint::new("Rock")
            .with_component(physics(3.0, Vec2::new(1.0, 0.0)))
            .with_child(EntityBlueprint::new("Chip").with_position(Vec2::new(1.0, 1.0)))
    }

    #[test]
    fn rock_and_chip() {
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();

        let rock = materializer.materialize(&mut world, &rock()).unwrap();
        assert_eq!(world.state(rock), Some(EntityState::Built));
        let chip = world.children_of(rock)[0];
        assert_eq!(world.name(chip), Some("Chip"));

        let body = world.component::<PhysicsBody>(rock).unwrap();
        assert_eq!(body.mass, 3.0);
        assert_eq!(body.velocity, Vec2::new(1.0, 0.0));

        world.spawn_entity(rock, Vec2::new(10.0, 5.0), Vec2::ONE, None);
        assert_close(world.world_position(chip).unwrap(), Vec2::new(11.0, 6.0));
        assert!(materializer.diagnostics().is_empty());
    }

    #[test]
    fn no_hooks_fire_during_materialization() {
        let registry = ComponentRegistry::with_builtins();
        let mut world = World::new();
        let rock = Materializer::new(&registry).materialize(&mut world, &rock()).unwrap();

        assert!(world.pending_additions().is_empty());
        assert_eq!(
            world.component_states(rock),
            vec![("PhysicsBody", crate::ecs::ComponentState::Created)]
        );
    }

    #[test]
    fn unknown_component_aborts_the_entity() {
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();
        let bp = EntityBlueprint::new("Ghost")
            .with_component(physics(1.0, Vec2::ZERO))
            .with_component(ComponentBlueprint::new("Haunting"))
            .with_child(EntityBlueprint::new("Chain"));

        let err = materializer.materialize(&mut world, &bp).unwrap_err();

        assert_eq!(
            err,
            MaterializeError::UnknownComponentType {
                entity: "Ghost".into(),
                component_type: "Haunting".into(),
            }
        );
        assert_eq!(world.entity_count(), 0);
        assert_eq!(materializer.diagnostics().len(), 1);
        assert!(materializer.diagnostics()[0].is_abort());
    }

    #[test]
    fn bad_properties_are_skipped() {
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();
        let bp = EntityBlueprint::new("Crate").with_component(
            ComponentBlueprint::new("PhysicsBody")
                .with_property("mass", 4)
                .with_property("colour", "red")
                .with_property("velocity", "fast")
                .with_property("elasticity", 0.5),
        );

        let e = materializer.materialize(&mut world, &bp).unwrap();
        let body = world.component::<PhysicsBody>(e).unwrap();
        assert_eq!(body.mass, 4.0);
        assert_eq!(body.elasticity, 0.5);
        assert_eq!(body.velocity, Vec2::ZERO);

        let diagnostics = materializer.take_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::Property(PropertyError::Unbound { .. })
        ));
        assert!(matches!(
            diagnostics[1].kind,
            DiagnosticKind::Property(PropertyError::Conversion { .. })
        ));
        assert!(materializer.diagnostics().is_empty());
    }

    #[test]
    fn failing_child_is_skipped_and_siblings_survive() {
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();
        let bp = EntityBlueprint::new("Cart")
            .with_child(EntityBlueprint::new("Wheel"))
            .with_child(
                EntityBlueprint::new("Broken").with_component(ComponentBlueprint::new("Nope")),
            )
            .with_child(EntityBlueprint::new("Wheel"));

        let cart = materializer.materialize(&mut world, &bp).unwrap();
        let children = world.children_of(cart);
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|&c| world.name(c) == Some("Wheel")));
        assert_eq!(world.entity_count(), 3);

        assert!(world.spawn(cart));
        assert_eq!(world.pending_additions().len(), 3);
    }

    #[test]
    fn batch_failures_do_not_stop_siblings() {
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();
        let batch = [
            EntityBlueprint::new("A"),
            EntityBlueprint::new("B").with_component(ComponentBlueprint::new("Missing")),
            EntityBlueprint::new("C"),
        ];

        let results = materializer.materialize_all(&mut world, &batch);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn aliases_resolve_to_the_registered_name() {
        let registry = ComponentRegistry::with_builtins();
        let mut world = World::new();
        let bp = EntityBlueprint::new("Aliased")
            .with_component(ComponentBlueprint::new("physics.PhysicsBody"));

        let e = Materializer::new(&registry).materialize(&mut world, &bp).unwrap();
        assert_eq!(world.component_states(e)[0].0, "PhysicsBody");
    }

    #[test]
    fn spawn_materializes_and_starts() {
        let registry = ComponentRegistry::with_builtins();
        let mut world = World::new();
        let bp = rock().with_position(Vec2::new(2.0, 3.0));

        let rock = Materializer::new(&registry).spawn(&mut world, &bp, None).unwrap();
        assert_eq!(world.state(rock), Some(EntityState::Spawned));
        assert_close(world.world_position(rock).unwrap(), Vec2::new(2.0, 3.0));
        assert_eq!(world.pending_additions().len(), 2);
    }

    #[test]
    fn spawn_under_stale_parent_is_reported_and_torn_down() {
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();

        let err = materializer.spawn(&mut world, &rock(), Some(NodeId(999))).unwrap_err();

        assert_eq!(
            err,
            MaterializeError::SpawnRejected {
                entity: "Rock".into()
            }
        );
        assert_eq!(materializer.diagnostics().len(), 1);
        assert!(materializer.diagnostics()[0].is_abort());
        assert!(world.pending_additions().is_empty());

        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.transforms().len(), 1);
    }

    #[test]
    fn loaded_documents_materialize() {
        let json = r#"{
            "name": "Rock",
            "components": [
                {
                    "componentType": "PhysicsBody",
                    "properties": { "mass": 3, "velocity": [1, 0], "physics_type": "kinematic" }
                }
            ],
            "children": [ { "name": "Chip", "position": [1, 1] } ]
        }"#;
        let bp = EntityBlueprint::from_json_str(json).unwrap();
        let registry = ComponentRegistry::with_builtins();
        let mut materializer = Materializer::new(&registry);
        let mut world = World::new();

        let rock = materializer.materialize(&mut world, &bp).unwrap();
        let body = world.component::<PhysicsBody>(rock).unwrap();
        assert_eq!(body.mass, 3.0);
        assert_eq!(body.physics_type, crate::components::PhysicsType::Kinematic);
        assert!(materializer.diagnostics().is_empty());
    }
}

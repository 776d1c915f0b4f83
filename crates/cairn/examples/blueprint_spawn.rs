//! Blueprints: save a small entity tree, load it back, spawn it and run it.
//!
//! A rock with a physics body carries a chip whose fuse burns down and
//! destroys it. A third blueprint names a component nobody registered, to
//! show how the materializer reports problems.
//!
//! Run with: `RUST_LOG=debug cargo run -p cairn --example blueprint_spawn`

use cairn::prelude::*;

const FRAME: f32 = 1.0 / 60.0;

// ── Components ───────────────────────────────────────────────────────────

/// Destroys its entity when the timer runs out.
#[derive(Default)]
struct Fuse {
    seconds: f32,
}

impl Component for Fuse {
    fn on_start(&mut self, cx: &mut HookContext<'_>) {
        log::info!("{} fuse lit, {:.2}s", cx.entity(), self.seconds);
    }

    fn on_update(&mut self, cx: &mut HookContext<'_>, delta: f32) {
        self.seconds -= delta;
        if self.seconds <= 0.0 {
            cx.destroy_self();
        }
    }

    fn on_destroy(&mut self, cx: &mut HookContext<'_>) {
        let p = cx.world_position();
        log::info!("{} went off at ({:.2}, {:.2})", cx.entity(), p.x, p.y);
    }

    fn debug_stats(&self) -> String {
        format!("{:.2}s left", self.seconds.max(0.0))
    }
}

// ── Systems ──────────────────────────────────────────────────────────────

/// Integrate physics bodies and move their entities.
fn move_bodies(world: &mut World, delta: f32) {
    for entity in world.active_entities().to_vec() {
        let Some(body) = world.component_mut::<PhysicsBody>(entity) else {
            continue;
        };
        if body.physics_type == PhysicsType::Dynamic {
            body.velocity += (body.acceleration + body.gravity) * delta;
        }
        body.velocity *= Vec2::new(1.0 - body.drag_x * delta, 1.0 - body.drag_y * delta);
        body.acceleration = Vec2::ZERO;
        let step = body.velocity * delta;

        if let Some(position) = world.transform(entity).map(|t| t.local_position()) {
            world.set_local_position(entity, position + step);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut registry = ComponentRegistry::with_builtins();
    registry
        .register::<Fuse>("Fuse")
        .field("seconds", |f: &mut Fuse| &mut f.seconds);

    let rock = EntityBlueprint::new("Rock").with_component(
        ComponentBlueprint::new("PhysicsBody")
            .with_property("mass", 3)
            .with_property("drag_x", 0.5)
            .with_vec2("velocity", Vec2::new(1.0, 0.0)),
    );
    let rock = rock.with_child(
        EntityBlueprint::new("Chip")
            .with_position(Vec2::new(1.0, 1.0))
            .with_size(Vec2::splat(0.25))
            .with_component(ComponentBlueprint::new("Fuse").with_property("seconds", 0.05)),
    );

    // Round-trip through a file, like a level editor would.
    let path = std::env::temp_dir().join("cairn_rock.blueprint.json");
    save_blueprint(&rock, &path)?;
    let loaded = load_blueprint(&path)?;
    log::info!(
        "Loaded '{}' ({} entities) from {}",
        loaded.name,
        loaded.entity_count(),
        path.display()
    );

    let broken = EntityBlueprint::new("Sparkles")
        .with_component(ComponentBlueprint::new("ParticleEmitter"));

    // ── Build and spawn ──────────────────────────────────────────────

    let mut world = World::new();
    let mut materializer = Materializer::new(&registry);
    let rock = materializer.spawn(&mut world, &loaded, None)?;
    world.set_local_position(rock, Vec2::new(10.0, 5.0));

    if let Err(err) = materializer.spawn(&mut world, &broken, None) {
        log::warn!("Not spawned: {err}");
    }
    for diagnostic in materializer.take_diagnostics() {
        log::info!("diagnostic: {diagnostic}");
    }

    // ── Run ──────────────────────────────────────────────────────────

    let mut schedule = Schedule::new();
    schedule.add_system(move_bodies).add_system(ComponentUpdates);

    for frame in 0..5 {
        schedule.run_frame(&mut world, FRAME);
        log::debug!("frame {frame}: {} active", world.active_entities().len());
    }
    print!("{}", world.debug_tree());

    // ── Tear down ────────────────────────────────────────────────────

    world.destroy_entity(rock);
    let changes = schedule.run_frame(&mut world, FRAME);
    log::info!("Removed {} entities, {} left", changes.removed.len(), world.entity_count());

    std::fs::remove_file(&path).ok();
    Ok(())
}

//! # System: Game Logic That Runs Every Frame
//!
//! Components hold per-entity behaviour; systems hold everything else
//! (input polling, spawning waves, moving physics bodies). A system gets
//! `&mut World` once at startup and once per frame.
//!
//! ## Frame
//!
//! ```text
//! Schedule::run_frame(world, delta)
//!   │
//!   ├─ System::start for systems not started yet, in order
//!   ├─ world.apply_pending()        ← frame boundary
//!   └─ System::update(world, delta) for every system, in order
//! ```
//!
//! Spawns and destroys requested while systems run land in the world's
//! queues and become visible at the next boundary, so the active list never
//! changes under an update pass.
//!
//! Any `FnMut(&mut World, f32)` is a system (its `start` is a no-op), so
//! closures and plain functions work directly. [`ComponentUpdates`] is the
//! system that drives `Component::on_update`; add it wherever component
//! updates should happen relative to the other systems.

use super::registry::PendingChanges;
use super::world::World;

/// A unit of game logic driven by a [`Schedule`].
pub trait System {
    /// Runs once, before the first update.
    fn start(&mut self, _world: &mut World) {}

    /// Runs once per frame with the frame's delta time in seconds.
    fn update(&mut self, world: &mut World, delta: f32);
}

impl<F: FnMut(&mut World, f32)> System for F {
    fn update(&mut self, world: &mut World, delta: f32) {
        (self)(world, delta);
    }
}

/// Calls `on_update` on every component of every active entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentUpdates;

impl System for ComponentUpdates {
    fn update(&mut self, world: &mut World, delta: f32) {
        world.update_components(delta);
    }
}

struct NamedSystem {
    name: String,
    system: Box<dyn System>,
}

/// An ordered list of systems plus the frame-boundary bookkeeping.
pub struct Schedule {
    systems: Vec<NamedSystem>,
    /// How many leading systems have had `start` called.
    started: usize,
    frame: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            started: 0,
            frame: 0,
        }
    }

    /// A schedule that only runs [`ComponentUpdates`].
    pub fn with_component_updates() -> Self {
        let mut schedule = Self::new();
        schedule.add_system(ComponentUpdates);
        schedule
    }

    /// Add a system to the end of the schedule.
    ///
    /// Systems added after the first frame are started on the next frame.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> &mut Self {
        let name = short_system_name(std::any::type_name::<S>());
        self.systems.push(NamedSystem {
            name,
            system: Box::new(system),
        });
        self
    }

    /// Run one frame: start new systems, cross the frame boundary, then
    /// update every system in order.
    pub fn run_frame(&mut self, world: &mut World, delta: f32) -> PendingChanges {
        self.start_pending(world);

        let changes = world.apply_pending();
        for named in &mut self.systems {
            named.system.update(world, delta);
        }
        self.frame += 1;
        changes
    }

    fn start_pending(&mut self, world: &mut World) {
        for named in &mut self.systems[self.started..] {
            log::debug!("Starting system {}", named.name);
            named.system.start(world);
        }
        self.started = self.systems.len();
    }

    /// Number of frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Short names of the systems, in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.name.as_str())
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// `my_game::systems::spawn_waves` → `spawn_waves`, closures → `<closure>`.
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ecs::component::{Component, HookContext};

    fn dummy_system(_world: &mut World, _delta: f32) {}

    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl System for Recorder {
        fn start(&mut self, _world: &mut World) {
            self.log.borrow_mut().push("start".into());
        }

        fn update(&mut self, world: &mut World, delta: f32) {
            self.log
                .borrow_mut()
                .push(format!("update {delta} active={}", world.active_entities().len()));
        }
    }

    #[derive(Default)]
    struct Ticks(u32);

    impl Component for Ticks {
        fn on_update(&mut self, _cx: &mut HookContext<'_>, _delta: f32) {
            self.0 += 1;
        }
    }

    #[test]
    fn system_names() {
        let mut schedule = Schedule::new();
        schedule.add_system(dummy_system).add_system(|_: &mut World, _: f32| {});
        schedule.add_system(ComponentUpdates);
        let names: Vec<&str> = schedule.system_names().collect();
        assert_eq!(names, vec!["dummy_system", "<closure>", "ComponentUpdates"]);
    }

    #[test]
    fn start_runs_once_before_first_update() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let mut schedule = Schedule::new();
        schedule.add_system(Recorder { log: log.clone() });

        schedule.run_frame(&mut world, 0.5);
        schedule.run_frame(&mut world, 0.25);

        assert_eq!(*log.borrow(), vec!["start", "update 0.5 active=0", "update 0.25 active=0"]);
        assert_eq!(schedule.frame(), 2);
    }

    #[test]
    fn late_systems_start_on_next_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let mut schedule = Schedule::new();
        schedule.add_system(dummy_system);
        schedule.run_frame(&mut world, 0.1);

        schedule.add_system(Recorder { log: log.clone() });
        schedule.run_frame(&mut world, 0.1);
        assert_eq!(log.borrow()[0], "start");
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn spawns_become_active_at_the_next_boundary() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let mut schedule = Schedule::new();
        schedule.add_system(Recorder { log: log.clone() });

        let e = world.create_entity("e");
        world.spawn(e);
        let changes = schedule.run_frame(&mut world, 0.1);

        assert_eq!(changes.added, vec![e]);
        assert_eq!(log.borrow()[1], "update 0.1 active=1");
    }

    #[test]
    fn component_updates_drive_components() {
        let mut world = World::new();
        let e = world.create_entity("e");
        world.add_component(e, Ticks::default());
        world.spawn(e);

        let mut schedule = Schedule::with_component_updates();
        schedule.run_frame(&mut world, 0.016);
        schedule.run_frame(&mut world, 0.016);

        assert_eq!(world.component::<Ticks>(e).map(|t| t.0), Some(2));
    }
}

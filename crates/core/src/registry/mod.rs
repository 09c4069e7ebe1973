//! The single collection of live entities, advanced and pruned once per
//! frame tick.

use glam::Vec3;
use serde::Serialize;

use crate::{
    ascent::AscendingBody,
    burst::{ShapedBurst, SphereBurst},
    config::EngineConfig,
    render::RenderSurface,
    timeline::{Task, TaskQueue},
    RandomSource,
};

/// Which scheduler an entity descends from. Children inherit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Lineage {
    Main,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Lifecycle transitions raised during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    AscentBurnedOut { position: Vec3 },
    SphereBurst { origin: Vec3, second_stage: bool },
    SecondaryTriggered { origin: Vec3 },
}

/// Every kind of live entity.
#[derive(Debug)]
pub enum Entity {
    Ascending(AscendingBody),
    Sphere(SphereBurst),
    Shaped(ShapedBurst),
}

impl Entity {
    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        match self {
            Entity::Ascending(body) => body.update(ctx),
            Entity::Sphere(burst) => burst.update(ctx),
            Entity::Shaped(burst) => burst.update(ctx),
        }
    }

    pub fn is_dead(&self) -> bool {
        match self {
            Entity::Ascending(body) => body.is_dead(),
            Entity::Sphere(burst) => burst.is_dead(),
            Entity::Shaped(burst) => burst.is_dead(),
        }
    }

    pub fn dispose(self, surface: &mut dyn RenderSurface) {
        match self {
            Entity::Ascending(body) => body.dispose(surface),
            Entity::Sphere(burst) => burst.dispose(surface),
            Entity::Shaped(burst) => burst.dispose(surface),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Entity::Ascending(_) => "ascending",
            Entity::Sphere(_) => "sphere",
            Entity::Shaped(_) => "shaped",
        }
    }
}

/// Mutable view handed to an entity while it updates.
///
/// Spawns go into an outbox that the registry appends only after every
/// entity has been updated for the tick.
pub struct TickContext<'a> {
    pub tick: u64,
    pub config: &'a EngineConfig,
    pub rng: &'a mut RandomSource,
    pub surface: &'a mut dyn RenderSurface,
    pub tasks: &'a mut TaskQueue,
    spawned: &'a mut Vec<Entity>,
    events: &'a mut Vec<SimEvent>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        tick: u64,
        config: &'a EngineConfig,
        rng: &'a mut RandomSource,
        surface: &'a mut dyn RenderSurface,
        tasks: &'a mut TaskQueue,
        spawned: &'a mut Vec<Entity>,
        events: &'a mut Vec<SimEvent>,
    ) -> Self {
        Self {
            tick,
            config,
            rng,
            surface,
            tasks,
            spawned,
            events,
        }
    }

    pub fn spawn(&mut self, entity: Entity) {
        self.spawned.push(entity);
    }

    /// Creates a sphere burst and records its creation event.
    pub fn spawn_sphere(&mut self, origin: Vec3, second_stage: bool) {
        let burst = SphereBurst::new(
            origin,
            second_stage,
            &self.config.sphere,
            self.rng,
            self.surface,
        );
        self.emit(SimEvent::SphereBurst {
            origin,
            second_stage,
        });
        self.spawn(Entity::Sphere(burst));
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}

#[derive(Debug)]
struct Slot {
    id: EntityId,
    lineage: Lineage,
    entity: Entity,
}

/// Outcome of one [`SimulationRegistry::tick`].
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<SimEvent>,
    pub spawned: usize,
    pub disposed: usize,
    pub tasks_run: usize,
}

#[derive(Debug, Default)]
pub struct SimulationRegistry {
    slots: Vec<Slot>,
    tasks: TaskQueue,
    next_id: u64,
    tick: u64,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lineage: Lineage, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        tracing::trace!(?id, ?lineage, kind = entity.label(), "entity registered");
        self.slots.push(Slot {
            id,
            lineage,
            entity,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn count(&self, lineage: Lineage) -> usize {
        self.slots.iter().filter(|s| s.lineage == lineage).count()
    }

    /// Live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Lineage, &Entity)> {
        self.slots.iter().map(|s| (s.id, s.lineage, &s.entity))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.entity)
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// Advances the simulation by one tick: runs due tasks, updates every
    /// entity, disposes the dead ones, then registers new spawns.
    pub fn tick(
        &mut self,
        config: &EngineConfig,
        rng: &mut RandomSource,
        surface: &mut dyn RenderSurface,
    ) -> TickReport {
        self.tick += 1;
        let tick = self.tick;

        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        for task in self.tasks.drain_due(tick) {
            run_task(task, surface);
            report.tasks_run += 1;
        }

        let mut pending: Vec<(Lineage, Entity)> = Vec::new();
        let mut spawned = Vec::new();
        for slot in &mut self.slots {
            let mut ctx = TickContext::new(
                tick,
                config,
                rng,
                surface,
                &mut self.tasks,
                &mut spawned,
                &mut report.events,
            );
            slot.entity.update(&mut ctx);
            pending.extend(spawned.drain(..).map(|entity| (slot.lineage, entity)));
        }

        let mut live = Vec::with_capacity(self.slots.len());
        for slot in std::mem::take(&mut self.slots) {
            if slot.entity.is_dead() {
                tracing::trace!(id = ?slot.id, kind = slot.entity.label(), "entity disposed");
                slot.entity.dispose(surface);
                report.disposed += 1;
            } else {
                live.push(slot);
            }
        }
        self.slots = live;

        report.spawned = pending.len();
        for (lineage, entity) in pending {
            self.insert(lineage, entity);
        }

        report
    }

    /// Disposes every entity, then runs the tasks that disposal did not
    /// cancel.
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        for slot in self.slots.drain(..) {
            slot.entity.dispose(surface);
        }
        for task in self.tasks.drain_all() {
            run_task(task, surface);
        }
    }
}

fn run_task(task: Task, surface: &mut dyn RenderSurface) {
    match task {
        Task::RemoveVisual(handle) => surface.remove(handle),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::RenderGraph;

    /// Owns everything a [`TickContext`] borrows, for driving entities
    /// directly in tests.
    pub(crate) struct Harness {
        pub tick: u64,
        pub config: EngineConfig,
        pub rng: RandomSource,
        pub surface: RenderGraph,
        pub tasks: TaskQueue,
        pub spawned: Vec<Entity>,
        pub events: Vec<SimEvent>,
    }

    impl Harness {
        pub fn new(seed: u64) -> Self {
            Self {
                tick: 0,
                config: EngineConfig::default(),
                rng: RandomSource::seeded(seed),
                surface: RenderGraph::new(),
                tasks: TaskQueue::new(),
                spawned: Vec::new(),
                events: Vec::new(),
            }
        }

        pub fn ctx(&mut self) -> TickContext<'_> {
            TickContext::new(
                self.tick,
                &self.config,
                &mut self.rng,
                &mut self.surface,
                &mut self.tasks,
                &mut self.spawned,
                &mut self.events,
            )
        }
    }
}

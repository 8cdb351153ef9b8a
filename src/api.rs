//! Public API for the simulation.
//!
//! This module provides the main interface for a renderer, a game shell or
//! any other client to drive the arena.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 60 Hz). When
//! `step(dt)` is called, the simulation accumulates time and runs whole ticks
//! as needed. `tick()` runs exactly one.
//!
//! ## Tick Order
//!
//! Every tick runs one chained schedule:
//! field upkeep, spatial grid, player intent, AI decisions, movement,
//! boundary / self / pairwise collisions, death drops, pickup, population.
//!
//! ## Game Over
//!
//! When the player dies the arena computes the final score, records it in the
//! score history and stops simulating. It restarts with a fresh population
//! on `restart()` or by itself once the restart delay has passed.

use crate::components::*;
use crate::config::{ArenaConfig, ConfigError};
use crate::field::ResourceField;
use crate::scoreboard::Scoreboard;
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::world::{ArenaClock, SimRng, Snapshot};
use bevy_ecs::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{info, warn};

/// Spatial grid cell size in world units.
const SPATIAL_CELL_SIZE: f32 = 100.0;

/// Two-state game machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Running,
    Over {
        final_score: u64,
        /// Ticks since the player died.
        ticks_waited: u32,
    },
}

/// `floor(score · difficulty · factor) + floor(elapsed · time_bonus)`.
pub fn compute_final_score(score: u32, clock: &ArenaClock, config: &ArenaConfig) -> u64 {
    let scaled = score as f64 * clock.difficulty as f64 * config.difficulty_score_factor as f64;
    let time_bonus = clock.elapsed as f64 * config.time_bonus_factor as f64;
    scaled.floor() as u64 + time_bonus.floor() as u64
}

/// The main simulation container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing and restarting the arena
/// - Stepping the simulation forward
/// - Feeding player input
/// - Extracting state snapshots
pub struct ArenaSim {
    world: World,
    schedule: Schedule,
    config: ArenaConfig,
    state: GameState,
    scoreboard: Scoreboard,
    player: Entity,
    player_id: AgentId,
    /// Skin given to the player at the next (re)start.
    player_skin: usize,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl ArenaSim {
    /// Create an arena with the default configuration.
    pub fn new() -> Self {
        Self::build(ArenaConfig::default())
    }

    /// Create an arena with a custom configuration.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            warn!(%err, "rejecting arena configuration");
            return Err(err);
        }
        Ok(Self::build(config))
    }

    fn build(config: ArenaConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(config.clone());
        world.insert_resource(SimRng::new(config.rng_seed));
        world.insert_resource(SpatialGrid::new(SPATIAL_CELL_SIZE));
        world.insert_resource(ResourceField::new(&config));
        world.insert_resource(ArenaClock::default());
        world.insert_resource(TickEvents::default());
        world.insert_resource(DeathDrops::default());
        world.insert_resource(PlayerIntent::default());
        world.insert_resource(AgentIdAllocator::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                field_update_system,
                spatial_grid_update_system,
                player_intent_system,
                decision_system,
                advance_system,
                boundary_collision_system,
                self_collision_system,
                pairwise_collision_system,
                drop_food_system,
                pickup_system,
                population_system,
            )
                .chain(),
        );

        let scoreboard = Scoreboard::open(config.scoreboard_path.as_deref(), config.scoreboard_capacity);

        let mut sim = Self {
            world,
            schedule,
            config,
            state: GameState::Running,
            scoreboard,
            player: Entity::PLACEHOLDER,
            player_id: AgentId(0),
            player_skin: 0,
            time_accumulator: 0.0,
        };
        sim.populate();
        sim
    }

    /// Reset every per-game resource and spawn the player and the initial
    /// AI population.
    fn populate(&mut self) {
        self.world.clear_entities();
        self.world.insert_resource(ResourceField::new(&self.config));
        self.world.insert_resource(ArenaClock::default());
        self.world.insert_resource(TickEvents::default());
        self.world.insert_resource(DeathDrops::default());
        self.world.insert_resource(PlayerIntent::default());
        self.world.insert_resource(AgentIdAllocator::default());
        self.world.resource_mut::<SpatialGrid>().clear();

        let config = self.config.clone();
        let skin = self.player_skin;
        let (player, player_id) = self.world.resource_scope(|world, mut sim_rng: Mut<SimRng>| {
            let rng = &mut sim_rng.0;
            let center = Point::new(config.world_width / 2.0, config.world_height / 2.0);

            let player_id = world.resource_mut::<AgentIdAllocator>().allocate();
            let heading = rng.gen_range(0.0..TAU);
            let player = world
                .spawn((
                    AgentBundle {
                        id: player_id,
                        agent: Agent::new(center, heading, true, skin, &config),
                    },
                    Player,
                ))
                .id();

            for _ in 0..config.ai_count {
                let id = world.resource_mut::<AgentIdAllocator>().allocate();
                let head = initial_spawn_point(&config, rng, center);
                world.spawn(ai_agent(id, head, &config, rng));
            }
            (player, player_id)
        });

        self.player = player;
        self.player_id = player_id;
        self.state = GameState::Running;
        self.time_accumulator = 0.0;
        info!(
            ai_count = self.config.ai_count,
            seed = ?self.config.rng_seed,
            "arena initialised"
        );
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs whole
    /// ticks as needed.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.config.fixed_timestep();
        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.tick();
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run a single tick.
    ///
    /// While the game is over this only counts down to the automatic
    /// restart.
    pub fn tick(&mut self) {
        if let GameState::Over { ticks_waited, .. } = &mut self.state {
            *ticks_waited += 1;
            if *ticks_waited > self.config.restart_delay_ticks() {
                info!("restart delay elapsed, starting a new game");
                self.restart();
            }
            return;
        }

        self.world.resource_mut::<TickEvents>().clear();
        self.world
            .resource_mut::<ArenaClock>()
            .advance(&self.config);

        self.schedule.run(&mut self.world);

        self.check_game_over();
    }

    fn check_game_over(&mut self) {
        let Some(player) = self.world.get::<Agent>(self.player) else {
            return;
        };
        if player.is_alive() {
            return;
        }

        let score = player.score();
        let clock = *self.world.resource::<ArenaClock>();
        let cause = self
            .world
            .resource::<TickEvents>()
            .player_death()
            .map(|death| death.cause);
        let final_score = compute_final_score(score, &clock, &self.config);
        let rank = self.scoreboard.record(final_score);
        info!(
            final_score,
            score,
            elapsed = clock.elapsed,
            difficulty = clock.difficulty,
            ?cause,
            ?rank,
            "player died"
        );

        self.state = GameState::Over {
            final_score,
            ticks_waited: 0,
        };
    }

    /// Start a fresh game: new player, new AI population, empty field.
    ///
    /// The score history and the gameplay random stream carry over.
    pub fn restart(&mut self) {
        self.populate();
    }

    /// Set the player's input for the coming ticks.
    pub fn set_player_intent(&mut self, desired_heading: Option<f32>, boost_requested: bool) {
        *self.world.resource_mut::<PlayerIntent>() = PlayerIntent {
            desired_heading,
            boost_requested,
        };
    }

    /// Choose the player's skin; applied at the next (re)start.
    pub fn set_player_skin(&mut self, skin_index: usize) {
        self.player_skin = skin_index;
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        let mut snapshot = Snapshot::from_world(&mut self.world);
        snapshot.game_over = self.is_game_over();
        snapshot.final_score = self.final_score();
        snapshot.scoreboard = self.scoreboard.scores().to_vec();
        snapshot
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        snapshot_to_json(&self.snapshot()).unwrap_or_else(|err| {
            warn!(%err, "failed to serialize snapshot");
            "{}".to_string()
        })
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.state, GameState::Over { .. })
    }

    /// Final score of the game that just ended.
    pub fn final_score(&self) -> Option<u64> {
        match self.state {
            GameState::Over { final_score, .. } => Some(final_score),
            GameState::Running => None,
        }
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Get the current tick number of this game.
    pub fn current_tick(&self) -> u64 {
        self.world.resource::<ArenaClock>().tick
    }

    /// Get the elapsed play time of this game.
    pub fn current_time(&self) -> f32 {
        self.world.resource::<ArenaClock>().elapsed
    }

    pub fn difficulty(&self) -> f32 {
        self.world.resource::<ArenaClock>().difficulty
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn player_id(&self) -> AgentId {
        self.player_id
    }

    /// The player's agent record; kept after death until restart.
    pub fn player(&self) -> Option<&Agent> {
        self.world.get::<Agent>(self.player)
    }

    pub fn field(&self) -> &ResourceField {
        self.world.resource::<ResourceField>()
    }

    pub fn field_mut(&mut self) -> Mut<'_, ResourceField> {
        self.world.resource_mut::<ResourceField>()
    }

    /// Look up any agent by id.
    pub fn agent(&mut self, id: AgentId) -> Option<&Agent> {
        let mut query = self.world.query::<(Entity, &AgentId)>();
        let entity = query
            .iter(&self.world)
            .find(|(_, agent_id)| **agent_id == id)
            .map(|(entity, _)| entity)?;
        self.world.get::<Agent>(entity)
    }

    /// Number of living AI agents.
    pub fn alive_ai_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<&Agent, With<AiControlled>>();
        query.iter(&self.world).filter(|a| a.is_alive()).count()
    }

    /// Add an AI-controlled agent and return its id.
    pub fn spawn_ai_agent(&mut self, agent: Agent) -> AgentId {
        let id = self.world.resource_mut::<AgentIdAllocator>().allocate();
        let heading = agent.heading;
        self.world
            .spawn((AgentBundle { id, agent }, AiBundle::new(heading)));
        id
    }

    /// Replace the player's body, e.g. to stage a scenario.
    pub fn replace_player(&mut self, mut agent: Agent) {
        agent.is_player = true;
        if let Some(mut current) = self.world.get_mut::<Agent>(self.player) {
            *current = agent;
        }
    }

    /// Despawn every AI agent.
    pub fn clear_ai_agents(&mut self) {
        let mut query = self.world.query_filtered::<Entity, With<AiControlled>>();
        let entities: Vec<Entity> = query.iter(&self.world).collect();
        for entity in entities {
            self.world.despawn(entity);
        }
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for ArenaSim {
    fn default() -> Self {
        Self::new()
    }
}

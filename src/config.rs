//! Arena configuration.
//!
//! All tunables are fixed when an `ArenaSim` is built. Durations are stored in
//! seconds and converted to ticks through the configured tick rate.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating an [`ArenaConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value the simulation cannot run with.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration text is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Static configuration for an arena.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    pub world_width: f32,
    pub world_height: f32,
    /// Size of the player's view; respawns are placed outside it.
    pub view_width: f32,
    pub view_height: f32,

    /// Segments an agent starts with.
    pub initial_length: usize,
    /// Units per tick.
    pub player_speed: f32,
    pub ai_speed: f32,
    pub head_radius: f32,
    pub segment_radius: f32,
    /// Seconds of self-collision immunity granted by a sharp turn.
    pub immunity_duration: f32,

    pub boost_multiplier: f32,
    /// Ticks between boost segment drops.
    pub boost_drop_interval: u32,
    /// Agents at or below this length cannot boost.
    pub boost_min_length: usize,
    /// Seconds of cooldown after leaving boost.
    pub boost_cooldown: f32,
    /// Value of the resource left behind by a boost drop.
    pub boost_food_value: u32,

    pub self_collision_enabled: bool,
    pub self_collision_start_index: usize,
    /// Upper bound on resources dropped by a dying agent.
    pub dropped_food_cap: usize,

    /// Per-tick probability of a spawn attempt.
    pub food_spawn_rate: f64,
    pub max_food: usize,
    /// Segments grown per unit of resource value.
    pub growth_per_food: u32,
    pub food_spawn_margin: f32,
    /// Spawns closer than this to any agent segment are rejected.
    pub food_min_spawn_distance: f32,

    /// Target number of AI agents.
    pub ai_count: usize,
    pub ai_vision_range: f32,
    /// Ticks between full AI re-plans.
    pub ai_decision_rate: u32,
    pub ai_aggression: f64,
    pub ai_target_player_chance: f64,
    /// Margin from the world edge for AI spawns.
    pub agent_spawn_margin: f32,
    /// Initial AI agents spawn farther than this from the player.
    pub player_safe_radius: f32,
    /// Extra margin around the view rectangle when respawning.
    pub respawn_view_margin: f32,

    /// Difficulty gained per second of play.
    pub difficulty_increase_rate: f32,
    pub max_difficulty: f32,
    pub difficulty_score_factor: f32,
    /// Final score points per second survived.
    pub time_bonus_factor: f32,

    pub scoreboard_capacity: usize,
    /// Score history file; `None` keeps history in memory only.
    pub scoreboard_path: Option<PathBuf>,
    pub leaderboard_size: usize,
    /// Seconds before a finished game restarts on its own.
    pub restart_delay: f32,

    /// Seed for gameplay randomness; `None` draws one from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            world_width: 3000.0,
            world_height: 2400.0,
            view_width: 800.0,
            view_height: 600.0,
            initial_length: 5,
            player_speed: 5.0,
            ai_speed: 4.0,
            head_radius: 10.0,
            segment_radius: 8.0,
            immunity_duration: 0.5,
            boost_multiplier: 1.8,
            boost_drop_interval: 6,
            boost_min_length: 8,
            boost_cooldown: 1.5,
            boost_food_value: 1,
            self_collision_enabled: false,
            self_collision_start_index: 8,
            dropped_food_cap: 10,
            food_spawn_rate: 0.05,
            max_food: 200,
            growth_per_food: 2,
            food_spawn_margin: 100.0,
            food_min_spawn_distance: 20.0,
            ai_count: 15,
            ai_vision_range: 200.0,
            ai_decision_rate: 10,
            ai_aggression: 0.85,
            ai_target_player_chance: 0.3,
            agent_spawn_margin: 100.0,
            player_safe_radius: 300.0,
            respawn_view_margin: 100.0,
            difficulty_increase_rate: 0.001,
            max_difficulty: 2.0,
            difficulty_score_factor: 1.2,
            time_bonus_factor: 0.5,
            scoreboard_capacity: 10,
            scoreboard_path: None,
            leaderboard_size: 5,
            restart_delay: 3.0,
            rng_seed: None,
        }
    }
}

impl ArenaConfig {
    /// Parse a JSON configuration and validate it.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(value: f32) -> bool {
            value.is_finite() && value > 0.0
        }
        fn probability(value: f64) -> bool {
            (0.0..=1.0).contains(&value)
        }

        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be positive"));
        }
        if !positive(self.world_width) || !positive(self.world_height) {
            return Err(ConfigError::Invalid("world dimensions must be positive"));
        }
        if !positive(self.view_width) || !positive(self.view_height) {
            return Err(ConfigError::Invalid("view dimensions must be positive"));
        }
        if self.initial_length == 0 {
            return Err(ConfigError::Invalid("initial_length must be at least 1"));
        }
        if !positive(self.player_speed) || !positive(self.ai_speed) {
            return Err(ConfigError::Invalid("agent speeds must be positive"));
        }
        if !positive(self.head_radius) || !positive(self.segment_radius) {
            return Err(ConfigError::Invalid("agent radii must be positive"));
        }
        if !(self.immunity_duration >= 0.0) || !(self.boost_cooldown >= 0.0) {
            return Err(ConfigError::Invalid("durations must not be negative"));
        }
        if !positive(self.boost_multiplier) {
            return Err(ConfigError::Invalid("boost_multiplier must be positive"));
        }
        if self.boost_drop_interval == 0 {
            return Err(ConfigError::Invalid("boost_drop_interval must be positive"));
        }
        if self.boost_min_length == 0 {
            return Err(ConfigError::Invalid("boost_min_length must be at least 1"));
        }
        if self.boost_food_value == 0 {
            return Err(ConfigError::Invalid("boost_food_value must be at least 1"));
        }
        if !probability(self.food_spawn_rate)
            || !probability(self.ai_aggression)
            || !probability(self.ai_target_player_chance)
        {
            return Err(ConfigError::Invalid("probabilities must lie in [0, 1]"));
        }
        if self.max_food == 0 {
            return Err(ConfigError::Invalid("max_food must be positive"));
        }
        if self.growth_per_food == 0 {
            return Err(ConfigError::Invalid("growth_per_food must be positive"));
        }
        if !(self.food_min_spawn_distance >= 0.0) {
            return Err(ConfigError::Invalid("food_min_spawn_distance must not be negative"));
        }
        if !(self.food_spawn_margin >= 0.0)
            || self.food_spawn_margin * 2.0 >= self.world_width
            || self.food_spawn_margin * 2.0 >= self.world_height
        {
            return Err(ConfigError::Invalid("food_spawn_margin leaves no spawnable area"));
        }
        if !(self.agent_spawn_margin >= 0.0)
            || self.agent_spawn_margin * 2.0 >= self.world_width
            || self.agent_spawn_margin * 2.0 >= self.world_height
        {
            return Err(ConfigError::Invalid("agent_spawn_margin leaves no spawnable area"));
        }
        if !(self.player_safe_radius >= 0.0) || !(self.respawn_view_margin >= 0.0) {
            return Err(ConfigError::Invalid("spawn distances must not be negative"));
        }
        if !positive(self.ai_vision_range) {
            return Err(ConfigError::Invalid("ai_vision_range must be positive"));
        }
        if self.ai_decision_rate == 0 {
            return Err(ConfigError::Invalid("ai_decision_rate must be positive"));
        }
        if !(self.difficulty_increase_rate >= 0.0) || !(self.max_difficulty >= 1.0) {
            return Err(ConfigError::Invalid(
                "difficulty must ramp up from 1.0 to a cap of at least 1.0",
            ));
        }
        if !(self.difficulty_score_factor >= 0.0) || !(self.time_bonus_factor >= 0.0) {
            return Err(ConfigError::Invalid("score factors must not be negative"));
        }
        if self.scoreboard_capacity == 0 {
            return Err(ConfigError::Invalid("scoreboard_capacity must be positive"));
        }
        if !(self.restart_delay >= 0.0) {
            return Err(ConfigError::Invalid("restart_delay must not be negative"));
        }
        Ok(())
    }

    /// Seconds per tick.
    pub fn fixed_timestep(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn seconds_to_ticks(&self, seconds: f32) -> u32 {
        (seconds * self.tick_rate as f32).round() as u32
    }

    pub fn boost_cooldown_ticks(&self) -> u32 {
        self.seconds_to_ticks(self.boost_cooldown)
    }

    pub fn immunity_ticks(&self) -> u32 {
        self.seconds_to_ticks(self.immunity_duration)
    }

    pub fn restart_delay_ticks(&self) -> u32 {
        self.seconds_to_ticks(self.restart_delay)
    }
}

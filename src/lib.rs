//! Serpent Arena - Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of a snake arena: one
//! player and a population of AI serpents compete for resources on a bounded
//! field, grow by eating and die on walls or rival bodies.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod field;
pub mod scoreboard;
pub mod skins;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::{ArenaSim, GameState};
pub use components::*;
pub use config::{ArenaConfig, ConfigError};
pub use field::{ResourceField, ResourceItem};
pub use scoreboard::{Scoreboard, ScoreboardError};
pub use skins::{Skin, SKINS};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::*;
pub use world::{ArenaClock, SimRng, Snapshot};

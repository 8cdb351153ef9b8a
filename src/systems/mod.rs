//! ECS Systems for the serpent arena.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick Order
//!
//! Every system touches shared agent state, so the tick is one chained
//! schedule rather than parallel groups:
//!
//! **Upkeep**
//! - `field_update_system` - Spawns and animates resources
//! - `spatial_grid_update_system` - Rebuilds the head index
//!
//! **Steering**
//! - `player_intent_system` - Applies the player's heading and boost input
//! - `decision_system` - AI strategy, target and boost choice
//!
//! **Motion**
//! - `advance_system` - Moves every agent, emits boost drops
//!
//! **Collisions**
//! - `boundary_collision_system`
//! - `self_collision_system`
//! - `pairwise_collision_system` - Gather in parallel, apply in id order
//! - `drop_food_system` - Turns corpses into resources
//!
//! **Bookkeeping**
//! - `pickup_system` - One pickup per agent per tick
//! - `population_system` - Prunes and respawns AI agents
//!
//! Within a system, agents are always processed in ascending id order so a
//! seeded arena replays identically.

pub mod collision;
pub mod decision;
pub mod events;
pub mod feeding;
pub mod intent;
pub mod movement;
pub mod population;
pub mod serialization;

pub use collision::*;
pub use decision::decision_system;
pub use events::*;
pub use feeding::*;
pub use intent::*;
pub use movement::*;
pub use population::*;
pub use serialization::*;

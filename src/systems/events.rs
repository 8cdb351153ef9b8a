//! Per-tick observable events.
//!
//! `TickEvents` is cleared at the start of every tick and filled by the
//! systems that run during it.

use crate::components::AgentId;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// What killed an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rival", rename_all = "snake_case")]
pub enum DeathCause {
    Boundary,
    SelfCollision,
    /// Head touched the body of the given rival, who is credited.
    Rival(AgentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub agent: AgentId,
    pub cause: DeathCause,
    /// Body length at the moment of death.
    pub length: usize,
    pub is_player: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupEvent {
    pub agent: AgentId,
    pub value: u32,
    /// Segments (and points) granted.
    pub growth: u32,
}

/// Everything notable that happened during the current tick.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    pub deaths: Vec<DeathEvent>,
    pub pickups: Vec<PickupEvent>,
    /// Byproduct resources placed in the field (boost and death drops).
    pub byproducts: u32,
    /// AI agents spawned by population maintenance.
    pub respawned: Vec<AgentId>,
    /// The player lost a point to boosting.
    pub player_score_reduced: bool,
}

impl TickEvents {
    pub fn clear(&mut self) {
        self.deaths.clear();
        self.pickups.clear();
        self.byproducts = 0;
        self.respawned.clear();
        self.player_score_reduced = false;
    }

    pub fn player_death(&self) -> Option<&DeathEvent> {
        self.deaths.iter().find(|death| death.is_player)
    }

    pub fn is_empty(&self) -> bool {
        self.deaths.is_empty()
            && self.pickups.is_empty()
            && self.byproducts == 0
            && self.respawned.is_empty()
            && !self.player_score_reduced
    }
}

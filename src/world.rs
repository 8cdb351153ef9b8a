//! Arena-wide resources and snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that a renderer or telemetry consumer can read once per tick.

use crate::components::*;
use crate::config::ArenaConfig;
use crate::field::ResourceField;
use crate::systems::events::TickEvents;
use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Source of every gameplay-affecting random draw.
///
/// Cosmetic randomness (colours, animation) never touches this stream, so a
/// seeded arena replays identically.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    /// Seeded stream when `seed` is given, entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(SmallRng::seed_from_u64(seed)),
            None => Self(SmallRng::from_entropy()),
        }
    }
}

/// Tick counter, elapsed play time and the difficulty ramp of one game.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaClock {
    pub tick: u64,
    /// Seconds of play in the current game.
    pub elapsed: f32,
    /// Final-score multiplier, ramping from 1.0 up to the configured cap.
    pub difficulty: f32,
}

impl Default for ArenaClock {
    fn default() -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            difficulty: 1.0,
        }
    }
}

impl ArenaClock {
    pub fn advance(&mut self, config: &ArenaConfig) {
        self.tick = self.tick.wrapping_add(1);
        self.elapsed += config.fixed_timestep();
        self.difficulty =
            (1.0 + self.elapsed * config.difficulty_increase_rate).min(config.max_difficulty);
    }
}

/// Snapshot of a single agent's state for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub is_player: bool,
    pub alive: bool,
    /// Head first.
    pub segments: Vec<Point>,
    pub heading: f32,
    pub score: u32,
    pub boosting: bool,
    /// Ticks until boost is available again.
    pub boost_cooldown: u32,
    pub skin: String,
    pub color: Rgb,
    pub trail: Vec<Point>,
    /// Current AI strategy; absent for the player.
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub value: u32,
    pub radius: f32,
    pub color: Rgb,
    pub pulse: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u32,
    pub score: u32,
    pub is_player: bool,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed play time in seconds.
    pub time: f32,
    pub difficulty: f32,
    pub game_over: bool,
    /// Set once the player has died.
    pub final_score: Option<u64>,
    pub agents: Vec<AgentSnapshot>,
    pub resources: Vec<ResourceSnapshot>,
    /// Living agents ranked by score.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Historical final scores, best first.
    pub scoreboard: Vec<u64>,
    /// Events of the last tick.
    pub events: TickEvents,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    ///
    /// Game-over fields and the score history live outside the world and are
    /// filled in by the caller.
    pub fn from_world(world: &mut World) -> Self {
        let mut agents = Vec::new();
        let mut query = world.query::<(&AgentId, &Agent, Option<&DecisionState>)>();
        for (id, agent, decision) in query.iter(world) {
            agents.push(AgentSnapshot {
                id: id.0,
                is_player: agent.is_player,
                alive: agent.is_alive(),
                segments: agent.segments().iter().copied().collect(),
                heading: agent.heading,
                score: agent.score(),
                boosting: agent.is_boosting(),
                boost_cooldown: agent.boost_cooldown(),
                skin: agent.skin().name.to_string(),
                color: agent.color(),
                trail: agent.trail().iter().copied().collect(),
                strategy: decision.map(|d| d.strategy.as_str().to_string()),
            });
        }
        agents.sort_by_key(|a| a.id);

        let leaderboard_size = world
            .get_resource::<ArenaConfig>()
            .map(|c| c.leaderboard_size)
            .unwrap_or(5);
        let mut leaderboard: Vec<LeaderboardEntry> = agents
            .iter()
            .filter(|a| a.alive)
            .map(|a| LeaderboardEntry {
                id: a.id,
                score: a.score,
                is_player: a.is_player,
            })
            .collect();
        leaderboard.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        leaderboard.truncate(leaderboard_size);

        let resources = world
            .get_resource::<ResourceField>()
            .map(|field| {
                field
                    .items()
                    .iter()
                    .map(|item| ResourceSnapshot {
                        id: item.id,
                        x: item.position.x,
                        y: item.position.y,
                        value: item.value,
                        radius: item.radius(),
                        color: item.color,
                        pulse: item.pulse,
                        rotation: item.rotation,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let clock = world.get_resource::<ArenaClock>().copied().unwrap_or_default();
        let events = world.get_resource::<TickEvents>().cloned().unwrap_or_default();

        Self {
            tick: clock.tick,
            time: clock.elapsed,
            difficulty: clock.difficulty,
            game_over: false,
            final_score: None,
            agents,
            resources,
            leaderboard,
            scoreboard: Vec::new(),
            events,
        }
    }

    pub fn player(&self) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.is_player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = SimRng::new(Some(42));
        let mut b = SimRng::new(Some(42));
        let xs: Vec<u32> = (0..8).map(|_| a.0.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.0.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_clock_difficulty_is_capped() {
        let config = ArenaConfig {
            difficulty_increase_rate: 1.0,
            ..Default::default()
        };
        let mut clock = ArenaClock::default();
        clock.advance(&config);
        assert_eq!(clock.tick, 1);
        assert!(clock.difficulty > 1.0);
        for _ in 0..120 {
            clock.advance(&config);
        }
        assert_eq!(clock.difficulty, config.max_difficulty);
    }

    #[test]
    fn test_snapshot_from_world() {
        let config = ArenaConfig {
            leaderboard_size: 1,
            ..Default::default()
        };
        let mut world = World::new();
        world.insert_resource(ResourceField::new(&config));
        world.insert_resource(ArenaClock::default());

        let mut player = Agent::new(Point::new(500.0, 500.0), 0.0, true, 0, &config);
        player.grow(3);
        world.spawn((AgentId(0), player, Player));
        world.spawn((
            AgentId(1),
            Agent::new(Point::new(900.0, 500.0), 0.0, false, 2, &config),
            AiBundle::new(0.0),
        ));
        world.insert_resource(config);

        let snapshot = Snapshot::from_world(&mut world);
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.agents[0].id, 0);
        assert_eq!(snapshot.agents[0].segments.len(), 8);
        assert!(snapshot.agents[0].strategy.is_none());
        assert_eq!(snapshot.agents[1].strategy.as_deref(), Some("hunt_food"));
        assert_eq!(snapshot.agents[1].skin, "Fire Red");
        assert_eq!(snapshot.leaderboard.len(), 1);
        assert_eq!(snapshot.leaderboard[0].id, 0);
        assert_eq!(snapshot.player().map(|p| p.score), Some(3));
    }
}

//! Collision systems - boundary, self and agent-versus-agent contact.
//!
//! ## Pairwise pass
//!
//! The pairwise pass has two phases:
//!
//! 1. **Gather Phase** - O(n × m) where n = living agents, m = segments checked
//!    - Every agent alive at the start of the pass is tested against every
//!      other such agent, in ascending id order; the first body touched wins
//!    - Read-only, so it is parallelizable
//!
//! 2. **Apply Phase** - O(h) where h = hits
//!    - Kill victims, collect their drops, credit the rival
//!    - Sequential, in ascending victim id order
//!
//! Because the gather phase sees the living set from the start of the pass,
//! two agents that touch each other in the same tick both die. Neither is
//! credited, since the bonus only goes to a surviving rival.
//!
//! ## Parallel Feature
//!
//! When compiled with `--features parallel`, the gather phase uses rayon.
//! The apply order does not change.

use crate::components::*;
use crate::config::ArenaConfig;
use crate::field::ResourceField;
use crate::systems::events::{DeathCause, DeathEvent, TickEvents};
use crate::world::SimRng;
use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Segments of length credited to the rival per point of bonus.
const BONUS_DIVISOR: usize = 5;

/// Food scattered by agents that died this tick, waiting for the field.
#[derive(Resource, Debug, Default)]
pub struct DeathDrops(pub Vec<DroppedFood>);

/// One agent-versus-agent contact found in the gather phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionHit {
    pub victim: Entity,
    pub victim_id: AgentId,
    pub rival: Entity,
    pub rival_id: AgentId,
}

fn kill<R: Rng + ?Sized>(
    id: AgentId,
    agent: &mut Agent,
    cause: DeathCause,
    rng: &mut R,
    config: &ArenaConfig,
    drops: &mut DeathDrops,
    events: &mut TickEvents,
) -> usize {
    let length = agent.len();
    drops.0.extend(agent.die(rng, config));
    events.deaths.push(DeathEvent {
        agent: id,
        cause,
        length,
        is_player: agent.is_player,
    });
    debug!(agent = id.0, ?cause, length, "agent died");
    length
}

/// Living agents as (id, entity), in ascending id order.
fn living_in_order(query: &Query<(Entity, &AgentId, &mut Agent)>) -> Vec<(AgentId, Entity)> {
    let mut order: Vec<(AgentId, Entity)> = query
        .iter()
        .filter(|(_, _, agent)| agent.is_alive())
        .map(|(entity, id, _)| (*id, entity))
        .collect();
    order.sort_unstable();
    order
}

/// System that kills agents whose head reached the world edge.
pub fn boundary_collision_system(
    config: Res<ArenaConfig>,
    mut sim_rng: ResMut<SimRng>,
    mut drops: ResMut<DeathDrops>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(Entity, &AgentId, &mut Agent)>,
) {
    for (id, entity) in living_in_order(&query) {
        let Ok((_, _, mut agent)) = query.get_mut(entity) else {
            continue;
        };
        if agent.check_boundary_collision(config.world_width, config.world_height) {
            kill(
                id,
                &mut agent,
                DeathCause::Boundary,
                &mut sim_rng.0,
                &config,
                &mut drops,
                &mut events,
            );
        }
    }
}

/// System that kills agents whose head overlaps their own body.
/// Does nothing unless self collision is enabled.
pub fn self_collision_system(
    config: Res<ArenaConfig>,
    mut sim_rng: ResMut<SimRng>,
    mut drops: ResMut<DeathDrops>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(Entity, &AgentId, &mut Agent)>,
) {
    if !config.self_collision_enabled {
        return;
    }
    for (id, entity) in living_in_order(&query) {
        let Ok((_, _, mut agent)) = query.get_mut(entity) else {
            continue;
        };
        if agent.check_self_collision(&config) {
            kill(
                id,
                &mut agent,
                DeathCause::SelfCollision,
                &mut sim_rng.0,
                &config,
                &mut drops,
                &mut events,
            );
        }
    }
}

/// First rival (in id order) whose body the agent at `index` touches.
/// This function is pure and can be called in parallel.
fn first_rival_hit(index: usize, bodies: &[(Entity, AgentId, &Agent)]) -> Option<CollisionHit> {
    let (victim, victim_id, agent) = bodies[index];
    bodies
        .iter()
        .filter(|(_, rival_id, _)| *rival_id != victim_id)
        .find(|(_, _, rival)| agent.check_collision(rival))
        .map(|(rival, rival_id, _)| CollisionHit {
            victim,
            victim_id,
            rival: *rival,
            rival_id: *rival_id,
        })
}

/// Gather phase over bodies sorted by id. Hits come back in victim id order.
pub fn gather_hits(bodies: &[(Entity, AgentId, &Agent)]) -> Vec<CollisionHit> {
    #[cfg(feature = "parallel")]
    {
        (0..bodies.len())
            .into_par_iter()
            .filter_map(|index| first_rival_hit(index, bodies))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..bodies.len())
            .filter_map(|index| first_rival_hit(index, bodies))
            .collect()
    }
}

/// System that resolves agent-versus-agent contact.
///
/// The victim dies; a rival still alive after its own hit is resolved grows
/// by `floor(victim_length / 5)`.
pub fn pairwise_collision_system(
    config: Res<ArenaConfig>,
    mut sim_rng: ResMut<SimRng>,
    mut drops: ResMut<DeathDrops>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(Entity, &AgentId, &mut Agent)>,
) {
    let hits = {
        let mut bodies: Vec<(Entity, AgentId, &Agent)> = query
            .iter()
            .filter(|(_, _, agent)| agent.is_alive())
            .map(|(entity, id, agent)| (entity, *id, agent))
            .collect();
        bodies.sort_unstable_by_key(|(_, id, _)| *id);
        gather_hits(&bodies)
    };

    for hit in hits {
        let Ok((_, _, mut victim)) = query.get_mut(hit.victim) else {
            continue;
        };
        if !victim.is_alive() {
            continue;
        }
        let length = kill(
            hit.victim_id,
            &mut victim,
            DeathCause::Rival(hit.rival_id),
            &mut sim_rng.0,
            &config,
            &mut drops,
            &mut events,
        );

        let bonus = (length / BONUS_DIVISOR) as u32;
        if bonus == 0 {
            continue;
        }
        // only a surviving rival is credited
        if let Ok((_, _, mut rival)) = query.get_mut(hit.rival) {
            if rival.is_alive() {
                rival.grow(bonus);
            }
        }
    }
}

/// System that moves this tick's death drops into the resource field.
pub fn drop_food_system(
    mut drops: ResMut<DeathDrops>,
    mut field: ResMut<ResourceField>,
    mut events: ResMut<TickEvents>,
) {
    for food in drops.0.drain(..) {
        if field
            .add_byproduct(food.position, food.value, None)
            .is_some()
        {
            events.byproducts += 1;
        }
    }
}

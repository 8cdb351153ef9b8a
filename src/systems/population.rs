//! Population maintenance - pruning dead AI agents and respawning new ones.

use crate::components::*;
use crate::config::ArenaConfig;
use crate::skins::SKINS;
use crate::systems::events::TickEvents;
use crate::world::SimRng;
use bevy_ecs::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::debug;

/// Replacements spawned per tick at most.
const MAX_RESPAWNS_PER_TICK: usize = 2;
/// Candidate positions tried before settling for the last one.
const SPAWN_ATTEMPTS: usize = 64;

/// Hands out agent ids; never reuses one within a game.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct AgentIdAllocator {
    next: u32,
}

impl AgentIdAllocator {
    pub fn allocate(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

fn random_spawn_point<R: Rng + ?Sized>(config: &ArenaConfig, rng: &mut R) -> Point {
    let margin = config.agent_spawn_margin;
    Point::new(
        rng.gen_range(margin..=config.world_width - margin),
        rng.gen_range(margin..=config.world_height - margin),
    )
}

/// Spawn point for the initial population: farther than the safe radius from
/// the player.
pub fn initial_spawn_point<R: Rng + ?Sized>(config: &ArenaConfig, rng: &mut R, player: Point) -> Point {
    let safe_sq = config.player_safe_radius * config.player_safe_radius;
    let mut candidate = random_spawn_point(config, rng);
    for _ in 1..SPAWN_ATTEMPTS {
        if candidate.distance_sq(&player) > safe_sq {
            break;
        }
        candidate = random_spawn_point(config, rng);
    }
    candidate
}

/// The player's view rectangle (clamped to the world) grown by the respawn
/// margin, as (min, max) corners.
pub fn view_exclusion(config: &ArenaConfig, player: Point) -> (Point, Point) {
    let clamp_axis = |value: f32, half: f32, extent: f32| {
        if half * 2.0 >= extent {
            extent / 2.0
        } else {
            value.clamp(half, extent - half)
        }
    };
    let half_w = config.view_width / 2.0;
    let half_h = config.view_height / 2.0;
    let center = Point::new(
        clamp_axis(player.x, half_w, config.world_width),
        clamp_axis(player.y, half_h, config.world_height),
    );
    let margin = config.respawn_view_margin;
    (
        Point::new(center.x - half_w - margin, center.y - half_h - margin),
        Point::new(center.x + half_w + margin, center.y + half_h + margin),
    )
}

/// Spawn point for a replacement: outside what the player can currently see.
pub fn respawn_point<R: Rng + ?Sized>(config: &ArenaConfig, rng: &mut R, player: Point) -> Point {
    let (min, max) = view_exclusion(config, player);
    let visible = |p: &Point| p.x > min.x && p.x < max.x && p.y > min.y && p.y < max.y;
    let mut candidate = random_spawn_point(config, rng);
    for _ in 1..SPAWN_ATTEMPTS {
        if !visible(&candidate) {
            break;
        }
        candidate = random_spawn_point(config, rng);
    }
    candidate
}

/// Components of a fresh AI agent. Heading comes from the gameplay stream,
/// the skin is cosmetic.
pub fn ai_agent<R: Rng + ?Sized>(
    id: AgentId,
    head: Point,
    config: &ArenaConfig,
    rng: &mut R,
) -> (AgentBundle, AiBundle) {
    let heading = rng.gen_range(0.0..TAU);
    let skin_index = rand::thread_rng().gen_range(0..SKINS.len());
    (
        AgentBundle {
            id,
            agent: Agent::new(head, heading, false, skin_index, config),
        },
        AiBundle::new(heading),
    )
}

/// System that despawns dead AI agents and tops the population back up.
///
/// Replacements are only spawned once fewer than half of `ai_count` AI
/// agents are alive, at most two per tick. The player entity is never
/// despawned here.
pub fn population_system(
    mut commands: Commands,
    config: Res<ArenaConfig>,
    mut sim_rng: ResMut<SimRng>,
    mut ids: ResMut<AgentIdAllocator>,
    mut events: ResMut<TickEvents>,
    query: Query<(Entity, &Agent, Has<Player>)>,
) {
    let mut alive_ai = 0usize;
    let mut player_head = None;
    for (entity, agent, is_player) in query.iter() {
        if is_player {
            player_head = Some(agent.head());
        } else if agent.is_alive() {
            alive_ai += 1;
        } else {
            commands.entity(entity).despawn();
        }
    }

    if alive_ai >= config.ai_count / 2 {
        return;
    }

    let anchor = player_head
        .unwrap_or_else(|| Point::new(config.world_width / 2.0, config.world_height / 2.0));
    let count = MAX_RESPAWNS_PER_TICK.min(config.ai_count - alive_ai);
    for _ in 0..count {
        let id = ids.allocate();
        let head = respawn_point(&config, &mut sim_rng.0, anchor);
        commands.spawn(ai_agent(id, head, &config, &mut sim_rng.0));
        events.respawned.push(id);
        debug!(agent = id.0, x = head.x, y = head.y, "respawned AI agent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn population_world(config: ArenaConfig) -> World {
        let mut world = World::new();
        world.insert_resource(SimRng::new(Some(21)));
        world.insert_resource(AgentIdAllocator { next: 100 });
        world.insert_resource(TickEvents::default());
        world.insert_resource(config);
        world
    }

    #[test]
    fn test_initial_spawn_respects_safe_radius() {
        let config = ArenaConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let player = Point::new(1500.0, 1200.0);
        for _ in 0..100 {
            let p = initial_spawn_point(&config, &mut rng, player);
            assert!(p.distance_to(&player) > config.player_safe_radius);
            assert!(p.x >= 100.0 && p.x <= 2900.0);
        }
    }

    #[test]
    fn test_respawn_outside_view() {
        let config = ArenaConfig::default();
        let mut rng = SmallRng::seed_from_u64(4);
        let player = Point::new(1500.0, 1200.0);
        let (min, max) = view_exclusion(&config, player);
        assert_eq!(min, Point::new(1000.0, 800.0));
        assert_eq!(max, Point::new(2000.0, 1600.0));
        for _ in 0..100 {
            let p = respawn_point(&config, &mut rng, player);
            assert!(p.x <= min.x || p.x >= max.x || p.y <= min.y || p.y >= max.y);
        }
    }

    #[test]
    fn test_view_is_clamped_to_world() {
        let config = ArenaConfig::default();
        let (min, _) = view_exclusion(&config, Point::new(50.0, 50.0));
        assert_eq!(min, Point::new(-100.0, -100.0));
    }

    #[test]
    fn test_respawns_two_per_tick_below_half() {
        let config = ArenaConfig {
            ai_count: 6,
            ..Default::default()
        };
        let mut world = population_world(config.clone());
        world.spawn((
            AgentId(0),
            Agent::new(Point::new(1500.0, 1200.0), 0.0, true, 0, &config),
            Player,
        ));
        world.spawn((
            AgentId(1),
            Agent::new(Point::new(500.0, 500.0), 0.0, false, 0, &config),
            AiBundle::new(0.0),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(population_system);
        schedule.run(&mut world);

        let events = world.resource::<TickEvents>();
        assert_eq!(events.respawned, vec![AgentId(100), AgentId(101)]);
        let mut query = world.query_filtered::<&Agent, With<AiControlled>>();
        assert_eq!(query.iter(&world).count(), 3);

        // 3 alive == ai_count / 2, no more respawns
        world.resource_mut::<TickEvents>().clear();
        schedule.run(&mut world);
        assert!(world.resource::<TickEvents>().respawned.is_empty());
    }

    #[test]
    fn test_dead_ai_despawned_player_kept() {
        let config = ArenaConfig {
            ai_count: 0,
            ..Default::default()
        };
        let mut world = population_world(config.clone());
        let mut rng = SmallRng::seed_from_u64(1);

        let mut player = Agent::new(Point::new(1500.0, 1200.0), 0.0, true, 0, &config);
        player.die(&mut rng, &config);
        world.spawn((AgentId(0), player, Player));
        let mut corpse = Agent::new(Point::new(500.0, 500.0), 0.0, false, 0, &config);
        corpse.die(&mut rng, &config);
        world.spawn((AgentId(1), corpse, AiBundle::new(0.0)));

        let mut schedule = Schedule::default();
        schedule.add_systems(population_system);
        schedule.run(&mut world);

        let mut query = world.query::<&AgentId>();
        let ids: Vec<_> = query.iter(&world).copied().collect();
        assert_eq!(ids, vec![AgentId(0)]);
    }
}

//! Feeding systems - resource field upkeep and pickup.

use crate::components::*;
use crate::config::ArenaConfig;
use crate::field::ResourceField;
use crate::systems::events::{PickupEvent, TickEvents};
use crate::world::SimRng;
use bevy_ecs::prelude::*;

/// System that runs the field's spawn step and animation.
///
/// Every segment of every living agent counts as occupied.
pub fn field_update_system(
    mut field: ResMut<ResourceField>,
    mut sim_rng: ResMut<SimRng>,
    query: Query<&Agent>,
) {
    let occupied = query
        .iter()
        .filter(|agent| agent.is_alive())
        .flat_map(|agent| agent.segments().iter());
    field.update(occupied, &mut sim_rng.0);
}

/// System that lets each living agent eat at most one resource.
///
/// Agents are served in ascending id order, so when two heads reach the same
/// item the lower id gets it.
pub fn pickup_system(
    config: Res<ArenaConfig>,
    mut field: ResMut<ResourceField>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(&AgentId, &mut Agent)>,
) {
    let mut agents: Vec<_> = query
        .iter_mut()
        .filter(|(_, agent)| agent.is_alive())
        .collect();
    agents.sort_unstable_by_key(|(id, _)| **id);

    for (id, mut agent) in agents {
        let value = field.consume(agent.head(), agent.head_radius);
        if value == 0 {
            continue;
        }
        let growth = value * config.growth_per_food;
        agent.grow(growth);
        events.pickups.push(PickupEvent {
            agent: *id,
            value,
            growth,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feeding_world(config: ArenaConfig) -> World {
        let mut world = World::new();
        world.insert_resource(ResourceField::new(&config));
        world.insert_resource(SimRng::new(Some(5)));
        world.insert_resource(TickEvents::default());
        world.insert_resource(config);
        world
    }

    #[test]
    fn test_pickup_grows_by_value_times_growth() {
        let config = ArenaConfig::default();
        let mut world = feeding_world(config.clone());
        world.spawn((
            AgentId(1),
            Agent::new(Point::new(1000.0, 1000.0), 0.0, false, 0, &config),
        ));
        world
            .resource_mut::<ResourceField>()
            .add_byproduct(Point::new(1010.0, 1000.0), 3, None);

        let mut schedule = Schedule::default();
        schedule.add_systems(pickup_system);
        schedule.run(&mut world);

        let mut query = world.query::<&Agent>();
        let agent = query.single(&world);
        assert_eq!(agent.len(), 11);
        assert_eq!(agent.score(), 6);
        assert!(world.resource::<ResourceField>().is_empty());
        assert_eq!(
            world.resource::<TickEvents>().pickups,
            vec![PickupEvent {
                agent: AgentId(1),
                value: 3,
                growth: 6
            }]
        );
    }

    #[test]
    fn test_one_pickup_per_agent_per_tick() {
        let config = ArenaConfig::default();
        let mut world = feeding_world(config.clone());
        world.spawn((
            AgentId(1),
            Agent::new(Point::new(1000.0, 1000.0), 0.0, false, 0, &config),
        ));
        {
            let mut field = world.resource_mut::<ResourceField>();
            field.add_byproduct(Point::new(1000.0, 1000.0), 1, None);
            field.add_byproduct(Point::new(1001.0, 1000.0), 1, None);
        }

        let mut schedule = Schedule::default();
        schedule.add_systems(pickup_system);
        schedule.run(&mut world);
        assert_eq!(world.resource::<ResourceField>().len(), 1);
        schedule.run(&mut world);
        assert!(world.resource::<ResourceField>().is_empty());
    }

    #[test]
    fn test_lower_id_wins_shared_item() {
        let config = ArenaConfig::default();
        let mut world = feeding_world(config.clone());
        world.spawn((
            AgentId(8),
            Agent::new(Point::new(1000.0, 1000.0), 0.0, false, 0, &config),
        ));
        world.spawn((
            AgentId(3),
            Agent::new(Point::new(1004.0, 1000.0), 0.0, false, 0, &config),
        ));
        world
            .resource_mut::<ResourceField>()
            .add_byproduct(Point::new(1002.0, 1000.0), 2, None);

        let mut schedule = Schedule::default();
        schedule.add_systems(pickup_system);
        schedule.run(&mut world);

        let pickups = &world.resource::<TickEvents>().pickups;
        assert_eq!(pickups.len(), 1);
        assert_eq!(pickups[0].agent, AgentId(3));
    }

    #[test]
    fn test_field_update_avoids_agents() {
        let config = ArenaConfig {
            food_spawn_rate: 1.0,
            food_min_spawn_distance: 5000.0,
            ..Default::default()
        };
        let mut world = feeding_world(config.clone());
        world.spawn((
            AgentId(1),
            Agent::new(Point::new(1500.0, 1200.0), 0.0, false, 0, &config),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(field_update_system);
        for _ in 0..20 {
            schedule.run(&mut world);
        }
        assert!(world.resource::<ResourceField>().is_empty());
    }

    #[test]
    fn test_field_update_spawns_when_clear() {
        let config = ArenaConfig {
            food_spawn_rate: 1.0,
            ..Default::default()
        };
        let mut world = feeding_world(config);

        let mut schedule = Schedule::default();
        schedule.add_systems(field_update_system);
        for _ in 0..20 {
            schedule.run(&mut world);
        }
        assert_eq!(world.resource::<ResourceField>().len(), 20);
    }
}

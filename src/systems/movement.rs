//! Movement system - advances every living agent by one tick.

use crate::components::*;
use crate::config::ArenaConfig;
use crate::field::ResourceField;
use crate::systems::events::TickEvents;
use bevy_ecs::prelude::*;

/// System that moves agents and turns boost drops into byproduct resources.
///
/// Drops are tinted with the dropping agent's colour and inserted in
/// ascending agent id order.
pub fn advance_system(
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

    for (_, mut agent) in agents {
        let outcome = agent.advance(&config);
        let color = agent.color();
        for tail in outcome.dropped {
            if field
                .add_byproduct(tail, config.boost_food_value, Some(color))
                .is_some()
            {
                events.byproducts += 1;
            }
        }
        if outcome.score_reduced {
            events.player_score_reduced = true;
        }
    }
}

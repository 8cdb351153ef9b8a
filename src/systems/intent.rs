//! Player intent - the externally supplied steering input.

use crate::components::*;
use crate::config::ArenaConfig;
use bevy_ecs::prelude::*;

/// Input snapshot for the player, sampled once per tick.
///
/// The value persists between ticks until the controller replaces it.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    /// Heading in radians; `None` keeps the current heading.
    pub desired_heading: Option<f32>,
    pub boost_requested: bool,
}

/// System that applies the intent snapshot to the living player.
pub fn player_intent_system(
    config: Res<ArenaConfig>,
    intent: Res<PlayerIntent>,
    mut query: Query<&mut Agent, With<Player>>,
) {
    for mut agent in query.iter_mut() {
        if !agent.is_alive() {
            continue;
        }
        if let Some(heading) = intent.desired_heading {
            agent.set_heading(heading, &config);
        }
        agent.toggle_boost(intent.boost_requested, &config);
    }
}

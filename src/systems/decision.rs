//! Decision engine for AI-controlled agents.
//!
//! Every tick an AI agent turns a little toward its stored target heading and
//! re-evaluates boost. Every `ai_decision_rate` ticks it re-plans: it picks a
//! strategy from what it can see, resolves that strategy to a world point and
//! stores the heading toward it. Between re-plans the target is stale on
//! purpose, which keeps the steering smooth and cheap.

use crate::components::*;
use crate::config::ArenaConfig;
use crate::field::ResourceField;
use crate::spatial::SpatialGrid;
use crate::world::SimRng;
use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Rivals closer than this are considered during a re-plan.
const NEARBY_RIVAL_RADIUS: f32 = 300.0;

const TARGET_PLAYER_MIN_SIZE: usize = 30;
const TARGET_PLAYER_RANGE: f32 = 400.0;
const TARGET_PLAYER_SIZE_RATIO: f32 = 1.2;
const PLAYER_LEAD_RANGE: f32 = 300.0;
const PLAYER_MAX_LEAD: f32 = 200.0;
const PLAYER_LEAD_JITTER: f32 = 30.0;

const LARGE_AGENT_SIZE: usize = 20;
const SMALLER_RIVAL_RATIO: f32 = 0.7;
const LARGER_RIVAL_RATIO: f32 = 1.3;
const MAX_ENCIRCLE_CHANCE: f64 = 0.7;

const ATTACK_MIN_RANGE: f32 = 50.0;
const ATTACK_MAX_RANGE: f32 = 250.0;
const ATTACK_MAX_SIZE_RATIO: f32 = 1.5;
const ATTACK_MIN_SIZE: usize = 10;
const INTERCEPT_OFFSET: f32 = 50.0;
const INTERCEPT_JITTER: f32 = 30.0;

const ENCIRCLE_MAX_SIZE_RATIO: f32 = 0.5;
const ENCIRCLE_MIN_SIZE: usize = 5;
const ENCIRCLE_RANGE: f32 = 200.0;
const ENCIRCLE_RADIUS: f32 = 60.0;
const ENCIRCLE_RADIUS_JITTER: f32 = 10.0;

const EVADE_RANGE: f32 = 200.0;
const EVADE_DISTANCE: f32 = 150.0;

const WANDER_RADIUS: f32 = 300.0;
const FOOD_VALUE_WEIGHT: f32 = 50.0;

const HEADING_JITTER: f32 = 0.15;
/// Radians turned per tick toward the target heading.
const TURN_RATE: f32 = 0.05;
/// Heading errors at or below this are left alone.
const TURN_DEADBAND: f32 = 0.1;

const BOOST_FOOD_RANGE: f32 = 150.0;
const BOOST_FOOD_MIN_VALUE: u32 = 3;
const THREAT_RANGE: f32 = 100.0;
const CHASE_RANGE: f32 = 120.0;
const CHASE_AGGRESSION_SCALE: f64 = 0.7;

// ============================================================================
// PERCEPTION
// ============================================================================

/// Read-only copy of the parts of an agent the decision engine looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub head: Point,
    pub neck: Option<Point>,
    pub heading: f32,
    pub len: usize,
    pub is_player: bool,
}

impl AgentView {
    pub fn of(id: AgentId, agent: &Agent) -> Self {
        Self {
            id,
            head: agent.head(),
            neck: agent.neck(),
            heading: agent.heading,
            len: agent.len(),
            is_player: agent.is_player,
        }
    }

    /// Unit vector of the last move (neck to head), if the agent has moved.
    pub fn direction(&self) -> Option<(f32, f32)> {
        let neck = self.neck?;
        let dx = self.head.x - neck.x;
        let dy = self.head.y - neck.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f32::EPSILON {
            None
        } else {
            Some((dx / length, dy / length))
        }
    }

    /// Movement direction, falling back to the heading for a coiled body.
    pub fn movement(&self) -> (f32, f32) {
        self.direction()
            .unwrap_or((self.heading.cos(), self.heading.sin()))
    }
}

/// A rival seen from one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rival {
    pub view: AgentView,
    pub distance: f32,
}

/// Highest-scoring candidate; the earliest one wins ties.
fn best_by<T>(candidates: impl Iterator<Item = (f32, T)>) -> Option<T> {
    let mut best: Option<(f32, T)> = None;
    for (score, candidate) in candidates {
        match &best {
            Some((top, _)) if *top >= score => {}
            _ => best = Some((score, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

/// Wrap an angle into [-π, π).
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Turn at most `TURN_RATE` toward `target`; small errors are ignored.
pub fn smooth_heading(current: f32, target: f32) -> f32 {
    let diff = wrap_angle(target - current);
    if diff.abs() > TURN_DEADBAND {
        wrap_angle(current + TURN_RATE * diff.signum())
    } else {
        current
    }
}

// ============================================================================
// STRATEGY SELECTION
// ============================================================================

/// Pick the behaviour for the next planning window.
pub fn choose_strategy<R: Rng + ?Sized>(
    me: &AgentView,
    rivals: &[Rival],
    player: Option<&AgentView>,
    config: &ArenaConfig,
    rng: &mut R,
) -> Strategy {
    let own = me.len as f32;

    if let Some(player) = player.filter(|p| p.id != me.id) {
        if me.len > TARGET_PLAYER_MIN_SIZE
            && rng.gen_bool(config.ai_target_player_chance)
            && me.head.distance_to(&player.head) < TARGET_PLAYER_RANGE
            && own > player.len as f32 * TARGET_PLAYER_SIZE_RATIO
        {
            return Strategy::TargetPlayer;
        }
    }

    if rivals.is_empty() {
        return Strategy::HuntFood;
    }

    if me.len > LARGE_AGENT_SIZE
        && rivals
            .iter()
            .any(|r| (r.view.len as f32) < own * SMALLER_RIVAL_RATIO)
    {
        let chance = (me.len as f64 / 100.0).min(MAX_ENCIRCLE_CHANCE);
        return if rng.gen_bool(chance) {
            Strategy::Encircle
        } else {
            Strategy::Attack
        };
    }

    if rivals
        .iter()
        .any(|r| r.view.len as f32 > own * LARGER_RIVAL_RATIO)
    {
        return Strategy::Evade;
    }

    Strategy::HuntFood
}

// ============================================================================
// TARGET RESOLUTION
// ============================================================================

/// Most valuable visible resource, or a random point near the arena centre.
pub fn hunt_food_target<R: Rng + ?Sized>(
    me: &AgentView,
    field: &ResourceField,
    config: &ArenaConfig,
    rng: &mut R,
) -> Point {
    let visible = field.items().iter().filter_map(|item| {
        let distance = item.position.distance_to(&me.head);
        (distance < config.ai_vision_range)
            .then(|| (item.value as f32 * FOOD_VALUE_WEIGHT - distance, item.position))
    });
    best_by(visible).unwrap_or_else(|| {
        Point::new(
            config.world_width / 2.0 + rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS),
            config.world_height / 2.0 + rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS),
        )
    })
}

/// Intercept point ahead of the best moving rival of comparable size.
pub fn attack_target<R: Rng + ?Sized>(me: &AgentView, rivals: &[Rival], rng: &mut R) -> Option<Point> {
    let own = me.len as f32;
    let prey = best_by(
        rivals
            .iter()
            .filter(|r| {
                r.distance > ATTACK_MIN_RANGE
                    && r.distance < ATTACK_MAX_RANGE
                    && r.view.len as f32 <= own * ATTACK_MAX_SIZE_RATIO
                    && r.view.len >= ATTACK_MIN_SIZE
                    && r.view.direction().is_some()
            })
            .map(|r| (300.0 - r.distance - r.view.len as f32 * 0.5, r)),
    )?;
    let (dx, dy) = prey.view.direction()?;
    let lead = INTERCEPT_OFFSET + rng.gen_range(0.0..INTERCEPT_JITTER);
    Some(Point::new(
        prey.view.head.x + dx * lead,
        prey.view.head.y + dy * lead,
    ))
}

/// Orbit point beside a much smaller nearby rival.
pub fn encircle_target<R: Rng + ?Sized>(me: &AgentView, rivals: &[Rival], rng: &mut R) -> Option<Point> {
    let own = me.len as f32;
    let prey = best_by(
        rivals
            .iter()
            .filter(|r| {
                r.view.len as f32 <= own * ENCIRCLE_MAX_SIZE_RATIO
                    && r.view.len >= ENCIRCLE_MIN_SIZE
                    && r.distance < ENCIRCLE_RANGE
            })
            .map(|r| (250.0 - r.distance - r.view.len as f32, r)),
    )?;
    let bearing = (prey.view.head.y - me.head.y).atan2(prey.view.head.x - me.head.x);
    let radius = ENCIRCLE_RADIUS + rng.gen_range(-ENCIRCLE_RADIUS_JITTER..=ENCIRCLE_RADIUS_JITTER);
    Some(prey.view.head.offset(bearing + FRAC_PI_2, radius))
}

/// Point away from every larger nearby rival, kept inside the arena.
pub fn evade_target(me: &AgentView, rivals: &[Rival], config: &ArenaConfig) -> Option<Point> {
    let own = me.len.max(1) as f32;
    let (mut ax, mut ay) = (0.0f32, 0.0f32);
    for rival in rivals
        .iter()
        .filter(|r| r.view.len > me.len && r.distance < EVADE_RANGE)
    {
        let distance = rival.distance.max(0.1);
        let weight = (EVADE_RANGE / distance) * (rival.view.len as f32 / own);
        ax += (me.head.x - rival.view.head.x) / distance * weight;
        ay += (me.head.y - rival.view.head.y) / distance * weight;
    }

    let norm = (ax * ax + ay * ay).sqrt();
    if norm <= f32::EPSILON {
        return None;
    }
    let margin = config.agent_spawn_margin;
    Some(Point::new(
        (me.head.x + ax / norm * EVADE_DISTANCE).clamp(margin, config.world_width - margin),
        (me.head.y + ay / norm * EVADE_DISTANCE).clamp(margin, config.world_height - margin),
    ))
}

/// Lead the player when close, otherwise head straight for it.
pub fn target_player_target<R: Rng + ?Sized>(me: &AgentView, player: &AgentView, rng: &mut R) -> Point {
    let distance = me.head.distance_to(&player.head);
    if distance >= PLAYER_LEAD_RANGE {
        return player.head;
    }
    let (dx, dy) = player.movement();
    let lead = (distance / 2.0).min(PLAYER_MAX_LEAD);
    Point::new(
        player.head.x + dx * lead + PLAYER_LEAD_JITTER * rng.gen_range(-1.0..=1.0),
        player.head.y + dy * lead + PLAYER_LEAD_JITTER * rng.gen_range(-1.0..=1.0),
    )
}

/// Resolve a strategy to a point. Strategies without a usable target fall
/// back to hunting food, and the returned strategy says so.
pub fn resolve_target<R: Rng + ?Sized>(
    strategy: Strategy,
    me: &AgentView,
    rivals: &[Rival],
    player: Option<&AgentView>,
    field: &ResourceField,
    config: &ArenaConfig,
    rng: &mut R,
) -> (Strategy, Point) {
    let resolved = match strategy {
        Strategy::HuntFood => None,
        Strategy::Attack => attack_target(me, rivals, rng),
        Strategy::Encircle => encircle_target(me, rivals, rng),
        Strategy::Evade => evade_target(me, rivals, config),
        Strategy::TargetPlayer => player.map(|p| target_player_target(me, p, rng)),
    };
    match resolved {
        Some(point) => (strategy, point),
        None => (Strategy::HuntFood, hunt_food_target(me, field, config, rng)),
    }
}

// ============================================================================
// BOOST
// ============================================================================

/// Boost intent for this tick.
pub fn wants_boost<R: Rng + ?Sized>(
    me: &AgentView,
    agent: &Agent,
    rivals: &[Rival],
    field: &ResourceField,
    config: &ArenaConfig,
    rng: &mut R,
) -> bool {
    if !agent.can_boost(config) {
        return false;
    }

    let valuable_food = field.items().iter().any(|item| {
        item.value >= BOOST_FOOD_MIN_VALUE && item.position.distance_to(&me.head) < BOOST_FOOD_RANGE
    });
    if valuable_food {
        return true;
    }

    let threatened = rivals.iter().any(|r| {
        if r.view.len <= me.len || r.distance >= THREAT_RANGE {
            return false;
        }
        let (mx, my) = r.view.movement();
        mx * (me.head.x - r.view.head.x) + my * (me.head.y - r.view.head.y) > 0.0
    });
    if threatened {
        return true;
    }

    let (hx, hy) = me.movement();
    let prey_ahead = rivals.iter().any(|r| {
        (r.view.len as f32) < me.len as f32 * SMALLER_RIVAL_RATIO
            && r.distance < CHASE_RANGE
            && hx * (r.view.head.x - me.head.x) + hy * (r.view.head.y - me.head.y) > 0.0
    });
    prey_ahead && rng.gen_bool(config.ai_aggression * CHASE_AGGRESSION_SCALE)
}

// ============================================================================
// DECISION SYSTEM
// ============================================================================

/// System that steers every living AI agent.
///
/// Agents are processed in ascending id order so a seeded run consumes the
/// random stream identically. All agents see the positions from the start of
/// the system.
pub fn decision_system(
    config: Res<ArenaConfig>,
    grid: Res<SpatialGrid>,
    field: Res<ResourceField>,
    mut sim_rng: ResMut<SimRng>,
    mut agents: Query<(Entity, &AgentId, &mut Agent, Option<&mut DecisionState>)>,
) {
    let rng = &mut sim_rng.0;

    let views: HashMap<AgentId, AgentView> = agents
        .iter()
        .filter(|(_, _, agent, _)| agent.is_alive())
        .map(|(_, id, agent, _)| (*id, AgentView::of(*id, agent)))
        .collect();
    let player = views.values().find(|v| v.is_player).copied();

    let mut order: Vec<(AgentId, Entity)> = agents
        .iter()
        .filter(|(_, _, agent, decision)| decision.is_some() && agent.is_alive())
        .map(|(entity, id, _, _)| (*id, entity))
        .collect();
    order.sort_unstable();

    for (id, entity) in order {
        let Ok((_, _, mut agent, Some(mut decision))) = agents.get_mut(entity) else {
            continue;
        };
        let Some(me) = views.get(&id).copied() else {
            continue;
        };

        let rivals: Vec<Rival> = grid
            .query_rivals(id, me.head.x, me.head.y, NEARBY_RIVAL_RADIUS)
            .into_iter()
            .filter_map(|entry| {
                views.get(&entry.id).map(|view| Rival {
                    view: *view,
                    distance: entry.distance_to(me.head.x, me.head.y),
                })
            })
            .collect();

        decision.counter += 1;
        if decision.counter < config.ai_decision_rate {
            let heading = smooth_heading(agent.heading, decision.target_angle);
            agent.set_heading(heading, &config);
        } else {
            // re-plan ticks only pick a new target; turning starts next tick
            decision.counter = 0;
            let chosen = choose_strategy(&me, &rivals, player.as_ref(), &config, rng);
            let (strategy, target) =
                resolve_target(chosen, &me, &rivals, player.as_ref(), &field, &config, rng);
            let jitter = rng.gen_range(-1.0..=1.0) * HEADING_JITTER / (1.0 + me.len as f32 * 0.01);

            decision.strategy = strategy;
            decision.target = Some(target);
            decision.target_angle = (target.y - me.head.y).atan2(target.x - me.head.x) + jitter;
        }

        let boost = wants_boost(&me, &agent, &rivals, &field, &config, rng);
        agent.toggle_boost(boost, &config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::spatial_grid_update_system;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn view(id: u32, x: f32, y: f32, len: usize) -> AgentView {
        AgentView {
            id: AgentId(id),
            head: Point::new(x, y),
            neck: Some(Point::new(x - 5.0, y)),
            heading: 0.0,
            len,
            is_player: false,
        }
    }

    fn rival(me: &AgentView, other: AgentView) -> Rival {
        Rival {
            distance: me.head.distance_to(&other.head),
            view: other,
        }
    }

    #[test]
    fn test_wrap_and_smooth_heading() {
        assert!((wrap_angle(2.5 * PI) - FRAC_PI_2).abs() < 1e-4);
        assert_eq!(smooth_heading(0.0, 0.05), 0.0);
        assert!((smooth_heading(0.0, 1.0) - TURN_RATE).abs() < 1e-6);
        assert!((smooth_heading(0.0, -1.0) + TURN_RATE).abs() < 1e-6);
        // takes the short way round
        assert!(smooth_heading(3.0, -3.0) > 3.0);
    }

    #[test]
    fn test_alone_hunts_food() {
        let config = ArenaConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let me = view(1, 1000.0, 1000.0, 50);
        assert_eq!(
            choose_strategy(&me, &[], None, &config, &mut rng),
            Strategy::HuntFood
        );
    }

    #[test]
    fn test_small_agent_evades_large_rival() {
        let config = ArenaConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let me = view(1, 1000.0, 1000.0, 10);
        let big = rival(&me, view(2, 1100.0, 1000.0, 40));
        assert_eq!(
            choose_strategy(&me, &[big], None, &config, &mut rng),
            Strategy::Evade
        );
    }

    #[test]
    fn test_large_agent_hunts_smaller_rival() {
        let config = ArenaConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let me = view(1, 1000.0, 1000.0, 60);
        let small = rival(&me, view(2, 1100.0, 1000.0, 12));
        for _ in 0..20 {
            let strategy = choose_strategy(&me, &[small], None, &config, &mut rng);
            assert!(matches!(strategy, Strategy::Encircle | Strategy::Attack));
        }
    }

    #[test]
    fn test_targets_player_when_certain() {
        let config = ArenaConfig {
            ai_target_player_chance: 1.0,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let me = view(1, 1000.0, 1000.0, 40);
        let mut player = view(0, 1200.0, 1000.0, 10);
        player.is_player = true;
        assert_eq!(
            choose_strategy(&me, &[], Some(&player), &config, &mut rng),
            Strategy::TargetPlayer
        );

        // too far away
        let mut distant = player;
        distant.head = Point::new(1500.0, 1000.0);
        assert_eq!(
            choose_strategy(&me, &[], Some(&distant), &config, &mut rng),
            Strategy::HuntFood
        );
    }

    #[test]
    fn test_hunt_food_prefers_value() {
        let config = ArenaConfig::default();
        let mut field = ResourceField::new(&config);
        field.add_byproduct(Point::new(1020.0, 1000.0), 1, None);
        field.add_byproduct(Point::new(1150.0, 1000.0), 5, None);
        let mut rng = SmallRng::seed_from_u64(1);
        let me = view(1, 1000.0, 1000.0, 10);
        assert_eq!(
            hunt_food_target(&me, &field, &config, &mut rng),
            Point::new(1150.0, 1000.0)
        );
    }

    #[test]
    fn test_hunt_food_wanders_near_centre() {
        let config = ArenaConfig::default();
        let field = ResourceField::new(&config);
        let mut rng = SmallRng::seed_from_u64(4);
        let me = view(1, 200.0, 200.0, 10);
        for _ in 0..20 {
            let target = hunt_food_target(&me, &field, &config, &mut rng);
            assert!((target.x - 1500.0).abs() <= WANDER_RADIUS);
            assert!((target.y - 1200.0).abs() <= WANDER_RADIUS);
        }
    }

    #[test]
    fn test_attack_leads_moving_prey() {
        let mut rng = SmallRng::seed_from_u64(2);
        let me = view(1, 1000.0, 1000.0, 30);
        let prey = rival(&me, view(2, 1100.0, 1000.0, 20));
        let target = attack_target(&me, &[prey], &mut rng).unwrap();
        assert!(target.x >= 1100.0 + INTERCEPT_OFFSET);
        assert!(target.x < 1100.0 + INTERCEPT_OFFSET + INTERCEPT_JITTER);

        let too_close = rival(&me, view(3, 1030.0, 1000.0, 20));
        assert!(attack_target(&me, &[too_close], &mut rng).is_none());
    }

    #[test]
    fn test_encircle_orbits_prey() {
        let mut rng = SmallRng::seed_from_u64(2);
        let me = view(1, 1000.0, 1000.0, 40);
        let prey = rival(&me, view(2, 1100.0, 1000.0, 10));
        let target = encircle_target(&me, &[prey], &mut rng).unwrap();
        let radius = target.distance_to(&prey.view.head);
        assert!((ENCIRCLE_RADIUS - ENCIRCLE_RADIUS_JITTER - 0.01..=ENCIRCLE_RADIUS + ENCIRCLE_RADIUS_JITTER + 0.01)
            .contains(&radius));
        // perpendicular to the line of approach
        assert!((target.x - 1100.0).abs() < 0.01);
    }

    #[test]
    fn test_evade_moves_away_and_stays_inside() {
        let config = ArenaConfig::default();
        let me = view(1, 1000.0, 1000.0, 10);
        let big = rival(&me, view(2, 1100.0, 1000.0, 40));
        let target = evade_target(&me, &[big], &config).unwrap();
        assert!((target.x - 850.0).abs() < 0.01);

        let cornered = view(1, 120.0, 1000.0, 10);
        let big = rival(&cornered, view(2, 200.0, 1000.0, 40));
        let target = evade_target(&cornered, &[big], &config).unwrap();
        assert_eq!(target.x, config.agent_spawn_margin);

        let smaller = rival(&me, view(3, 1100.0, 1000.0, 5));
        assert!(evade_target(&me, &[smaller], &config).is_none());
    }

    #[test]
    fn test_target_player_far_aims_at_head() {
        let mut rng = SmallRng::seed_from_u64(3);
        let me = view(1, 1000.0, 1000.0, 40);
        let player = view(0, 1350.0, 1000.0, 10);
        assert_eq!(target_player_target(&me, &player, &mut rng), player.head);

        let near = view(0, 1200.0, 1000.0, 10);
        let target = target_player_target(&me, &near, &mut rng);
        // lead of 100 along +x plus up to 30 of jitter
        assert!((target.x - 1300.0).abs() <= PLAYER_LEAD_JITTER + 0.01);
    }

    #[test]
    fn test_fallback_to_food_when_no_target() {
        let config = ArenaConfig::default();
        let field = ResourceField::new(&config);
        let mut rng = SmallRng::seed_from_u64(3);
        let me = view(1, 1000.0, 1000.0, 40);
        let (strategy, _) = resolve_target(Strategy::Attack, &me, &[], None, &field, &config, &mut rng);
        assert_eq!(strategy, Strategy::HuntFood);
    }

    #[test]
    fn test_boost_toward_valuable_food() {
        let config = ArenaConfig::default();
        let mut field = ResourceField::new(&config);
        let mut rng = SmallRng::seed_from_u64(3);
        let agent = Agent::from_segments(
            (0..12).map(|i| Point::new(1000.0 - i as f32 * 16.0, 1000.0)),
            0.0,
            false,
            &config,
        )
        .unwrap();
        let me = AgentView::of(AgentId(1), &agent);
        assert!(!wants_boost(&me, &agent, &[], &field, &config, &mut rng));

        field.add_byproduct(Point::new(1100.0, 1000.0), 4, None);
        assert!(wants_boost(&me, &agent, &[], &field, &config, &mut rng));

        let short = Agent::from_segments([Point::new(1000.0, 1000.0)], 0.0, false, &config).unwrap();
        let short_view = AgentView::of(AgentId(2), &short);
        assert!(!wants_boost(&short_view, &short, &[], &field, &config, &mut rng));
    }

    #[test]
    fn test_boost_away_from_charging_rival() {
        let config = ArenaConfig::default();
        let field = ResourceField::new(&config);
        let mut rng = SmallRng::seed_from_u64(3);
        let agent = Agent::from_segments(
            (0..12).map(|i| Point::new(1000.0 - i as f32 * 16.0, 1000.0)),
            0.0,
            false,
            &config,
        )
        .unwrap();
        let me = AgentView::of(AgentId(1), &agent);

        // larger rival to the left, moving right toward us
        let charging = rival(&me, view(2, 920.0, 1040.0, 30));
        assert!(wants_boost(&me, &agent, &[charging], &field, &config, &mut rng));

        // same rival moving away
        let mut fleeing = charging;
        fleeing.view.neck = Some(Point::new(925.0, 1040.0));
        assert!(!wants_boost(&me, &agent, &[fleeing], &field, &config, &mut rng));
    }

    fn straight(head_x: f32, step: f32, heading: f32, config: &ArenaConfig) -> Agent {
        Agent::from_segments(
            (0..12).map(|i| Point::new(head_x - i as f32 * step, 1000.0)),
            heading,
            false,
            config,
        )
        .unwrap()
    }

    fn boost_rolls(agent: &Agent, prey: AgentView, config: &ArenaConfig) -> usize {
        let field = ResourceField::new(config);
        let mut rng = SmallRng::seed_from_u64(5);
        let me = AgentView::of(AgentId(1), agent);
        let prey = rival(&me, prey);
        (0..50)
            .filter(|_| wants_boost(&me, agent, &[prey], &field, config, &mut rng))
            .count()
    }

    #[test]
    fn test_boost_chases_smaller_rival_ahead() {
        let eager = ArenaConfig {
            ai_aggression: 1.0,
            ..Default::default()
        };
        let agent = straight(1000.0, 16.0, 0.0, &eager);

        let ahead = view(2, 1060.0, 1000.0, 5);
        let hits = boost_rolls(&agent, ahead, &eager);
        assert!(hits > 0 && hits < 50);

        let behind = view(2, 940.0, 1000.0, 5);
        assert_eq!(boost_rolls(&agent, behind, &eager), 0);

        // same size, no chase
        let peer = view(2, 1060.0, 1000.0, 12);
        assert_eq!(boost_rolls(&agent, peer, &eager), 0);

        let timid = ArenaConfig {
            ai_aggression: 0.0,
            ..Default::default()
        };
        assert_eq!(boost_rolls(&agent, ahead, &timid), 0);
    }

    #[test]
    fn test_chase_uses_movement_not_heading() {
        let config = ArenaConfig {
            ai_aggression: 1.0,
            ..Default::default()
        };
        // facing +x but the body shows it last moved toward -x
        let agent = straight(1000.0, -16.0, 0.0, &config);

        assert_eq!(boost_rolls(&agent, view(2, 1060.0, 1000.0, 5), &config), 0);
        assert!(boost_rolls(&agent, view(2, 940.0, 1000.0, 5), &config) > 0);
    }

    #[test]
    fn test_no_boost_while_cooling_down() {
        let config = ArenaConfig::default();
        let mut field = ResourceField::new(&config);
        field.add_byproduct(Point::new(1100.0, 1000.0), 4, None);
        let mut rng = SmallRng::seed_from_u64(3);

        let mut agent = straight(1000.0, 16.0, 0.0, &config);
        agent.toggle_boost(true, &config);
        assert!(agent.is_boosting());
        agent.toggle_boost(false, &config);
        assert!(agent.boost_cooldown() > 0);

        let me = AgentView::of(AgentId(1), &agent);
        assert!(!wants_boost(&me, &agent, &[], &field, &config, &mut rng));
    }

    fn decision_world(config: ArenaConfig) -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(ResourceField::new(&config));
        world.insert_resource(SpatialGrid::new(100.0));
        world.insert_resource(SimRng::new(Some(9)));

        let agent = Agent::new(Point::new(1500.0, 1200.0), 0.0, false, 0, &config);
        world.spawn((AgentId(1), agent, AiBundle::new(0.0)));
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, decision_system).chain());
        (world, schedule)
    }

    #[test]
    fn test_replans_on_cadence() {
        let config = ArenaConfig::default();
        let rate = config.ai_decision_rate;
        let (mut world, mut schedule) = decision_world(config);

        for _ in 1..rate {
            schedule.run(&mut world);
        }
        let mut query = world.query::<&DecisionState>();
        let decision = query.single(&world);
        assert_eq!(decision.counter, rate - 1);
        assert!(decision.target.is_none());

        schedule.run(&mut world);
        let decision = query.single(&world);
        assert_eq!(decision.counter, 0);
        assert!(decision.target.is_some());
        assert_eq!(decision.strategy, Strategy::HuntFood);
    }

    #[test]
    fn test_replan_tick_does_not_turn() {
        let config = ArenaConfig::default();
        let rate = config.ai_decision_rate;
        let (mut world, mut schedule) = decision_world(config);
        for _ in 1..rate {
            schedule.run(&mut world);
        }
        {
            let mut query = world.query::<&mut DecisionState>();
            let mut decision = query.single_mut(&mut world);
            decision.target_angle = FRAC_PI_2;
        }

        schedule.run(&mut world);
        let mut query = world.query::<(&Agent, &DecisionState)>();
        let (agent, decision) = query.single(&world);
        assert_eq!(decision.counter, 0);
        assert_eq!(agent.heading, 0.0);
    }

    #[test]
    fn test_heading_turns_gradually() {
        let config = ArenaConfig::default();
        let (mut world, mut schedule) = decision_world(config);
        {
            let mut query = world.query::<&mut DecisionState>();
            let mut decision = query.single_mut(&mut world);
            decision.target_angle = FRAC_PI_2;
        }
        schedule.run(&mut world);
        let mut query = world.query::<&Agent>();
        assert!((query.single(&world).heading - TURN_RATE).abs() < 1e-6);
    }

    #[test]
    fn test_player_is_not_steered() {
        let config = ArenaConfig::default();
        let (mut world, mut schedule) = decision_world(config.clone());
        world.spawn((
            AgentId(0),
            Agent::new(Point::new(500.0, 500.0), 1.0, true, 0, &config),
            Player,
        ));
        for _ in 0..25 {
            schedule.run(&mut world);
        }
        let mut query = world.query_filtered::<&Agent, With<Player>>();
        assert_eq!(query.single(&world).heading, 1.0);
    }
}

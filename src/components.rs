//! ECS Components for the Serpent Arena simulation.
//!
//! `Agent` owns one organism's body and motion state. Its methods implement
//! the per-agent rules; systems decide when they are called.

use crate::config::ArenaConfig;
use crate::skins::{SegmentPalette, Skin};
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// Trail samples kept for rendering.
const TRAIL_LENGTH: usize = 10;
/// Ticks between trail samples.
const TRAIL_INTERVAL: u32 = 2;
/// Sharp turns (|sin Δθ| above this) grant collision immunity.
const SHARP_TURN_SINE: f32 = 0.7;
/// Death drops scatter this far from the head.
const DEATH_SCATTER_MIN: f32 = 20.0;
const DEATH_SCATTER_MAX: f32 = 80.0;

// ============================================================================
// SPATIAL / VALUE TYPES
// ============================================================================

/// 2D position in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Point `distance` away along `angle`.
    pub fn offset(&self, angle: f32, distance: f32) -> Point {
        Point::new(
            self.x + angle.cos() * distance,
            self.y + angle.sin() * distance,
        )
    }
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Brighten every channel, saturating at 255.
    pub fn lighten(self, amount: u8) -> Rgb {
        Rgb(
            self.0.saturating_add(amount),
            self.1.saturating_add(amount),
            self.2.saturating_add(amount),
        )
    }

    /// Linear blend toward `other`; channels truncate toward zero.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t) as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable agent identifier. Ascending id order is the collision tie-break order.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AgentId(pub u32);

/// Marker for the agent driven by external input.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Marker for agents driven by the decision engine.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AiControlled;

// ============================================================================
// AGENT
// ============================================================================

/// A resource scattered by a dying agent, not yet placed in the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DroppedFood {
    pub position: Point,
    pub value: u32,
}

/// Result of one [`Agent::advance`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceOutcome {
    /// Tail segments shed by boosting this tick.
    pub dropped: Vec<Point>,
    /// The player lost a point to boosting this tick.
    pub score_reduced: bool,
}

/// One organism: an ordered chain of segments with the head at index 0.
#[derive(Component, Debug, Clone)]
pub struct Agent {
    segments: VecDeque<Point>,
    /// Current heading in radians.
    pub heading: f32,
    /// Base speed in units per tick.
    pub speed: f32,
    pub head_radius: f32,
    pub segment_radius: f32,
    pub is_player: bool,
    alive: bool,
    score: u32,
    boosting: bool,
    /// Ticks until boost may be entered again.
    boost_cooldown: u32,
    boost_drop_timer: u32,
    collision_immune: bool,
    immunity_remaining: u32,
    trail: VecDeque<Point>,
    trail_counter: u32,
    palette: SegmentPalette,
}

impl Agent {
    /// Create an agent whose body trails straight back from `head`.
    pub fn new(
        head: Point,
        heading: f32,
        is_player: bool,
        skin_index: usize,
        config: &ArenaConfig,
    ) -> Self {
        let spacing = config.segment_radius * 2.0;
        let segments = (0..config.initial_length.max(1))
            .map(|i| head.offset(heading, -(i as f32) * spacing))
            .collect();

        Self {
            segments,
            heading,
            speed: if is_player { config.player_speed } else { config.ai_speed },
            head_radius: config.head_radius,
            segment_radius: config.segment_radius,
            is_player,
            alive: true,
            score: 0,
            boosting: false,
            boost_cooldown: 0,
            boost_drop_timer: 0,
            collision_immune: false,
            immunity_remaining: 0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
            trail_counter: 0,
            palette: SegmentPalette::new(skin_index),
        }
    }

    /// Build an agent from explicit segment positions (head first).
    ///
    /// Returns `None` for an empty body.
    pub fn from_segments(
        segments: impl IntoIterator<Item = Point>,
        heading: f32,
        is_player: bool,
        config: &ArenaConfig,
    ) -> Option<Self> {
        let segments: VecDeque<Point> = segments.into_iter().collect();
        if segments.is_empty() {
            return None;
        }
        let mut agent = Self::new(Point::default(), heading, is_player, 0, config);
        agent.segments = segments;
        Some(agent)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn segments(&self) -> &VecDeque<Point> {
        &self.segments
    }

    pub fn head(&self) -> Point {
        self.segments[0]
    }

    /// Segment right behind the head, if any.
    pub fn neck(&self) -> Option<Point> {
        self.segments.get(1).copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Add points without growing (collision bonus).
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn is_boosting(&self) -> bool {
        self.boosting
    }

    pub fn boost_cooldown(&self) -> u32 {
        self.boost_cooldown
    }

    pub fn can_boost(&self, config: &ArenaConfig) -> bool {
        self.boost_cooldown == 0 && self.len() > config.boost_min_length
    }

    pub fn is_immune(&self) -> bool {
        self.collision_immune
    }

    pub fn trail(&self) -> &VecDeque<Point> {
        &self.trail
    }

    pub fn skin(&self) -> &'static Skin {
        self.palette.skin()
    }

    pub fn skin_index(&self) -> usize {
        self.palette.skin_index()
    }

    pub fn color(&self) -> Rgb {
        self.skin().base_color()
    }

    pub fn segment_color(&self, index: usize) -> Rgb {
        self.palette.color_at(index)
    }

    /// Replace the skin and recompute the memoized palette.
    pub fn set_skin(&mut self, skin_index: usize) {
        self.palette = SegmentPalette::new(skin_index);
    }

    // ------------------------------------------------------------------------
    // Per-tick rules
    // ------------------------------------------------------------------------

    /// Move one tick along the current heading.
    ///
    /// The body keeps its length except on boost drop ticks, where the tail is
    /// shed as a byproduct and one more segment is removed while the agent is
    /// still above the boost floor.
    pub fn advance(&mut self, config: &ArenaConfig) -> AdvanceOutcome {
        let mut outcome = AdvanceOutcome::default();
        if !self.alive {
            return outcome;
        }

        if self.boost_cooldown > 0 {
            self.boost_cooldown -= 1;
        }

        let speed = if self.boosting {
            self.speed * config.boost_multiplier
        } else {
            self.speed
        };
        let new_head = self.head().offset(self.heading, speed);
        self.segments.push_front(new_head);

        if self.boosting && self.len() > config.boost_min_length {
            self.boost_drop_timer += 1;
            if self.boost_drop_timer >= config.boost_drop_interval {
                self.boost_drop_timer = 0;
                if let Some(tail) = self.segments.pop_back() {
                    outcome.dropped.push(tail);
                }
                if self.is_player && self.score > 0 {
                    self.score -= 1;
                    outcome.score_reduced = true;
                }
                if self.len() > config.boost_min_length {
                    self.segments.pop_back();
                }
            } else {
                self.segments.pop_back();
            }
        } else {
            self.segments.pop_back();
        }

        self.trail_counter += 1;
        if self.trail_counter >= TRAIL_INTERVAL {
            self.trail_counter = 0;
            if self.trail.len() >= TRAIL_LENGTH {
                self.trail.pop_back();
            }
            self.trail.push_front(new_head);
        }

        if self.collision_immune {
            self.immunity_remaining = self.immunity_remaining.saturating_sub(1);
            if self.immunity_remaining == 0 {
                self.collision_immune = false;
            }
        }

        outcome
    }

    /// Append `amount` segments at the tail and score `amount` points.
    pub fn grow(&mut self, amount: u32) {
        let Some(&tail) = self.segments.back() else {
            return;
        };
        for _ in 0..amount {
            self.segments.push_back(tail);
        }
        self.score = self.score.saturating_add(amount);
    }

    /// Steer directly; a sharp turn opens a short self-collision grace window.
    pub fn set_heading(&mut self, angle: f32, config: &ArenaConfig) {
        let previous = self.heading;
        self.heading = angle;
        if (previous - angle).sin().abs() > SHARP_TURN_SINE {
            self.collision_immune = true;
            self.immunity_remaining = config.immunity_ticks();
        }
    }

    /// Enter or leave boost. Leaving starts the cooldown.
    pub fn toggle_boost(&mut self, active: bool, config: &ArenaConfig) {
        if active {
            if !self.boosting && self.can_boost(config) {
                self.boosting = true;
                self.boost_drop_timer = 0;
            }
        } else if self.boosting {
            self.boosting = false;
            self.boost_cooldown = config.boost_cooldown_ticks();
        }
    }

    /// True when the head is within `head_radius` of a world edge.
    pub fn check_boundary_collision(&self, width: f32, height: f32) -> bool {
        let head = self.head();
        let margin = self.head_radius;
        head.x < margin || head.x > width - margin || head.y < margin || head.y > height - margin
    }

    /// True when the head overlaps the agent's own body past the start index.
    pub fn check_self_collision(&self, config: &ArenaConfig) -> bool {
        if !config.self_collision_enabled || self.collision_immune {
            return false;
        }
        let head = self.head();
        let reach_sq = self.head_radius * self.head_radius;
        self.segments
            .iter()
            .skip(config.self_collision_start_index)
            .any(|segment| head.distance_sq(segment) < reach_sq)
    }

    /// True when this agent's head touches any segment of `other`.
    pub fn check_collision(&self, other: &Agent) -> bool {
        if !self.alive || !other.alive {
            return false;
        }
        let head = self.head();
        let reach = self.head_radius + other.segment_radius;
        let reach_sq = reach * reach;
        other
            .segments
            .iter()
            .any(|segment| head.distance_sq(segment) < reach_sq)
    }

    /// Mark the agent dead and scatter food around its head.
    ///
    /// Returns nothing when the agent is already dead.
    pub fn die<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &ArenaConfig) -> Vec<DroppedFood> {
        if !self.alive {
            return Vec::new();
        }
        self.alive = false;
        self.boosting = false;

        let length = self.len();
        let count = config.dropped_food_cap.min(length / 2);
        let value = (length / 20).clamp(1, 5) as u32;
        let head = self.head();

        (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let distance = rng.gen_range(DEATH_SCATTER_MIN..DEATH_SCATTER_MAX);
                DroppedFood {
                    position: head.offset(angle, distance),
                    value,
                }
            })
            .collect()
    }
}

// ============================================================================
// DECISION STATE
// ============================================================================

/// High-level behaviour chosen by the decision engine at each re-plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    HuntFood,
    Attack,
    Encircle,
    Evade,
    TargetPlayer,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::HuntFood => "hunt_food",
            Strategy::Attack => "attack",
            Strategy::Encircle => "encircle",
            Strategy::Evade => "evade",
            Strategy::TargetPlayer => "target_player",
        }
    }
}

/// Steering memory of an AI agent. Intentionally stale between re-plans.
#[derive(Component, Debug, Clone, Default)]
pub struct DecisionState {
    /// Ticks since the last full re-plan.
    pub counter: u32,
    /// Heading the agent turns toward between re-plans.
    pub target_angle: f32,
    /// Point chosen at the last re-plan.
    pub target: Option<Point>,
    pub strategy: Strategy,
}

impl DecisionState {
    pub fn new(heading: f32) -> Self {
        Self {
            target_angle: heading,
            ..Default::default()
        }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle shared by every agent entity.
#[derive(Bundle)]
pub struct AgentBundle {
    pub id: AgentId,
    pub agent: Agent,
}

/// Bundle for AI components to add to an agent.
#[derive(Bundle, Default)]
pub struct AiBundle {
    pub ai_controlled: AiControlled,
    pub decision: DecisionState,
}

impl AiBundle {
    pub fn new(heading: f32) -> Self {
        Self {
            ai_controlled: AiControlled,
            decision: DecisionState::new(heading),
        }
    }
}

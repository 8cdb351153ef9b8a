//! Resource field: the population of consumable items on the arena floor.
//!
//! Items are kept in insertion order. Pickup scans that order and the first
//! match wins, so at most one item is consumed per call.

use crate::components::{Point, Rgb};
use crate::config::ArenaConfig;
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Chance that a spawned item is a high-value bonus item.
const BONUS_CHANCE: f64 = 0.1;
const BONUS_COLOR: Rgb = Rgb(255, 255, 0);
/// Colour of byproducts dropped without a source colour (death drops).
const BYPRODUCT_COLOR: Rgb = Rgb(100, 200, 255);
/// Tint applied to a source colour for boost drops.
const BYPRODUCT_TINT: u8 = 50;

const SPAWN_COLORS: [Rgb; 8] = [
    Rgb(255, 100, 100),
    Rgb(100, 255, 100),
    Rgb(100, 100, 255),
    Rgb(255, 255, 100),
    Rgb(255, 150, 50),
    Rgb(200, 100, 255),
    Rgb(100, 255, 255),
    Rgb(255, 100, 255),
];

/// A consumable item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceItem {
    pub id: u64,
    pub position: Point,
    /// Growth units granted on pickup; always at least 1.
    pub value: u32,
    pub color: Rgb,
    /// Cosmetic pulse phase in [0, 1].
    pub pulse: f32,
    /// Cosmetic rotation in degrees.
    pub rotation: f32,
    #[serde(skip)]
    pulse_dir: f32,
    #[serde(skip)]
    pulse_speed: f32,
    #[serde(skip)]
    spin_speed: f32,
}

impl ResourceItem {
    pub fn new(id: u64, position: Point, value: u32, color: Rgb) -> Self {
        let mut cosmetic = rand::thread_rng();
        Self {
            id,
            position,
            value: value.max(1),
            color,
            pulse: 0.0,
            rotation: cosmetic.gen_range(0.0..360.0),
            pulse_dir: 0.1,
            pulse_speed: cosmetic.gen_range(0.05..0.15),
            spin_speed: cosmetic.gen_range(-3.0..3.0),
        }
    }

    pub fn radius(&self) -> f32 {
        5.0 + self.value as f32
    }

    fn animate(&mut self) {
        self.pulse += self.pulse_dir * self.pulse_speed;
        if self.pulse > 1.0 {
            self.pulse = 1.0;
            self.pulse_dir = -0.1;
        } else if self.pulse < 0.0 {
            self.pulse = 0.0;
            self.pulse_dir = 0.1;
        }
        self.rotation = (self.rotation + self.spin_speed).rem_euclid(360.0);
    }
}

/// All resource items in the arena.
#[derive(Resource, Debug, Clone)]
pub struct ResourceField {
    items: Vec<ResourceItem>,
    capacity: usize,
    spawn_rate: f64,
    margin: f32,
    min_distance_sq: f32,
    width: f32,
    height: f32,
    next_id: u64,
}

impl ResourceField {
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            items: Vec::with_capacity(config.max_food),
            capacity: config.max_food,
            spawn_rate: config.food_spawn_rate,
            margin: config.food_spawn_margin,
            min_distance_sq: config.food_min_spawn_distance * config.food_min_spawn_distance,
            width: config.world_width,
            height: config.world_height,
            next_id: 0,
        }
    }

    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn push(&mut self, position: Point, value: u32, color: Rgb) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(ResourceItem::new(id, position, value, color));
        id
    }

    /// Maybe add one item at a random position away from `occupied`.
    ///
    /// Returns the new item's id. Nothing happens at capacity, when the
    /// probability roll fails, or when the candidate lies too close to an
    /// occupied position.
    pub fn spawn<'a, R, I>(&mut self, occupied: I, rng: &mut R) -> Option<u64>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = &'a Point>,
    {
        if self.is_full() || !rng.gen_bool(self.spawn_rate) {
            return None;
        }

        let candidate = Point::new(
            rng.gen_range(self.margin..=self.width - self.margin),
            rng.gen_range(self.margin..=self.height - self.margin),
        );
        if occupied
            .into_iter()
            .any(|pos| pos.distance_sq(&candidate) < self.min_distance_sq)
        {
            return None;
        }

        let (value, color) = if rng.gen_bool(BONUS_CHANCE) {
            (rng.gen_range(2..=5), BONUS_COLOR)
        } else {
            let mut cosmetic = rand::thread_rng();
            (1, SPAWN_COLORS[cosmetic.gen_range(0..SPAWN_COLORS.len())])
        };
        Some(self.push(candidate, value, color))
    }

    /// Spawn step followed by the cosmetic animation of every item.
    pub fn update<'a, R, I>(&mut self, occupied: I, rng: &mut R)
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = &'a Point>,
    {
        self.spawn(occupied, rng);
        for item in &mut self.items {
            item.animate();
        }
    }

    /// Remove and return the value of the first item touching the circle at
    /// `point` with `radius`, or 0 when none does.
    pub fn consume(&mut self, point: Point, radius: f32) -> u32 {
        let hit = self.items.iter().position(|item| {
            let reach = radius + item.radius();
            item.position.distance_sq(&point) < reach * reach
        });
        match hit {
            Some(index) => self.items.remove(index).value,
            None => 0,
        }
    }

    /// Insert a death or boost byproduct. Dropped silently at capacity.
    ///
    /// A source colour is tinted; without one the neutral byproduct colour is
    /// used.
    pub fn add_byproduct(&mut self, point: Point, value: u32, color: Option<Rgb>) -> Option<u64> {
        if self.is_full() {
            return None;
        }
        let color = color
            .map(|c| c.lighten(BYPRODUCT_TINT))
            .unwrap_or(BYPRODUCT_COLOR);
        Some(self.push(point, value, color))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

//! Spatial partitioning for efficient neighbor queries.
//!
//! Indexes the heads of living agents so the decision engine can find rivals
//! within a radius in O(k) instead of scanning every agent.

use crate::components::{Agent, AgentId};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure.
///
/// Divides the world into cells and tracks which agent heads are in each cell.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    count: usize,
}

/// Entry in a spatial cell: one agent head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: AgentId,
    pub x: f32,
    pub y: f32,
}

impl SpatialEntry {
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            count: 0,
        }
    }

    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call at start of each tick before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.count = 0;
    }

    pub fn insert(&mut self, id: AgentId, x: f32, y: f32) {
        let cell = self.world_to_cell(x, y);
        self.cells
            .entry(cell)
            .or_default()
            .push(SpatialEntry { id, x, y });
        self.count += 1;
    }

    /// All entries within `radius` of a point, closest first.
    /// Equal distances are ordered by ascending id.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let radius_sq = radius * radius;
        let cells_to_check = (radius / self.cell_size).ceil() as i32 + 1;
        let center_cell = self.world_to_cell(x, y);

        let mut results = Vec::new();
        for dx in -cells_to_check..=cells_to_check {
            for dy in -cells_to_check..=cells_to_check {
                let cell = (center_cell.0 + dx, center_cell.1 + dy);
                if let Some(entries) = self.cells.get(&cell) {
                    for entry in entries {
                        let dist_sq = (entry.x - x).powi(2) + (entry.y - y).powi(2);
                        if dist_sq <= radius_sq {
                            results.push(*entry);
                        }
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            let dist_a = (a.x - x).powi(2) + (a.y - y).powi(2);
            let dist_b = (b.x - x).powi(2) + (b.y - y).powi(2);
            dist_a
                .partial_cmp(&dist_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        results
    }

    /// Agents other than `me` whose heads lie strictly within `radius`.
    pub fn query_rivals(&self, me: AgentId, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| e.id != me && e.distance_to(x, y) < radius);
        results
    }

    pub fn total_count(&self) -> usize {
        self.count
    }
}

/// System that rebuilds the spatial grid from living agents each tick.
pub fn spatial_grid_update_system(mut grid: ResMut<SpatialGrid>, query: Query<(&AgentId, &Agent)>) {
    grid.clear();
    for (id, agent) in query.iter() {
        if !agent.is_alive() {
            continue;
        }
        let head = agent.head();
        grid.insert(*id, head.x, head.y);
    }
}

//! Sparse terrain cost/height model and obstacle map
//!
//! The map is populated by an external perception pipeline and read by the
//! adjacency models. Absence of a cell means the terrain there was never
//! perceived; absence of an obstacle entry means unknown, treated as free.

use std::collections::BTreeMap;

use nalgebra::Vector2;

use crate::common::Vertex;
use crate::terrain::space_model::SpaceModel;

/// Per-cell terrain information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainCell {
    /// Traversal cost of the cell, higher is worse
    pub cost: f64,
    /// Terrain height of the cell
    pub height: f64,
}

/// Read-mostly facade over the terrain cost map, the height map and the
/// obstacle map, together with their discretisations.
#[derive(Debug, Clone)]
pub struct TerrainMap {
    terrain_data: BTreeMap<Vertex, TerrainCell>,
    height_map: BTreeMap<Vertex, f64>,
    obstacle_map: BTreeMap<Vertex, bool>,
    terrain_space: SpaceModel,
    obstacle_space: SpaceModel,
    cost_sum: f64,
}

impl TerrainMap {
    /// Creates an empty map. The obstacle grid starts at the terrain plane
    /// resolution; use [`set_obstacle_resolution`](Self::set_obstacle_resolution)
    /// when the occupancy source is coarser.
    pub fn new(plane_resolution: f64, angular_resolution: f64) -> Self {
        Self {
            terrain_data: BTreeMap::new(),
            height_map: BTreeMap::new(),
            obstacle_map: BTreeMap::new(),
            terrain_space: SpaceModel::new(plane_resolution, angular_resolution),
            obstacle_space: SpaceModel::new(plane_resolution, angular_resolution),
            cost_sum: 0.0,
        }
    }

    pub fn set_obstacle_resolution(&mut self, resolution: f64) {
        self.obstacle_space =
            SpaceModel::new(resolution, self.obstacle_space.angular_resolution());
    }

    /// Inserts or replaces the terrain cell containing `coord`.
    pub fn add_terrain_cell(&mut self, coord: &Vector2<f64>, cost: f64, height: f64) {
        let vertex = self.terrain_space.coord_to_vertex(coord);
        if let Some(old) = self
            .terrain_data
            .insert(vertex, TerrainCell { cost, height })
        {
            self.cost_sum -= old.cost;
        }
        self.cost_sum += cost;
        self.height_map.insert(vertex, height);
    }

    /// Marks the obstacle cell containing `coord` as occupied or free.
    pub fn add_obstacle(&mut self, coord: &Vector2<f64>, occupied: bool) {
        let vertex = self.obstacle_space.coord_to_vertex(coord);
        self.obstacle_map.insert(vertex, occupied);
    }

    /// Drops all terrain and obstacle information.
    pub fn clear(&mut self) {
        self.terrain_data.clear();
        self.height_map.clear();
        self.obstacle_map.clear();
        self.cost_sum = 0.0;
    }

    pub fn is_terrain_information(&self) -> bool {
        !self.terrain_data.is_empty()
    }

    pub fn is_obstacle_information(&self) -> bool {
        !self.obstacle_map.is_empty()
    }

    pub fn terrain_data_map(&self) -> &BTreeMap<Vertex, TerrainCell> {
        &self.terrain_data
    }

    pub fn terrain_height_map(&self) -> &BTreeMap<Vertex, f64> {
        &self.height_map
    }

    pub fn obstacle_map(&self) -> &BTreeMap<Vertex, bool> {
        &self.obstacle_map
    }

    /// Cost of a perceived cell.
    ///
    /// Panics if the vertex has no terrain data; callers check
    /// [`terrain_data_map`](Self::terrain_data_map) first.
    pub fn terrain_cost(&self, vertex: Vertex) -> f64 {
        self.terrain_data[&vertex].cost
    }

    /// Arithmetic mean of all stored cell costs, 0.0 when nothing has been
    /// perceived yet.
    pub fn average_cost_of_terrain(&self) -> f64 {
        if self.terrain_data.is_empty() {
            0.0
        } else {
            self.cost_sum / self.terrain_data.len() as f64
        }
    }

    /// Terrain resolution of the plane axes (`plane == true`) or of yaw.
    pub fn resolution(&self, plane: bool) -> f64 {
        self.terrain_space.resolution(plane)
    }

    pub fn obstacle_resolution(&self) -> f64 {
        self.obstacle_space.plane_resolution()
    }

    pub fn terrain_space_model(&self) -> &SpaceModel {
        &self.terrain_space
    }

    pub fn obstacle_space_model(&self) -> &SpaceModel {
        &self.obstacle_space
    }
}

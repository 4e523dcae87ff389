//! Stance-area terrain sampling shared by the grid and lattice adjacencies

use std::collections::{BinaryHeap, HashSet};

use nalgebra::{Vector2, Vector3};
use ordered_float::OrderedFloat;

use crate::adjacency::feature::{Feature, RobotAndTerrain};
use crate::common::SearchArea;
use crate::terrain::TerrainMap;

/// Rotates `point` about `origin` by `yaw`.
///
/// This pivot matters: stance samples are generated axis-aligned around the
/// body position and then swung into the body heading, so the rotation must
/// translate into the body frame, rotate, and translate back.
pub(crate) fn rotate_about(point: Vector2<f64>, origin: Vector2<f64>, yaw: f64) -> Vector2<f64> {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let delta = point - origin;
    Vector2::new(
        delta.x * cos_yaw - delta.y * sin_yaw + origin.x,
        delta.x * sin_yaw + delta.y * cos_yaw + origin.y,
    )
}

/// Averaged cost of the best available footholds under a body state.
///
/// Each stance area is swept on a regular grid at the area resolution, every
/// sample rotated about the body origin by the state yaw and looked up in the
/// terrain map. Perceived costs form a set keyed by cost value, so cells
/// sharing a cost collapse to one entry; per area, the `number_top_cost`
/// lowest entries are averaged. An area with no perceived sample contributes
/// `uncertainty_factor * average_cost_of_terrain` instead. The result is the
/// mean over all areas.
pub(crate) fn stance_terrain_cost(
    state: &Vector3<f64>,
    stance_areas: &[SearchArea],
    terrain: &TerrainMap,
    number_top_cost: usize,
    uncertainty_factor: f64,
) -> f64 {
    if stance_areas.is_empty() {
        return uncertainty_factor * terrain.average_cost_of_terrain();
    }

    let space = terrain.terrain_space_model();
    let terrain_map = terrain.terrain_data_map();
    let origin = Vector2::new(state.x, state.y);

    let mut terrain_cost = 0.0;
    for area in stance_areas {
        let min_x = area.min_x + state.x;
        let max_x = area.max_x + state.x;
        let min_y = area.min_y + state.y;
        let max_y = area.max_y + state.y;

        // Keep the N lowest perceived costs, one entry per distinct cost
        // value.
        let mut sampled_costs = HashSet::new();
        let mut best_costs: BinaryHeap<OrderedFloat<f64>> = BinaryHeap::new();
        let mut y = min_y;
        while y <= max_y {
            let mut x = min_x;
            while x <= max_x {
                let point = rotate_about(Vector2::new(x, y), origin, state.z);
                let vertex = space.coord_to_vertex(&point);
                if terrain_map.contains_key(&vertex) {
                    let cost = OrderedFloat(terrain.terrain_cost(vertex));
                    if sampled_costs.insert(cost) {
                        best_costs.push(cost);
                        if best_costs.len() > number_top_cost {
                            best_costs.pop();
                        }
                    }
                }
                x += area.resolution;
            }
            y += area.resolution;
        }

        let stance_cost = if best_costs.is_empty() {
            uncertainty_factor * terrain.average_cost_of_terrain()
        } else {
            let count = best_costs.len() as f64;
            best_costs.iter().map(|cost| cost.0).sum::<f64>() / count
        };
        terrain_cost += stance_cost;
    }

    terrain_cost / stance_areas.len() as f64
}

/// Adds the weighted feature contributions on top of the stance terrain
/// cost.
pub(crate) fn with_feature_costs(
    terrain_cost: f64,
    features: &[Box<dyn Feature>],
    info: &RobotAndTerrain<'_>,
) -> f64 {
    let mut cost = terrain_cost;
    for feature in features {
        cost += feature.weight() * feature.compute_cost(info);
    }
    cost
}

//! Pluggable scalar cost features
//!
//! A feature scores one aspect of a candidate body transition from the local
//! terrain. Adjacency models own a collection of features and add each
//! feature's weighted cost on top of the stance terrain cost.

use std::collections::BTreeMap;

use nalgebra::{Vector2, Vector3};

use crate::adjacency::stance::rotate_about;
use crate::common::{Pose3d, SearchArea, Vertex};
use crate::robot::RobotModel;
use crate::terrain::SpaceModel;

/// Robot and terrain information handed to a feature evaluation.
#[derive(Debug)]
pub struct RobotAndTerrain<'m> {
    /// Body action (dx, dy, dyaw) being evaluated
    pub body_action: Vector3<f64>,
    /// Candidate body pose
    pub pose: Pose3d,
    /// Terrain height map keyed by environment vertex
    pub height_map: &'m BTreeMap<Vertex, f64>,
    /// Plane resolution of the height map
    pub resolution: f64,
}

/// A scalar cost function of (pose, action, local terrain).
///
/// Features are stateless after [`reset`](Self::reset) and pure functions of
/// the context, so evaluations are reentrant.
pub trait Feature {
    /// Captures whatever robot properties the feature needs.
    fn reset(&mut self, robot: &dyn RobotModel);

    /// Cost contribution in [0, 1].
    fn compute_cost(&self, info: &RobotAndTerrain<'_>) -> f64;

    /// Multiplier applied to the cost contribution.
    fn weight(&self) -> f64;

    /// Feature name for diagnostics.
    fn name(&self) -> &str;
}

/// Penalises terrain whose height varies under the body footprint.
///
/// At reset the feature captures the robot's body workspace; each evaluation
/// sweeps that window (rotated to the pose heading) over the height map and
/// normalises the height standard deviation by the flat-ground tolerance.
#[derive(Debug)]
pub struct HeightDeviationFeature {
    weight: f64,
    /// Height deviation treated as maximally costly [m]
    flat_deviation: f64,
    sampling_area: SearchArea,
}

impl HeightDeviationFeature {
    pub fn new(weight: f64, flat_deviation: f64) -> Self {
        Self {
            weight,
            flat_deviation,
            sampling_area: SearchArea::new(0.0, 0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl Feature for HeightDeviationFeature {
    fn reset(&mut self, robot: &dyn RobotModel) {
        self.sampling_area = robot.predefined_body_workspace();
    }

    fn compute_cost(&self, info: &RobotAndTerrain<'_>) -> f64 {
        // Rebuilding the space model from the context resolution yields the
        // same vertices the height map was keyed with.
        let space = SpaceModel::new(info.resolution, info.resolution);
        let origin = info.pose.position;
        let area = &self.sampling_area;

        let step = area.resolution.max(info.resolution);
        let mut heights = Vec::new();
        let mut y = area.min_y + origin.y;
        let max_y = area.max_y + origin.y;
        let max_x = area.max_x + origin.x;
        while y <= max_y {
            let mut x = area.min_x + origin.x;
            while x <= max_x {
                let point = rotate_about(Vector2::new(x, y), origin, info.pose.orientation);
                let vertex = space.coord_to_vertex(&point);
                if let Some(&height) = info.height_map.get(&vertex) {
                    heights.push(height);
                }
                x += step;
            }
            y += step;
        }

        if heights.len() < 2 {
            return 0.0;
        }
        let mean = heights.iter().sum::<f64>() / heights.len() as f64;
        let variance =
            heights.iter().map(|h| (h - mean).powi(2)).sum::<f64>() / heights.len() as f64;
        (variance.sqrt() / self.flat_deviation).min(1.0)
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn name(&self) -> &str {
        "height deviation"
    }
}

//! A quadruped robot description for the adjacency models

use nalgebra::{Vector2, Vector3};

use crate::common::{PlannerResult, SearchArea};
use crate::robot::motor_primitives::{BodyMotorPrimitives, MotorPrimitives};
use crate::robot::RobotModel;

/// Geometry of a four-legged robot.
#[derive(Debug, Clone)]
pub struct QuadrupedConfig {
    /// Longitudinal hip offset from the body origin [m]
    pub hip_x: f64,
    /// Lateral hip offset from the body origin [m]
    pub hip_y: f64,
    /// Edge length of the square stance window around each hip [m]
    pub stance_size: f64,
    /// Sampling resolution inside a stance window [m]
    pub stance_resolution: f64,
    /// Body footprint half length [m]
    pub workspace_half_length: f64,
    /// Body footprint half width [m]
    pub workspace_half_width: f64,
    /// Sampling resolution of the body footprint [m]
    pub workspace_resolution: f64,
    /// Fraction of the commanded displacement by which each stance window
    /// is shifted along the action
    pub action_window_gain: f64,
}

impl Default for QuadrupedConfig {
    fn default() -> Self {
        Self {
            hip_x: 0.37,
            hip_y: 0.25,
            stance_size: 0.2,
            stance_resolution: 0.04,
            workspace_half_length: 0.45,
            workspace_half_width: 0.3,
            workspace_resolution: 0.1,
            action_window_gain: 0.5,
        }
    }
}

/// Concrete [`RobotModel`] for a quadruped with point feet.
///
/// Stance windows are placed at the four mirrored hip offsets and tracked
/// along the commanded body action, so a forward command searches footholds
/// ahead of the nominal hip positions.
#[derive(Debug, Default)]
pub struct QuadrupedModel {
    config: QuadrupedConfig,
    primitives: BodyMotorPrimitives,
}

impl QuadrupedModel {
    pub fn new(config: QuadrupedConfig) -> Self {
        Self {
            config,
            primitives: BodyMotorPrimitives::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(QuadrupedConfig::default())
    }

    /// Replaces the primitive set, e.g. one built in memory.
    pub fn set_motor_primitives(&mut self, primitives: BodyMotorPrimitives) {
        self.primitives = primitives;
    }

    /// Loads the body motor primitives from a YAML file.
    pub fn load_motor_primitives(&mut self, path: &str) -> PlannerResult<()> {
        self.primitives.read(path)
    }

    fn hip_offsets(&self) -> [Vector2<f64>; 4] {
        let hip_x = self.config.hip_x;
        let hip_y = self.config.hip_y;
        [
            Vector2::new(hip_x, hip_y),
            Vector2::new(hip_x, -hip_y),
            Vector2::new(-hip_x, hip_y),
            Vector2::new(-hip_x, -hip_y),
        ]
    }
}

impl RobotModel for QuadrupedModel {
    fn footstep_search_areas(&self, action: &Vector3<f64>) -> Vec<SearchArea> {
        let half = self.config.stance_size / 2.0;
        let shift = self.config.action_window_gain * Vector2::new(action.x, action.y);
        self.hip_offsets()
            .iter()
            .map(|hip| {
                let center = hip + shift;
                SearchArea::new(
                    center.x - half,
                    center.x + half,
                    center.y - half,
                    center.y + half,
                    self.config.stance_resolution,
                )
            })
            .collect()
    }

    fn predefined_body_workspace(&self) -> SearchArea {
        SearchArea::new(
            -self.config.workspace_half_length,
            self.config.workspace_half_length,
            -self.config.workspace_half_width,
            self.config.workspace_half_width,
            self.config.workspace_resolution,
        )
    }

    fn body_motor_primitive(&self) -> &dyn MotorPrimitives {
        &self.primitives
    }
}

//! Robot-side inputs of the adjacency models
//!
//! The adjacency models only need three things from a robot: where each foot
//! may be placed for a given body action, the footprint the body sweeps, and
//! a generator of candidate body actions.

pub mod motor_primitives;
pub mod quadruped;

use nalgebra::Vector3;

use crate::common::SearchArea;
use crate::robot::motor_primitives::MotorPrimitives;

pub use motor_primitives::{BodyMotorPrimitive, BodyMotorPrimitives};
pub use quadruped::{QuadrupedConfig, QuadrupedModel};

/// Robot properties consumed by the adjacency models.
pub trait RobotModel {
    /// Body-frame stance regions, one per foot, for a commanded body action
    /// `(dx, dy, dyaw)`.
    fn footstep_search_areas(&self, action: &Vector3<f64>) -> Vec<SearchArea>;

    /// Body-frame rectangle swept by the robot body, used for obstacle
    /// checking.
    fn predefined_body_workspace(&self) -> SearchArea;

    /// Generator of candidate body actions.
    fn body_motor_primitive(&self) -> &dyn MotorPrimitives;
}

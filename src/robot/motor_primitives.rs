//! Body motor primitives
//!
//! A motor primitive is a prebuilt body-action template: a pose delta plus a
//! traversal cost. The lattice adjacency expands a body pose by applying
//! every primitive in the pose's own yaw frame.

use log::warn;
use nalgebra::{Vector2, Vector3};
use serde::Deserialize;

use crate::common::{Action3d, PlannerResult, Pose3d};

/// Generator of candidate body actions from a pose.
pub trait MotorPrimitives {
    /// Loads the primitive set from a configuration file.
    fn read(&mut self, path: &str) -> PlannerResult<()>;

    /// Appends the candidate actions reachable from `state`. The default
    /// implementation reports that no primitives are defined and produces
    /// nothing.
    fn generate_actions(&self, _actions: &mut Vec<Action3d>, _state: &Pose3d) {
        warn!("could not generate 3d actions because no motor primitives are defined");
    }
}

/// One body-action template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMotorPrimitive {
    /// Pose delta (dx, dy, dyaw) in the frame of the pose it is applied to
    pub action: Vector3<f64>,
    /// Traversal cost charged on top of the terrain cost
    pub cost: f64,
}

#[derive(Debug, Deserialize)]
struct PrimitiveRecord {
    action: [f64; 3],
    cost: f64,
}

#[derive(Debug, Deserialize)]
struct PrimitiveFile {
    motor_primitives: Vec<PrimitiveRecord>,
}

/// The concrete primitive set used for body lattice expansion.
#[derive(Debug, Default)]
pub struct BodyMotorPrimitives {
    actions: Vec<BodyMotorPrimitive>,
    is_defined: bool,
}

impl BodyMotorPrimitives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a defined primitive set directly, bypassing the file loader.
    pub fn from_primitives(actions: Vec<BodyMotorPrimitive>) -> Self {
        Self {
            actions,
            is_defined: true,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.is_defined
    }
}

impl MotorPrimitives for BodyMotorPrimitives {
    /// Reads the primitive set from a YAML file of the form:
    ///
    /// ```yaml
    /// motor_primitives:
    ///   - action: [0.10, 0.00, 0.00]
    ///     cost: 0.05
    /// ```
    fn read(&mut self, path: &str) -> PlannerResult<()> {
        let text = std::fs::read_to_string(path)?;
        let file: PrimitiveFile = serde_yaml::from_str(&text)?;
        self.actions = file
            .motor_primitives
            .iter()
            .map(|record| BodyMotorPrimitive {
                action: Vector3::new(record.action[0], record.action[1], record.action[2]),
                cost: record.cost,
            })
            .collect();
        self.is_defined = true;
        Ok(())
    }

    fn generate_actions(&self, actions: &mut Vec<Action3d>, state: &Pose3d) {
        if !self.is_defined {
            warn!("could not generate 3d actions because the motor primitives were not loaded");
            return;
        }

        let (sin_yaw, cos_yaw) = state.orientation.sin_cos();
        for primitive in &self.actions {
            let delta = Vector2::new(
                primitive.action.x * cos_yaw - primitive.action.y * sin_yaw,
                primitive.action.x * sin_yaw + primitive.action.y * cos_yaw,
            );
            actions.push(Action3d {
                pose: Pose3d {
                    position: state.position + delta,
                    orientation: state.orientation + primitive.action.z,
                },
                cost: primitive.cost,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_undefined_primitives_produce_nothing() {
        let primitives = BodyMotorPrimitives::new();
        let mut actions = Vec::new();
        primitives.generate_actions(&mut actions, &Pose3d::new(0.0, 0.0, 0.0));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_actions_are_applied_in_the_pose_yaw_frame() {
        let primitives = BodyMotorPrimitives::from_primitives(vec![BodyMotorPrimitive {
            action: Vector3::new(1.0, 0.0, 0.1),
            cost: 0.5,
        }]);

        // Facing +y, a forward primitive must move the body along +y.
        let mut actions = Vec::new();
        primitives.generate_actions(&mut actions, &Pose3d::new(2.0, 3.0, FRAC_PI_2));
        assert_eq!(actions.len(), 1);
        assert_relative_eq!(actions[0].pose.position.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(actions[0].pose.position.y, 4.0, epsilon = 1e-12);
        assert_relative_eq!(actions[0].pose.orientation, FRAC_PI_2 + 0.1, epsilon = 1e-12);
        assert_relative_eq!(actions[0].cost, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_read_from_yaml_file() {
        let path = std::env::temp_dir().join("legged_nav_primitives_test.yaml");
        std::fs::write(
            &path,
            "motor_primitives:\n  - action: [0.10, 0.00, 0.00]\n    cost: 0.05\n  - action: [0.00, 0.05, 0.20]\n    cost: 0.30\n",
        )
        .unwrap();

        let mut primitives = BodyMotorPrimitives::new();
        primitives.read(path.to_str().unwrap()).unwrap();
        assert!(primitives.is_defined());

        let mut actions = Vec::new();
        primitives.generate_actions(&mut actions, &Pose3d::new(0.0, 0.0, 0.0));
        assert_eq!(actions.len(), 2);
        assert_relative_eq!(actions[0].pose.position.x, 0.10, epsilon = 1e-12);
        assert_relative_eq!(actions[1].pose.orientation, 0.20, epsilon = 1e-12);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_rejects_malformed_file() {
        let path = std::env::temp_dir().join("legged_nav_primitives_bad.yaml");
        std::fs::write(&path, "motor_primitives: not-a-list\n").unwrap();

        let mut primitives = BodyMotorPrimitives::new();
        assert!(primitives.read(path.to_str().unwrap()).is_err());
        assert!(!primitives.is_defined());

        std::fs::remove_file(&path).unwrap();
    }
}

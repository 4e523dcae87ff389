//! Motion-primitive lattice adjacency over body poses
//!
//! Expands a body pose through the robot's motor primitives, vetoing
//! actions whose body footprint overlaps an obstacle, and charges each
//! surviving action its stance cost plus the primitive's own cost.

use log::{error, info};
use nalgebra::{Vector2, Vector3};

use crate::adjacency::feature::{Feature, RobotAndTerrain};
use crate::adjacency::{stance, BodyAdjacency};
use crate::common::{Edge, Pose3d, StateRepr, Vertex};
use crate::robot::RobotModel;
use crate::terrain::TerrainMap;

/// Tunables of the lattice expansion.
#[derive(Debug, Clone)]
pub struct LatticeAdjacencyConfig {
    /// Ordered-statistics window of the stance cost
    pub number_top_cost: usize,
    /// Multiplier on the average terrain cost for unperceived areas
    pub uncertainty_factor: f64,
    /// Weight edges by stance cost instead of raw terrain cost
    pub is_stance_adjacency: bool,
}

impl Default for LatticeAdjacencyConfig {
    fn default() -> Self {
        Self {
            number_top_cost: 10,
            uncertainty_factor: 1.15,
            is_stance_adjacency: true,
        }
    }
}

impl LatticeAdjacencyConfig {
    fn sanitized(mut self) -> Self {
        self.number_top_cost = self.number_top_cost.max(1);
        self.uncertainty_factor = self.uncertainty_factor.max(1.0);
        self
    }
}

/// Lattice-based body adjacency model.
pub struct LatticeBodyAdjacency<'m> {
    robot: Option<&'m dyn RobotModel>,
    terrain: Option<&'m TerrainMap>,
    features: Vec<Box<dyn Feature>>,
    config: LatticeAdjacencyConfig,
    /// Delta of the action being evaluated, consumed by the stance areas
    /// and the feature context
    current_action: Vector3<f64>,
}

impl<'m> LatticeBodyAdjacency<'m> {
    pub fn new(config: LatticeAdjacencyConfig) -> Self {
        Self {
            robot: None,
            terrain: None,
            features: Vec::new(),
            config: config.sanitized(),
            current_action: Vector3::zeros(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LatticeAdjacencyConfig::default())
    }

    /// Registers a feature whose weighted cost joins every stance cost.
    pub fn add_feature(&mut self, feature: Box<dyn Feature>) {
        self.features.push(feature);
    }

    pub fn config(&self) -> &LatticeAdjacencyConfig {
        &self.config
    }

    fn robot(&self) -> &'m dyn RobotModel {
        self.robot
            .expect("lattice adjacency queried before reset() bound a robot model")
    }

    fn terrain(&self) -> &'m TerrainMap {
        self.terrain
            .expect("lattice adjacency queried before reset() bound a terrain map")
    }

    /// Stance cost of a body state under the current action, plus the
    /// weighted feature costs.
    fn compute_body_cost(&self, state: &Vector3<f64>) -> f64 {
        let robot = self.robot();
        let terrain = self.terrain();

        // The stance areas depend on the action being applied.
        let stance_areas = robot.footstep_search_areas(&self.current_action);
        let terrain_cost = stance::stance_terrain_cost(
            state,
            &stance_areas,
            terrain,
            self.config.number_top_cost,
            self.config.uncertainty_factor,
        );

        let info = RobotAndTerrain {
            body_action: self.current_action,
            pose: Pose3d::new(state.x, state.y, state.z),
            height_map: terrain.terrain_height_map(),
            resolution: terrain.resolution(true),
        };
        stance::with_feature_costs(terrain_cost, &self.features, &info)
    }

    /// Whether a candidate state is clear of obstacles.
    ///
    /// Without obstacle information everything is free. A point check
    /// projects the vertex onto the obstacle grid; a body check sweeps the
    /// robot workspace rotated to the candidate heading and fails on the
    /// first occupied cell. Unknown cells count as free either way.
    fn is_free_of_obstacle(&self, state_vertex: Vertex, repr: StateRepr, body: bool) -> bool {
        let terrain = self.terrain();
        if !terrain.is_obstacle_information() {
            return true;
        }

        let obstacle_space = terrain.obstacle_space_model();
        let obstacle_map = terrain.obstacle_map();
        if !body {
            let terrain_vertex =
                obstacle_space.state_vertex_to_environment_vertex(state_vertex, repr);
            return !matches!(obstacle_map.get(&terrain_vertex), Some(&true));
        }

        // The candidate vertex was encoded by the terrain discretisation, so
        // it is decoded with the same model; samples are then keyed into the
        // obstacle grid.
        let state_space = terrain.terrain_space_model();
        let (origin, yaw) = match repr {
            StateRepr::Xy => (state_space.vertex_to_coord(state_vertex), 0.0),
            StateRepr::XyYaw => {
                let state = state_space.vertex_to_state(state_vertex);
                (Vector2::new(state.x, state.y), state.z)
            }
        };

        let workspace = self.robot().predefined_body_workspace();
        let min_x = workspace.min_x + origin.x;
        let max_x = workspace.max_x + origin.x;
        let min_y = workspace.min_y + origin.y;
        let max_y = workspace.max_y + origin.y;
        let step = workspace.resolution.max(terrain.obstacle_resolution());

        let mut y = min_y;
        while y <= max_y {
            let mut x = min_x;
            while x <= max_x {
                let point = stance::rotate_about(Vector2::new(x, y), origin, yaw);
                let vertex = obstacle_space.coord_to_vertex(&point);
                if obstacle_map.get(&vertex) == Some(&true) {
                    return false;
                }
                x += step;
            }
            y += step;
        }
        true
    }
}

impl<'m> BodyAdjacency<'m> for LatticeBodyAdjacency<'m> {
    fn reset(&mut self, robot: &'m dyn RobotModel, terrain: &'m TerrainMap) {
        info!("setting the robot information in the {} adjacency model", self.name());
        self.robot = Some(robot);

        info!("setting the terrain information in the {} adjacency model", self.name());
        self.terrain = Some(terrain);

        for feature in &mut self.features {
            feature.reset(robot);
        }
    }

    fn get_successors(&mut self, successors: &mut Vec<Edge>, state_vertex: Vertex) {
        let robot = self.robot();
        let terrain = self.terrain();
        if !terrain.is_terrain_information() {
            error!("could not compute the successors because there is no terrain information");
            return;
        }

        let space = terrain.terrain_space_model();
        let current_state = space.vertex_to_state(state_vertex);
        let current_pose = Pose3d::new(current_state.x, current_state.y, current_state.z);

        // Candidate actions from the body motor primitives; targets are
        // absolute poses.
        let mut actions = Vec::new();
        robot
            .body_motor_primitive()
            .generate_actions(&mut actions, &current_pose);

        for action in &actions {
            let action_state = Vector3::new(
                action.pose.position.x,
                action.pose.position.y,
                action.pose.orientation,
            );
            let action_vertex = space.state_to_vertex(&action_state);
            let terrain_vertex =
                space.state_vertex_to_environment_vertex(action_vertex, StateRepr::XyYaw);

            self.current_action = action_state - current_state;

            if !self.is_free_of_obstacle(action_vertex, StateRepr::XyYaw, true) {
                continue;
            }

            let weight = if !self.config.is_stance_adjacency {
                if terrain.terrain_data_map().contains_key(&terrain_vertex) {
                    terrain.terrain_cost(terrain_vertex)
                } else {
                    self.config.uncertainty_factor * terrain.average_cost_of_terrain()
                }
            } else {
                self.compute_body_cost(&action_state) + action.cost
            };
            successors.push(Edge::new(action_vertex, weight));
        }
    }

    fn name(&self) -> &str {
        "lattice-based body"
    }

    fn is_lattice(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AdjacencyMap, PlannerError, SearchArea};
    use crate::robot::motor_primitives::{
        BodyMotorPrimitive, BodyMotorPrimitives, MotorPrimitives,
    };
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    struct TestRobot {
        stance: SearchArea,
        workspace: SearchArea,
        primitives: BodyMotorPrimitives,
    }

    impl TestRobot {
        fn with_primitives(primitives: Vec<BodyMotorPrimitive>) -> Self {
            Self {
                stance: SearchArea::new(-0.1, 0.1, -0.1, 0.1, 0.04),
                workspace: SearchArea::new(-0.3, 0.3, -0.3, 0.3, 0.1),
                primitives: BodyMotorPrimitives::from_primitives(primitives),
            }
        }

        fn without_primitives() -> Self {
            Self {
                stance: SearchArea::new(-0.1, 0.1, -0.1, 0.1, 0.04),
                workspace: SearchArea::new(-0.3, 0.3, -0.3, 0.3, 0.1),
                primitives: BodyMotorPrimitives::new(),
            }
        }
    }

    impl RobotModel for TestRobot {
        fn footstep_search_areas(&self, _action: &Vector3<f64>) -> Vec<SearchArea> {
            vec![self.stance]
        }

        fn predefined_body_workspace(&self) -> SearchArea {
            self.workspace
        }

        fn body_motor_primitive(&self) -> &dyn MotorPrimitives {
            &self.primitives
        }
    }

    fn forward_primitive(dx: f64, cost: f64) -> BodyMotorPrimitive {
        BodyMotorPrimitive {
            action: Vector3::new(dx, 0.0, 0.0),
            cost,
        }
    }

    fn uniform_terrain(extent: i64, cost: f64) -> TerrainMap {
        let mut terrain = TerrainMap::new(1.0, 2.0 * PI / 16.0);
        for x in -extent..=extent {
            for y in -extent..=extent {
                terrain.add_terrain_cell(&Vector2::new(x as f64, y as f64), cost, 0.0);
            }
        }
        terrain
    }

    fn state_vertex(terrain: &TerrainMap, x: f64, y: f64, yaw: f64) -> Vertex {
        terrain
            .terrain_space_model()
            .state_to_vertex(&Vector3::new(x, y, yaw))
    }

    #[test]
    fn test_no_terrain_information_yields_no_successors() {
        let robot = TestRobot::with_primitives(vec![forward_primitive(1.0, 0.1)]);
        let terrain = TerrainMap::new(1.0, 2.0 * PI / 16.0);
        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        let mut successors = Vec::new();
        adjacency.get_successors(&mut successors, state_vertex(&terrain, 0.0, 0.0, 0.0));
        assert!(successors.is_empty());
    }

    #[test]
    fn test_undefined_primitives_yield_no_successors() {
        let robot = TestRobot::without_primitives();
        let terrain = uniform_terrain(2, 1.0);
        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        let mut successors = Vec::new();
        adjacency.get_successors(&mut successors, state_vertex(&terrain, 0.0, 0.0, 0.0));
        assert!(successors.is_empty());
    }

    #[test]
    fn test_primitive_cost_joins_the_stance_cost() {
        let robot = TestRobot::with_primitives(vec![forward_primitive(1.0, 0.25)]);
        let terrain = uniform_terrain(2, 2.0);
        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        let mut successors = Vec::new();
        adjacency.get_successors(&mut successors, state_vertex(&terrain, 0.0, 0.0, 0.0));
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].target, state_vertex(&terrain, 1.0, 0.0, 0.0));
        // Uniform terrain pins the stance cost at the cell cost.
        assert_relative_eq!(successors[0].weight, 2.0 + 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_terrain_weighted_expansion_substitutes_uncertainty() {
        let robot = TestRobot::with_primitives(vec![
            forward_primitive(1.0, 0.1),
            forward_primitive(10.0, 0.1),
        ]);
        let terrain = uniform_terrain(2, 2.0);
        let mut adjacency = LatticeBodyAdjacency::new(LatticeAdjacencyConfig {
            is_stance_adjacency: false,
            ..LatticeAdjacencyConfig::default()
        });
        adjacency.reset(&robot, &terrain);

        let mut successors = Vec::new();
        adjacency.get_successors(&mut successors, state_vertex(&terrain, 0.0, 0.0, 0.0));
        assert_eq!(successors.len(), 2);
        // (1, 0) is perceived; (10, 0) is off the map.
        assert_relative_eq!(successors[0].weight, 2.0, epsilon = 1e-12);
        assert_relative_eq!(successors[1].weight, 1.15 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_obstacle_vetoes_a_primitive() {
        let robot = TestRobot::with_primitives(vec![
            forward_primitive(0.5, 0.1),
            forward_primitive(1.5, 0.1),
        ]);
        // Fine grid so the candidate poses are representable exactly.
        let mut terrain = TerrainMap::new(0.1, 2.0 * PI / 16.0);
        for x in -10..=20 {
            for y in -10..=10 {
                terrain.add_terrain_cell(
                    &Vector2::new(x as f64 * 0.1, y as f64 * 0.1),
                    1.0,
                    0.0,
                );
            }
        }
        terrain.add_obstacle(&Vector2::new(0.5, 0.0), true);

        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        let mut successors = Vec::new();
        adjacency.get_successors(&mut successors, state_vertex(&terrain, 0.0, 0.0, 0.0));
        // The body footprint at (0.5, 0) covers the obstacle; (1.5, 0)
        // stays clear.
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].target, state_vertex(&terrain, 1.5, 0.0, 0.0));
    }

    #[test]
    fn test_point_obstacle_check() {
        let robot = TestRobot::with_primitives(vec![forward_primitive(1.0, 0.1)]);
        let mut terrain = uniform_terrain(2, 1.0);
        terrain.add_obstacle(&Vector2::new(1.0, 0.0), true);
        terrain.add_obstacle(&Vector2::new(0.0, 1.0), false);

        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        // Occupied cell blocks the point check.
        let blocked = state_vertex(&terrain, 1.0, 0.0, 0.0);
        assert!(!adjacency.is_free_of_obstacle(blocked, StateRepr::XyYaw, false));
        // Explicitly free cell passes.
        let free = state_vertex(&terrain, 0.0, 1.0, 0.0);
        assert!(adjacency.is_free_of_obstacle(free, StateRepr::XyYaw, false));
        // A cell absent from the obstacle map counts as free.
        let unknown = state_vertex(&terrain, 2.0, 2.0, 0.0);
        assert!(adjacency.is_free_of_obstacle(unknown, StateRepr::XyYaw, false));

        // Environment vertices go through the same check unprojected.
        let space = terrain.terrain_space_model();
        let blocked_env = space.coord_to_vertex(&Vector2::new(1.0, 0.0));
        assert!(!adjacency.is_free_of_obstacle(blocked_env, StateRepr::Xy, false));
        let free_env = space.coord_to_vertex(&Vector2::new(0.0, 1.0));
        assert!(adjacency.is_free_of_obstacle(free_env, StateRepr::Xy, false));
    }

    #[test]
    fn test_body_obstacle_check_from_an_environment_vertex() {
        let robot = TestRobot::with_primitives(vec![forward_primitive(1.0, 0.1)]);
        let mut terrain = uniform_terrain(4, 1.0);
        terrain.add_obstacle(&Vector2::new(1.0, 0.0), true);

        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        // An environment vertex carries no yaw; the footprint sweeps
        // axis-aligned around the decoded coordinate.
        let space = terrain.terrain_space_model();
        let near = space.coord_to_vertex(&Vector2::new(1.0, 0.0));
        assert!(!adjacency.is_free_of_obstacle(near, StateRepr::Xy, true));
        let far = space.coord_to_vertex(&Vector2::new(4.0, 0.0));
        assert!(adjacency.is_free_of_obstacle(far, StateRepr::Xy, true));
    }

    #[test]
    fn test_missing_obstacle_information_means_free() {
        let robot = TestRobot::with_primitives(vec![forward_primitive(1.0, 0.1)]);
        let terrain = uniform_terrain(2, 1.0);
        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        let mut successors = Vec::new();
        adjacency.get_successors(&mut successors, state_vertex(&terrain, 0.0, 0.0, 0.0));
        assert_eq!(successors.len(), 1);
    }

    #[test]
    fn test_whole_map_materialisation_is_unsupported() {
        let robot = TestRobot::with_primitives(vec![forward_primitive(1.0, 0.1)]);
        let terrain = uniform_terrain(1, 1.0);
        let mut adjacency = LatticeBodyAdjacency::with_defaults();
        adjacency.reset(&robot, &terrain);

        let mut adjacency_map = AdjacencyMap::new();
        let result = adjacency.compute_adjacency_map(&mut adjacency_map, 0, 1);
        assert!(matches!(
            result,
            Err(PlannerError::UnsupportedOperation(_))
        ));
        assert!(adjacency_map.is_empty());
    }

    #[test]
    fn test_name_and_kind() {
        let adjacency = LatticeBodyAdjacency::with_defaults();
        assert_eq!(adjacency.name(), "lattice-based body");
        assert!(adjacency.is_lattice());
    }

    #[test]
    fn test_grid_and_lattice_share_the_adjacency_trait() {
        let grid = crate::adjacency::GridBodyAdjacency::with_defaults();
        let lattice = LatticeBodyAdjacency::with_defaults();
        let models: Vec<Box<dyn BodyAdjacency<'static>>> = vec![Box::new(grid), Box::new(lattice)];
        let kinds: Vec<bool> = models.iter().map(|m| m.is_lattice()).collect();
        assert_eq!(kinds, vec![false, true]);
    }
}

//! 8-direction grid adjacency over body poses
//!
//! Expands a body-pose vertex to the nearest perceived terrain cell along
//! each of the eight compass rays, and can materialise the adjacency over
//! the whole terrain map for searches that want it up front.

use log::{error, info};
use nalgebra::{Vector2, Vector3};

use crate::adjacency::feature::{Feature, RobotAndTerrain};
use crate::adjacency::{stance, BodyAdjacency};
use crate::common::{AdjacencyMap, Edge, Key, PlannerResult, Pose3d, SearchArea, StateRepr, Vertex};
use crate::robot::RobotModel;
use crate::terrain::TerrainMap;

/// Compass probe offsets, one ring step per direction. The order is fixed
/// and determines the successor order.
const COMPASS_DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
];

/// Tunables of the grid expansion.
#[derive(Debug, Clone)]
pub struct GridAdjacencyConfig {
    /// Ring horizon of the directional neighbour search
    pub neighboring_definition: usize,
    /// Ordered-statistics window of the stance cost
    pub number_top_cost: usize,
    /// Multiplier on the average terrain cost for unperceived areas
    pub uncertainty_factor: f64,
    /// Weight edges by stance cost instead of raw terrain cost
    pub is_stance_adjacency: bool,
}

impl Default for GridAdjacencyConfig {
    fn default() -> Self {
        Self {
            neighboring_definition: 3,
            number_top_cost: 5,
            uncertainty_factor: 1.15,
            is_stance_adjacency: true,
        }
    }
}

impl GridAdjacencyConfig {
    fn sanitized(mut self) -> Self {
        self.neighboring_definition = self.neighboring_definition.max(1);
        self.number_top_cost = self.number_top_cost.max(1);
        self.uncertainty_factor = self.uncertainty_factor.max(1.0);
        self
    }
}

/// Grid-based body adjacency model.
pub struct GridBodyAdjacency<'m> {
    robot: Option<&'m dyn RobotModel>,
    terrain: Option<&'m TerrainMap>,
    features: Vec<Box<dyn Feature>>,
    config: GridAdjacencyConfig,
}

impl<'m> GridBodyAdjacency<'m> {
    pub fn new(config: GridAdjacencyConfig) -> Self {
        Self {
            robot: None,
            terrain: None,
            features: Vec::new(),
            config: config.sanitized(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(GridAdjacencyConfig::default())
    }

    /// Registers a feature whose weighted cost joins every stance cost.
    pub fn add_feature(&mut self, feature: Box<dyn Feature>) {
        self.features.push(feature);
    }

    pub fn config(&self) -> &GridAdjacencyConfig {
        &self.config
    }

    fn robot(&self) -> &'m dyn RobotModel {
        self.robot
            .expect("grid adjacency queried before reset() bound a robot model")
    }

    fn terrain(&self) -> &'m TerrainMap {
        self.terrain
            .expect("grid adjacency queried before reset() bound a terrain map")
    }

    /// Nearest perceived terrain cell along each compass ray, as state
    /// vertices carrying the source's quantised yaw.
    ///
    /// Each direction is probed ring by ring up to the configured horizon
    /// and contributes only the first ring where terrain exists, so at most
    /// eight neighbours come back.
    fn search_neighbors(&self, terrain: &TerrainMap, state_vertex: Vertex) -> Vec<Vertex> {
        let mut neighbor_states = Vec::new();
        if !terrain.is_terrain_information() {
            error!("could not search the neighbors because there is no terrain information");
            return neighbor_states;
        }

        let space = terrain.terrain_space_model();
        let state = space.vertex_to_state(state_vertex);
        let key_yaw = space.state_to_key(state.z, false);
        let yaw = space.key_to_state(key_yaw, false);

        let terrain_vertex =
            space.state_vertex_to_environment_vertex(state_vertex, StateRepr::XyYaw);
        let terrain_key = space.vertex_to_key(terrain_vertex, StateRepr::Xy);

        let terrain_map = terrain.terrain_data_map();
        let mut found = [false; COMPASS_DIRECTIONS.len()];
        for ring in 1..=self.config.neighboring_definition as i64 {
            for (direction, &(dx, dy)) in COMPASS_DIRECTIONS.iter().enumerate() {
                if found[direction] {
                    continue;
                }
                let searching_key = Key::new(
                    terrain_key.x + dx * ring,
                    terrain_key.y + dy * ring,
                    0,
                );
                let neighbor_vertex = space.key_to_vertex(searching_key, StateRepr::Xy);
                if terrain_map.contains_key(&neighbor_vertex) {
                    let neighbor_state = Vector3::new(
                        space.key_to_state(searching_key.x, true),
                        space.key_to_state(searching_key.y, true),
                        yaw,
                    );
                    neighbor_states.push(space.state_to_vertex(&neighbor_state));
                    found[direction] = true;
                }
            }
        }
        neighbor_states
    }

    /// Stance cost of a body state plus the weighted feature costs.
    fn compute_body_cost(
        &self,
        terrain: &TerrainMap,
        state: &Vector3<f64>,
        stance_areas: &[SearchArea],
    ) -> f64 {
        let terrain_cost = stance::stance_terrain_cost(
            state,
            stance_areas,
            terrain,
            self.config.number_top_cost,
            self.config.uncertainty_factor,
        );

        let info = RobotAndTerrain {
            body_action: Vector3::new(1.0, 0.0, 0.0),
            pose: Pose3d::new(state.x, state.y, state.z),
            height_map: terrain.terrain_height_map(),
            resolution: terrain.resolution(true),
        };
        stance::with_feature_costs(terrain_cost, &self.features, &info)
    }

    /// Snaps `source` and `target` onto perceived terrain. A vertex whose
    /// environment projection is already perceived snaps to itself; only
    /// the missing side is searched, by 2D Euclidean distance over (x, y).
    fn closest_start_and_goal(
        &self,
        terrain: &TerrainMap,
        source: Vertex,
        target: Vertex,
        yaw: f64,
    ) -> (Vertex, Vertex) {
        let space = terrain.terrain_space_model();
        let terrain_map = terrain.terrain_data_map();

        let source_env = space.state_vertex_to_environment_vertex(source, StateRepr::XyYaw);
        let target_env = space.state_vertex_to_environment_vertex(target, StateRepr::XyYaw);
        let has_source = terrain_map.contains_key(&source_env);
        let has_target = terrain_map.contains_key(&target_env);
        if has_source && has_target {
            return (source, target);
        }

        let source_state = space.vertex_to_state(source);
        let target_state = space.vertex_to_state(target);
        let source_coord = Vector2::new(source_state.x, source_state.y);
        let target_coord = Vector2::new(target_state.x, target_state.y);

        let mut closest_source = source;
        let mut closest_target = target;
        let mut closest_source_distance = f64::MAX;
        let mut closest_target_distance = f64::MAX;
        for &vertex in terrain_map.keys() {
            let coord = space.vertex_to_coord(vertex);
            let snapped =
                space.state_to_vertex(&Vector3::new(coord.x, coord.y, yaw));

            if !has_source {
                let distance = (coord - source_coord).norm();
                if distance < closest_source_distance {
                    closest_source = snapped;
                    closest_source_distance = distance;
                }
            }
            if !has_target {
                let distance = (coord - target_coord).norm();
                if distance < closest_target_distance {
                    closest_target = snapped;
                    closest_target_distance = distance;
                }
            }
        }
        (closest_source, closest_target)
    }
}

impl<'m> BodyAdjacency<'m> for GridBodyAdjacency<'m> {
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
        let neighbor_states = self.search_neighbors(terrain, state_vertex);
        let stance_areas = if self.config.is_stance_adjacency {
            robot.footstep_search_areas(&Vector3::zeros())
        } else {
            Vec::new()
        };

        for neighbor in neighbor_states {
            let weight = if self.config.is_stance_adjacency {
                let state = space.vertex_to_state(neighbor);
                self.compute_body_cost(terrain, &state, &stance_areas)
            } else {
                let terrain_vertex =
                    space.state_vertex_to_environment_vertex(neighbor, StateRepr::XyYaw);
                terrain.terrain_cost(terrain_vertex)
            };
            successors.push(Edge::new(neighbor, weight));
        }
    }

    /// Builds the adjacency over every perceived terrain cell at the
    /// source's yaw representative. Unperceived source/target vertices are
    /// joined to their snapped counterparts with zero-weight edges so the
    /// search can cross the gap.
    fn compute_adjacency_map(
        &mut self,
        adjacency_map: &mut AdjacencyMap,
        source: Vertex,
        target: Vertex,
    ) -> PlannerResult<()> {
        let robot = self.robot();
        let terrain = self.terrain();
        if !terrain.is_terrain_information() {
            error!("could not compute the adjacency map because there is no terrain information");
            return Ok(());
        }

        // Default stance areas for the whole sweep.
        let stance_areas = robot.footstep_search_areas(&Vector3::zeros());

        // Body orientation, quantised to its yaw-key representative.
        let space = terrain.terrain_space_model();
        let initial_state = space.vertex_to_state(source);
        let key_yaw = space.state_to_key(initial_state.z, false);
        let yaw = space.key_to_state(key_yaw, false);

        let (closest_source, closest_target) =
            self.closest_start_and_goal(terrain, source, target, yaw);
        if closest_source != source {
            adjacency_map
                .entry(source)
                .or_default()
                .push(Edge::new(closest_source, 0.0));
        }
        if closest_target != target {
            adjacency_map
                .entry(closest_target)
                .or_default()
                .push(Edge::new(target, 0.0));
        }

        for (&vertex, cell) in terrain.terrain_data_map() {
            let coord = space.vertex_to_coord(vertex);
            let state = Vector3::new(coord.x, coord.y, yaw);
            let state_vertex = space.state_to_vertex(&state);

            let weight = if self.config.is_stance_adjacency {
                self.compute_body_cost(terrain, &state, &stance_areas)
            } else {
                cell.cost
            };

            for neighbor in self.search_neighbors(terrain, state_vertex) {
                adjacency_map
                    .entry(state_vertex)
                    .or_default()
                    .push(Edge::new(neighbor, weight));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "grid-based body"
    }

    fn is_lattice(&self) -> bool {
        false
    }
}

//! Body-pose adjacency models
//!
//! An adjacency model turns the terrain and robot descriptions into a
//! weighted directed successor relation over discretised body poses, which
//! an external shortest-path search traverses. Two expansion modes exist
//! behind the same trait: an 8-direction grid search and a motion-primitive
//! lattice search.

pub mod feature;
pub mod grid;
pub mod lattice;

mod stance;

use crate::common::{AdjacencyMap, Edge, PlannerError, PlannerResult, Vertex};
use crate::robot::RobotModel;
use crate::terrain::TerrainMap;

pub use feature::{Feature, HeightDeviationFeature, RobotAndTerrain};
pub use grid::{GridAdjacencyConfig, GridBodyAdjacency};
pub use lattice::{LatticeAdjacencyConfig, LatticeBodyAdjacency};

/// The successor relation over body-pose vertices exposed to a path search.
///
/// An adjacency is constructed idle; [`reset`](Self::reset) binds the robot
/// and terrain for the borrow lifetime `'m`. Query methods panic if called
/// before `reset`.
pub trait BodyAdjacency<'m> {
    /// Binds the robot and terrain information used by subsequent queries
    /// and resets the registered features.
    fn reset(&mut self, robot: &'m dyn RobotModel, terrain: &'m TerrainMap);

    /// Appends the weighted successors of `state_vertex`. Without terrain
    /// information a diagnostic is emitted and nothing is appended.
    fn get_successors(&mut self, successors: &mut Vec<Edge>, state_vertex: Vertex);

    /// Materialises the adjacency over the whole terrain map, snapping
    /// `source` and `target` onto perceived terrain where needed. Only grid
    /// expansion supports this.
    fn compute_adjacency_map(
        &mut self,
        _adjacency_map: &mut AdjacencyMap,
        _source: Vertex,
        _target: Vertex,
    ) -> PlannerResult<()> {
        Err(PlannerError::UnsupportedOperation(format!(
            "the {} adjacency cannot materialise a whole-map adjacency",
            self.name()
        )))
    }

    /// Human-readable model name for diagnostics.
    fn name(&self) -> &str;

    /// Whether this model expands through motion primitives.
    fn is_lattice(&self) -> bool;
}

//! Common types used throughout legged-nav

use std::collections::BTreeMap;

use nalgebra::Vector2;

/// Opaque handle for a discretised grid cell.
///
/// Two vertex spaces share this type: environment vertices index 2D terrain
/// cells by (x, y); state vertices index 3D body states by (x, y, yaw).
/// Encoding and decoding belong to `SpaceModel`; consumers only compare and
/// hash vertices.
pub type Vertex = u64;

/// Signed per-axis grid indices. The canonical form for neighbour
/// arithmetic; the environment grid ignores `yaw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub x: i64,
    pub y: i64,
    pub yaw: i64,
}

impl Key {
    pub fn new(x: i64, y: i64, yaw: i64) -> Self {
        Self { x, y, yaw }
    }
}

/// Which axes a vertex encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRepr {
    /// 2D environment cell (x, y)
    Xy,
    /// 3D body state cell (x, y, yaw)
    XyYaw,
}

/// Weighted outgoing edge of the adjacency relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: Vertex,
    pub weight: f64,
}

impl Edge {
    pub fn new(target: Vertex, weight: f64) -> Self {
        Self { target, weight }
    }
}

/// Mapping from vertex to its outgoing edges. Edge order within a vertex
/// reflects insertion during expansion; search consumers treat it as a
/// multiset.
pub type AdjacencyMap = BTreeMap<Vertex, Vec<Edge>>;

/// Planar body pose (position + heading).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3d {
    pub position: Vector2<f64>,
    pub orientation: f64,
}

impl Pose3d {
    pub fn new(x: f64, y: f64, orientation: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            orientation,
        }
    }
}

/// A motion primitive endpoint: the absolute target pose produced by
/// applying the primitive, plus its traversal cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action3d {
    pub pose: Pose3d,
    pub cost: f64,
}

/// Axis-aligned rectangle in the body frame, with the sampling resolution
/// used when it is swept. Describes a per-foot stance region or the whole
/// body footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub resolution: f64,
}

impl SearchArea {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64, resolution: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose3d_new() {
        let pose = Pose3d::new(1.0, -2.0, 0.5);
        assert_eq!(pose.position, Vector2::new(1.0, -2.0));
        assert_eq!(pose.orientation, 0.5);
    }

    #[test]
    fn test_edge_ordering_is_insertion() {
        let mut map = AdjacencyMap::new();
        map.entry(3).or_default().push(Edge::new(7, 1.0));
        map.entry(3).or_default().push(Edge::new(5, 2.0));
        let edges = &map[&3];
        assert_eq!(edges[0].target, 7);
        assert_eq!(edges[1].target, 5);
    }
}

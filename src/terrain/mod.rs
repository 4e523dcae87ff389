//! Terrain discretisation and read-only terrain access
//!
//! `SpaceModel` maps between continuous states, integer keys and opaque
//! vertices; `TerrainMap` is the sparse cost/height/obstacle facade the
//! adjacency models query.

pub mod space_model;
pub mod terrain_map;

pub use space_model::{normalize_yaw, SpaceModel};
pub use terrain_map::{TerrainCell, TerrainMap};

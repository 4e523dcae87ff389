//! Bidirectional mapping between continuous states, integer keys and
//! opaque vertices over the 2D environment grid and the 3D body-state grid.
//!
//! Keys are signed cell indices obtained by rounding a coordinate to the
//! nearest multiple of the axis resolution, so every key <-> state round
//! trip is exact to half a resolution. Vertices pack the biased keys into
//! 16-bit fields of a `u64`: environment vertices hold (x, y), state
//! vertices hold (x, y, yaw). Packing is modular, so out-of-range keys
//! remain representable and the caller decides whether a probed vertex is
//! meaningful by consulting the map.

use std::f64::consts::PI;

use nalgebra::{Vector2, Vector3};

use crate::common::{Key, StateRepr, Vertex};

const KEY_BITS: u32 = 16;
const KEY_SPAN: i64 = 1 << KEY_BITS;
const KEY_BIAS: i64 = KEY_SPAN / 2;
const AXIS_MASK: u64 = (KEY_SPAN - 1) as u64;
const ENV_MASK: u64 = (1 << (2 * KEY_BITS)) - 1;

/// Wraps a yaw angle into (-pi, pi].
pub fn normalize_yaw(mut yaw: f64) -> f64 {
    while yaw > PI {
        yaw -= 2.0 * PI;
    }
    while yaw <= -PI {
        yaw += 2.0 * PI;
    }
    yaw
}

fn pack_axis(key: i64) -> u64 {
    ((key + KEY_BIAS).rem_euclid(KEY_SPAN)) as u64
}

fn unpack_axis(bits: u64) -> i64 {
    (bits & AXIS_MASK) as i64 - KEY_BIAS
}

/// Discretisation of the planar workspace and the yaw wheel.
///
/// All mappings are pure: two models built with the same resolutions produce
/// identical vertices for identical states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceModel {
    plane_resolution: f64,
    angular_resolution: f64,
}

impl SpaceModel {
    pub fn new(plane_resolution: f64, angular_resolution: f64) -> Self {
        Self {
            plane_resolution,
            angular_resolution,
        }
    }

    pub fn plane_resolution(&self) -> f64 {
        self.plane_resolution
    }

    pub fn angular_resolution(&self) -> f64 {
        self.angular_resolution
    }

    /// Resolution of the plane axes (`plane == true`) or the yaw axis.
    pub fn resolution(&self, plane: bool) -> f64 {
        if plane {
            self.plane_resolution
        } else {
            self.angular_resolution
        }
    }

    /// Quantises a scalar state value to its cell index. Yaw values are
    /// wrapped into (-pi, pi] first, which makes the yaw key space a finite
    /// wheel.
    pub fn state_to_key(&self, value: f64, plane: bool) -> i64 {
        if plane {
            (value / self.plane_resolution).round() as i64
        } else {
            (normalize_yaw(value) / self.angular_resolution).round() as i64
        }
    }

    /// Center of the cell addressed by `key`.
    pub fn key_to_state(&self, key: i64, plane: bool) -> f64 {
        key as f64 * self.resolution(plane)
    }

    /// Packs a key into a vertex of the chosen space.
    pub fn key_to_vertex(&self, key: Key, repr: StateRepr) -> Vertex {
        let base = pack_axis(key.x) | pack_axis(key.y) << KEY_BITS;
        match repr {
            StateRepr::Xy => base,
            StateRepr::XyYaw => base | pack_axis(key.yaw) << (2 * KEY_BITS),
        }
    }

    /// Unpacks a vertex of the chosen space back into its key. The `yaw`
    /// component is zero for environment vertices.
    pub fn vertex_to_key(&self, vertex: Vertex, repr: StateRepr) -> Key {
        let x = unpack_axis(vertex);
        let y = unpack_axis(vertex >> KEY_BITS);
        let yaw = match repr {
            StateRepr::Xy => 0,
            StateRepr::XyYaw => unpack_axis(vertex >> (2 * KEY_BITS)),
        };
        Key::new(x, y, yaw)
    }

    /// Environment vertex of the cell containing `coord`.
    pub fn coord_to_vertex(&self, coord: &Vector2<f64>) -> Vertex {
        let key = Key::new(
            self.state_to_key(coord.x, true),
            self.state_to_key(coord.y, true),
            0,
        );
        self.key_to_vertex(key, StateRepr::Xy)
    }

    /// Center coordinate of an environment vertex.
    pub fn vertex_to_coord(&self, vertex: Vertex) -> Vector2<f64> {
        let key = self.vertex_to_key(vertex, StateRepr::Xy);
        Vector2::new(
            self.key_to_state(key.x, true),
            self.key_to_state(key.y, true),
        )
    }

    /// State vertex of the cell containing `(x, y, yaw)`.
    pub fn state_to_vertex(&self, state: &Vector3<f64>) -> Vertex {
        let key = Key::new(
            self.state_to_key(state.x, true),
            self.state_to_key(state.y, true),
            self.state_to_key(state.z, false),
        );
        self.key_to_vertex(key, StateRepr::XyYaw)
    }

    /// Center state of a state vertex, yaw collapsed to its discrete
    /// representative.
    pub fn vertex_to_state(&self, vertex: Vertex) -> Vector3<f64> {
        let key = self.vertex_to_key(vertex, StateRepr::XyYaw);
        Vector3::new(
            self.key_to_state(key.x, true),
            self.key_to_state(key.y, true),
            self.key_to_state(key.yaw, false),
        )
    }

    /// Drops the yaw axis, projecting a state vertex onto the environment
    /// vertex covering the same (x, y) cell.
    pub fn state_vertex_to_environment_vertex(
        &self,
        state_vertex: Vertex,
        repr: StateRepr,
    ) -> Vertex {
        match repr {
            StateRepr::Xy => state_vertex,
            StateRepr::XyYaw => state_vertex & ENV_MASK,
        }
    }
}

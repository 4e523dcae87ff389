//! Common types and error definitions for legged-nav
//!
//! This module provides the foundational building blocks shared by the
//! terrain, robot and adjacency layers.

pub mod types;
pub mod error;

pub use types::*;
pub use error::*;

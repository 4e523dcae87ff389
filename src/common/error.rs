//! Error types for legged-nav

use std::fmt;

/// Main error type for the adjacency models
#[derive(Debug)]
pub enum PlannerError {
    /// The adjacency model does not support the requested operation
    UnsupportedOperation(String),
    /// Motor-primitive file could not be parsed
    PrimitiveLoad(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::UnsupportedOperation(msg) => {
                write!(f, "Unsupported operation: {}", msg)
            }
            PlannerError::PrimitiveLoad(msg) => {
                write!(f, "Motor-primitive load error: {}", msg)
            }
            PlannerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::Io(e)
    }
}

impl From<serde_yaml::Error> for PlannerError {
    fn from(e: serde_yaml::Error) -> Self {
        PlannerError::PrimitiveLoad(e.to_string())
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

//! Error types
//!
//! Stepping never fails; errors only come from registering bodies and
//! loading or validating configuration.

use thiserror::Error;

use crate::sim::EntityId;

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("body size must be positive and finite, got {width}x{height}")]
    InvalidSize { width: f32, height: f32 },

    #[error("max_move_ratio must be positive and finite, got {0}")]
    InvalidMoveRatio(f32),

    #[error("world bounds must be positive and finite, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("failed to parse settings: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

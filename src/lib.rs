//! Arcade Physics - movement and collision core for 2D arcade games
//!
//! Core modules:
//! - `sim`: Deterministic per-frame step (quad-tree broad phase, AABB/swept narrow phase)
//! - `settings`: Tunable step parameters and precision presets
//! - `error`: Registration and configuration errors
//! - `breakout`: A small Breakout collaborator built on the core

pub mod breakout;
pub mod error;
pub mod settings;
pub mod sim;

pub use error::{PhysicsError, Result};
pub use settings::{PhysicsSettings, PrecisionPreset};
pub use sim::{
    Aabb, Behavior, Body, Bounds, CollisionTable, CollisionTag, Contact, ContactKind, EntityId,
    Inert, StepReport, World,
};

/// Engine configuration constants
pub mod consts {
    /// Default fraction of a body's smallest dimension it may travel per substep
    pub const DEFAULT_MAX_MOVE_RATIO: f32 = 0.5;
    /// Substep cap under the `Fast` preset; other presets leave substepping uncapped
    pub const FAST_MAX_SUBSTEPS: u32 = 4;

    /// Quad-tree node capacity before subdividing
    pub const QUADTREE_CAPACITY: usize = 4;
    /// Deepest quad-tree level (root is level 0)
    pub const QUADTREE_MAX_LEVELS: u32 = 5;

    /// Padding added around a body's AABB when querying the broad phase
    pub const QUERY_PADDING: f32 = 1.0;
    /// Positional nudge along the contact normal after a swept hit (anti-sticking)
    pub const CCD_EPSILON: f32 = 0.01;
}

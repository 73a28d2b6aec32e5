//! Deterministic movement and collision core
//!
//! This module must stay pure and deterministic:
//! - One self-contained pass per `step` call, nothing kept between calls
//! - Stable iteration order (arena order = id order, groups by `Ord`)
//! - No rendering, audio or platform dependencies

pub mod aabb;
pub mod entity;
pub mod group;
pub mod narrowphase;
pub mod quadtree;
pub mod step;
pub mod world;

pub use aabb::{Aabb, Bounds};
pub use entity::{Behavior, Body, Contact, ContactKind, Entity, EntityId, Inert};
pub use group::{CollisionTable, CollisionTag};
pub use narrowphase::{Overlap, SweepHit, is_colliding, overlap, reflect_velocity, swept_aabb};
pub use quadtree::QuadTree;
pub use step::{CollisionRecord, StepReport, step, substep_count};
pub use world::World;

//! Entity model
//!
//! A registered entity is plain `Body` data plus a boxed `Behavior`. The step
//! owns integration: behaviors steer through `vel` and flags, never `pos`.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::group::CollisionTag;
use crate::consts::DEFAULT_MAX_MOVE_RATIO;

/// Stable entity handle, assigned on registration and never reused
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Movable, collidable state of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body<G> {
    pub(crate) id: EntityId,
    /// Top-left corner (world units)
    pub pos: Vec2,
    /// Width/height, both > 0
    pub size: Vec2,
    /// World units per unit time
    pub vel: Vec2,
    /// Cleared by `destroy`; inactive bodies are compacted at step end
    pub active: bool,
    /// Takes part in collision at all
    pub collider: bool,
    /// Informational only, does not pin the body
    pub is_static: bool,
    /// Broad-phase bucket this body is inserted into
    pub group: G,
    /// Buckets this body queries
    pub collides_with: Vec<G>,
    /// Resolve hits by time of impact instead of end-of-step overlap
    pub use_ccd: bool,
    pub substep_enabled: bool,
    /// Fraction of the smallest dimension allowed per substep
    pub max_move_ratio: f32,
    /// Clamp into world bounds instead of leaving them
    pub stay_in_world: bool,
}

impl<G: CollisionTag> Body<G> {
    /// Active collider at rest in `group`, colliding with nothing yet
    pub fn new(pos: Vec2, size: Vec2, group: G) -> Self {
        Self {
            id: EntityId::default(),
            pos,
            size,
            vel: Vec2::ZERO,
            active: true,
            collider: true,
            is_static: false,
            group,
            collides_with: Vec::new(),
            use_ccd: false,
            substep_enabled: false,
            max_move_ratio: DEFAULT_MAX_MOVE_RATIO,
            stay_in_world: false,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn colliding_with(mut self, groups: impl IntoIterator<Item = G>) -> Self {
        for group in groups {
            if !self.collides_with.contains(&group) {
                self.collides_with.push(group);
            }
        }
        self
    }

    pub fn with_ccd(mut self) -> Self {
        self.use_ccd = true;
        self
    }

    /// Enable substepping with the given per-substep move ratio
    pub fn with_substeps(mut self, max_move_ratio: f32) -> Self {
        self.substep_enabled = true;
        self.max_move_ratio = max_move_ratio;
        self
    }

    pub fn staying_in_world(mut self) -> Self {
        self.stay_in_world = true;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Present in the world but ignored by collision
    pub fn without_collider(mut self) -> Self {
        self.collider = false;
        self
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Soft delete: the body stays readable until the current step ends
    pub fn destroy(&mut self) {
        self.active = false;
    }

    pub(crate) fn takes_part_in_collision(&self) -> bool {
        self.active && self.collider
    }
}

/// How a contact was confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    /// Swept AABB time of impact
    Swept,
    /// Discrete overlap at the end of the (sub)step
    Overlap,
}

/// Contact details handed to `Behavior::on_collision`, from the receiver's side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub kind: ContactKind,
    /// Unit normal pointing away from the other body, into the receiver
    pub normal: Vec2,
    /// Time of impact fraction for swept contacts
    pub toi: Option<f32>,
    /// Penetration depth for overlap contacts (0 for swept)
    pub depth: f32,
}

impl Contact {
    /// Same contact seen from the other participant
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            ..*self
        }
    }
}

/// Per-type game logic attached to a body
///
/// Implementations hold whatever game state they need (hit points, shared
/// score handles). The step passes the body in so it can be steered.
pub trait Behavior<G> {
    /// Logic only (input, AI, timers). Change `vel`, not `pos`.
    fn update(&mut self, _body: &mut Body<G>, _dt: f32) {}

    /// Called once on each participant of a confirmed pair per step.
    fn on_collision(&mut self, _body: &mut Body<G>, _other: &Body<G>, _contact: &Contact) {}

    /// Refines the `collides_with` tag filter for a single pair.
    fn can_collide_with(&self, _body: &Body<G>, _other: &Body<G>) -> bool {
        true
    }
}

/// Behavior that does nothing (walls, static scenery)
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl<G> Behavior<G> for Inert {}

/// A registered body and its behavior
pub struct Entity<G> {
    pub body: Body<G>,
    pub behavior: Box<dyn Behavior<G>>,
}

impl<G: CollisionTag> Entity<G> {
    pub fn new(body: Body<G>, behavior: impl Behavior<G> + 'static) -> Self {
        Self {
            body,
            behavior: Box::new(behavior),
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    /// Mutual consent of both behaviors
    pub(crate) fn accepts(&self, other: &Entity<G>) -> bool {
        self.behavior.can_collide_with(&self.body, &other.body)
            && other.behavior.can_collide_with(&other.body, &self.body)
    }
}

impl<G: fmt::Debug> fmt::Debug for Entity<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("body", &self.body).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Tag {
        A,
        B,
    }

    struct OnlyOthers;

    impl Behavior<Tag> for OnlyOthers {
        fn can_collide_with(&self, body: &Body<Tag>, other: &Body<Tag>) -> bool {
            body.group != other.group
        }
    }

    #[test]
    fn test_builder_defaults() {
        let body = Body::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Tag::A);
        assert!(body.active && body.collider && !body.is_static);
        assert!(!body.use_ccd && !body.substep_enabled && !body.stay_in_world);
        assert_eq!(body.max_move_ratio, DEFAULT_MAX_MOVE_RATIO);
        assert_eq!(body.aabb(), Aabb::new(Vec2::new(1.0, 2.0), Vec2::new(4.0, 6.0)));
    }

    #[test]
    fn test_colliding_with_is_a_set() {
        let body = Body::new(Vec2::ZERO, Vec2::ONE, Tag::A).colliding_with([Tag::B, Tag::B]);
        assert_eq!(body.collides_with, vec![Tag::B]);
    }

    #[test]
    fn test_destroy_is_soft() {
        let mut body = Body::new(Vec2::ZERO, Vec2::ONE, Tag::A);
        body.destroy();
        assert!(!body.active);
        assert!(!body.takes_part_in_collision());
        assert_eq!(body.pos, Vec2::ZERO);
    }

    #[test]
    fn test_accepts_requires_both_sides() {
        let a = Entity::new(Body::new(Vec2::ZERO, Vec2::ONE, Tag::A), OnlyOthers);
        let a2 = Entity::new(Body::new(Vec2::ZERO, Vec2::ONE, Tag::A), Inert);
        let b = Entity::new(Body::new(Vec2::ZERO, Vec2::ONE, Tag::B), Inert);
        assert!(a.accepts(&b));
        assert!(b.accepts(&a));
        assert!(!a.accepts(&a2));
        assert!(!a2.accepts(&a));
    }

    #[test]
    fn test_flipped_contact() {
        let c = Contact {
            kind: ContactKind::Swept,
            normal: Vec2::new(-1.0, 0.0),
            toi: Some(0.3),
            depth: 0.0,
        };
        let f = c.flipped();
        assert_eq!(f.normal, Vec2::new(1.0, 0.0));
        assert_eq!(f.toi, Some(0.3));
    }
}

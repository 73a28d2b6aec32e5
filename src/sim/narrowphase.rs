//! Narrow phase: exact AABB tests
//!
//! Discrete overlap for the common case and a swept AABB time-of-impact test
//! for fast movers that would otherwise tunnel through thin targets.

use glam::Vec2;

use super::aabb::Aabb;

/// Discrete overlap contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Minimum-penetration axis normal, pointing from the other box into this one
    pub normal: Vec2,
    /// Penetration depth along `normal` (> 0)
    pub depth: f32,
}

/// Swept hit against a stationary target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction in [0,1] of the motion at which the boxes first touch
    pub toi: f32,
    /// Axis normal pointing away from the target, into the mover
    pub normal: Vec2,
}

/// Strict AABB intersection. Touching edges are not a collision.
#[inline]
pub fn is_colliding(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Discrete overlap with a separating normal from `other` into `me`
pub fn overlap(me: &Aabb, other: &Aabb) -> Option<Overlap> {
    if !is_colliding(me, other) {
        return None;
    }

    let d = me.center() - other.center();
    let ox = (me.width() + other.width()) * 0.5 - d.x.abs();
    let oy = (me.height() + other.height()) * 0.5 - d.y.abs();

    // Resolve along the axis of least penetration
    let (normal, depth) = if ox <= oy {
        let nx = if d.x >= 0.0 { 1.0 } else { -1.0 };
        (Vec2::new(nx, 0.0), ox)
    } else {
        let ny = if d.y >= 0.0 { 1.0 } else { -1.0 };
        (Vec2::new(0.0, ny), oy)
    };

    Some(Overlap { normal, depth })
}

/// Entry/exit parameters of a point moving by `d` across the slab `[min, max]`
fn slab_times(p: f32, d: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if d == 0.0 {
        // Not moving on this axis: must already be strictly inside the slab
        if p > min && p < max {
            Some((f32::NEG_INFINITY, f32::INFINITY))
        } else {
            None
        }
    } else {
        let t1 = (min - p) / d;
        let t2 = (max - p) / d;
        Some((t1.min(t2), t1.max(t2)))
    }
}

/// Swept AABB test of `mover` travelling by `motion` against a stationary `target`
///
/// The target is grown by the mover's size so the mover reduces to its
/// top-left point. A hit requires `entry <= exit` and `0 <= entry <= 1`.
/// Boxes already overlapping at the start report no hit.
pub fn swept_aabb(mover: &Aabb, motion: Vec2, target: &Aabb) -> Option<SweepHit> {
    let expanded = Aabb::new(target.min - mover.size(), target.max);
    let p = mover.min;

    let (tx_entry, tx_exit) = slab_times(p.x, motion.x, expanded.min.x, expanded.max.x)?;
    let (ty_entry, ty_exit) = slab_times(p.y, motion.y, expanded.min.y, expanded.max.y)?;

    let entry = tx_entry.max(ty_entry);
    let exit = tx_exit.min(ty_exit);

    if entry > exit || !(0.0..=1.0).contains(&entry) {
        return None;
    }

    // The later entry axis is the face that was struck
    let normal = if tx_entry > ty_entry {
        Vec2::new(-motion.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, -motion.y.signum())
    };

    Some(SweepHit { toi: entry, normal })
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::from_pos_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_is_colliding_strict() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(is_colliding(&a, &rect(5.0, 5.0, 10.0, 10.0)));
        assert!(!is_colliding(&a, &rect(10.0, 0.0, 10.0, 10.0)));
        assert!(!is_colliding(&a, &rect(0.0, 10.0, 10.0, 10.0)));
    }

    #[test]
    fn test_overlap_normal_points_into_me() {
        // Me slightly right of other, shallow on x
        let me = rect(8.0, 0.0, 10.0, 10.0);
        let other = rect(0.0, 0.0, 10.0, 10.0);
        let hit = overlap(&me, &other).unwrap();
        assert_eq!(hit.normal, Vec2::new(1.0, 0.0));
        assert!((hit.depth - 2.0).abs() < 1e-5);

        // Me above other, shallow on y
        let me = rect(0.0, -9.0, 10.0, 10.0);
        let hit = overlap(&me, &other).unwrap();
        assert_eq!(hit.normal, Vec2::new(0.0, -1.0));
        assert!((hit.depth - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_overlap_miss() {
        assert!(overlap(&rect(0.0, 0.0, 4.0, 4.0), &rect(4.0, 0.0, 4.0, 4.0)).is_none());
    }

    #[test]
    fn test_swept_thin_wall_tunneling_case() {
        // 4x4 mover covering 20 units in one frame past a 4-wide wall
        let mover = rect(0.0, 50.0, 4.0, 4.0);
        let wall = rect(10.0, 40.0, 4.0, 20.0);
        let motion = Vec2::new(1200.0, 0.0) * (1.0 / 60.0);

        // End-of-frame discrete test misses entirely
        assert!(!is_colliding(&mover.translated(motion), &wall));

        let hit = swept_aabb(&mover, motion, &wall).unwrap();
        assert!((hit.toi - 0.3).abs() < 1e-4);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));

        let x = mover.min.x + motion.x * hit.toi;
        assert!((x - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_swept_vertical_hit_normal() {
        // Falling onto a floor
        let mover = rect(10.0, 0.0, 4.0, 4.0);
        let floor = rect(0.0, 20.0, 40.0, 2.0);
        let hit = swept_aabb(&mover, Vec2::new(0.0, 32.0), &floor).unwrap();
        assert!((hit.toi - 0.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_swept_dominant_axis_picks_normal() {
        // Diagonal approach that reaches the target's left face last
        let mover = rect(0.0, 6.0, 4.0, 4.0);
        let target = rect(10.0, 0.0, 10.0, 10.0);
        let hit = swept_aabb(&mover, Vec2::new(12.0, 2.0), &target).unwrap();
        assert!((hit.toi - 0.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_swept_misses() {
        let mover = rect(0.0, 0.0, 4.0, 4.0);
        let target = rect(10.0, 0.0, 4.0, 4.0);
        // Too short
        assert!(swept_aabb(&mover, Vec2::new(5.0, 0.0), &target).is_none());
        // Moving away
        assert!(swept_aabb(&mover, Vec2::new(-20.0, 0.0), &target).is_none());
        // Passing beside it
        assert!(swept_aabb(&mover, Vec2::new(20.0, 0.0), &rect(10.0, 10.0, 4.0, 4.0)).is_none());
        // Sliding along a touching edge
        assert!(swept_aabb(&mover, Vec2::new(20.0, 0.0), &rect(10.0, 4.0, 4.0, 4.0)).is_none());
        // No motion at all
        assert!(swept_aabb(&mover, Vec2::ZERO, &target).is_none());
    }

    #[test]
    fn test_swept_declines_when_already_overlapping() {
        let mover = rect(0.0, 0.0, 4.0, 4.0);
        let target = rect(2.0, 0.0, 4.0, 4.0);
        assert!(swept_aabb(&mover, Vec2::new(3.0, 0.0), &target).is_none());
        assert!(is_colliding(&mover, &target));
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving right, hits vertical wall (normal pointing left)
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }
}

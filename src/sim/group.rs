//! Collision groups
//!
//! Each game defines a small closed enum of groups. A group names the
//! broad-phase bucket a body lives in; `collides_with` lists the buckets it
//! queries. `CollisionTable` keeps the group -> targets mapping in one place.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::entity::Body;

/// Marker for types usable as collision groups
///
/// Ordering keeps per-group iteration stable across runs.
pub trait CollisionTag: Copy + Eq + Ord + Hash + Debug {}

impl<T: Copy + Eq + Ord + Hash + Debug> CollisionTag for T {}

/// Explicit group -> allowed targets table
#[derive(Debug, Clone)]
pub struct CollisionTable<G: CollisionTag> {
    targets: BTreeMap<G, Vec<G>>,
}

impl<G: CollisionTag> Default for CollisionTable<G> {
    fn default() -> Self {
        Self {
            targets: BTreeMap::new(),
        }
    }
}

impl<G: CollisionTag> CollisionTable<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `group` query each of `targets` (duplicates ignored)
    pub fn allow(mut self, group: G, targets: impl IntoIterator<Item = G>) -> Self {
        let entry = self.targets.entry(group).or_default();
        for target in targets {
            if !entry.contains(&target) {
                entry.push(target);
            }
        }
        self
    }

    pub fn targets(&self, group: G) -> &[G] {
        self.targets.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn allows(&self, group: G, target: G) -> bool {
        self.targets(group).contains(&target)
    }

    /// Overwrite a body's `collides_with` from its group's row
    pub fn apply(&self, body: &mut Body<G>) {
        body.collides_with = self.targets(body.group).to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Tag {
        Ball,
        Brick,
        Wall,
    }

    #[test]
    fn test_table_lookup() {
        let table = CollisionTable::new()
            .allow(Tag::Ball, [Tag::Brick, Tag::Wall, Tag::Brick])
            .allow(Tag::Brick, []);
        assert_eq!(table.targets(Tag::Ball), &[Tag::Brick, Tag::Wall]);
        assert!(table.allows(Tag::Ball, Tag::Wall));
        assert!(!table.allows(Tag::Brick, Tag::Ball));
        assert!(table.targets(Tag::Wall).is_empty());
    }

    #[test]
    fn test_apply_sets_collides_with() {
        let table = CollisionTable::new().allow(Tag::Ball, [Tag::Wall]);
        let mut body = Body::new(Vec2::ZERO, Vec2::splat(4.0), Tag::Ball);
        table.apply(&mut body);
        assert_eq!(body.collides_with, vec![Tag::Wall]);
    }
}

//! Quad-tree broad phase
//!
//! Rebuilt from scratch every step, one tree per collision group. Items are
//! non-owning handles (arena indices in the step) stored next to the AABB
//! they were inserted with.
//!
//! An item that straddles child boundaries stays at the node where it
//! stopped fitting, so every item is stored exactly once and a query visits
//! it at most once.

use super::aabb::Aabb;

#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    boundary: Aabb,
    capacity: usize,
    level: u32,
    max_levels: u32,
    items: Vec<(T, Aabb)>,
    /// nw, ne, sw, se
    children: Option<Box<[QuadTree<T>; 4]>>,
}

impl<T: Copy> QuadTree<T> {
    pub fn new(boundary: Aabb, capacity: usize, max_levels: u32) -> Self {
        Self::with_level(boundary, capacity.max(1), 0, max_levels)
    }

    fn with_level(boundary: Aabb, capacity: usize, level: u32, max_levels: u32) -> Self {
        Self {
            boundary,
            capacity,
            level,
            max_levels,
            items: Vec::new(),
            children: None,
        }
    }

    /// Insert an item. Returns false if `aabb` misses this node entirely.
    pub fn insert(&mut self, item: T, aabb: Aabb) -> bool {
        if !self.boundary.intersects(&aabb) {
            return false;
        }

        if self.items.len() < self.capacity || self.level >= self.max_levels {
            self.items.push((item, aabb));
            return true;
        }

        if self.children.is_none() {
            self.subdivide();
        }

        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.boundary.contains(&aabb)) {
                return child.insert(item, aabb);
            }
        }

        // Straddles several quadrants (or pokes outside the boundary)
        self.items.push((item, aabb));
        true
    }

    fn subdivide(&mut self) {
        let level = self.level + 1;
        let [nw, ne, sw, se] = self.boundary.quadrants();
        let make = |b| QuadTree::with_level(b, self.capacity, level, self.max_levels);
        self.children = Some(Box::new([make(nw), make(ne), make(sw), make(se)]));
    }

    /// Append every item whose AABB intersects `range` to `out`
    pub fn query(&self, range: &Aabb, out: &mut Vec<T>) {
        if !self.boundary.intersects(range) {
            return;
        }

        out.extend(
            self.items
                .iter()
                .filter(|(_, aabb)| aabb.intersects(range))
                .map(|(item, _)| *item),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.boundary.intersects(range) {
                    child.query(range, out);
                }
            }
        }
    }

    /// Drop every item and collapse back to a single node
    pub fn clear(&mut self) {
        self.items.clear();
        self.children = None;
    }

    /// Number of stored items in this subtree
    pub fn len(&self) -> usize {
        self.items.len()
            + self
                .children
                .as_ref()
                .map(|c| c.iter().map(QuadTree::len).sum())
                .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map(|c| c.iter().map(QuadTree::node_count).sum())
            .unwrap_or(0)
    }

    /// Levels below this node that have been created
    pub fn depth(&self) -> u32 {
        self.children
            .as_ref()
            .map(|c| 1 + c.iter().map(QuadTree::depth).max().unwrap_or(0))
            .unwrap_or(0)
    }
}

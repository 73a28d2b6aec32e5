//! Per-frame physics step
//!
//! One call advances every active body by `dt`:
//! 1. logic hooks (`Behavior::update`)
//! 2. fresh quad-tree per collision group
//! 3. integration (optionally substepped) with broad and narrow phase
//! 4. compaction of bodies destroyed during the step
//!
//! Everything the step needs between phases is local to the call.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::{Aabb, Bounds};
use super::entity::{Body, Contact, ContactKind, Entity, EntityId};
use super::group::CollisionTag;
use super::narrowphase::{overlap, swept_aabb};
use super::quadtree::QuadTree;
use crate::settings::PhysicsSettings;

/// One fired pair, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Body being integrated when the pair was found
    pub a: EntityId,
    /// Candidate it hit
    pub b: EntityId,
    pub kind: ContactKind,
    pub toi: Option<f32>,
}

/// What a step did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub collisions: Vec<CollisionRecord>,
    /// Integration substeps executed across all bodies
    pub substeps: u32,
    /// Bodies compacted away at the end of the step
    pub removed: Vec<EntityId>,
    /// Bodies left out of the broad phase for lying outside the world
    pub dropped: usize,
}

impl StepReport {
    /// Fired pairs as unordered keys (smaller id first)
    pub fn pairs(&self) -> Vec<(EntityId, EntityId)> {
        self.collisions.iter().map(|c| pair_key(c.a, c.b)).collect()
    }

    pub fn fired(&self, a: EntityId, b: EntityId) -> bool {
        let key = pair_key(a, b);
        self.collisions.iter().any(|c| pair_key(c.a, c.b) == key)
    }
}

#[inline]
fn pair_key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Number of equal substeps `body` needs this frame
///
/// `ceil(max_span / (min_size * max_move_ratio))`, limited by `max_substeps` when set.
pub fn substep_count<G>(body: &Body<G>, dt: f32, max_substeps: Option<u32>) -> u32 {
    if !body.substep_enabled {
        return 1;
    }
    let displacement = body.vel * dt;
    let max_span = displacement.x.abs().max(displacement.y.abs());
    let limit = body.size.min_element() * body.max_move_ratio;
    if !(limit > 0.0) || max_span <= limit {
        return 1;
    }
    let steps = ((max_span / limit).ceil() as u32).max(1);
    match max_substeps {
        Some(cap) => steps.min(cap.max(1)),
        None => steps,
    }
}

/// Clamp a body into the world, zeroing velocity that points outward on a clamped axis
fn clamp_to_world<G>(body: &mut Body<G>, bounds: Bounds) {
    let max = (Vec2::new(bounds.width, bounds.height) - body.size).max(Vec2::ZERO);

    if body.pos.x < 0.0 {
        body.pos.x = 0.0;
        body.vel.x = body.vel.x.max(0.0);
    } else if body.pos.x > max.x {
        body.pos.x = max.x;
        body.vel.x = body.vel.x.min(0.0);
    }

    if body.pos.y < 0.0 {
        body.pos.y = 0.0;
        body.vel.y = body.vel.y.max(0.0);
    } else if body.pos.y > max.y {
        body.pos.y = max.y;
        body.vel.y = body.vel.y.min(0.0);
    }
}

/// Two distinct mutable elements of a slice
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// Fire `on_collision` on both participants, integrated body first
fn dispatch<G>(entities: &mut [Entity<G>], i: usize, j: usize, contact: &Contact) {
    let (a, b) = pair_mut(entities, i, j);
    a.behavior.on_collision(&mut a.body, &b.body, contact);
    b.behavior.on_collision(&mut b.body, &a.body, &contact.flipped());
}

/// Advance `entities` by one frame
///
/// A non-positive or non-finite `dt` skips logic, integration and collision;
/// bodies destroyed beforehand are still compacted.
pub fn step<G: CollisionTag>(
    entities: &mut Vec<Entity<G>>,
    dt: f32,
    bounds: Bounds,
    settings: &PhysicsSettings,
) -> StepReport {
    let mut ctx = StepContext {
        dt,
        bounds,
        settings,
        trees: BTreeMap::new(),
        checked: HashSet::new(),
        candidates: Vec::new(),
        report: StepReport::default(),
    };

    if dt.is_finite() && dt > 0.0 {
        ctx.run_logic(entities);
        ctx.build_broad_phase(entities);
        for i in 0..entities.len() {
            ctx.advance(entities, i);
        }
    } else {
        log::trace!("Skipping integration for dt={}", dt);
    }

    let mut report = ctx.report;
    report.removed = compact(entities);

    log::debug!(
        "Step dt={:.4}: {} bodies, {} collisions, {} substeps, {} removed",
        dt,
        entities.len(),
        report.collisions.len(),
        report.substeps,
        report.removed.len()
    );
    report
}

/// Drop inactive bodies, keeping the rest in order
fn compact<G>(entities: &mut Vec<Entity<G>>) -> Vec<EntityId> {
    let removed: Vec<EntityId> = entities
        .iter()
        .filter(|e| !e.body.active)
        .map(|e| e.body.id)
        .collect();
    if !removed.is_empty() {
        entities.retain(|e| e.body.active);
    }
    removed
}

/// Transient state for a single step
struct StepContext<'a, G> {
    dt: f32,
    bounds: Bounds,
    settings: &'a PhysicsSettings,
    /// Broad phase, one tree per group, storing arena indices
    trees: BTreeMap<G, QuadTree<usize>>,
    /// Unordered pairs that already fired this step
    checked: HashSet<(EntityId, EntityId)>,
    /// Reused query buffer
    candidates: Vec<usize>,
    report: StepReport,
}

impl<G: CollisionTag> StepContext<'_, G> {
    fn run_logic(&mut self, entities: &mut [Entity<G>]) {
        for entity in entities.iter_mut() {
            if !entity.body.active {
                continue;
            }
            let before = entity.body.pos;
            entity.behavior.update(&mut entity.body, self.dt);
            if self.settings.warn_on_logic_movement && entity.body.pos != before {
                log::warn!(
                    "Entity {} moved itself in update(); set velocity and let the step integrate",
                    entity.body.id
                );
            }
        }
    }

    fn build_broad_phase(&mut self, entities: &[Entity<G>]) {
        let root = self.bounds.as_aabb();
        for (idx, entity) in entities.iter().enumerate() {
            let body = &entity.body;
            if !body.takes_part_in_collision() {
                continue;
            }
            let tree = self.trees.entry(body.group).or_insert_with(|| {
                QuadTree::new(
                    root,
                    self.settings.quadtree_capacity,
                    self.settings.quadtree_max_levels,
                )
            });
            // Cover the whole frame's travel so movers are still found later in the step
            let binned = body.aabb().swept(body.vel * self.dt);
            if !tree.insert(idx, binned) {
                self.report.dropped += 1;
                log::trace!("Entity {} is outside the world, skipped this frame", body.id);
            }
        }
    }

    /// Integrate body `i` through its substeps, colliding after each
    fn advance(&mut self, entities: &mut [Entity<G>], i: usize) {
        if !entities[i].body.active {
            return;
        }
        let steps = substep_count(&entities[i].body, self.dt, self.settings.max_substeps);
        let sub_dt = self.dt / steps as f32;

        for _ in 0..steps {
            let body = &mut entities[i].body;
            if !body.active {
                break;
            }
            self.report.substeps += 1;

            let start = body.pos;
            body.pos += body.vel * sub_dt;
            if body.stay_in_world {
                clamp_to_world(body, self.bounds);
            }

            if body.takes_part_in_collision() && !body.collides_with.is_empty() {
                self.collide(entities, i, start, sub_dt);
            }
        }
    }

    /// Broad + narrow phase for body `i`, which moved from `start` this substep
    fn collide(&mut self, entities: &mut [Entity<G>], i: usize, start: Vec2, sub_dt: f32) {
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();

        {
            let body = &entities[i].body;
            let here = body.aabb();
            let range = if body.use_ccd {
                here.union(&Aabb::from_pos_size(start, body.size))
            } else {
                here
            }
            .padded(self.settings.query_padding);

            for group in &body.collides_with {
                if let Some(tree) = self.trees.get(group) {
                    tree.query(&range, &mut candidates);
                }
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        let mut swept = false;
        for &j in &candidates {
            if j == i {
                continue;
            }
            if !entities[i].body.active {
                break;
            }
            if !entities[j].body.takes_part_in_collision() {
                continue;
            }
            if !entities[i].accepts(&entities[j]) {
                continue;
            }
            let key = pair_key(entities[i].body.id, entities[j].body.id);
            if self.checked.contains(&key) {
                continue;
            }

            // The first use_ccd side met is the mover. A candidate mover has no
            // motion during this body's turn (it sweeps on its own), so only
            // an integrated mover can produce a swept hit here.
            let sweep = if !swept && entities[i].body.use_ccd {
                let from = Aabb::from_pos_size(start, entities[i].body.size);
                let motion = entities[i].body.pos - start;
                swept_aabb(&from, motion, &entities[j].body.aabb()).map(|hit| (hit, motion))
            } else {
                None
            };

            let contact = if let Some((hit, motion)) = sweep {
                let body = &mut entities[i].body;
                body.pos = start + motion * hit.toi + hit.normal * self.settings.ccd_epsilon;
                Contact {
                    kind: ContactKind::Swept,
                    normal: hit.normal,
                    toi: Some(hit.toi),
                    depth: 0.0,
                }
            } else if let Some(ov) = overlap(&entities[i].body.aabb(), &entities[j].body.aabb()) {
                Contact {
                    kind: ContactKind::Overlap,
                    normal: ov.normal,
                    toi: None,
                    depth: ov.depth,
                }
            } else {
                continue;
            };

            self.checked.insert(key);
            self.report.collisions.push(CollisionRecord {
                a: entities[i].body.id,
                b: entities[j].body.id,
                kind: contact.kind,
                toi: contact.toi,
            });
            log::trace!(
                "{:?} hit {} -> {} normal=({:.2},{:.2})",
                contact.kind,
                entities[i].body.id,
                entities[j].body.id,
                contact.normal.x,
                contact.normal.y
            );

            dispatch(entities, i, j, &contact);

            if let Some(toi) = contact.toi {
                // Finish the substep with whatever velocity the callbacks left
                let body = &mut entities[i].body;
                body.pos += body.vel * sub_dt * (1.0 - toi);
                if body.stay_in_world {
                    clamp_to_world(body, self.bounds);
                }
                swept = true;
            }
        }

        self.candidates = candidates;
    }
}

//! Entity arena
//!
//! Dense `Vec` of entities kept in id order, plus a sparse id -> slot index
//! rebuilt whenever a step compacts destroyed entities away.

use std::collections::HashMap;

use super::aabb::Bounds;
use super::entity::{Behavior, Body, Entity, EntityId};
use super::group::CollisionTag;
use super::step::{StepReport, step};
use crate::error::{PhysicsError, Result};
use crate::settings::PhysicsSettings;

pub struct World<G: CollisionTag> {
    bounds: Bounds,
    settings: PhysicsSettings,
    entities: Vec<Entity<G>>,
    index: HashMap<EntityId, usize>,
    /// Last id handed out; ids start at 1 and only grow
    next_id: u64,
}

impl<G: CollisionTag> World<G> {
    pub fn new(bounds: Bounds, settings: PhysicsSettings) -> Result<Self> {
        check_bounds(bounds)?;
        settings.validate()?;
        Ok(Self {
            bounds,
            settings,
            entities: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        })
    }

    /// Register a body. Degenerate sizes are rejected here so the step
    /// never has to special-case them.
    pub fn spawn(
        &mut self,
        mut body: Body<G>,
        behavior: impl Behavior<G> + 'static,
    ) -> Result<EntityId> {
        let size = body.size;
        if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
            return Err(PhysicsError::InvalidSize {
                width: size.x,
                height: size.y,
            });
        }
        if !body.max_move_ratio.is_finite() || body.max_move_ratio <= 0.0 {
            return Err(PhysicsError::InvalidMoveRatio(body.max_move_ratio));
        }

        self.next_id += 1;
        let id = EntityId(self.next_id);
        body.id = id;
        log::trace!("Spawned {} in group {:?}", id, body.group);

        self.index.insert(id, self.entities.len());
        self.entities.push(Entity::new(body, behavior));
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Body<G>> {
        self.index.get(&id).map(|&slot| &self.entities[slot].body)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Body<G>> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.entities[slot].body)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Soft delete; the entity is removed at the end of the next step
    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        let body = self.get_mut(id).ok_or(PhysicsError::UnknownEntity(id))?;
        body.destroy();
        Ok(())
    }

    /// Registered bodies in id order, including ones pending removal
    pub fn bodies(&self) -> impl Iterator<Item = &Body<G>> {
        self.entities.iter().map(|e| &e.body)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<()> {
        check_bounds(bounds)?;
        self.bounds = bounds;
        Ok(())
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PhysicsSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Advance the world by `dt`
    pub fn step(&mut self, dt: f32) -> StepReport {
        let report = step(&mut self.entities, dt, self.bounds, &self.settings);
        if !report.removed.is_empty() {
            self.reindex();
        }
        report
    }

    fn reindex(&mut self) {
        self.index.clear();
        self.index
            .extend(self.entities.iter().enumerate().map(|(slot, e)| (e.id(), slot)));
    }
}

fn check_bounds(bounds: Bounds) -> Result<()> {
    if bounds.is_valid() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidBounds {
            width: bounds.width,
            height: bounds.height,
        })
    }
}

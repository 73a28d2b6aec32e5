//! Breakout on top of the physics core
//!
//! A small collaborator showing how games plug in: a closed tag enum, a
//! collision table, behaviors per object type, and a shared score handle
//! captured by the behaviors instead of living inside the engine.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::{
    Behavior, Body, Bounds, CollisionTable, Contact, EntityId, Inert, World, reflect_velocity,
};

/// Arena dimensions
pub const ARENA_WIDTH: f32 = 480.0;
pub const ARENA_HEIGHT: f32 = 360.0;
pub const WALL_THICKNESS: f32 = 8.0;

/// Ball defaults
pub const BALL_SIZE: f32 = 8.0;
pub const BALL_SPEED: f32 = 240.0;

/// Paddle defaults
pub const PADDLE_WIDTH: f32 = 64.0;
pub const PADDLE_HEIGHT: f32 = 8.0;
pub const PADDLE_SPEED: f32 = 360.0;
/// How far an off-centre paddle hit bends the bounce (0 = pure reflection)
pub const PADDLE_DEFLECTION: f32 = 0.75;

/// Brick layout
pub const BRICK_WIDTH: f32 = 40.0;
pub const BRICK_HEIGHT: f32 = 12.0;
pub const BRICK_GAP: f32 = 4.0;
pub const BRICK_TOP: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BreakoutTag {
    Ball,
    Paddle,
    Brick,
    Wall,
}

/// Who queries whom
pub fn collision_table() -> CollisionTable<BreakoutTag> {
    use BreakoutTag::*;
    CollisionTable::new()
        .allow(Ball, [Paddle, Brick, Wall])
        .allow(Paddle, [])
        .allow(Brick, [])
        .allow(Wall, [])
}

/// Running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub points: u64,
    pub bricks_broken: u32,
    pub paddle_hits: u32,
    pub balls_lost: u32,
}

/// Shared handle to the score, cloned into every behavior that scores
#[derive(Debug, Clone, Default)]
pub struct Score(Rc<RefCell<ScoreBoard>>);

impl Score {
    pub fn snapshot(&self) -> ScoreBoard {
        *self.0.borrow()
    }

    fn brick_broken(&self, points: u64) {
        let mut board = self.0.borrow_mut();
        board.points += points;
        board.bricks_broken += 1;
    }

    fn paddle_hit(&self) {
        self.0.borrow_mut().paddle_hits += 1;
    }

    fn ball_lost(&self) {
        self.0.borrow_mut().balls_lost += 1;
    }
}

/// Paddle target x, written by whatever drives input
#[derive(Debug, Clone, Default)]
pub struct PaddleInput(Rc<RefCell<Option<f32>>>);

impl PaddleInput {
    pub fn aim(&self, x: f32) {
        *self.0.borrow_mut() = Some(x);
    }

    pub fn release(&self) {
        *self.0.borrow_mut() = None;
    }

    fn target(&self) -> Option<f32> {
        *self.0.borrow()
    }
}

/// Bounces off everything; lost when it falls past `floor`
pub struct Ball {
    pub floor: f32,
    pub score: Score,
}

impl Behavior<BreakoutTag> for Ball {
    fn update(&mut self, body: &mut Body<BreakoutTag>, _dt: f32) {
        if body.pos.y > self.floor {
            log::info!("Ball {} lost", body.id());
            self.score.ball_lost();
            body.destroy();
        }
    }

    fn on_collision(
        &mut self,
        body: &mut Body<BreakoutTag>,
        other: &Body<BreakoutTag>,
        contact: &Contact,
    ) {
        if other.group == BreakoutTag::Paddle && contact.normal.y < 0.0 {
            // Normalize hit position: 0 = center, -1/+1 = edges
            let half = other.size.x * 0.5;
            let offset = ((body.center().x - other.center().x) / half).clamp(-1.0, 1.0);
            let speed = body.vel.length();
            body.vel = Vec2::new(offset * PADDLE_DEFLECTION, -1.0).normalize() * speed;
            self.score.paddle_hit();
            return;
        }

        // Only reflect while still heading into the surface, so several
        // simultaneous hits along one axis flip it once
        if body.vel.dot(contact.normal) < 0.0 {
            body.vel = reflect_velocity(body.vel, contact.normal);
        }
    }
}

pub struct Brick {
    pub hp: u8,
    pub points: u64,
    pub score: Score,
}

impl Behavior<BreakoutTag> for Brick {
    fn on_collision(
        &mut self,
        body: &mut Body<BreakoutTag>,
        _other: &Body<BreakoutTag>,
        _contact: &Contact,
    ) {
        self.hp = self.hp.saturating_sub(1);
        if self.hp == 0 {
            self.score.brick_broken(self.points);
            body.destroy();
        }
    }
}

/// Chases the input target horizontally
pub struct Paddle {
    pub input: PaddleInput,
    pub speed: f32,
}

impl Behavior<BreakoutTag> for Paddle {
    fn update(&mut self, body: &mut Body<BreakoutTag>, _dt: f32) {
        body.vel.x = match self.input.target() {
            Some(target) => ((target - body.center().x) * 10.0).clamp(-self.speed, self.speed),
            None => 0.0,
        };
    }
}

/// Handles to a freshly built level
#[derive(Debug, Clone)]
pub struct Scene {
    pub ball: EntityId,
    pub paddle: EntityId,
    pub bricks: Vec<EntityId>,
    pub score: Score,
    pub input: PaddleInput,
}

/// Empty arena with the default bounds
pub fn new_world(settings: crate::PhysicsSettings) -> Result<World<BreakoutTag>> {
    World::new(Bounds::new(ARENA_WIDTH, ARENA_HEIGHT), settings)
}

/// Populate `world` with walls, a paddle, one ball and a `rows` x `cols` brick wall
pub fn build_scene<R: Rng>(
    world: &mut World<BreakoutTag>,
    rng: &mut R,
    rows: u32,
    cols: u32,
) -> Result<Scene> {
    let table = collision_table();
    let bounds = world.bounds();
    let score = Score::default();
    let input = PaddleInput::default();

    // Walls: left, right, top. The bottom stays open.
    let walls = [
        (Vec2::ZERO, Vec2::new(WALL_THICKNESS, bounds.height)),
        (
            Vec2::new(bounds.width - WALL_THICKNESS, 0.0),
            Vec2::new(WALL_THICKNESS, bounds.height),
        ),
        (Vec2::ZERO, Vec2::new(bounds.width, WALL_THICKNESS)),
    ];
    for (pos, size) in walls {
        let body = Body::new(pos, size, BreakoutTag::Wall).as_static();
        add(world, &table, body, Inert)?;
    }

    let paddle_body = Body::new(
        Vec2::new(
            (bounds.width - PADDLE_WIDTH) * 0.5,
            bounds.height - 3.0 * PADDLE_HEIGHT,
        ),
        Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
        BreakoutTag::Paddle,
    )
    .staying_in_world();
    let paddle = add(
        world,
        &table,
        paddle_body,
        Paddle {
            input: input.clone(),
            speed: PADDLE_SPEED,
        },
    )?;

    let mut bricks = Vec::new();
    let row_width = cols as f32 * (BRICK_WIDTH + BRICK_GAP) - BRICK_GAP;
    let left = (bounds.width - row_width) * 0.5;
    for row in 0..rows {
        for col in 0..cols {
            let pos = Vec2::new(
                left + col as f32 * (BRICK_WIDTH + BRICK_GAP),
                BRICK_TOP + row as f32 * (BRICK_HEIGHT + BRICK_GAP),
            );
            let hp: u8 = rng.random_range(1..=3);
            let brick = Brick {
                hp,
                points: 10 * hp as u64,
                score: score.clone(),
            };
            let body = Body::new(pos, Vec2::new(BRICK_WIDTH, BRICK_HEIGHT), BreakoutTag::Brick)
                .as_static();
            bricks.push(add(world, &table, body, brick)?);
        }
    }

    // Launch upward within 30 degrees of vertical
    let angle = rng.random_range(-30.0f32..30.0).to_radians();
    let vel = Vec2::new(angle.sin(), -angle.cos()) * BALL_SPEED;
    let ball_body = Body::new(
        Vec2::new((bounds.width - BALL_SIZE) * 0.5, bounds.height - 6.0 * PADDLE_HEIGHT),
        Vec2::splat(BALL_SIZE),
        BreakoutTag::Ball,
    )
    .with_velocity(vel)
    .with_ccd()
    .with_substeps(0.5);
    let ball_behavior = Ball {
        floor: bounds.height,
        score: score.clone(),
    };
    let ball = add(world, &table, ball_body, ball_behavior)?;

    log::info!(
        "Built scene: {} bricks, ball {} launched at ({:.1}, {:.1})",
        bricks.len(),
        ball,
        vel.x,
        vel.y
    );

    Ok(Scene {
        ball,
        paddle,
        bricks,
        score,
        input,
    })
}

/// Register `body` with its `collides_with` taken from the table
fn add(
    world: &mut World<BreakoutTag>,
    table: &CollisionTable<BreakoutTag>,
    mut body: Body<BreakoutTag>,
    behavior: impl Behavior<BreakoutTag> + 'static,
) -> Result<EntityId> {
    table.apply(&mut body);
    world.spawn(body, behavior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhysicsSettings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn ball_body(pos: Vec2, vel: Vec2) -> Body<BreakoutTag> {
        let mut body = Body::new(pos, Vec2::splat(BALL_SIZE), BreakoutTag::Ball).with_velocity(vel);
        collision_table().apply(&mut body);
        body
    }

    fn brick_body(x: f32, y: f32) -> Body<BreakoutTag> {
        Body::new(Vec2::new(x, y), Vec2::new(BRICK_WIDTH, 10.0), BreakoutTag::Brick)
    }

    #[test]
    fn test_build_scene_counts() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let scene = build_scene(&mut world, &mut rng, 3, 8).unwrap();

        assert_eq!(scene.bricks.len(), 24);
        // 3 walls + paddle + ball + bricks
        assert_eq!(world.len(), 3 + 1 + 1 + 24);
        let ball = world.get(scene.ball).unwrap();
        assert!(ball.use_ccd && ball.substep_enabled);
        assert!(ball.vel.y < 0.0);
        assert_eq!(
            ball.collides_with,
            vec![BreakoutTag::Paddle, BreakoutTag::Brick, BreakoutTag::Wall]
        );
    }

    #[test]
    fn test_simultaneous_brick_hits_flip_once() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let score = Score::default();
        let ball = world
            .spawn(
                ball_body(Vec2::new(136.0, 112.0), Vec2::new(0.0, -240.0)),
                Ball {
                    floor: ARENA_HEIGHT,
                    score: score.clone(),
                },
            )
            .unwrap();
        for x in [100.0, 140.0] {
            world
                .spawn(
                    brick_body(x, 100.0),
                    Brick {
                        hp: 1,
                        points: 10,
                        score: score.clone(),
                    },
                )
                .unwrap();
        }

        let report = world.step(DT);

        assert_eq!(report.collisions.len(), 2);
        assert_eq!(report.removed.len(), 2);
        assert_eq!(score.snapshot().bricks_broken, 2);
        assert_eq!(score.snapshot().points, 20);
        // Both normals pointed down; the ball reflected exactly once
        assert_eq!(world.get(ball).unwrap().vel, Vec2::new(0.0, 240.0));
    }

    #[test]
    fn test_armored_brick_survives_first_hit() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let score = Score::default();
        world
            .spawn(
                ball_body(Vec2::new(110.0, 112.0), Vec2::new(0.0, -240.0)).with_ccd(),
                Ball {
                    floor: ARENA_HEIGHT,
                    score: score.clone(),
                },
            )
            .unwrap();
        let brick = world
            .spawn(
                brick_body(100.0, 100.0),
                Brick {
                    hp: 2,
                    points: 20,
                    score: score.clone(),
                },
            )
            .unwrap();

        let report = world.step(DT);
        assert_eq!(report.collisions.len(), 1);
        assert!(world.contains(brick));
        assert_eq!(score.snapshot().bricks_broken, 0);
    }

    #[test]
    fn test_paddle_edge_hit_deflects() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let score = Score::default();
        let paddle = world
            .spawn(
                Body::new(
                    Vec2::new(200.0, 300.0),
                    Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
                    BreakoutTag::Paddle,
                ),
                Paddle {
                    input: PaddleInput::default(),
                    speed: PADDLE_SPEED,
                },
            )
            .unwrap();
        // Falling onto the right half of the paddle
        let ball = world
            .spawn(
                ball_body(Vec2::new(250.0, 290.0), Vec2::new(0.0, 240.0)).with_ccd(),
                Ball {
                    floor: ARENA_HEIGHT,
                    score: score.clone(),
                },
            )
            .unwrap();

        let report = world.step(DT);
        assert!(report.fired(ball, paddle));

        let vel = world.get(ball).unwrap().vel;
        assert!(vel.y < 0.0);
        assert!(vel.x > 0.0);
        assert!((vel.length() - 240.0).abs() < 1e-2);
        assert_eq!(score.snapshot().paddle_hits, 1);
    }

    #[test]
    fn test_paddle_follows_input_and_stays_in_world() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let input = PaddleInput::default();
        let paddle = world
            .spawn(
                Body::new(
                    Vec2::new(400.0, 300.0),
                    Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
                    BreakoutTag::Paddle,
                )
                .staying_in_world(),
                Paddle {
                    input: input.clone(),
                    speed: PADDLE_SPEED,
                },
            )
            .unwrap();

        input.aim(10_000.0);
        for _ in 0..60 {
            world.step(DT);
        }
        let body = world.get(paddle).unwrap();
        assert_eq!(body.pos.x, ARENA_WIDTH - PADDLE_WIDTH);

        input.release();
        world.step(DT);
        assert_eq!(world.get(paddle).unwrap().vel.x, 0.0);
    }

    #[test]
    fn test_ball_lost_below_floor() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let score = Score::default();
        let ball = world
            .spawn(
                ball_body(Vec2::new(100.0, ARENA_HEIGHT + 1.0), Vec2::new(0.0, 100.0)),
                Ball {
                    floor: ARENA_HEIGHT,
                    score: score.clone(),
                },
            )
            .unwrap();

        let report = world.step(DT);
        assert_eq!(report.removed, vec![ball]);
        assert_eq!(score.snapshot().balls_lost, 1);
    }

    #[test]
    fn test_ball_never_escapes_walls() {
        let mut world = new_world(PhysicsSettings::default()).unwrap();
        let mut rng = Pcg32::seed_from_u64(42);
        let scene = build_scene(&mut world, &mut rng, 2, 6).unwrap();

        for _ in 0..600 {
            if let Some(ball) = world.get(scene.ball) {
                scene.input.aim(ball.center().x);
            }
            world.step(DT);
            if let Some(ball) = world.get(scene.ball) {
                assert!(ball.pos.x >= 0.0 && ball.pos.x + ball.size.x <= ARENA_WIDTH);
                assert!(ball.pos.y >= 0.0);
            }
        }
        assert!(score_moved(&scene.score));
    }

    fn score_moved(score: &Score) -> bool {
        let board = score.snapshot();
        board.paddle_hits > 0 || board.bricks_broken > 0
    }
}

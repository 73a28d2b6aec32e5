//! Headless Breakout run
//!
//! Usage: `arcade-physics [SEED] [fast|balanced|precise]`
//!
//! Plays one ball with an autopilot paddle until the bricks are gone, the
//! ball is lost, or the time limit runs out, then prints the score as JSON.

use arcade_physics::breakout::{self, BreakoutTag};
use arcade_physics::{PhysicsSettings, PrecisionPreset, World};
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Fixed simulation timestep (seconds)
const SIM_DT: f32 = 1.0 / 60.0;
/// Two minutes of play at most
const MAX_FRAMES: u32 = 120 * 60;

#[derive(Parser, Debug)]
#[command(name = "arcade-physics", about = "Headless Breakout run on the arcade physics core")]
struct Cli {
    /// Seed for brick toughness and launch angle
    #[arg(default_value_t = 12345)]
    seed: u64,

    /// Precision preset: fast, balanced or precise
    #[arg(default_value = "balanced", value_parser = parse_preset)]
    preset: PrecisionPreset,
}

fn parse_preset(s: &str) -> Result<PrecisionPreset, String> {
    PrecisionPreset::from_str(s)
        .ok_or_else(|| format!("unknown preset '{s}' (expected fast, balanced or precise)"))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    log::info!(
        "Arcade physics demo starting (seed {}, preset {})",
        cli.seed,
        cli.preset.as_str()
    );

    if let Err(e) = run(cli.seed, cli.preset) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run(seed: u64, preset: PrecisionPreset) -> arcade_physics::Result<()> {
    let mut world: World<BreakoutTag> =
        breakout::new_world(PhysicsSettings::from_preset(preset))?;
    let mut rng = Pcg32::seed_from_u64(seed);
    let scene = breakout::build_scene(&mut world, &mut rng, 4, 9)?;

    let mut collisions = 0usize;
    let mut frames = 0u32;
    while frames < MAX_FRAMES {
        let Some(ball) = world.get(scene.ball) else {
            break;
        };
        scene.input.aim(ball.center().x);

        let report = world.step(SIM_DT);
        collisions += report.collisions.len();
        frames += 1;

        if scene.bricks.iter().all(|id| !world.contains(*id)) {
            log::info!("All bricks cleared after {} frames", frames);
            break;
        }
    }

    let board = scene.score.snapshot();
    log::info!(
        "Finished after {} frames: {} collisions, {} bricks, {} points",
        frames,
        collisions,
        board.bricks_broken,
        board.points
    );
    println!("{}", serde_json::to_string_pretty(&board)?);
    Ok(())
}

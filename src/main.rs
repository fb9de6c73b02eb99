//! Tunnel Runner headless entry point
//!
//! Runs the simulation with the autopilot steering and logs what happens.
//! Usage: `tunnel-runner [settings.json] [seconds]`

use tunnel_runner::Settings;
use tunnel_runner::sim::{GameEvent, GamePhase, RunState, TickInput, tick};

/// Simulated frame rate of the headless loop
const FRAME_DT: f64 = 1.0 / 60.0;
const DEFAULT_SECONDS: f64 = 60.0;

fn main() {
    env_logger::init();
    log::info!("Tunnel Runner (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SECONDS);

    let mut state = RunState::new(settings);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let frames = (seconds / FRAME_DT).ceil() as u64;
    for _ in 0..frames {
        for event in tick(&mut state, &input, FRAME_DT) {
            match event {
                GameEvent::BarrierPassed { id } => log::debug!("whoosh: {:?}", id),
                GameEvent::PickupsCollected { count } => {
                    log::debug!("+{} coin(s), score {}", count, state.score)
                }
                GameEvent::Crashed { barrier } => log::info!("crashed into {:?}", barrier),
            }
        }
        if state.phase == GamePhase::GameOver {
            break;
        }
    }

    println!(
        "{} after {:.1}s: distance {:.1}, barriers passed {}, coins {}, score {}",
        match state.phase {
            GamePhase::Running => "Survived",
            GamePhase::GameOver => "Crashed",
        },
        state.elapsed,
        state.distance,
        state.barriers_passed,
        state.pickups_collected,
        state.score
    );
}

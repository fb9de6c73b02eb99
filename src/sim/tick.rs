//! Per-frame simulation tick
//!
//! Drives one run: clamps the frame time, scrolls the chain, then asks the
//! collision engine about coins and crashes, strictly in that order.

use glam::DVec2;

use super::chain::ChainEvent;
use super::state::{GameEvent, GamePhase, RunState};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Where the player is steering (tunnel cross-section coordinates)
    pub target: Option<DVec2>,
    /// Idle/demo mode - autopilot steers for the next hole
    pub idle_mode: bool,
    /// Start a fresh run before simulating
    pub restart: bool,
}

/// Clamp a wall-clock frame delta to `[0, max_dt]`, so a stall never turns
/// into one giant simulation step
#[inline]
pub fn clamp_dt(dt: f64, max_dt: f64) -> f64 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, max_dt.max(0.0))
}

/// Advance the run by one frame and report what happened
pub fn tick(state: &mut RunState, input: &TickInput, dt: f64) -> Vec<GameEvent> {
    if input.restart {
        state.restart();
    }

    // Nothing moves once the run is over
    if state.phase == GamePhase::GameOver {
        return Vec::new();
    }

    let dt = clamp_dt(dt, state.settings.max_dt);
    state.time_ticks += 1;
    state.elapsed += dt;
    state.colors.advance(dt);
    let world_speed = state.world_speed();

    // Steering
    let target = if input.idle_mode {
        autopilot_target(state)
    } else {
        input.target
    };
    if let Some(target) = target {
        let bound = state.chain.config().outer_radius;
        state
            .player
            .move_toward(target, dt, state.settings.player_speed, bound);
    }

    let mut events = Vec::new();

    // Chain first: positions are final for this tick after this call
    for event in state.chain.update(world_speed, dt, &state.colors) {
        match event {
            ChainEvent::BarrierPassed { id } => {
                state.barriers_passed += 1;
                events.push(GameEvent::BarrierPassed { id });
            }
        }
    }
    state.distance += world_speed * dt;

    // Coins
    let (barriers, pickups) = state.chain.live_mut();
    let collected = state
        .collision
        .collect_pickups(pickups, barriers, &state.player);
    if collected > 0 {
        state.pickups_collected += collected;
        let award = (collected as u64).saturating_mul(state.settings.score_per_pickup);
        state.score = state.score.saturating_add(award);
        events.push(GameEvent::PickupsCollected { count: collected });
    }

    // Crashes
    if let Some(barrier) = state
        .collision
        .first_obstacle_hit(state.chain.barriers(), &state.player)
    {
        state.phase = GamePhase::GameOver;
        events.push(GameEvent::Crashed { barrier });
        log::info!(
            "Run over: hit {:?} after {:.1}s, distance {:.1}, score {}",
            barrier,
            state.elapsed,
            state.distance,
            state.score
        );
    }

    events
}

/// Center of the hole the autopilot should aim for
///
/// Picks the nearest barrier that has not reached the player plane yet and,
/// of its holes, the one whose current world position is closest.
pub fn autopilot_target(state: &RunState) -> Option<DVec2> {
    let player = state.player.pos;
    state
        .chain
        .barriers()
        .iter()
        .filter(|b| !b.passed)
        .max_by(|a, b| a.z.total_cmp(&b.z))
        .and_then(|barrier| {
            barrier
                .holes
                .iter()
                .map(|hole| crate::rotate(hole.center(), barrier.angle))
                .min_by(|a, b| a.distance(player).total_cmp(&b.distance(player)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::holes::{FracRange, HoleGenConfig};

    const DT: f64 = 1.0 / 60.0;

    /// Every barrier gets a single centered hole leaving a ring of `width`
    fn ring_settings(width: f64) -> Settings {
        let mut settings = Settings::default();
        settings.chain.holes = HoleGenConfig {
            twin_chance: 0.0,
            ring_chance: 1.0,
            ring_width: FracRange::new(width, width),
            ..Default::default()
        };
        settings
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(1.0, 0.05), 0.05);
        assert_eq!(clamp_dt(0.01, 0.05), 0.01);
        assert_eq!(clamp_dt(-1.0, 0.05), 0.0);
        assert_eq!(clamp_dt(f64::NAN, 0.05), 0.0);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut state = RunState::new(Settings::default());
        tick(&mut state, &TickInput::default(), 3.0);
        assert!((state.elapsed - state.settings.max_dt).abs() < 1e-12);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_centered_player_flies_through_rings() {
        let mut state = RunState::new(ring_settings(0.3));
        let mut passed = 0;
        let mut coins = 0;
        for _ in 0..(6.0 / DT) as usize {
            for event in tick(&mut state, &TickInput::default(), DT) {
                match event {
                    GameEvent::BarrierPassed { .. } => passed += 1,
                    GameEvent::PickupsCollected { count } => coins += count,
                    GameEvent::Crashed { barrier } => panic!("crashed into {:?}", barrier),
                }
            }
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert!(passed > 0);
        assert_eq!(passed, state.barriers_passed);
        // One coin sits dead center in every ring
        assert!(coins > 0);
        assert_eq!(state.score, coins as u64 * state.settings.score_per_pickup);
        assert!(state.distance > 0.0);
    }

    #[test]
    fn test_score_saturates_instead_of_overflowing() {
        let mut settings = ring_settings(0.3);
        settings.score_per_pickup = u64::MAX;
        let mut state = RunState::new(settings);
        for _ in 0..(10.0 / DT) as usize {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(state.pickups_collected > 1);
        assert_eq!(state.score, u64::MAX);
    }

    #[test]
    fn test_player_in_solid_disc_crashes() {
        let mut state = RunState::new(ring_settings(0.9));
        let input = TickInput {
            target: Some(DVec2::new(4.0, 0.0)),
            ..Default::default()
        };

        let mut crashed = None;
        for _ in 0..(6.0 / DT) as usize {
            let events = tick(&mut state, &input, DT);
            if let Some(GameEvent::Crashed { barrier }) = events
                .iter()
                .find(|e| matches!(e, GameEvent::Crashed { .. }))
            {
                crashed = Some(*barrier);
                break;
            }
        }
        assert!(crashed.is_some());
        assert_eq!(state.phase, GamePhase::GameOver);

        // Frozen until restart
        let ticks = state.time_ticks;
        assert!(tick(&mut state, &input, DT).is_empty());
        assert_eq!(state.time_ticks, ticks);

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut state, &restart, DT);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_autopilot_targets_nearest_hole() {
        let state = RunState::new(Settings::default());
        let target = autopilot_target(&state).expect("chain is prefilled");
        let nearest = state
            .chain
            .barriers()
            .iter()
            .filter(|b| !b.passed)
            .max_by(|a, b| a.z.total_cmp(&b.z))
            .expect("chain is prefilled");
        let local = nearest.to_local(target);
        assert!(nearest.holes.iter().any(|h| h.center().distance(local) < 1e-9));
    }

    #[test]
    fn test_world_speed_ramps_to_cap() {
        let mut state = RunState::new(Settings::default());
        let start = state.world_speed();
        state.elapsed = 1.0e6;
        assert!(state.world_speed() > start);
        assert_eq!(state.world_speed(), state.settings.speed.max);
    }

    #[test]
    fn test_determinism() {
        let mut a = RunState::new(Settings::default());
        let mut b = RunState::new(Settings::default());
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            let ea = tick(&mut a, &input, DT);
            let eb = tick(&mut b, &input, DT);
            assert_eq!(ea, eb);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.phase, b.phase);
    }
}

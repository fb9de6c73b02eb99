//! Tunnel Runner - simulation core for an endless disc-barrier runner
//!
//! Core modules:
//! - `sim`: Barrier chain, hole generation, collisions and the run driver
//! - `theme`: Color cycle the chain tags new barriers with
//! - `settings`: Data-driven tuning, loadable from JSON

pub mod settings;
pub mod sim;
pub mod theme;

pub use settings::Settings;
pub use theme::{ColorCycle, ThemeSource, ThemeToken};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Largest tick the driver will simulate (1/20 s); longer frames are clamped
    pub const MAX_DT: f64 = 1.0 / 20.0;

    /// Barrier disc defaults (world units)
    pub const BARRIER_OUTER_RADIUS: f64 = 8.0;
    pub const BARRIER_DEPTH: f64 = 0.6;
    /// Minimum empty space between the faces of two neighbouring barriers
    pub const BARRIER_SURFACE_GAP: f64 = 0.5;
    /// Slack added on top of depth + surface gap when clamping spacing
    pub const SPACING_EPSILON: f64 = 1e-3;

    /// Chain defaults
    pub const CHAIN_SPACING_Z: f64 = 14.0;
    pub const CHAIN_PREFILL: u32 = 8;
    /// Hard cap on live barriers, keeps a tick inside its budget
    pub const MAX_PREFILL: u32 = 64;
    pub const CHAIN_START_Z: f64 = -30.0;
    pub const CHAIN_DESPAWN_Z: f64 = 8.0;
    /// Upper bound on barrier spacing; keeps a full chain's z values finite
    pub const MAX_CHAIN_SPACING: f64 = 1.0e4;
    /// Largest |start_z| / |despawn_z| accepted from config
    pub const MAX_CHAIN_Z: f64 = 1.0e6;
    /// Initial spin rates are drawn from [-MAX_SPIN_RATE, MAX_SPIN_RATE] rad/s
    pub const MAX_SPIN_RATE: f64 = 0.9;

    /// Player defaults
    pub const PLAYER_RADIUS: f64 = 0.35;
    /// Planar steering speed (units/s)
    pub const PLAYER_SPEED: f64 = 14.0;

    /// Pickup ("coin") defaults
    pub const PICKUP_RADIUS: f64 = 0.5;
    /// Cosmetic coin spin (rad/s)
    pub const PICKUP_SPIN_RATE: f64 = 3.0;

    /// Collision forgiveness defaults
    pub const RADIUS_SHRINK: f64 = 0.9;
    pub const COLLISION_Z_PADDING: f64 = 0.15;
    pub const COIN_Z_PADDING: f64 = 1.2;

    /// World speed profile (units/s)
    pub const WORLD_SPEED_START: f64 = 18.0;
    pub const WORLD_SPEED_ACCEL: f64 = 0.35;
    pub const WORLD_SPEED_MAX: f64 = 42.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    // Large spins would loop for a long time below
    if angle.abs() > 4.0 * TAU {
        angle %= TAU;
    }
    while angle >= PI {
        angle -= TAU;
    }
    while angle < -PI {
        angle += TAU;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}

/// Rotate a point by `angle` radians about the origin
#[inline]
pub fn rotate(point: DVec2, angle: f64) -> DVec2 {
    DVec2::from_angle(angle).rotate(point)
}

/// Replace NaN/infinite values with `fallback`
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-9);
        assert!((normalize_angle(-PI / 2.0) - (-PI / 2.0)).abs() < 1e-9);
        assert!(normalize_angle(1000.0).abs() < PI + 1e-9);
        assert_eq!(normalize_angle(f64::NAN), 0.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = rotate(DVec2::new(1.0, 0.0), PI / 2.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_polar_roundtrip_length() {
        let p = polar_to_cartesian(5.0, 1.2);
        assert!((p.length() - 5.0).abs() < 1e-9);
    }
}

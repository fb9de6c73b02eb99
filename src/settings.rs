//! Run settings and tuning
//!
//! Everything the simulation reads is a plain numeric knob, grouped here so a
//! driver can load it from JSON. Missing fields fall back to defaults and
//! out-of-range values are clamped rather than rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::finite_or;
use crate::sim::{ChainConfig, CollisionTuning};
use crate::theme::ThemeConfig;

/// World scroll speed over the course of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfile {
    /// Speed at the start of a run (units/s)
    pub start: f64,
    /// Added speed per second survived
    pub accel: f64,
    /// Speed cap
    pub max: f64,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            start: WORLD_SPEED_START,
            accel: WORLD_SPEED_ACCEL,
            max: WORLD_SPEED_MAX,
        }
    }
}

impl SpeedProfile {
    pub fn speed_at(&self, elapsed: f64) -> f64 {
        (self.start + self.accel * elapsed.max(0.0)).min(self.max)
    }

    fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let start = finite_or(self.start, defaults.start).max(0.0);
        Self {
            start,
            accel: finite_or(self.accel, defaults.accel).max(0.0),
            max: finite_or(self.max, defaults.max).max(start),
        }
    }
}

/// Everything a run is configured by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for hole layouts and spins
    pub seed: u64,
    pub chain: ChainConfig,
    pub collision: CollisionTuning,
    pub speed: SpeedProfile,
    pub theme: ThemeConfig,
    pub player_radius: f64,
    /// Planar steering speed (units/s)
    pub player_speed: f64,
    /// Longest frame the driver will simulate in one tick (seconds)
    pub max_dt: f64,
    pub score_per_pickup: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED_7E11,
            chain: ChainConfig::default(),
            collision: CollisionTuning::default(),
            speed: SpeedProfile::default(),
            theme: ThemeConfig::default(),
            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            max_dt: MAX_DT,
            score_per_pickup: 1,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Bad settings in {}: {}, using defaults", path.display(), err);
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Cannot read {}: {}, using defaults", path.display(), err);
                Self::default()
            }
        }
    }

    /// Copy with every knob coerced into a safe range
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            seed: self.seed,
            chain: self.chain.sanitized(),
            collision: self.collision.sanitized(),
            speed: self.speed.sanitized(),
            theme: self.theme.clone(),
            player_radius: finite_or(self.player_radius, defaults.player_radius).max(0.0),
            player_speed: finite_or(self.player_speed, defaults.player_speed).max(0.0),
            max_dt: match finite_or(self.max_dt, defaults.max_dt) {
                dt if dt > 0.0 => dt,
                _ => defaults.max_dt,
            },
            score_per_pickup: self.score_per_pickup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "seed": 42, "chain": { "spacing_z": 20.0 } }"#)
            .expect("valid json");
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.chain.spacing_z, 20.0);
        assert_eq!(settings.chain.prefill_count, CHAIN_PREFILL);
        assert_eq!(settings.max_dt, MAX_DT);
    }

    #[test]
    fn test_json_values_are_clamped() {
        let settings = Settings::from_json(
            r#"{ "chain": { "spacing_z": 0.1, "depth": 1.0 }, "max_dt": -2.0,
                 "speed": { "start": 10.0, "max": 5.0 } }"#,
        )
        .expect("valid json");
        assert!(settings.chain.spacing_z >= 1.0 + BARRIER_SURFACE_GAP);
        assert_eq!(settings.max_dt, MAX_DT);
        assert_eq!(settings.speed.max, 10.0);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Settings::from_json("{ not json").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings::default();
        let json = settings.to_json().expect("serializable");
        let back = Settings::from_json(&json).expect("valid json");
        assert_eq!(back, settings);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load("/definitely/not/here/settings.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_speed_profile_caps() {
        let speed = SpeedProfile {
            start: 10.0,
            accel: 2.0,
            max: 20.0,
        };
        assert_eq!(speed.speed_at(0.0), 10.0);
        assert_eq!(speed.speed_at(2.5), 15.0);
        assert_eq!(speed.speed_at(100.0), 20.0);
    }
}

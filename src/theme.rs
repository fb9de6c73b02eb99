//! Color cycle used to tag freshly spawned barriers
//!
//! The simulation never interprets a token; renderers map it to a palette.

use serde::{Deserialize, Serialize};

/// Opaque color/theme tag carried by each barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ThemeToken(pub u32);

/// Source of theme tokens for new barriers
///
/// Both queries are pure: calling them never advances the cycle.
pub trait ThemeSource {
    /// Token active right now
    fn current(&self) -> ThemeToken;
    /// Token that will be active `n` steps from now
    fn sample_ahead(&self, n: u32) -> ThemeToken;
}

/// Color cycle tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Number of distinct tokens before the cycle wraps
    pub palette_len: u32,
    /// Seconds each token stays current
    pub period_secs: f64,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            palette_len: 6,
            period_secs: 8.0,
        }
    }
}

/// Time-driven palette cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorCycle {
    palette_len: u32,
    period_secs: f64,
    /// Index of the current token
    index: u32,
    /// Time spent on the current token
    elapsed: f64,
}

impl ColorCycle {
    pub fn new(config: &ThemeConfig) -> Self {
        let period_secs = if config.period_secs.is_finite() && config.period_secs > 0.0 {
            config.period_secs
        } else {
            ThemeConfig::default().period_secs
        };
        Self {
            palette_len: config.palette_len.max(1),
            period_secs,
            index: 0,
            elapsed: 0.0,
        }
    }

    /// Advance the cycle by `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.period_secs {
            let steps = (self.elapsed / self.period_secs).floor();
            self.elapsed -= steps * self.period_secs;
            let steps = (steps % self.palette_len as f64) as u32;
            self.index = (self.index + steps) % self.palette_len;
        }
    }

    /// Progress through the current token, 0-1 (for crossfading)
    pub fn blend(&self) -> f64 {
        self.elapsed / self.period_secs
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.elapsed = 0.0;
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new(&ThemeConfig::default())
    }
}

impl ThemeSource for ColorCycle {
    fn current(&self) -> ThemeToken {
        ThemeToken(self.index)
    }

    fn sample_ahead(&self, n: u32) -> ThemeToken {
        ThemeToken(((self.index as u64 + n as u64) % self.palette_len as u64) as u32)
    }
}

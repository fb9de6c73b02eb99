//! Simulation entities and run state
//!
//! Barriers and pickups are plain data; the chain manager moves them and the
//! collision engine only flips `Pickup::collected`.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::chain::{ChainConfig, ChainManager};
use super::collision::CollisionEngine;
use crate::settings::Settings;
use crate::theme::{ColorCycle, ThemeToken};
use crate::{normalize_angle, rotate};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// World is scrolling and collisions are live
    Running,
    /// Player hit a barrier; ticks are ignored until restart
    GameOver,
}

/// Stable handle to a barrier, unique within one chain's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarrierId(pub u32);

/// A circular opening in a barrier, in the barrier's unrotated frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Hole {
    pub fn new(center: DVec2, radius: f64) -> Self {
        Self {
            x: center.x,
            y: center.y,
            radius,
        }
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Distance from the barrier axis to the hole center
    #[inline]
    pub fn offset_distance(&self) -> f64 {
        self.center().length()
    }

    /// Whether a circle lies entirely inside this hole
    #[inline]
    pub fn contains_circle(&self, point: DVec2, radius: f64) -> bool {
        point.distance(self.center()) <= self.radius - radius
    }
}

/// Which generator produced a barrier's holes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleLayout {
    /// Two equal holes mirrored through the center
    Twin,
    /// One large centered hole leaving a solid ring
    Ring,
    /// One hole somewhere off-center
    Offset,
}

/// A rotating disc obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    pub id: BarrierId,
    pub outer_radius: f64,
    /// Thickness along the scroll axis (collision window only)
    pub depth: f64,
    pub holes: Vec<Hole>,
    pub layout: HoleLayout,
    /// Scroll-axis position; negative is ahead of the player
    pub z: f64,
    /// Rotation about the scroll axis, normalized to [-π, π)
    pub angle: f64,
    /// Angular velocity (rad/s), may be zero or negative
    pub spin_rate: f64,
    /// Set once when z first crosses zero
    pub passed: bool,
    pub theme: ThemeToken,
}

impl Barrier {
    /// Advance position and spin. Returns true on the tick z crosses 0.
    pub fn advance(&mut self, dz: f64, dt: f64) -> bool {
        let previous_z = self.z;
        self.z += dz;
        if self.spin_rate != 0.0 {
            self.angle = normalize_angle(self.angle + self.spin_rate * dt);
        }
        if !self.passed && previous_z < 0.0 && self.z >= 0.0 {
            self.passed = true;
            return true;
        }
        false
    }

    /// Map a world-plane point into this barrier's unrotated frame
    #[inline]
    pub fn to_local(&self, point: DVec2) -> DVec2 {
        rotate(point, -self.angle)
    }

    /// Map a local-frame offset into world space (planar + z)
    #[inline]
    pub fn to_world(&self, local: DVec3) -> DVec3 {
        let planar = rotate(local.truncate(), self.angle);
        DVec3::new(planar.x, planar.y, self.z + local.z)
    }
}

/// A collectible coin seated in a hole
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    /// Offset from the owner, or absolute position when unowned
    pub local_offset: DVec3,
    /// Non-owning handle, resolved against the live barrier list
    pub owner: Option<BarrierId>,
    /// Last resolved world position
    pub world: DVec3,
    /// Cosmetic spin (radians)
    pub spin: f64,
    pub collected: bool,
    pub pickup_radius: f64,
}

impl Pickup {
    /// Pickup riding along with `owner`
    pub fn attached(id: u32, owner: &Barrier, local_offset: DVec3, pickup_radius: f64) -> Self {
        Self {
            id,
            local_offset,
            owner: Some(owner.id),
            world: owner.to_world(local_offset),
            spin: 0.0,
            collected: false,
            pickup_radius,
        }
    }

    /// Free-floating pickup at an absolute position
    pub fn free(id: u32, position: DVec3, pickup_radius: f64) -> Self {
        Self {
            id,
            local_offset: position,
            owner: None,
            world: position,
            spin: 0.0,
            collected: false,
            pickup_radius,
        }
    }

    /// World position resolved through the owner if it is still live,
    /// otherwise the last-known position
    pub fn resolve(&self, barriers: &[Barrier]) -> DVec3 {
        match self.owner {
            Some(owner) => barriers
                .iter()
                .find(|b| b.id == owner)
                .map(|b| b.to_world(self.local_offset))
                .unwrap_or(self.world),
            None => self.local_offset,
        }
    }
}

/// The player's avatar, seen from the collision engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Planar position in the tunnel cross-section
    pub pos: DVec2,
    pub radius: f64,
}

impl Player {
    pub fn new(pos: DVec2, radius: f64) -> Self {
        Self { pos, radius }
    }

    /// Move toward target, limited to `max_speed * dt`, and keep the whole
    /// avatar inside a disc of `bound` radius
    pub fn move_toward(&mut self, target: DVec2, dt: f64, max_speed: f64, bound: f64) {
        let delta = target - self.pos;
        let max_step = max_speed * dt;
        let step = if delta.length() > max_step {
            delta.normalize_or_zero() * max_step
        } else {
            delta
        };
        self.pos += step;

        let limit = (bound - self.radius).max(0.0);
        if self.pos.length() > limit {
            self.pos = self.pos.normalize_or_zero() * limit;
        }
    }
}

/// Things the driver reports back to the shell (audio, HUD, run end)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A barrier's face crossed the player plane
    BarrierPassed { id: BarrierId },
    /// Pickups collected this tick
    PickupsCollected { count: u32 },
    /// Player hit a barrier's solid body
    Crashed { barrier: BarrierId },
}

/// One run: chain, collision tunables, player and score
///
/// The chain's own config is authoritative for layout; `settings.chain`
/// mirrors it. Prefer [`RunState::set_chain_config`] over the chain setters.
#[derive(Debug, Clone)]
pub struct RunState {
    pub settings: Settings,
    pub chain: ChainManager,
    pub collision: CollisionEngine,
    pub colors: ColorCycle,
    pub player: Player,
    pub phase: GamePhase,
    pub score: u64,
    /// Pickups collected this run
    pub pickups_collected: u32,
    /// Barriers passed this run
    pub barriers_passed: u32,
    /// Distance scrolled this run (world units)
    pub distance: f64,
    /// Simulated seconds this run
    pub elapsed: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl RunState {
    /// Create a run from settings, seeding the chain's generator from `settings.seed`
    pub fn new(settings: Settings) -> Self {
        let settings = settings.sanitized();
        let chain = ChainManager::new(settings.chain.clone(), settings.seed);
        let collision = CollisionEngine::new(settings.collision.clone());
        let colors = ColorCycle::new(&settings.theme);
        let player = Player::new(DVec2::ZERO, settings.player_radius);

        let mut state = Self {
            settings,
            chain,
            collision,
            colors,
            player,
            phase: GamePhase::Running,
            score: 0,
            pickups_collected: 0,
            barriers_passed: 0,
            distance: 0.0,
            elapsed: 0.0,
            time_ticks: 0,
        };
        state.chain.reset(&state.colors);
        state
    }

    /// Change chain layout for this and later runs; rebuilds on the next tick
    pub fn set_chain_config(&mut self, config: ChainConfig) {
        self.chain.set_config(config);
        self.settings.chain = self.chain.config().clone();
    }

    /// Start a fresh run, keeping settings and the generator stream
    pub fn restart(&mut self) {
        // Pick up any change made straight through the chain's setters
        self.settings.chain = self.chain.config().clone();
        self.colors.reset();
        self.player = Player::new(DVec2::ZERO, self.settings.player_radius);
        self.phase = GamePhase::Running;
        self.score = 0;
        self.pickups_collected = 0;
        self.barriers_passed = 0;
        self.distance = 0.0;
        self.elapsed = 0.0;
        self.time_ticks = 0;
        self.chain.reset(&self.colors);
        log::info!("Run restarted");
    }

    /// Current world scroll speed from the speed profile
    pub fn world_speed(&self) -> f64 {
        self.settings.speed.speed_at(self.elapsed)
    }
}

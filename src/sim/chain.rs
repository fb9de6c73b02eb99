//! Barrier chain: spawn, scroll, recycle
//!
//! Keeps `prefill_count` barriers alive at exactly `spacing_z` apart. Barriers
//! scroll toward the player, get dropped once they pass `despawn_z`, and are
//! replaced at the back of the chain. Each barrier's holes are cut once at
//! spawn and a coin is seated in every hole.

use std::f64::consts::TAU;

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::holes::{HoleGenConfig, generate_holes};
use super::state::{Barrier, BarrierId, Pickup};
use crate::consts::*;
use crate::theme::{ThemeSource, ThemeToken};
use crate::{finite_or, normalize_angle};

/// Chain layout and barrier geometry
///
/// Any change goes through [`ChainManager::set_config`] and rebuilds the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Distance between consecutive barrier centers
    pub spacing_z: f64,
    /// Barriers kept alive at once
    pub prefill_count: u32,
    /// z of the first barrier on rebuild
    pub start_z: f64,
    /// Barriers and pickups past this z are dropped
    pub despawn_z: f64,
    pub outer_radius: f64,
    pub depth: f64,
    /// Minimum empty space between neighbouring barrier faces
    pub surface_gap: f64,
    /// Initial spin is drawn from [-max_spin_rate, max_spin_rate]
    pub max_spin_rate: f64,
    pub pickup_radius: f64,
    /// Cosmetic coin spin (rad/s)
    pub pickup_spin_rate: f64,
    pub holes: HoleGenConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            spacing_z: CHAIN_SPACING_Z,
            prefill_count: CHAIN_PREFILL,
            start_z: CHAIN_START_Z,
            despawn_z: CHAIN_DESPAWN_Z,
            outer_radius: BARRIER_OUTER_RADIUS,
            depth: BARRIER_DEPTH,
            surface_gap: BARRIER_SURFACE_GAP,
            max_spin_rate: MAX_SPIN_RATE,
            pickup_radius: PICKUP_RADIUS,
            pickup_spin_rate: PICKUP_SPIN_RATE,
            holes: HoleGenConfig::default(),
        }
    }
}

impl ChainConfig {
    /// Closest two barriers may ever be without their bodies touching
    pub fn min_spacing(&self) -> f64 {
        self.depth + self.surface_gap + SPACING_EPSILON
    }

    /// Coerce every value into something that yields a valid chain
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();

        let outer_radius = match finite_or(self.outer_radius, defaults.outer_radius) {
            r if r > 0.0 => r,
            _ => defaults.outer_radius,
        };
        // Depth + gap must leave room under MAX_CHAIN_SPACING
        let depth = finite_or(self.depth, defaults.depth).clamp(0.0, MAX_CHAIN_SPACING / 4.0);
        let surface_gap =
            finite_or(self.surface_gap, defaults.surface_gap).clamp(0.0, MAX_CHAIN_SPACING / 4.0);

        let mut config = Self {
            spacing_z: finite_or(self.spacing_z, defaults.spacing_z),
            prefill_count: self.prefill_count.clamp(1, MAX_PREFILL),
            start_z: finite_or(self.start_z, defaults.start_z).clamp(-MAX_CHAIN_Z, MAX_CHAIN_Z),
            despawn_z: finite_or(self.despawn_z, defaults.despawn_z)
                .clamp(-MAX_CHAIN_Z, MAX_CHAIN_Z),
            outer_radius,
            depth,
            surface_gap,
            max_spin_rate: finite_or(self.max_spin_rate, defaults.max_spin_rate).abs(),
            pickup_radius: finite_or(self.pickup_radius, defaults.pickup_radius).max(0.0),
            pickup_spin_rate: finite_or(self.pickup_spin_rate, defaults.pickup_spin_rate),
            holes: self.holes.sanitized(),
        };

        let min_spacing = config.min_spacing();
        if config.spacing_z < min_spacing {
            log::warn!(
                "spacing_z {:.3} below minimum {:.3}, clamping",
                config.spacing_z,
                min_spacing
            );
            config.spacing_z = min_spacing;
        } else if config.spacing_z > MAX_CHAIN_SPACING {
            log::warn!(
                "spacing_z {:.3} above maximum {:.3}, clamping",
                config.spacing_z,
                MAX_CHAIN_SPACING
            );
            config.spacing_z = MAX_CHAIN_SPACING;
        }

        // A fresh barrier must have room to scroll before it despawns
        let latest_start = config.despawn_z - config.spacing_z;
        if config.start_z > latest_start {
            log::warn!(
                "start_z {:.3} too close to despawn_z {:.3}, clamping",
                config.start_z,
                config.despawn_z
            );
            config.start_z = latest_start;
        }

        config
    }
}

/// Notifications produced by a chain update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    /// Barrier z went from negative to non-negative this tick
    BarrierPassed { id: BarrierId },
}

/// Owns the live barriers and pickups
#[derive(Debug, Clone)]
pub struct ChainManager {
    config: ChainConfig,
    /// Live barriers, nearest first
    barriers: Vec<Barrier>,
    pickups: Vec<Pickup>,
    rng: Pcg32,
    /// Set by config changes, consumed by the next update
    dirty: bool,
    next_barrier_id: u32,
    next_pickup_id: u32,
}

impl ChainManager {
    /// Chain with a generator seeded from `seed`
    pub fn new(config: ChainConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    /// Chain drawing hole layouts from `rng`
    ///
    /// The chain starts empty; the first `update` (or an explicit `reset`)
    /// fills it.
    pub fn with_rng(config: ChainConfig, rng: Pcg32) -> Self {
        Self {
            config: config.sanitized(),
            barriers: Vec::new(),
            pickups: Vec::new(),
            rng,
            dirty: false,
            next_barrier_id: 1,
            next_pickup_id: 1,
        }
    }

    /// Chain with an OS-seeded generator (non-reproducible layouts)
    pub fn from_entropy(config: ChainConfig) -> Self {
        Self::with_rng(config, Pcg32::from_rng(&mut rand::rng()))
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Live barriers, nearest first
    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Barriers for reading alongside pickups for the collision pass
    pub fn live_mut(&mut self) -> (&[Barrier], &mut [Pickup]) {
        (&self.barriers, &mut self.pickups)
    }

    /// Whether a config change is waiting for the next update
    pub fn needs_rebuild(&self) -> bool {
        self.dirty
    }

    /// Replace the configuration; any real change schedules a rebuild
    pub fn set_config(&mut self, config: ChainConfig) {
        let config = config.sanitized();
        if config != self.config {
            log::info!("Chain config changed, rebuild scheduled");
            self.config = config;
            self.dirty = true;
        }
    }

    pub fn set_spacing_z(&mut self, spacing_z: f64) {
        self.set_config(ChainConfig {
            spacing_z,
            ..self.config.clone()
        });
    }

    pub fn set_prefill_count(&mut self, prefill_count: u32) {
        self.set_config(ChainConfig {
            prefill_count,
            ..self.config.clone()
        });
    }

    pub fn set_start_z(&mut self, start_z: f64) {
        self.set_config(ChainConfig {
            start_z,
            ..self.config.clone()
        });
    }

    pub fn set_despawn_z(&mut self, despawn_z: f64) {
        self.set_config(ChainConfig {
            despawn_z,
            ..self.config.clone()
        });
    }

    pub fn set_hole_config(&mut self, holes: HoleGenConfig) {
        self.set_config(ChainConfig {
            holes,
            ..self.config.clone()
        });
    }

    /// Throw away every live entity and lay out a fresh chain
    ///
    /// The i-th barrier is tagged with the token `i` steps ahead so colors
    /// line up by the time it reaches the player.
    pub fn reset<T: ThemeSource + ?Sized>(&mut self, theme: &T) {
        self.barriers.clear();
        self.pickups.clear();
        self.dirty = false;

        for i in 0..self.config.prefill_count {
            let z = self.config.start_z - i as f64 * self.config.spacing_z;
            self.spawn_barrier(z, theme.sample_ahead(i));
        }

        log::info!(
            "Chain rebuilt: {} barriers, spacing {:.2}, z {:.2}..{:.2}",
            self.barriers.len(),
            self.config.spacing_z,
            self.config.start_z,
            self.furthest_z().unwrap_or(self.config.start_z)
        );
    }

    /// Advance the chain by one tick
    ///
    /// Scrolls and spins every barrier, carries pickups along, drops what has
    /// passed `despawn_z`, then refills the back of the chain.
    pub fn update<T: ThemeSource + ?Sized>(
        &mut self,
        world_speed: f64,
        dt: f64,
        theme: &T,
    ) -> Vec<ChainEvent> {
        if self.dirty || self.barriers.is_empty() {
            self.reset(theme);
        }

        let world_speed = finite_or(world_speed, 0.0).max(0.0);
        let dt = finite_or(dt, 0.0).max(0.0);
        let dz = world_speed * dt;

        let mut events = Vec::new();
        for barrier in &mut self.barriers {
            if barrier.advance(dz, dt) {
                events.push(ChainEvent::BarrierPassed { id: barrier.id });
            }
        }

        let spin = self.config.pickup_spin_rate * dt;
        for pickup in &mut self.pickups {
            let owner = pickup
                .owner
                .and_then(|id| self.barriers.iter().find(|b| b.id == id));
            match (pickup.owner, owner) {
                (Some(_), Some(barrier)) => pickup.world = barrier.to_world(pickup.local_offset),
                (None, _) => {
                    pickup.local_offset.z += dz;
                    pickup.world = pickup.local_offset;
                }
                // Orphan: last-known position keeps scrolling with the world
                (Some(_), None) => pickup.world.z += dz,
            }
            if spin != 0.0 {
                pickup.spin = normalize_angle(pickup.spin + spin);
            }
        }

        let despawn_z = self.config.despawn_z;
        let before = self.barriers.len();
        self.barriers.retain(|b| b.z <= despawn_z);
        let dropped = before - self.barriers.len();
        self.pickups.retain(|p| !p.collected && p.world.z <= despawn_z);

        let mut spawned = 0;
        while self.barriers.len() < self.config.prefill_count as usize {
            let z = self
                .furthest_z()
                .map_or(self.config.start_z, |z| z - self.config.spacing_z);
            self.spawn_barrier(z, theme.current());
            spawned += 1;
        }

        if dropped > 0 || spawned > 0 {
            log::debug!("Chain recycled: {} dropped, {} spawned", dropped, spawned);
        }

        events
    }

    /// Add a free-floating pickup at an absolute position
    pub fn add_free_pickup(&mut self, position: DVec3) -> u32 {
        let id = self.next_pickup_id();
        self.pickups.push(Pickup::free(id, position, self.config.pickup_radius));
        id
    }

    /// z of the barrier furthest ahead of the player
    pub fn furthest_z(&self) -> Option<f64> {
        self.barriers.iter().map(|b| b.z).reduce(f64::min)
    }

    fn spawn_barrier(&mut self, z: f64, theme: ThemeToken) {
        let (layout, holes) =
            generate_holes(self.config.outer_radius, &self.config.holes, &mut self.rng);
        let angle = normalize_angle(self.rng.random::<f64>() * TAU);
        let max_spin = self.config.max_spin_rate;
        let spin_rate = -max_spin + 2.0 * max_spin * self.rng.random::<f64>();

        let id = BarrierId(self.next_barrier_id);
        self.next_barrier_id = self.next_barrier_id.wrapping_add(1);

        let barrier = Barrier {
            id,
            outer_radius: self.config.outer_radius,
            depth: self.config.depth,
            holes,
            layout,
            z,
            angle,
            spin_rate,
            passed: false,
            theme,
        };

        for hole in &barrier.holes {
            let pickup_id = self.next_pickup_id();
            self.pickups.push(Pickup::attached(
                pickup_id,
                &barrier,
                DVec3::new(hole.x, hole.y, 0.0),
                self.config.pickup_radius,
            ));
        }

        log::debug!(
            "Spawned barrier {:?} at z={:.2} ({:?}, {} holes, spin {:.2})",
            id,
            z,
            layout,
            barrier.holes.len(),
            spin_rate
        );
        self.barriers.push(barrier);
    }

    fn next_pickup_id(&mut self) -> u32 {
        let id = self.next_pickup_id;
        self.next_pickup_id = self.next_pickup_id.wrapping_add(1);
        id
    }
}

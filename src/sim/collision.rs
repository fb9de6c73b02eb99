//! Collision queries against rotating, perforated discs
//!
//! The tricky part of the runner: the player is a circle in the tunnel
//! cross-section, each barrier is a disc with circular holes that spins about
//! the scroll axis. Rather than rotating every hole, the player is rotated
//! into the barrier's local frame and tested there.

use serde::{Deserialize, Serialize};

use super::state::{Barrier, BarrierId, Pickup, Player};
use crate::consts::*;

/// Forgiveness tunables; the engine holds no entity state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Extra z slack on each side of a barrier's half-depth
    pub z_padding: f64,
    /// Scroll-axis position of the player plane
    pub plane_z: f64,
    /// Multiplier on the player radius for barrier tests (< 1 is forgiving)
    pub radius_shrink: f64,
    /// Pickups are live while |z| <= this
    pub coin_z_padding: f64,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            z_padding: COLLISION_Z_PADDING,
            plane_z: 0.0,
            radius_shrink: RADIUS_SHRINK,
            coin_z_padding: COIN_Z_PADDING,
        }
    }
}

impl CollisionTuning {
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            z_padding: crate::finite_or(self.z_padding, defaults.z_padding).max(0.0),
            plane_z: crate::finite_or(self.plane_z, defaults.plane_z),
            radius_shrink: crate::finite_or(self.radius_shrink, defaults.radius_shrink)
                .clamp(0.0, 1.0),
            coin_z_padding: crate::finite_or(self.coin_z_padding, defaults.coin_z_padding)
                .max(0.0),
        }
    }
}

/// Stateless barrier and pickup queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionEngine {
    pub tuning: CollisionTuning,
}

impl CollisionEngine {
    pub fn new(tuning: CollisionTuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
        }
    }

    /// Player radius used against barrier bodies
    #[inline]
    pub fn effective_radius(&self, player: &Player) -> f64 {
        player.radius * self.tuning.radius_shrink
    }

    /// Whether a barrier straddles the player plane this tick
    #[inline]
    pub fn in_z_window(&self, barrier: &Barrier) -> bool {
        (barrier.z - self.tuning.plane_z).abs() <= barrier.depth / 2.0 + self.tuning.z_padding
    }

    /// Whether the player's shrunk circle sits in the solid part of `barrier`
    ///
    /// Ignores the z window. Fully inside any one hole is safe, otherwise any
    /// circle fully inside the disc is a hit. A circle poking past the outer
    /// rim is let through.
    pub fn hits_barrier(&self, barrier: &Barrier, player: &Player) -> bool {
        let local = barrier.to_local(player.pos);
        let radius = self.effective_radius(player);

        if barrier
            .holes
            .iter()
            .any(|hole| hole.contains_circle(local, radius))
        {
            return false;
        }

        local.length() <= barrier.outer_radius - radius
    }

    /// First barrier in the player plane whose solid body the player is in
    pub fn first_obstacle_hit(&self, barriers: &[Barrier], player: &Player) -> Option<BarrierId> {
        barriers
            .iter()
            .filter(|b| self.in_z_window(b))
            .find(|b| self.hits_barrier(b, player))
            .map(|b| b.id)
    }

    /// True if the player collides with any live barrier
    pub fn check_obstacles(&self, barriers: &[Barrier], player: &Player) -> bool {
        self.first_obstacle_hit(barriers, player).is_some()
    }

    /// Mark pickups the player has reached and return how many were newly
    /// collected. Only the `collected` flag is touched.
    pub fn collect_pickups(
        &self,
        pickups: &mut [Pickup],
        barriers: &[Barrier],
        player: &Player,
    ) -> u32 {
        let mut count = 0;
        for pickup in pickups.iter_mut().filter(|p| !p.collected) {
            let world = pickup.resolve(barriers);
            if world.z.abs() > self.tuning.coin_z_padding {
                continue;
            }
            let reach = pickup.pickup_radius + player.radius;
            if world.truncate().distance(player.pos) <= reach {
                pickup.collected = true;
                count += 1;
            }
        }
        count
    }
}

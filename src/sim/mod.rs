//! Simulation module
//!
//! All gameplay logic lives here. It is synchronous and free of rendering or
//! platform dependencies:
//! - Seeded RNG only (layouts are reproducible from the run seed)
//! - Chain manager runs to completion before any collision query
//! - Stable iteration order (barriers nearest first, pickups by spawn)

pub mod chain;
pub mod collision;
pub mod holes;
pub mod state;
pub mod tick;

pub use chain::{ChainConfig, ChainEvent, ChainManager};
pub use collision::{CollisionEngine, CollisionTuning};
pub use holes::{FracRange, HoleGenConfig, generate_holes};
pub use state::{
    Barrier, BarrierId, GameEvent, GamePhase, Hole, HoleLayout, Pickup, Player, RunState,
};
pub use tick::{TickInput, clamp_dt, tick};

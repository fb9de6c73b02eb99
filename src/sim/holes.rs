//! Procedural hole layouts for barrier discs
//!
//! Every size here is a fraction of the barrier's outer radius, so one config
//! works for any disc size. All three layouts keep each hole inside
//! `outer_radius - edge_margin` and never let two holes overlap.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Hole, HoleLayout};
use crate::polar_to_cartesian;

/// Smallest hole we will ever cut, as a fraction of outer radius
const MIN_HOLE_FRAC: f64 = 0.02;
/// Largest edge margin / twin gap accepted from config
const MAX_MARGIN_FRAC: f64 = 0.25;

/// Inclusive fractional range, relative to outer radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FracRange {
    pub min: f64,
    pub max: f64,
}

impl FracRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Finite, ordered and inside [MIN_HOLE_FRAC, 1]
    fn sanitized(self, fallback: FracRange) -> Self {
        let min = crate::finite_or(self.min, fallback.min).clamp(MIN_HOLE_FRAC, 1.0);
        let max = crate::finite_or(self.max, fallback.max).clamp(MIN_HOLE_FRAC, 1.0);
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Uniform draw, scaled by `scale`
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, scale: f64) -> f64 {
        draw(rng, self.min, self.max) * scale
    }
}

/// Hole generation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleGenConfig {
    /// Probability of the twin layout
    pub twin_chance: f64,
    /// Probability of the centered ring layout (offset takes the rest)
    pub ring_chance: f64,
    /// Solid rim kept between any hole and the disc edge
    pub edge_margin: f64,
    /// Minimum distance from the center to a twin hole's near edge
    pub min_gap: f64,
    /// Twin hole radius
    pub twin_radius: FracRange,
    /// Solid ring width for the centered layout
    pub ring_width: FracRange,
    /// Off-center single hole radius
    pub offset_radius: FracRange,
}

impl Default for HoleGenConfig {
    fn default() -> Self {
        Self {
            twin_chance: 0.45,
            ring_chance: 0.35,
            edge_margin: 0.06,
            min_gap: 0.05,
            twin_radius: FracRange::new(0.2, 0.32),
            ring_width: FracRange::new(0.3, 0.55),
            offset_radius: FracRange::new(0.25, 0.45),
        }
    }
}

impl HoleGenConfig {
    /// Coerce every knob into a range that always yields valid geometry
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let twin_chance = crate::finite_or(self.twin_chance, defaults.twin_chance).clamp(0.0, 1.0);
        let ring_chance =
            crate::finite_or(self.ring_chance, defaults.ring_chance).clamp(0.0, 1.0 - twin_chance);
        Self {
            twin_chance,
            ring_chance,
            edge_margin: crate::finite_or(self.edge_margin, defaults.edge_margin)
                .clamp(0.0, MAX_MARGIN_FRAC),
            min_gap: crate::finite_or(self.min_gap, defaults.min_gap).clamp(0.0, MAX_MARGIN_FRAC),
            twin_radius: self.twin_radius.sanitized(defaults.twin_radius),
            ring_width: self.ring_width.sanitized(defaults.ring_width),
            offset_radius: self.offset_radius.sanitized(defaults.offset_radius),
        }
    }

    /// Layout selected by a uniform draw `p` in [0, 1)
    pub fn layout_for(&self, p: f64) -> HoleLayout {
        if p < self.twin_chance {
            HoleLayout::Twin
        } else if p < self.twin_chance + self.ring_chance {
            HoleLayout::Ring
        } else {
            HoleLayout::Offset
        }
    }
}

/// Cut holes for a new barrier of `outer_radius`
///
/// `config` is expected to be sanitized; the chain manager stores it that way.
pub fn generate_holes<R: Rng + ?Sized>(
    outer_radius: f64,
    config: &HoleGenConfig,
    rng: &mut R,
) -> (HoleLayout, Vec<Hole>) {
    let layout = config.layout_for(rng.random::<f64>());
    let holes = match layout {
        HoleLayout::Twin => twin_holes(outer_radius, config, rng),
        HoleLayout::Ring => vec![ring_hole(outer_radius, config, rng)],
        HoleLayout::Offset => vec![offset_hole(outer_radius, config, rng)],
    };
    (layout, holes)
}

/// Two equal holes at +offset and -offset
fn twin_holes<R: Rng + ?Sized>(outer_radius: f64, config: &HoleGenConfig, rng: &mut R) -> Vec<Hole> {
    let usable = outer_radius * (1.0 - config.edge_margin);
    let gap = outer_radius * config.min_gap;
    let min_radius = outer_radius * MIN_HOLE_FRAC;

    // offset - r >= gap and offset + r <= usable  =>  r <= (usable - gap) / 2
    let max_radius = ((usable - gap) / 2.0).max(min_radius);
    let radius = config
        .twin_radius
        .sample(rng, outer_radius)
        .clamp(min_radius, max_radius);

    let offset = draw(rng, radius + gap, usable - radius);
    let center = polar_to_cartesian(offset, rng.random::<f64>() * TAU);

    vec![Hole::new(center, radius), Hole::new(-center, radius)]
}

/// One centered hole leaving a solid ring of drawn width
fn ring_hole<R: Rng + ?Sized>(outer_radius: f64, config: &HoleGenConfig, rng: &mut R) -> Hole {
    let margin = outer_radius * config.edge_margin;
    let min_radius = outer_radius * MIN_HOLE_FRAC;

    let width = config
        .ring_width
        .sample(rng, outer_radius)
        .clamp(margin, outer_radius - margin);
    let radius = (outer_radius - width).max(margin).max(min_radius);

    Hole::new(glam::DVec2::ZERO, radius)
}

/// One hole at a random offset, fully inside the usable disc
fn offset_hole<R: Rng + ?Sized>(outer_radius: f64, config: &HoleGenConfig, rng: &mut R) -> Hole {
    let usable = outer_radius * (1.0 - config.edge_margin);
    let min_radius = outer_radius * MIN_HOLE_FRAC;

    let radius = config
        .offset_radius
        .sample(rng, outer_radius)
        .clamp(min_radius, usable);
    let offset = draw(rng, 0.0, usable - radius);
    let center = polar_to_cartesian(offset, rng.random::<f64>() * TAU);

    Hole::new(center, radius)
}

/// Uniform draw in [lo, hi]; never panics on an empty or inverted range
fn draw<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return lo;
    }
    lo + (hi - lo) * rng.random::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const EPS: f64 = 1e-9;

    fn assert_valid(outer_radius: f64, config: &HoleGenConfig, holes: &[Hole]) {
        let usable = outer_radius * (1.0 - config.edge_margin);
        assert!(!holes.is_empty() && holes.len() <= 2);
        for hole in holes {
            assert!(hole.radius > 0.0, "hole radius {}", hole.radius);
            assert!(
                hole.offset_distance() + hole.radius <= usable + EPS,
                "hole {:?} pokes past {}",
                hole,
                usable
            );
        }
        for (i, a) in holes.iter().enumerate() {
            for b in &holes[i + 1..] {
                assert!(a.center().distance(b.center()) >= a.radius + b.radius - EPS);
            }
        }
    }

    fn forced(layout: HoleLayout) -> HoleGenConfig {
        let (twin_chance, ring_chance) = match layout {
            HoleLayout::Twin => (1.0, 0.0),
            HoleLayout::Ring => (0.0, 1.0),
            HoleLayout::Offset => (0.0, 0.0),
        };
        HoleGenConfig {
            twin_chance,
            ring_chance,
            ..Default::default()
        }
    }

    #[test]
    fn test_layout_thresholds() {
        let config = HoleGenConfig::default();
        assert_eq!(config.layout_for(0.0), HoleLayout::Twin);
        assert_eq!(config.layout_for(0.449), HoleLayout::Twin);
        assert_eq!(config.layout_for(0.45), HoleLayout::Ring);
        assert_eq!(config.layout_for(0.79), HoleLayout::Ring);
        assert_eq!(config.layout_for(0.8), HoleLayout::Offset);
        assert_eq!(config.layout_for(0.999), HoleLayout::Offset);
    }

    #[test]
    fn test_twin_holes_are_mirrored() {
        let mut rng = Pcg32::seed_from_u64(7);
        let config = forced(HoleLayout::Twin);
        let (layout, holes) = generate_holes(8.0, &config, &mut rng);
        assert_eq!(layout, HoleLayout::Twin);
        assert_eq!(holes.len(), 2);
        assert_eq!(holes[0].radius, holes[1].radius);
        assert!((holes[0].center() + holes[1].center()).length() < EPS);
        // near edge keeps the minimum gap from the center
        let gap = 8.0 * config.min_gap;
        assert!(holes[0].offset_distance() - holes[0].radius >= gap - EPS);
    }

    #[test]
    fn test_ring_hole_is_centered() {
        let mut rng = Pcg32::seed_from_u64(11);
        let (layout, holes) = generate_holes(8.0, &forced(HoleLayout::Ring), &mut rng);
        assert_eq!(layout, HoleLayout::Ring);
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].center(), glam::DVec2::ZERO);
        let width = 8.0 - holes[0].radius;
        assert!(width >= 8.0 * 0.3 - EPS && width <= 8.0 * 0.55 + EPS);
    }

    #[test]
    fn test_ring_radius_floored_at_margin() {
        let mut rng = Pcg32::seed_from_u64(3);
        let config = HoleGenConfig {
            twin_chance: 0.0,
            ring_chance: 1.0,
            ring_width: FracRange::new(1.0, 1.0),
            ..Default::default()
        };
        let (_, holes) = generate_holes(10.0, &config, &mut rng);
        assert!((holes[0].radius - 10.0 * config.edge_margin).abs() < EPS);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let config = HoleGenConfig::default();
        let mut a = Pcg32::seed_from_u64(42);
        let mut b = Pcg32::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(
                generate_holes(8.0, &config, &mut a),
                generate_holes(8.0, &config, &mut b)
            );
        }
    }

    #[test]
    fn test_sanitize_coerces_garbage() {
        let config = HoleGenConfig {
            twin_chance: f64::NAN,
            ring_chance: 5.0,
            edge_margin: -1.0,
            min_gap: 9.0,
            twin_radius: FracRange::new(0.9, -3.0),
            ring_width: FracRange::new(f64::INFINITY, f64::NAN),
            offset_radius: FracRange::new(2.0, 2.0),
        }
        .sanitized();
        assert_eq!(config.twin_chance, 0.45);
        assert!((config.ring_chance - 0.55).abs() < EPS);
        assert_eq!(config.edge_margin, 0.0);
        assert_eq!(config.min_gap, MAX_MARGIN_FRAC);
        assert!(config.twin_radius.min <= config.twin_radius.max);
        assert!(config.ring_width.min >= MIN_HOLE_FRAC);
        assert_eq!(config.offset_radius.max, 1.0);

        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            let (_, holes) = generate_holes(8.0, &config, &mut rng);
            assert_valid(8.0, &config, &holes);
        }
    }

    proptest! {
        #[test]
        fn prop_holes_fit_and_never_overlap(
            seed in any::<u64>(),
            outer_radius in 0.5f64..50.0,
            edge_margin in 0.0f64..0.3,
            min_gap in 0.0f64..0.3,
            lo in 0.0f64..1.0,
            hi in 0.0f64..1.0,
        ) {
            let config = HoleGenConfig {
                edge_margin,
                min_gap,
                twin_radius: FracRange::new(lo, hi),
                ring_width: FracRange::new(hi, lo),
                offset_radius: FracRange::new(lo, hi),
                ..Default::default()
            }
            .sanitized();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..8 {
                let (_, holes) = generate_holes(outer_radius, &config, &mut rng);
                let usable = outer_radius * (1.0 - config.edge_margin);
                for hole in &holes {
                    prop_assert!(hole.radius > 0.0);
                    prop_assert!(hole.offset_distance() + hole.radius <= usable + 1e-9);
                }
                if holes.len() == 2 {
                    let d = holes[0].center().distance(holes[1].center());
                    prop_assert!(d >= holes[0].radius + holes[1].radius - 1e-9);
                }
            }
        }
    }
}

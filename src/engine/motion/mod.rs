pub mod drift;
pub mod free_roam;
pub mod grid;

use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;

use super::bands::{BandEnergy, BandRanges, BandWeights};
use super::pen::{FilledShape, PenState};
use super::Viewport;
use crate::render::Surface;

pub use drift::{DriftConfig, DriftMotion};
pub use free_roam::{FreeRoamConfig, FreeRoamMotion};
pub use grid::{GridConfig, GridMotion};

/// The three motion variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    FreeRoam,
    Drift,
    Grid,
}

impl Variant {
    /// Band ranges and composite weighting for this variant. The numbers
    /// differ between variants on purpose; each set is that variant's
    /// contract.
    pub fn analysis(self) -> (BandRanges, BandWeights) {
        match self {
            Variant::FreeRoam => (
                BandRanges {
                    bass: 0..10,
                    mid: 10..50,
                    high: 50..100,
                },
                BandWeights {
                    bass: 0.3,
                    mid: 0.6,
                    high: 0.3,
                },
            ),
            Variant::Drift | Variant::Grid => (
                BandRanges {
                    bass: 0..10,
                    mid: 10..100,
                    high: 100..200,
                },
                BandWeights {
                    bass: 3.0,
                    mid: 2.5,
                    high: 1.5,
                },
            ),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free-roam" | "freeroam" => Ok(Variant::FreeRoam),
            "drift" | "continuous-drift" => Ok(Variant::Drift),
            "grid" | "grid-snap" => Ok(Variant::Grid),
            other => Err(format!(
                "unknown variant '{other}' (expected free-roam, drift, or grid)"
            )),
        }
    }
}

/// Everything a motion step reads besides its own state.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub bands: BandEnergy,
    /// Current noise-process value.
    pub noise: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Seconds since the session became active.
    pub elapsed_secs: f32,
    /// Track progress in [0, 1], when the host supplies it.
    pub progress: Option<f32>,
    pub viewport: Viewport,
}

/// Variant state machine: movement law, boundary policy, and stylistic
/// triggers behind one dispatch point.
#[derive(Debug)]
pub enum Motion {
    FreeRoam(FreeRoamMotion),
    Drift(DriftMotion),
    Grid(GridMotion),
}

impl Motion {
    pub fn new(variant: Variant, viewport: Viewport, rng: &mut impl Rng) -> Self {
        match variant {
            Variant::FreeRoam => Motion::FreeRoam(FreeRoamMotion::new(FreeRoamConfig::default())),
            Variant::Drift => Motion::Drift(DriftMotion::new(DriftConfig::default())),
            Variant::Grid => {
                Motion::Grid(GridMotion::new(GridConfig::default(), viewport, rng))
            }
        }
    }

    /// Advance the pen one frame and emit this frame's drawing operations.
    pub fn step(
        &mut self,
        pen: &mut PenState,
        ctx: &StepContext,
        rng: &mut StdRng,
        surface: &mut dyn Surface,
    ) {
        match self {
            Motion::FreeRoam(m) => m.step(pen, ctx, rng, surface),
            Motion::Drift(m) => m.step(pen, ctx, rng, surface),
            Motion::Grid(m) => m.step(pen, ctx, rng, surface),
        }
    }

    /// Drop per-variant spatial state after a viewport change.
    pub fn reset(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        match self {
            Motion::FreeRoam(m) => m.reset(),
            Motion::Drift(_) => {}
            Motion::Grid(m) => m.reset(viewport, rng),
        }
    }

    /// Decorative shapes logged so far (grid variant only).
    pub fn filled_shapes(&self) -> &[FilledShape] {
        match self {
            Motion::Grid(m) => m.shapes(),
            _ => &[],
        }
    }
}

use std::ops::Range;

use serde::Serialize;

use super::EngineError;
use crate::audio::spectrum::SpectralSnapshot;

/// Frequency-bin ranges for the three named bands.
///
/// The boundaries are tuned per variant and are part of that variant's
/// contract; they are validated against the snapshot length once at session
/// setup and never re-checked per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandRanges {
    pub bass: Range<usize>,
    pub mid: Range<usize>,
    pub high: Range<usize>,
}

impl BandRanges {
    fn validate(&self, snapshot_len: usize) -> Result<(), EngineError> {
        for (name, range) in [
            ("bass", &self.bass),
            ("mid", &self.mid),
            ("high", &self.high),
        ] {
            if range.is_empty() {
                return Err(EngineError::EmptyBand {
                    name,
                    start: range.start,
                    end: range.end,
                });
            }
            if range.end > snapshot_len {
                return Err(EngineError::BandOutOfRange {
                    name,
                    end: range.end,
                    len: snapshot_len,
                });
            }
        }
        Ok(())
    }
}

/// Per-band weighting applied when combining bands into the composite
/// music-energy scalar. A policy choice, not a derived constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandWeights {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

/// Reduced audio features for one frame. Band values are mean magnitudes
/// normalized into [0, 1]; `music_energy` is the weighted composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandEnergy {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub music_energy: f32,
}

impl BandEnergy {
    pub fn silent() -> Self {
        Self {
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            music_energy: 0.0,
        }
    }
}

/// Reduces a spectral snapshot into [`BandEnergy`].
#[derive(Debug, Clone)]
pub struct BandAnalyzer {
    ranges: BandRanges,
    weights: BandWeights,
}

impl BandAnalyzer {
    /// Validates the ranges against the snapshot length the session will
    /// use. Out-of-range bands fail here, not at render time.
    pub fn new(
        ranges: BandRanges,
        weights: BandWeights,
        snapshot_len: usize,
    ) -> Result<Self, EngineError> {
        ranges.validate(snapshot_len)?;
        Ok(Self { ranges, weights })
    }

    pub fn analyze(&self, snapshot: &SpectralSnapshot) -> BandEnergy {
        let bass = mean_magnitude(snapshot, &self.ranges.bass);
        let mid = mean_magnitude(snapshot, &self.ranges.mid);
        let high = mean_magnitude(snapshot, &self.ranges.high);
        let music_energy =
            bass * self.weights.bass + mid * self.weights.mid + high * self.weights.high;
        BandEnergy {
            bass,
            mid,
            high,
            music_energy,
        }
    }
}

fn mean_magnitude(snapshot: &SpectralSnapshot, range: &Range<usize>) -> f32 {
    let bins = &snapshot.bins()[range.start..range.end];
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / bins.len() as f32 / 255.0
}

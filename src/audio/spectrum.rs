use anyhow::{ensure, Result};
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Deserialize;

use super::decode::AudioTrack;

/// Byte-magnitude mapping range, in dBFS. Magnitudes at or below the floor
/// read as 0, at or above the ceiling as 255 — the convention the engine's
/// band constants were tuned against.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Spectrum resolution profile. `Small` exists for constrained hosts; it
/// halves the analysis window and the bin count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Small,
    Full,
}

impl Resolution {
    pub fn fft_size(self) -> usize {
        match self {
            Resolution::Small => 512,
            Resolution::Full => 1024,
        }
    }

    /// Bins per snapshot: half the analysis window.
    pub fn bin_count(self) -> usize {
        self.fft_size() / 2
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Resolution::Small),
            "full" => Ok(Resolution::Full),
            other => Err(format!(
                "unknown resolution '{other}' (expected small or full)"
            )),
        }
    }
}

/// One frequency-magnitude read: byte magnitudes, one per bin, constant
/// length for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectralSnapshot {
    bins: Vec<u8>,
}

impl SpectralSnapshot {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn silent(len: usize) -> Self {
        Self {
            bins: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }
}

/// Supplies the most recent snapshot for a frame. Polled once per frame;
/// there is no queuing of stale data.
pub trait SnapshotSource {
    fn bin_count(&self) -> usize;
    fn snapshot_at(&self, frame: usize) -> &SpectralSnapshot;
}

/// Fallback source for sessions running without an analyzer: every frame
/// reads as silence.
pub struct SilentSnapshots {
    snapshot: SpectralSnapshot,
}

impl SilentSnapshots {
    pub fn new(bin_count: usize) -> Self {
        Self {
            snapshot: SpectralSnapshot::silent(bin_count),
        }
    }
}

impl SnapshotSource for SilentSnapshots {
    fn bin_count(&self) -> usize {
        self.snapshot.len()
    }

    fn snapshot_at(&self, _frame: usize) -> &SpectralSnapshot {
        &self.snapshot
    }
}

/// Precomputed per-frame snapshots for a whole track.
pub struct OfflineSpectrum {
    frames: Vec<SpectralSnapshot>,
    bin_count: usize,
}

impl OfflineSpectrum {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl SnapshotSource for OfflineSpectrum {
    fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Frames past the end keep returning the final snapshot, matching the
    /// "latest available data" pull contract.
    fn snapshot_at(&self, frame: usize) -> &SpectralSnapshot {
        &self.frames[frame.min(self.frames.len() - 1)]
    }
}

/// Analyze a decoded track into one snapshot per output frame.
///
/// Two passes: raw per-frame magnitudes fan out across cores, then a
/// sequential pass applies temporal smoothing (which depends on the
/// previous frame) and the dB → byte mapping.
pub fn analyze_track(
    track: &AudioTrack,
    fps: u32,
    resolution: Resolution,
    smoothing: f32,
) -> Result<OfflineSpectrum> {
    let fft_size = resolution.fft_size();
    let bin_count = resolution.bin_count();
    ensure!(fps > 0, "fps must be positive");
    ensure!(
        (0.0..1.0).contains(&smoothing),
        "smoothing must be in [0, 1), got {smoothing}"
    );
    ensure!(
        track.samples.len() >= fft_size,
        "track too short for spectral analysis: {} samples, need at least {}",
        track.samples.len(),
        fft_size
    );

    let total_frames = (track.duration_secs() * fps as f32).ceil() as usize;
    let samples_per_frame = track.sample_rate as f64 / fps as f64;
    let hann = hann_window(fft_size);
    let window_sum: f32 = hann.iter().sum();

    log::info!(
        "Analyzing spectrum: {} frames, {} bins, window {}",
        total_frames,
        bin_count,
        fft_size
    );

    // Pass 1: windowed FFT magnitudes per frame, in parallel
    let raw: Vec<Vec<f32>> = (0..total_frames)
        .into_par_iter()
        .map(|frame_idx| {
            let center = (frame_idx as f64 * samples_per_frame) as usize;
            let start = center
                .saturating_sub(fft_size / 2)
                .min(track.samples.len() - fft_size);

            let mut buffer: Vec<Complex<f32>> = track.samples[start..start + fft_size]
                .iter()
                .zip(hann.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();

            // Per-task planner: rayon tasks cannot share one
            let mut planner = FftPlanner::<f32>::new();
            planner.plan_fft_forward(fft_size).process(&mut buffer);

            buffer[..bin_count]
                .iter()
                .map(|c| c.norm() * 2.0 / window_sum)
                .collect()
        })
        .collect();

    // Pass 2: temporal smoothing, then dB mapping into bytes
    let mut smoothed = vec![0.0f32; bin_count];
    let mut frames = Vec::with_capacity(total_frames);
    for magnitudes in &raw {
        let bins = smoothed
            .iter_mut()
            .zip(magnitudes.iter())
            .map(|(prev, &mag)| {
                *prev = smoothing * *prev + (1.0 - smoothing) * mag;
                byte_magnitude(*prev)
            })
            .collect();
        frames.push(SpectralSnapshot::new(bins));
    }

    Ok(OfflineSpectrum { frames, bin_count })
}

/// Map a linear magnitude to the 0..=255 byte scale over [MIN_DB, MAX_DB].
fn byte_magnitude(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_track(freq: f32, secs: f32, sample_rate: u32) -> AudioTrack {
        let count = (secs * sample_rate as f32) as usize;
        let samples = (0..count)
            .map(|i| {
                (std::f32::consts::TAU * freq * i as f32 / sample_rate as f32).sin() * 0.5
            })
            .collect();
        AudioTrack {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn snapshots_have_constant_configured_length() {
        let track = sine_track(440.0, 2.0, 44_100);
        let spectrum = analyze_track(&track, 30, Resolution::Small, 0.8).unwrap();
        assert_eq!(spectrum.bin_count(), 256);
        assert_eq!(spectrum.frame_count(), 60);
        for frame in 0..spectrum.frame_count() {
            assert_eq!(spectrum.snapshot_at(frame).len(), 256);
        }
    }

    #[test]
    fn full_resolution_doubles_the_bins() {
        assert_eq!(Resolution::Full.bin_count(), 512);
        assert_eq!(Resolution::Small.fft_size(), 512);
    }

    #[test]
    fn tone_energy_lands_in_its_bin_neighborhood() {
        // 440 Hz at 44.1 kHz with a 1024-point window sits near bin 10
        let track = sine_track(440.0, 1.0, 44_100);
        let spectrum = analyze_track(&track, 30, Resolution::Full, 0.0).unwrap();
        let snapshot = spectrum.snapshot_at(15);
        let peak_bin = snapshot
            .bins()
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert!((8..=12).contains(&peak_bin), "peak at bin {peak_bin}");
        // High bins carry essentially nothing
        assert!(snapshot.bins()[256..].iter().all(|&b| b < 30));
    }

    #[test]
    fn silence_maps_to_zero_bytes() {
        let track = AudioTrack {
            samples: vec![0.0; 44_100],
            sample_rate: 44_100,
        };
        let spectrum = analyze_track(&track, 30, Resolution::Full, 0.8).unwrap();
        assert!(spectrum.snapshot_at(10).bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn too_short_track_is_a_setup_error() {
        let track = AudioTrack {
            samples: vec![0.0; 100],
            sample_rate: 44_100,
        };
        assert!(analyze_track(&track, 30, Resolution::Full, 0.8).is_err());
    }

    #[test]
    fn reads_past_the_end_return_the_last_snapshot() {
        let track = sine_track(440.0, 1.0, 44_100);
        let spectrum = analyze_track(&track, 30, Resolution::Small, 0.8).unwrap();
        let last = spectrum.snapshot_at(spectrum.frame_count() - 1);
        assert_eq!(spectrum.snapshot_at(10_000), last);
    }

    #[test]
    fn silent_source_always_reads_silent() {
        let source = SilentSnapshots::new(256);
        assert_eq!(source.bin_count(), 256);
        assert!(source.snapshot_at(0).bins().iter().all(|&b| b == 0));
        assert!(source.snapshot_at(9_999).bins().iter().all(|&b| b == 0));
    }
}

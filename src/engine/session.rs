use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bands::{BandAnalyzer, BandEnergy};
use super::motion::{Motion, StepContext, Variant};
use super::noise::NoiseProcess;
use super::pen::{FilledShape, PenState};
use super::{EngineError, Viewport};
use crate::audio::spectrum::SpectralSnapshot;
use crate::render::Surface;

/// Scheduler state. Frames only run while Active; a frame arriving while
/// Idle (a late callback after stop) is a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active,
}

/// One drawing session: exclusive owner of the pen, the noise process, the
/// RNG, and any variant state. Construction performs all validation; the
/// per-frame path cannot fail.
#[derive(Debug)]
pub struct Session {
    state: SchedulerState,
    variant: Variant,
    viewport: Viewport,
    analyzer: BandAnalyzer,
    noise: NoiseProcess,
    pen: PenState,
    motion: Motion,
    rng: StdRng,
    elapsed_secs: f32,
    frames: u64,
}

impl Session {
    /// Validate configuration and build a session in the Idle state.
    ///
    /// `snapshot_len` is the bin count every snapshot of this session will
    /// carry; band ranges are checked against it here, never per frame.
    pub fn new(
        variant: Variant,
        viewport: Viewport,
        snapshot_len: usize,
        seed: u64,
    ) -> Result<Self, EngineError> {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return Err(EngineError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let (ranges, weights) = variant.analysis();
        let analyzer = BandAnalyzer::new(ranges, weights, snapshot_len)?;

        let mut rng = StdRng::seed_from_u64(seed);
        let pen = PenState::centered(viewport, rng.random::<f32>() * std::f32::consts::TAU);
        let noise = NoiseProcess::new(&mut rng);
        let motion = Motion::new(variant, viewport, &mut rng);

        Ok(Self {
            state: SchedulerState::Idle,
            variant,
            viewport,
            analyzer,
            noise,
            pen,
            motion,
            rng,
            elapsed_secs: 0.0,
            frames: 0,
        })
    }

    pub fn start(&mut self) {
        self.state = SchedulerState::Active;
    }

    pub fn stop(&mut self) {
        self.state = SchedulerState::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.state == SchedulerState::Active
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn pen(&self) -> &PenState {
        &self.pen
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn filled_shapes(&self) -> &[FilledShape] {
        self.motion.filled_shapes()
    }

    /// Run one frame of the pipeline: analyze → noise → motion → render.
    ///
    /// Returns the frame's band energies, or `None` when the session is
    /// Idle and the frame was dropped.
    pub fn frame(
        &mut self,
        snapshot: &SpectralSnapshot,
        dt: f32,
        progress: Option<f32>,
        surface: &mut dyn Surface,
    ) -> Option<BandEnergy> {
        if self.state != SchedulerState::Active {
            return None;
        }

        self.elapsed_secs += dt;
        let bands = self.analyzer.analyze(snapshot);
        let noise = self.noise.tick(dt, &mut self.rng);

        let ctx = StepContext {
            bands,
            noise,
            dt,
            elapsed_secs: self.elapsed_secs,
            progress,
            viewport: self.viewport,
        };
        self.motion.step(&mut self.pen, &ctx, &mut self.rng, surface);
        self.frames += 1;

        Some(bands)
    }

    /// Viewport change notification: recenter the pen with a fresh heading
    /// and rebuild variant spatial state so no stale coordinate can land
    /// outside the new bounds.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.pen.recenter(viewport);
        self.pen.angle = self.rng.random::<f32>() * std::f32::consts::TAU;
        self.motion.reset(viewport, &mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingSurface;

    const BINS: usize = 512;

    fn session(variant: Variant) -> Session {
        Session::new(variant, Viewport::new(800.0, 600.0), BINS, 42).unwrap()
    }

    fn loud_bass_snapshot() -> SpectralSnapshot {
        let mut bins = vec![0u8; BINS];
        for bin in bins.iter_mut().take(10) {
            *bin = 255;
        }
        SpectralSnapshot::new(bins)
    }

    #[test]
    fn frames_are_dropped_while_idle() {
        let mut s = session(Variant::Drift);
        let mut surface = RecordingSurface::new();
        let snapshot = SpectralSnapshot::silent(BINS);

        assert!(s.frame(&snapshot, 0.016, None, &mut surface).is_none());
        assert_eq!(s.frames(), 0);

        s.start();
        assert!(s.frame(&snapshot, 0.016, None, &mut surface).is_some());
        assert_eq!(s.frames(), 1);

        // A late callback after stop is a no-op, not an error
        s.stop();
        assert!(s.frame(&snapshot, 0.016, None, &mut surface).is_none());
        assert_eq!(s.frames(), 1);
    }

    #[test]
    fn band_ranges_are_validated_at_setup() {
        // Drift reads bins up to 200; a small-resolution snapshot has 128
        let err = Session::new(Variant::Drift, Viewport::new(800.0, 600.0), 128, 1).unwrap_err();
        assert!(matches!(err, EngineError::BandOutOfRange { .. }));

        // Free-roam only reads up to bin 100 and is fine with 128
        assert!(Session::new(Variant::FreeRoam, Viewport::new(800.0, 600.0), 128, 1).is_ok());
    }

    #[test]
    fn empty_viewport_is_rejected() {
        let err = Session::new(Variant::Drift, Viewport::new(0.0, 600.0), BINS, 1).unwrap_err();
        assert!(matches!(err, EngineError::EmptyViewport { .. }));
    }

    #[test]
    fn trajectories_are_reproducible_with_equal_seeds() {
        let trajectory = |seed: u64| {
            let mut s =
                Session::new(Variant::Drift, Viewport::new(800.0, 600.0), BINS, seed).unwrap();
            s.start();
            let mut surface = RecordingSurface::new();
            let loud = loud_bass_snapshot();
            let silent = SpectralSnapshot::silent(BINS);
            let mut points = Vec::new();
            for frame in 0..500 {
                let snapshot = if frame % 3 == 0 { &loud } else { &silent };
                let dt = if frame % 2 == 0 { 0.016 } else { 0.021 };
                s.frame(snapshot, dt, None, &mut surface);
                points.push(s.pen().position());
            }
            points
        };

        assert_eq!(trajectory(7), trajectory(7));
        assert_ne!(trajectory(7), trajectory(8));
    }

    #[test]
    fn loud_bass_reads_as_full_scale_energy() {
        let mut s = session(Variant::Drift);
        s.start();
        let mut surface = RecordingSurface::new();
        let bands = s
            .frame(&loud_bass_snapshot(), 0.016, None, &mut surface)
            .unwrap();
        assert_eq!(bands.bass, 1.0);
        assert_eq!(bands.music_energy, 3.0);
    }

    #[test]
    fn all_variants_keep_the_pen_in_bounds() {
        for variant in [Variant::FreeRoam, Variant::Drift, Variant::Grid] {
            let mut s = session(variant);
            s.start();
            let mut surface = RecordingSurface::new();
            let loud = loud_bass_snapshot();
            for _ in 0..2_000 {
                s.frame(&loud, 0.016, Some(0.5), &mut surface);
                let pen = s.pen();
                assert!((0.0..=800.0).contains(&pen.x), "{variant:?}: x={}", pen.x);
                assert!((0.0..=600.0).contains(&pen.y), "{variant:?}: y={}", pen.y);
            }
        }
    }

    #[test]
    fn resize_recenters_without_errors() {
        for variant in [Variant::FreeRoam, Variant::Drift, Variant::Grid] {
            let mut s = session(variant);
            s.start();
            let mut surface = RecordingSurface::new();
            let loud = loud_bass_snapshot();
            for _ in 0..50 {
                s.frame(&loud, 0.016, None, &mut surface);
            }

            s.resize(Viewport::new(300.0, 200.0));
            assert_eq!(s.pen().position(), (150.0, 100.0));

            // The session keeps running against the new bounds
            for _ in 0..200 {
                s.frame(&loud, 0.016, None, &mut surface);
                assert!((0.0..=300.0).contains(&s.pen().x));
                assert!((0.0..=200.0).contains(&s.pen().y));
            }
        }
    }

    #[test]
    fn grid_session_exposes_its_shape_log() {
        let mut s = session(Variant::Grid);
        s.start();
        let mut surface = RecordingSurface::new();
        let loud = loud_bass_snapshot();
        for _ in 0..2_000 {
            s.frame(&loud, 0.016, None, &mut surface);
        }
        // shape chance at energy 3.0 is 0.07 per frame; 2000 frames make
        // a dry run vanishingly unlikely
        assert!(!s.filled_shapes().is_empty());
        assert!(session(Variant::Drift).filled_shapes().is_empty());
    }
}

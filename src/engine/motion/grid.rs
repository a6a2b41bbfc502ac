use rand::Rng;

use super::StepContext;
use crate::engine::pen::{FilledShape, GridLattice, PenState, ShapeKind};
use crate::engine::Viewport;
use crate::render::{Stroke, Surface, INK};

/// Stroke opacity for grid segments.
const SEGMENT_ALPHA: f32 = 0.8;
/// Fill opacity for decorative shapes.
const SHAPE_ALPHA: f32 = 0.2;
const GRIDLINE_ALPHA: f32 = 0.25;

/// Tunables of the grid-snap variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Cells per axis.
    pub divisor: usize,
    /// Bounds jitter applied to each cell rect, in pixels.
    pub cell_jitter: f32,
    /// Chance of a straight segment instead of a curve; energy adds on top.
    pub straight_floor: f32,
    pub straight_energy_gain: f32,
    pub shape_floor: f32,
    pub shape_energy_gain: f32,
    pub gridline_floor: f32,
    pub gridline_energy_gain: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            divisor: 4,
            cell_jitter: 6.0,
            straight_floor: 0.7,
            straight_energy_gain: 0.1,
            shape_floor: 0.01,
            shape_energy_gain: 0.02,
            gridline_floor: 0.0005,
            gridline_energy_gain: 0.001,
        }
    }
}

/// Grid snap: axis-aligned steps over a jittered cell lattice, mostly
/// straight strokes, with occasional filled shapes and full-span gridlines.
#[derive(Debug)]
pub struct GridMotion {
    config: GridConfig,
    lattice: GridLattice,
    shapes: Vec<FilledShape>,
}

impl GridMotion {
    pub fn new(config: GridConfig, viewport: Viewport, rng: &mut impl Rng) -> Self {
        let lattice = GridLattice::new(viewport, config.divisor, config.cell_jitter, rng);
        Self {
            config,
            lattice,
            shapes: Vec::new(),
        }
    }

    pub fn lattice(&self) -> &GridLattice {
        &self.lattice
    }

    /// Shapes emitted so far. Append-only; later frames never read it.
    pub fn shapes(&self) -> &[FilledShape] {
        &self.shapes
    }

    pub fn step(
        &mut self,
        pen: &mut PenState,
        ctx: &StepContext,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
    ) {
        let energy = ctx.bands.music_energy;
        let (width, height) = (ctx.viewport.width, ctx.viewport.height);

        pen.remember();

        // One axis-aligned step per frame
        let step = (10.0 + energy * 20.0) * ctx.dt * 20.0;
        let signed = if rng.random::<f32>() < 0.5 { step } else { -step };
        if rng.random::<f32>() < 0.5 {
            pen.x += signed;
        } else {
            pen.y += signed;
        }
        pen.x += (rng.random::<f32>() - 0.5) * 2.0 * ctx.noise;
        pen.y += (rng.random::<f32>() - 0.5) * 2.0 * ctx.noise;

        pen.x = pen.x.clamp(0.0, width);
        pen.y = pen.y.clamp(0.0, height);

        self.lattice.mark_active(pen.x, pen.y, ctx.elapsed_secs);

        self.segment(pen, ctx, energy, rng, surface);

        if rng.random::<f32>() < self.config.shape_floor + energy * self.config.shape_energy_gain {
            self.emit_shape(pen, rng, surface);
        }

        if rng.random::<f32>()
            < self.config.gridline_floor + energy * self.config.gridline_energy_gain
        {
            self.gridline(ctx, rng, surface);
        }
    }

    fn segment(
        &self,
        pen: &PenState,
        ctx: &StepContext,
        energy: f32,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
    ) {
        // Thin strokes dominate; now and then a heavy one
        let width = if rng.random::<f32>() < 0.85 {
            0.8 + rng.random::<f32>() * 0.7
        } else {
            2.5 + rng.random::<f32>() * 2.0
        };
        let stroke = Stroke::ink(width, SEGMENT_ALPHA);

        let straight_chance = self.config.straight_floor + energy * self.config.straight_energy_gain;
        if rng.random::<f32>() < straight_chance {
            surface.stroke_line(pen.prev_position(), pen.position(), stroke);
        } else {
            let ctrl = (
                pen.prev_x + (pen.x - pen.prev_x) * 0.5 + (rng.random::<f32>() - 0.5) * 8.0 * ctx.noise,
                pen.prev_y + (pen.y - pen.prev_y) * 0.5 + (rng.random::<f32>() - 0.5) * 8.0 * ctx.noise,
            );
            surface.stroke_quadratic(pen.prev_position(), ctrl, pen.position(), stroke);
        }
    }

    /// Emit one decorative filled shape centered at the pen and log it.
    fn emit_shape(&mut self, pen: &PenState, rng: &mut impl Rng, surface: &mut dyn Surface) {
        let (cx, cy) = pen.position();
        let (kind, points) = match rng.random_range(0..3u32) {
            0 => {
                let half_w = rng.random_range(10.0..40.0);
                let half_h = rng.random_range(10.0..40.0);
                (
                    ShapeKind::Rect,
                    vec![
                        (cx - half_w, cy - half_h),
                        (cx + half_w, cy - half_h),
                        (cx + half_w, cy + half_h),
                        (cx - half_w, cy + half_h),
                    ],
                )
            }
            1 => {
                let radius = rng.random_range(10.0..40.0);
                (
                    ShapeKind::Diamond,
                    vec![
                        (cx, cy - radius),
                        (cx + radius, cy),
                        (cx, cy + radius),
                        (cx - radius, cy),
                    ],
                )
            }
            _ => {
                let count = rng.random_range(3..=6usize);
                let base_radius: f32 = rng.random_range(10.0..40.0);
                let points = (0..count)
                    .map(|i| {
                        let angle = std::f32::consts::TAU * i as f32 / count as f32;
                        // Per-point radius jitter keeps the outline irregular
                        let radius = base_radius * (0.7 + rng.random::<f32>() * 0.6);
                        (cx + angle.cos() * radius, cy + angle.sin() * radius)
                    })
                    .collect();
                (ShapeKind::Irregular, points)
            }
        };

        surface.fill_polygon(&points, INK, SHAPE_ALPHA);
        self.shapes.push(FilledShape { kind, points });
    }

    /// A full-span ruled line at a random offset, independent of the pen.
    fn gridline(&self, ctx: &StepContext, rng: &mut impl Rng, surface: &mut dyn Surface) {
        let (width, height) = (ctx.viewport.width, ctx.viewport.height);
        let stroke = Stroke::ink(1.0, GRIDLINE_ALPHA);
        if rng.random::<f32>() < 0.5 {
            let y = rng.random::<f32>() * height;
            surface.stroke_line((0.0, y), (width, y), stroke);
        } else {
            let x = rng.random::<f32>() * width;
            surface.stroke_line((x, 0.0), (x, height), stroke);
        }
    }

    /// Rebuild the lattice for a new viewport. The shape log is kept; it is
    /// a record, not live state.
    pub fn reset(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        self.lattice = GridLattice::new(viewport, self.config.divisor, self.config.cell_jitter, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bands::BandEnergy;
    use crate::render::recording::{Op, RecordingSurface};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context(bands: BandEnergy) -> StepContext {
        StepContext {
            bands,
            noise: 1.0,
            dt: 1.0 / 60.0,
            elapsed_secs: 2.0,
            progress: None,
            viewport: Viewport::new(800.0, 600.0),
        }
    }

    fn loud() -> BandEnergy {
        BandEnergy {
            bass: 1.0,
            mid: 0.0,
            high: 0.0,
            music_energy: 3.0,
        }
    }

    #[test]
    fn pen_stays_inside_canvas() {
        let mut rng = StdRng::seed_from_u64(17);
        let viewport = Viewport::new(800.0, 600.0);
        let mut motion = GridMotion::new(GridConfig::default(), viewport, &mut rng);
        let mut pen = PenState::centered(viewport, 0.0);
        let mut surface = RecordingSurface::new();
        let ctx = context(loud());
        for _ in 0..5_000 {
            motion.step(&mut pen, &ctx, &mut rng, &mut surface);
            assert!((0.0..=800.0).contains(&pen.x));
            assert!((0.0..=600.0).contains(&pen.y));
        }
    }

    #[test]
    fn movement_is_axis_aligned_up_to_jitter() {
        let mut rng = StdRng::seed_from_u64(17);
        let viewport = Viewport::new(800.0, 600.0);
        let mut motion = GridMotion::new(GridConfig::default(), viewport, &mut rng);
        let mut pen = PenState::centered(viewport, 0.0);
        let mut surface = RecordingSurface::new();
        let ctx = context(loud());
        for _ in 0..200 {
            motion.step(&mut pen, &ctx, &mut rng, &mut surface);
            let dx = (pen.x - pen.prev_x).abs();
            let dy = (pen.y - pen.prev_y).abs();
            // The stepped axis moves far, the other only by jitter (≤ noise)
            assert!(dx.min(dy) <= 1.0 + 1e-3);
        }
    }

    #[test]
    fn visited_cells_become_active() {
        let mut rng = StdRng::seed_from_u64(17);
        let viewport = Viewport::new(800.0, 600.0);
        let mut motion = GridMotion::new(GridConfig::default(), viewport, &mut rng);
        let mut pen = PenState::centered(viewport, 0.0);
        let mut surface = RecordingSurface::new();
        let ctx = context(loud());
        for _ in 0..100 {
            motion.step(&mut pen, &ctx, &mut rng, &mut surface);
        }
        assert!(motion.lattice().cells().iter().any(|c| c.active));
    }

    #[test]
    fn shapes_are_logged_when_the_trigger_fires() {
        let mut rng = StdRng::seed_from_u64(17);
        let viewport = Viewport::new(800.0, 600.0);
        let mut motion = GridMotion::new(
            GridConfig {
                // Force a shape every frame, silence the other triggers
                shape_floor: 1.1,
                gridline_floor: 0.0,
                gridline_energy_gain: 0.0,
                ..GridConfig::default()
            },
            viewport,
            &mut rng,
        );
        let mut pen = PenState::centered(viewport, 0.0);
        let mut surface = RecordingSurface::new();
        let ctx = context(BandEnergy::silent());
        for _ in 0..20 {
            motion.step(&mut pen, &ctx, &mut rng, &mut surface);
        }
        assert_eq!(motion.shapes().len(), 20);
        for shape in motion.shapes() {
            assert!(shape.points.len() >= 3);
            assert!(shape.points.len() <= 6);
        }
        let fills = surface
            .ops
            .iter()
            .filter(|op| matches!(op, Op::FillPolygon { .. }))
            .count();
        assert_eq!(fills, 20);
    }

    #[test]
    fn triggers_stay_at_their_floor_in_silence() {
        let mut rng = StdRng::seed_from_u64(29);
        let viewport = Viewport::new(800.0, 600.0);
        let mut motion = GridMotion::new(GridConfig::default(), viewport, &mut rng);
        let mut pen = PenState::centered(viewport, 0.0);
        let mut surface = RecordingSurface::new();
        let ctx = context(BandEnergy::silent());
        for _ in 0..2_000 {
            motion.step(&mut pen, &ctx, &mut rng, &mut surface);
        }
        // shape floor 0.01 → ~20 expected; gridline floor 0.0005 → ~1
        assert!(motion.shapes().len() < 60);
        let gridlines = surface
            .ops
            .iter()
            .filter(|op| match op {
                Op::Line { from, to, .. } => {
                    (from.0 == 0.0 && to.0 == 800.0) || (from.1 == 0.0 && to.1 == 600.0)
                }
                _ => false,
            })
            .count();
        assert!(gridlines < 10);
    }

    #[test]
    fn reset_rebuilds_the_lattice_and_keeps_the_shape_log() {
        let mut rng = StdRng::seed_from_u64(17);
        let viewport = Viewport::new(800.0, 600.0);
        let mut motion = GridMotion::new(
            GridConfig {
                shape_floor: 1.1,
                ..GridConfig::default()
            },
            viewport,
            &mut rng,
        );
        let mut pen = PenState::centered(viewport, 0.0);
        let mut surface = RecordingSurface::new();
        let ctx = context(BandEnergy::silent());
        motion.step(&mut pen, &ctx, &mut rng, &mut surface);
        assert_eq!(motion.shapes().len(), 1);

        motion.reset(Viewport::new(400.0, 400.0), &mut rng);
        assert_eq!(motion.lattice().cells().len(), 16);
        assert_eq!(motion.shapes().len(), 1);
        assert!(motion.lattice().cells().iter().all(|c| !c.active));
    }
}

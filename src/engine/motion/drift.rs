use rand::Rng;

use super::StepContext;
use crate::engine::pen::PenState;
use crate::render::{Stroke, Surface};

/// How far inside the canvas the pen is placed when it hits an edge.
const EDGE_MARGIN: f32 = 2.0;
/// Timeline overlay geometry, anchored to the bottom-right corner.
const TIMELINE_WIDTH: f32 = 200.0;
const TIMELINE_HEIGHT: f32 = 2.0;
const TIMELINE_PADDING: f32 = 20.0;

/// Tunables of the continuous-drift variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftConfig {
    /// Dash probability floor; the energy term is added on top.
    pub dash_floor: f32,
    pub dash_energy_gain: f32,
    /// Minimum inter-frame displacement before any ink is laid down.
    pub draw_threshold: f32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            dash_floor: 0.0002,
            dash_energy_gain: 0.0005,
            draw_threshold: 0.2,
        }
    }
}

/// Continuous drift: permanent ink, heading driven by elapsed time and
/// music energy, noise-scaled jitter, and a rare straight-dash event that
/// lifts the pen and drops it elsewhere.
#[derive(Debug)]
pub struct DriftMotion {
    config: DriftConfig,
}

impl DriftMotion {
    pub fn new(config: DriftConfig) -> Self {
        Self { config }
    }

    pub fn step(
        &mut self,
        pen: &mut PenState,
        ctx: &StepContext,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
    ) {
        let energy = ctx.bands.music_energy;
        let bass = ctx.bands.bass;
        let (width, height) = (ctx.viewport.width, ctx.viewport.height);

        pen.remember();

        // Heading winds forward with time; energy speeds the winding up
        let angle = ctx.elapsed_secs * 1000.0 * 0.01 * (0.1 + energy * 0.3);
        let radius = 0.5 + energy * 3.0;
        pen.angle = angle;
        pen.speed = radius;
        pen.x += angle.cos() * radius * ctx.dt * 20.0;
        pen.y += angle.sin() * radius * ctx.dt * 20.0;

        // Jitter in both directions, scaled by bass and the noise process
        pen.x += (rng.random::<f32>() - 0.5) * 2.0 * bass * ctx.noise;
        pen.y += (rng.random::<f32>() - 0.5) * 2.0 * bass * ctx.noise;

        clamp_inside(pen, width, height);

        // Micro-jitter lays no ink
        if pen.displacement() > self.config.draw_threshold {
            let stroke = Stroke::ink(1.5 + bass * 1.5, 0.6 + energy * 0.4);
            let dash_chance = self.config.dash_floor + energy * self.config.dash_energy_gain;

            if rng.random::<f32>() < dash_chance {
                self.dash(pen, energy, rng, surface, stroke);
                clamp_inside(pen, width, height);
            } else {
                self.curve(pen, ctx, energy, rng, surface, stroke);
            }
        }

        if let Some(progress) = ctx.progress {
            self.timeline(ctx, progress, energy, rng, surface);
        }
    }

    /// Pen-lift event: one long straight dash at a random angle, after
    /// which the pen continues from the dash's far end.
    fn dash(
        &self,
        pen: &mut PenState,
        energy: f32,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
        stroke: Stroke,
    ) {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let length = 20.0 + rng.random::<f32>() * 80.0 * (1.0 + energy);
        let end = (pen.x + angle.cos() * length, pen.y + angle.sin() * length);

        surface.stroke_line(pen.position(), end, stroke);

        pen.remember();
        pen.x = end.0;
        pen.y = end.1;
    }

    fn curve(
        &self,
        pen: &PenState,
        ctx: &StepContext,
        energy: f32,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
        stroke: Stroke,
    ) {
        let ctrl_x = pen.prev_x
            + (pen.x - pen.prev_x) * 0.5
            + (rng.random::<f32>() - 0.5) * 0.1 * energy * ctx.noise;
        let ctrl_y = pen.prev_y
            + (pen.y - pen.prev_y) * 0.5
            + 0.1 * energy * (1.0 + (rng.random::<f32>() - 0.5) * ctx.noise * 0.5);
        surface.stroke_quadratic(pen.prev_position(), (ctrl_x, ctrl_y), pen.position(), stroke);
    }

    /// Bottom-right progress timeline: background bar, proportional
    /// progress bar, and energy-scaled tick noise.
    fn timeline(
        &self,
        ctx: &StepContext,
        progress: f32,
        energy: f32,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
    ) {
        let (width, height) = (ctx.viewport.width, ctx.viewport.height);
        let progress = progress.clamp(0.0, 1.0);
        let left = width - TIMELINE_PADDING - TIMELINE_WIDTH;
        let y = height - TIMELINE_PADDING - 5.0;

        surface.stroke_line(
            (left, y),
            (width - TIMELINE_PADDING, y),
            Stroke::ink(TIMELINE_HEIGHT, 0.3),
        );
        surface.stroke_line(
            (left, y),
            (left + TIMELINE_WIDTH * progress, y),
            Stroke::ink(TIMELINE_HEIGHT, 0.85),
        );

        if energy > 0.2 {
            let ticks = (5.0 + energy * 10.0) as usize;
            let stroke = Stroke::ink(1.0, 0.4 * energy);
            for _ in 0..ticks {
                let x = left + rng.random::<f32>() * TIMELINE_WIDTH * progress;
                let tip = y + (rng.random::<f32>() - 0.5) * 6.0 * ctx.noise;
                surface.stroke_line((x, y), (x, tip), stroke);
            }
        }
    }
}

fn clamp_inside(pen: &mut PenState, width: f32, height: f32) {
    if pen.x < 0.0 {
        pen.x = EDGE_MARGIN;
    } else if pen.x > width {
        pen.x = width - EDGE_MARGIN;
    }
    if pen.y < 0.0 {
        pen.y = EDGE_MARGIN;
    } else if pen.y > height {
        pen.y = height - EDGE_MARGIN;
    }
}

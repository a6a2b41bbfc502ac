use rand::Rng;

use super::StepContext;
use crate::engine::pen::{PenState, TrailHistory};
use crate::render::{Stroke, Surface, PAGE};

/// Tunables of the free-roam variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeRoamConfig {
    /// Heading wobble per frame, scaled down further at low amplitude.
    pub wobble: f32,
    /// Speed gained per unit of amplitude on top of the base speed of 1.
    pub speed_gain: f32,
    pub history_cap: usize,
    /// Opacity of the per-frame page overlay that fades old ink away.
    pub fade_alpha: f32,
    pub stroke_width: f32,
}

impl Default for FreeRoamConfig {
    fn default() -> Self {
        Self {
            wobble: 0.02,
            speed_gain: 6.0,
            history_cap: 200,
            fade_alpha: 0.08,
            stroke_width: 2.0,
        }
    }
}

/// Free-roam: a heading/speed pen with bounded history, reflected off the
/// canvas edges, drawn each frame as a polyline over a translucent page
/// overlay. The trail fades instead of accumulating.
#[derive(Debug)]
pub struct FreeRoamMotion {
    config: FreeRoamConfig,
    history: TrailHistory,
}

impl FreeRoamMotion {
    pub fn new(config: FreeRoamConfig) -> Self {
        let history = TrailHistory::new(config.history_cap);
        Self { config, history }
    }

    pub fn history(&self) -> &TrailHistory {
        &self.history
    }

    pub fn step(
        &mut self,
        pen: &mut PenState,
        ctx: &StepContext,
        rng: &mut impl Rng,
        surface: &mut dyn Surface,
    ) {
        let amplitude = ctx.bands.music_energy;

        pen.speed = 1.0 + amplitude * self.config.speed_gain;
        // Wobble shrinks with amplitude: smooth in quiet passages, lively
        // in loud ones
        pen.angle += (rng.random::<f32>() - 0.5) * self.config.wobble * amplitude;

        pen.remember();
        pen.x += pen.angle.cos() * pen.speed;
        pen.y += pen.angle.sin() * pen.speed;

        self.bounce(pen, ctx);
        self.history.push(pen.position());

        surface.fade(PAGE, self.config.fade_alpha);
        if self.history.len() > 1 {
            surface.stroke_polyline(
                self.history.points(),
                Stroke::ink(self.config.stroke_width, 1.0),
            );
        }
    }

    /// Reflect off canvas edges, nudging 2 px inside so the pen cannot
    /// stick to a boundary.
    fn bounce(&self, pen: &mut PenState, ctx: &StepContext) {
        let (width, height) = (ctx.viewport.width, ctx.viewport.height);
        if pen.x < 0.0 || pen.x > width {
            pen.angle = std::f32::consts::PI - pen.angle;
            pen.x = if pen.x < 0.0 { 2.0 } else { width - 2.0 };
        }
        if pen.y < 0.0 || pen.y > height {
            pen.angle = -pen.angle;
            pen.y = if pen.y < 0.0 { 2.0 } else { height - 2.0 };
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

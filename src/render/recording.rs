use super::{Color, Stroke, Surface};

/// A drawing operation captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Line {
        from: (f32, f32),
        to: (f32, f32),
        stroke: Stroke,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        stroke: Stroke,
    },
    Quadratic {
        from: (f32, f32),
        ctrl: (f32, f32),
        to: (f32, f32),
        stroke: Stroke,
    },
    Arc {
        center: (f32, f32),
        radius: f32,
        stroke: Stroke,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        alpha: f32,
    },
    FillPolygon {
        points: Vec<(f32, f32)>,
        alpha: f32,
    },
    Fade {
        alpha: f32,
    },
}

/// Surface that records operations instead of rasterizing them.
///
/// Useful for inspecting what a session emits without a pixel buffer.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), stroke: Stroke) {
        self.ops.push(Op::Line { from, to, stroke });
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: Stroke) {
        self.ops.push(Op::Polyline {
            points: points.to_vec(),
            stroke,
        });
    }

    fn stroke_quadratic(
        &mut self,
        from: (f32, f32),
        ctrl: (f32, f32),
        to: (f32, f32),
        stroke: Stroke,
    ) {
        self.ops.push(Op::Quadratic {
            from,
            ctrl,
            to,
            stroke,
        });
    }

    fn stroke_arc(
        &mut self,
        center: (f32, f32),
        radius: f32,
        _start_angle: f32,
        _end_angle: f32,
        stroke: Stroke,
    ) {
        self.ops.push(Op::Arc {
            center,
            radius,
            stroke,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, _color: Color, alpha: f32) {
        self.ops.push(Op::FillRect { x, y, w, h, alpha });
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], _color: Color, alpha: f32) {
        self.ops.push(Op::FillPolygon {
            points: points.to_vec(),
            alpha,
        });
    }

    fn fade(&mut self, _color: Color, alpha: f32) {
        self.ops.push(Op::Fade { alpha });
    }
}

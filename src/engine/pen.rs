use rand::Rng;

use super::Viewport;

/// Mutable pen simulation state shared by all motion variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenState {
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    pub angle: f32,
    pub speed: f32,
}

impl PenState {
    /// Pen centered on the canvas with the given initial heading.
    pub fn centered(viewport: Viewport, angle: f32) -> Self {
        let (cx, cy) = viewport.center();
        Self {
            x: cx,
            y: cy,
            prev_x: cx,
            prev_y: cy,
            angle,
            speed: 1.0,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn prev_position(&self) -> (f32, f32) {
        (self.prev_x, self.prev_y)
    }

    /// Save the current position as the previous one before moving.
    pub fn remember(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;
    }

    /// Inter-frame displacement in pixels.
    pub fn displacement(&self) -> f32 {
        let dx = self.x - self.prev_x;
        let dy = self.y - self.prev_y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn recenter(&mut self, viewport: Viewport) {
        let (cx, cy) = viewport.center();
        self.x = cx;
        self.y = cy;
        self.prev_x = cx;
        self.prev_y = cy;
    }
}

/// Bounded FIFO of recent pen positions.
#[derive(Debug, Clone)]
pub struct TrailHistory {
    points: Vec<(f32, f32)>,
    cap: usize,
}

impl TrailHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            points: Vec::with_capacity(cap),
            cap,
        }
    }

    /// Append a position, evicting the oldest once over capacity.
    pub fn push(&mut self, point: (f32, f32)) {
        self.points.push(point);
        if self.points.len() > self.cap {
            self.points.remove(0);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// One spatial bucket of the grid variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub active: bool,
    pub last_active_secs: f32,
}

/// The precomputed cell set the grid variant walks over.
///
/// Cell bounds carry a per-cell jitter so the lattice reads as hand-ruled
/// rather than mechanical; indexing still uses the unjittered spacing.
#[derive(Debug, Clone)]
pub struct GridLattice {
    cells: Vec<GridCell>,
    cols: usize,
    rows: usize,
    cell_width: f32,
    cell_height: f32,
}

impl GridLattice {
    pub fn new(viewport: Viewport, divisor: usize, jitter: f32, rng: &mut impl Rng) -> Self {
        let cols = divisor;
        let rows = divisor;
        let cell_width = viewport.width / cols as f32;
        let cell_height = viewport.height / rows as f32;

        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(GridCell {
                    x: col as f32 * cell_width + rng.random_range(-jitter..=jitter),
                    y: row as f32 * cell_height + rng.random_range(-jitter..=jitter),
                    width: cell_width + rng.random_range(-jitter..=jitter),
                    height: cell_height + rng.random_range(-jitter..=jitter),
                    active: false,
                    last_active_secs: 0.0,
                });
            }
        }

        Self {
            cells,
            cols,
            rows,
            cell_width,
            cell_height,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Flat cell index (`row * cols + col`) for a canvas position.
    pub fn index_of(&self, x: f32, y: f32) -> usize {
        let col = (x / self.cell_width).floor() as usize;
        let row = (y / self.cell_height).floor() as usize;
        row * self.cols + col
    }

    /// Mark the cell under the pen active. An index outside the cell array
    /// is a no-op; motion carries on without the bookkeeping.
    pub fn mark_active(&mut self, x: f32, y: f32, elapsed_secs: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let index = self.index_of(x, y);
        if let Some(cell) = self.cells.get_mut(index) {
            cell.active = true;
            cell.last_active_secs = elapsed_secs;
        }
    }
}

/// Kind of decorative filled shape the grid variant can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Diamond,
    Irregular,
}

/// Append-only record of an emitted decorative shape. Later frames never
/// consult it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledShape {
    pub kind: ShapeKind,
    pub points: Vec<(f32, f32)>,
}

use liblife::pos::Position;

pub const PIXEL_BYTES: usize = 4;

/// An RGBA frame buffer borrowed from pixels for the duration of one redraw.
pub struct RenderFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub buffer: &'a mut [u8],
}

impl RenderFrame<'_> {
    pub fn fill(&mut self, color: [u8; PIXEL_BYTES]) {
        for pixel in self.buffer.chunks_exact_mut(PIXEL_BYTES) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Fills a rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: [u8; PIXEL_BYTES]) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);

        if x >= x_end || y >= y_end {
            return;
        }

        let row_bytes = self.width as usize * PIXEL_BYTES;

        for row in y as usize..y_end as usize {
            let start = row * row_bytes + x as usize * PIXEL_BYTES;
            let end = row * row_bytes + x_end as usize * PIXEL_BYTES;

            // The buffer lags behind the window size for a frame after a resize.
            let Some(span) = self.buffer.get_mut(start..end) else {
                return;
            };

            for pixel in span.chunks_exact_mut(PIXEL_BYTES) {
                pixel.copy_from_slice(&color);
            }
        }
    }
}

/// Maps grid cells to frame pixels. Cells are square-ish tiles anchored at the
/// top-left corner; leftover pixels on the right and bottom stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLayout {
    pub columns: usize,
    pub rows: usize,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl CellLayout {
    pub fn new(frame_width: u32, frame_height: u32, columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cell_width: (frame_width / columns.max(1) as u32).max(1),
            cell_height: (frame_height / rows.max(1) as u32).max(1),
        }
    }

    pub fn cell_origin(&self, pos: Position) -> (u32, u32) {
        (
            pos.x as u32 * self.cell_width,
            pos.y as u32 * self.cell_height,
        )
    }

    /// The cell under a point in physical pixels, if any.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<Position> {
        if x < 0.0 || y < 0.0 {
            return None;
        }

        let pos = Position {
            x: (x as u32 / self.cell_width) as usize,
            y: (y as u32 / self.cell_height) as usize,
        };

        (pos.x < self.columns && pos.y < self.rows).then_some(pos)
    }
}

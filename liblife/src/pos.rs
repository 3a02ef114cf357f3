/// A direct (non-wrapping) cell address. `x` is the column, `y` is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

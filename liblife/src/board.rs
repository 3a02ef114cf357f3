use rand::Rng;

use crate::{
    error::{GameError, Result},
    pos::Position,
    rule,
};

pub const MIN_DIMENSION: usize = 2;
pub const MAX_DIMENSION: usize = 100;

const NEIGHBOR_RELATIVE_POSITIONS: [[isize; 2]; 8] = [
    [-1, -1],
    [-1, 0],
    [-1, 1],
    [0, -1],
    [0, 1],
    [1, -1],
    [1, 0],
    [1, 1],
];

/// How a freshly created grid is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Dead,
    Uniform(TileState),
    /// Each cell is independently alive with probability 1/2.
    Random,
}

/// A toroidal grid of `columns x rows` cells, addressed as `(x, y)` with `x` the column.
///
/// Reads through [`Grid::get`] wrap on both axes so the grid has no edges.
/// Writes are direct and bounds-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    tiles: Vec<TileState>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize, fill: Fill) -> Result<Self> {
        Self::new_with(rows, columns, fill, &mut rand::rng())
    }

    pub fn new_random_with<R>(rows: usize, columns: usize, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        Self::new_with(rows, columns, Fill::Random, rng)
    }

    fn new_with<R>(rows: usize, columns: usize, fill: Fill, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        check_dimensions(rows, columns)?;

        Ok(Self {
            rows,
            columns,
            tiles: filled_tiles(rows * columns, fill, rng),
        })
    }

    /// A grid of the same dimensions with every cell replaced according to `fill`.
    pub fn refilled(&self, fill: Fill) -> Grid {
        Grid {
            rows: self.rows,
            columns: self.columns,
            tiles: filled_tiles(self.tiles.len(), fill, &mut rand::rng()),
        }
    }

    /// Builds a grid from row-major tiles (`index = x + y * columns`).
    pub fn with_tiles(rows: usize, columns: usize, tiles: Vec<TileState>) -> Result<Self> {
        check_dimensions(rows, columns)?;

        if tiles.len() != rows * columns {
            return Err(GameError::MalformedPattern(format!(
                "expected {} cells for a {rows}x{columns} grid, got {}",
                rows * columns,
                tiles.len()
            )));
        }

        Ok(Self {
            rows,
            columns,
            tiles,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The state at `(x, y)` after wrapping both coordinates onto the torus.
    pub fn get(&self, x: isize, y: isize) -> TileState {
        let x = x.rem_euclid(self.columns as isize) as usize;
        let y = y.rem_euclid(self.rows as isize) as usize;

        self.tiles[x + y * self.columns]
    }

    pub fn set(&mut self, x: usize, y: usize, tile: TileState) -> Result<()> {
        *self.tile_mut(x, y)? = tile;
        Ok(())
    }

    /// Flips a single cell and returns its new state.
    pub fn toggle(&mut self, x: usize, y: usize) -> Result<TileState> {
        let tile = self.tile_mut(x, y)?;
        *tile = tile.toggled();
        Ok(*tile)
    }

    /// Sums the eight Moore-neighborhood samples around `(x, y)`.
    ///
    /// On small grids several offsets wrap onto the same cell; each sample is
    /// counted separately, so a 2x2 grid can report up to 8 live neighbors.
    pub fn count_live_neighbors(&self, x: isize, y: isize) -> usize {
        // Wrapped first so the offsets below cannot overflow.
        let x = x.rem_euclid(self.columns as isize);
        let y = y.rem_euclid(self.rows as isize);

        NEIGHBOR_RELATIVE_POSITIONS
            .iter()
            .filter(|[rel_x, rel_y]| self.get(x + rel_x, y + rel_y).is_alive())
            .count()
    }

    /// Computes the following generation from this one without modifying it.
    pub fn next_generation(&self) -> Grid {
        let next_tiles = self
            .enumerate_tiles()
            .map(|(pos, tile)| {
                let alive_neighbors = self.count_live_neighbors(pos.x as isize, pos.y as isize);
                rule::next_state(*tile, alive_neighbors)
            })
            .collect();

        Grid {
            rows: self.rows,
            columns: self.columns,
            tiles: next_tiles,
        }
    }

    /// All tiles in row-major order together with their positions.
    pub fn enumerate_tiles(&self) -> impl Iterator<Item = (Position, &TileState)> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (self.index_to_pos(index), tile))
    }

    pub fn alive_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_alive()).count()
    }

    fn tile_mut(&mut self, x: usize, y: usize) -> Result<&mut TileState> {
        let index = self.pos_to_index(x, y).ok_or(GameError::OutOfRange {
            x,
            y,
            columns: self.columns,
            rows: self.rows,
        })?;

        Ok(&mut self.tiles[index])
    }

    fn pos_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.columns || y >= self.rows {
            return None;
        }

        Some(x + y * self.columns)
    }

    fn index_to_pos(&self, index: usize) -> Position {
        Position {
            x: index % self.columns,
            y: index / self.columns,
        }
    }
}

fn filled_tiles<R>(len: usize, fill: Fill, rng: &mut R) -> Vec<TileState>
where
    R: Rng + ?Sized,
{
    match fill {
        Fill::Dead => vec![TileState::Dead; len],
        Fill::Uniform(tile) => vec![tile; len],
        Fill::Random => (0..len)
            .map(|_| {
                if rng.random_bool(0.5) {
                    TileState::Alive
                } else {
                    TileState::Dead
                }
            })
            .collect(),
    }
}

pub fn check_dimensions(rows: usize, columns: usize) -> Result<()> {
    let range = MIN_DIMENSION..=MAX_DIMENSION;

    if range.contains(&rows) && range.contains(&columns) {
        Ok(())
    } else {
        Err(GameError::InvalidDimension { rows, columns })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileState {
    Alive,

    #[default]
    Dead,
}

impl TileState {
    pub fn is_alive(self) -> bool {
        self == TileState::Alive
    }

    pub fn toggled(self) -> Self {
        match self {
            TileState::Alive => TileState::Dead,
            TileState::Dead => TileState::Alive,
        }
    }
}

impl From<TileState> for u8 {
    fn from(value: TileState) -> Self {
        match value {
            TileState::Alive => 1,
            TileState::Dead => 0,
        }
    }
}

impl TryFrom<u8> for TileState {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(TileState::Dead),
            1 => Ok(TileState::Alive),
            other => Err(GameError::MalformedPattern(format!(
                "cell value {other} is neither 0 nor 1"
            ))),
        }
    }
}

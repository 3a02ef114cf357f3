//! Pattern persistence.
//!
//! A pattern is a MessagePack blob holding the grid dimensions followed by the
//! cells as one array per column (`cells[x][y]`), each value 0 or 1. The text
//! form is the same blob in standard base64 so patterns can be pasted around.

use std::io::{self, Read, Write};

use base64::{Engine, engine::GeneralPurposeConfig};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    board::{Grid, TileState, check_dimensions},
    error::{GameError, Result},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternData {
    rows: u32,
    columns: u32,
    cells: Vec<Vec<u8>>,
}

impl From<&Grid> for PatternData {
    fn from(grid: &Grid) -> Self {
        let cells = (0..grid.columns())
            .map(|x| {
                (0..grid.rows())
                    .map(|y| u8::from(grid.get(x as isize, y as isize)))
                    .collect()
            })
            .collect();

        Self {
            rows: grid.rows() as u32,
            columns: grid.columns() as u32,
            cells,
        }
    }
}

impl TryFrom<PatternData> for Grid {
    type Error = GameError;

    fn try_from(data: PatternData) -> Result<Self> {
        let PatternData {
            rows,
            columns,
            cells,
        } = data;
        let (rows, columns) = (rows as usize, columns as usize);

        if rows == 0 || columns == 0 {
            return Err(malformed(format!(
                "dimensions {rows}x{columns} must both be positive"
            )));
        }

        check_dimensions(rows, columns)?;

        if cells.len() != columns {
            return Err(malformed(format!(
                "header says {columns} columns but {} were stored",
                cells.len()
            )));
        }

        if !cells.iter().map(Vec::len).all_equal() {
            return Err(malformed("columns have differing lengths"));
        }

        if cells.first().map(Vec::len) != Some(rows) {
            return Err(malformed(format!(
                "header says {rows} rows but columns hold a different count"
            )));
        }

        // Stored column-major, the grid keeps rows contiguous.
        let mut tiles = vec![TileState::Dead; rows * columns];
        for (x, column) in cells.into_iter().enumerate() {
            for (y, value) in column.into_iter().enumerate() {
                tiles[x + y * columns] = TileState::try_from(value)?;
            }
        }

        Grid::with_tiles(rows, columns, tiles)
    }
}

pub fn write<W>(sink: &mut W, grid: &Grid) -> Result<()>
where
    W: Write + ?Sized,
{
    rmp_serde::encode::write(sink, &PatternData::from(grid))
        .map_err(|e| GameError::IoFailure(io::Error::other(e.to_string())))
}

pub fn read<R>(source: R) -> Result<Grid>
where
    R: Read,
{
    let data: PatternData =
        rmp_serde::decode::from_read(source).map_err(|e| malformed(e.to_string()))?;
    Grid::try_from(data)
}

pub fn to_bytes(grid: &Grid) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write(&mut bytes, grid)?;
    Ok(bytes)
}

pub fn to_text(grid: &Grid) -> Result<String> {
    Ok(new_base64_engine().encode(to_bytes(grid)?))
}

pub fn from_text(text: &str) -> Result<Grid> {
    let bytes = new_base64_engine()
        .decode(text.trim())
        .map_err(|e| malformed(e.to_string()))?;

    read(bytes.as_slice())
}

fn malformed(reason: impl Into<String>) -> GameError {
    GameError::MalformedPattern(reason.into())
}

fn new_base64_engine() -> impl Engine {
    base64::engine::GeneralPurpose::new(
        &base64::alphabet::STANDARD,
        GeneralPurposeConfig::default(),
    )
}

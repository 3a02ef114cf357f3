use std::io;

use thiserror::Error;

use crate::board::{MAX_DIMENSION, MIN_DIMENSION};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(
        "grid dimensions {rows}x{columns} (rows x columns) must be within {}..={}",
        MIN_DIMENSION,
        MAX_DIMENSION
    )]
    InvalidDimension { rows: usize, columns: usize },

    #[error("cell ({x}, {y}) is outside the {columns}x{rows} grid")]
    OutOfRange {
        x: usize,
        y: usize,
        columns: usize,
        rows: usize,
    },

    #[error("malformed pattern: {0}")]
    MalformedPattern(String),

    #[error("interval must be a positive number of milliseconds")]
    InvalidInterval,

    #[error("pattern i/o failed: {0}")]
    IoFailure(#[from] io::Error),
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;

use crate::board::TileState;

/// Classic Life (B3/S23): a dead cell with exactly three live neighbors is born,
/// a live cell with two or three live neighbors survives, everything else dies.
pub fn next_state(tile: TileState, alive_neighbors: usize) -> TileState {
    match (tile, alive_neighbors) {
        (TileState::Dead, 3) => TileState::Alive,
        (TileState::Alive, 2 | 3) => TileState::Alive,
        _ => TileState::Dead,
    }
}

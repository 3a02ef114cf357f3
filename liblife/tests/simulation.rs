use std::fs;

use liblife::{
    GameError, Simulation,
    board::{Fill, Grid, TileState},
    pattern,
};
use rand::{SeedableRng, rngs::StdRng};

fn seeded_simulation(rows: usize, columns: usize, seed: u64) -> Simulation {
    let grid = Grid::new_random_with(rows, columns, &mut StdRng::seed_from_u64(seed)).unwrap();
    Simulation::new(grid, 120).unwrap()
}

#[test]
fn toggle_while_running_is_visible_without_stepping() {
    let mut simulation = Simulation::new(Grid::new(8, 8, Fill::Dead).unwrap(), 120).unwrap();
    simulation.toggle_pause();
    assert!(!simulation.is_paused());

    assert_eq!(simulation.toggle_cell(3, 5).unwrap(), TileState::Alive);
    assert_eq!(simulation.grid().get(3, 5), TileState::Alive);
    assert_eq!(simulation.generation(), 0);
    assert!(!simulation.is_paused());
}

#[test]
fn shrinking_resize_discards_previous_pattern() {
    let mut simulation = seeded_simulation(10, 10, 11);
    simulation.toggle_pause();

    simulation.resize(5, 5, false).unwrap();

    assert_eq!(simulation.grid().rows(), 5);
    assert_eq!(simulation.grid().columns(), 5);
    assert_eq!(simulation.grid().alive_count(), 0);
    assert!(simulation.is_paused());
}

#[test]
fn resize_below_minimum_fails_cleanly() {
    let mut simulation = seeded_simulation(10, 10, 12);
    let before = simulation.clone();

    let err = simulation.resize(1, 1, true).unwrap_err();
    assert!(matches!(err, GameError::InvalidDimension { rows: 1, columns: 1 }));
    assert_eq!(simulation, before);
}

#[test]
fn save_then_load_restores_grid_and_pauses() {
    let mut simulation = seeded_simulation(17, 23, 5);
    let saved_grid = simulation.grid().clone();

    let mut blob = Vec::new();
    simulation.save(&mut blob).unwrap();

    simulation.toggle_pause();
    for _ in 0..3 {
        simulation.step();
    }
    assert_ne!(simulation.grid(), &saved_grid);

    simulation.load(blob.as_slice()).unwrap();
    assert_eq!(simulation.grid(), &saved_grid);
    assert!(simulation.is_paused());
    assert_eq!(simulation.generation(), 0);
}

#[test]
fn save_does_not_pause() {
    let mut simulation = seeded_simulation(6, 6, 8);
    simulation.toggle_pause();

    simulation.save(&mut Vec::new()).unwrap();
    assert!(!simulation.is_paused());
}

#[test]
fn failed_load_keeps_existing_grid_and_state() {
    let mut simulation = seeded_simulation(9, 9, 21);
    simulation.toggle_pause();
    simulation.step();
    let before = simulation.clone();

    let err = simulation.load(&b"\x93\x01\x02"[..]).unwrap_err();
    assert!(matches!(err, GameError::MalformedPattern(_)));
    assert_eq!(simulation, before);
}

#[test]
fn file_round_trip_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patterns").join("soup.life");

    let simulation = seeded_simulation(30, 40, 77);
    simulation.save_to_path(&path).unwrap();

    let mut restored = Simulation::new(Grid::new(2, 2, Fill::Dead).unwrap(), 50).unwrap();
    restored.load_from_path(&path).unwrap();
    assert_eq!(restored.grid(), simulation.grid());

    let grid_from_file = pattern::read(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(&grid_from_file, simulation.grid());
}

#[test]
fn loading_a_missing_file_is_an_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut simulation = seeded_simulation(4, 4, 1);
    let before = simulation.clone();

    let err = simulation
        .load_from_path(dir.path().join("nope.life"))
        .unwrap_err();
    assert!(matches!(err, GameError::IoFailure(_)));
    assert_eq!(simulation, before);
}

#[test]
fn text_patterns_load_into_a_simulation() {
    let source = seeded_simulation(12, 7, 4);
    let text = source.export_text().unwrap();
    assert_eq!(&pattern::from_text(&text).unwrap(), source.grid());

    let mut target = seeded_simulation(3, 3, 9);
    target.toggle_pause();
    target.import_text(&text).unwrap();
    assert_eq!(target.grid(), source.grid());
    assert!(target.is_paused());

    let before = target.clone();
    assert!(target.import_text("AAAA").is_err());
    assert_eq!(target, before);
}

#[test]
fn long_run_on_running_simulation_matches_manual_generations() {
    let mut simulation = seeded_simulation(20, 20, 42);
    let mut expected = simulation.grid().clone();

    simulation.toggle_pause();
    for _ in 0..25 {
        assert!(simulation.step());
        expected = expected.next_generation();
    }

    assert_eq!(simulation.grid(), &expected);
    assert_eq!(simulation.generation(), 25);
}

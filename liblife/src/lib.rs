use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use board::{Fill, Grid, TileState};

pub mod board;
pub mod error;
pub mod pattern;
pub mod pos;
pub mod rule;

pub use error::{GameError, Result};

/// Owns the grid together with the run/pause state.
///
/// The simulation starts paused. Only [`Simulation::toggle_pause`] moves it to
/// running; resetting, clearing, resizing and loading all pause it again.
/// Stepping is driven from outside: a caller invokes [`Simulation::step`] on
/// every tick and it does nothing while paused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    grid: Grid,
    paused: bool,
    interval_ms: u64,
    generation: u64,
}

impl Simulation {
    pub fn new(grid: Grid, interval_ms: u64) -> Result<Self> {
        check_interval(interval_ms)?;

        Ok(Self {
            grid,
            paused: true,
            interval_ms,
            generation: 0,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Milliseconds between ticks. Advisory: whoever drives [`Simulation::step`] honors it.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Steps applied since the grid was last replaced by a reset, resize or load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances one generation unless paused. Returns whether it advanced.
    pub fn step(&mut self) -> bool {
        if self.paused {
            return false;
        }

        self.step_once();
        true
    }

    /// Advances one generation regardless of the pause state.
    pub fn step_once(&mut self) {
        self.grid = self.grid.next_generation();
        self.generation += 1;
    }

    /// Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        log::debug!("simulation {}", if self.paused { "paused" } else { "running" });
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn toggle_cell(&mut self, x: usize, y: usize) -> Result<TileState> {
        self.grid.toggle(x, y)
    }

    pub fn set_interval(&mut self, interval_ms: u64) -> Result<()> {
        check_interval(interval_ms)?;
        self.interval_ms = interval_ms;
        Ok(())
    }

    pub fn reset(&mut self, randomize: bool) {
        let grid = self.grid.refilled(fill_for(randomize));
        self.replace_grid(grid);
    }

    pub fn clear(&mut self) {
        self.reset(false);
    }

    /// Replaces the grid with a fresh one of the given size. The previous
    /// pattern is discarded, not cropped.
    pub fn resize(&mut self, rows: usize, columns: usize, randomize: bool) -> Result<()> {
        let grid = Grid::new(rows, columns, fill_for(randomize))?;
        self.replace_grid(grid);
        Ok(())
    }

    pub fn save<W>(&self, sink: &mut W) -> Result<()>
    where
        W: Write + ?Sized,
    {
        pattern::write(sink, &self.grid)
    }

    pub fn load<R>(&mut self, source: R) -> Result<()>
    where
        R: Read,
    {
        let grid = pattern::read(source)?;
        self.replace_grid(grid);
        Ok(())
    }

    /// The grid as a base64 pattern string.
    pub fn export_text(&self) -> Result<String> {
        pattern::to_text(&self.grid)
    }

    pub fn import_text(&mut self, text: &str) -> Result<()> {
        let grid = pattern::from_text(text)?;
        self.replace_grid(grid);
        Ok(())
    }

    /// Saves to a file, creating missing parent directories.
    pub fn save_to_path<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        if let Some(parent_path) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent_path)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer)?;
        writer.flush()?;

        log::debug!(
            "saved {}x{} pattern to {}",
            self.grid.rows(),
            self.grid.columns(),
            path.display()
        );
        Ok(())
    }

    pub fn load_from_path<P>(&mut self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        self.load(reader)?;

        log::debug!(
            "loaded {}x{} pattern from {}",
            self.grid.rows(),
            self.grid.columns(),
            path.display()
        );
        Ok(())
    }

    fn replace_grid(&mut self, grid: Grid) {
        log::debug!("replacing grid with a {}x{} grid", grid.rows(), grid.columns());

        self.grid = grid;
        self.generation = 0;
        self.paused = true;
    }
}

fn fill_for(randomize: bool) -> Fill {
    if randomize { Fill::Random } else { Fill::Dead }
}

fn check_interval(interval_ms: u64) -> Result<()> {
    if interval_ms == 0 {
        Err(GameError::InvalidInterval)
    } else {
        Ok(())
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::SystemTime,
};

use anyhow::Context;
use liblife::{
    Simulation,
    board::{Fill, Grid},
};

use crate::settings::Settings;

pub const PATTERNS_DIR: &str = "patterns";
pub const PATTERN_EXTENSION: &str = "life";

/// Everything the console, ticker and window share behind one lock.
pub struct State {
    pub simulation: Simulation,
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub patterns_dir: PathBuf,
}

impl State {
    /// Starts a session with a randomized grid of the configured size.
    pub fn new<P>(settings: Settings, settings_path: P) -> anyhow::Result<Self>
    where
        P: Into<PathBuf>,
    {
        settings.validate()?;

        let grid = Grid::new(settings.rows, settings.columns, Fill::Random)?;
        let simulation = Simulation::new(grid, settings.interval_ms)?;

        Ok(Self {
            simulation,
            settings,
            settings_path: settings_path.into(),
            patterns_dir: PathBuf::from(PATTERNS_DIR),
        })
    }

    /// Applies new dimensions and interval, re-randomizes the grid and persists the settings.
    pub fn configure(
        &mut self,
        rows: usize,
        columns: usize,
        interval_ms: u64,
    ) -> anyhow::Result<()> {
        self.update_settings(|settings| {
            settings.rows = rows;
            settings.columns = columns;
            settings.interval_ms = interval_ms;
        })?;

        self.simulation.resize(rows, columns, true)?;
        self.simulation.set_interval(interval_ms)?;

        Ok(())
    }

    /// Validates and persists a settings change. Nothing changes if validation fails.
    pub fn update_settings<F>(&mut self, update: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.clone();
        update(&mut settings);
        settings.validate()?;

        settings.save(&self.settings_path)?;
        self.settings = settings;

        Ok(())
    }

    /// Saves the grid under the patterns directory with a timestamped name.
    pub fn quick_save(&self) -> anyhow::Result<PathBuf> {
        let file_name = format!(
            "{}.{PATTERN_EXTENSION}",
            chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let path = self.patterns_dir.join(file_name);

        self.save_pattern(&path)?;
        Ok(path)
    }

    /// Loads the most recently modified pattern from the patterns directory.
    pub fn load_latest(&mut self) -> anyhow::Result<PathBuf> {
        let path = latest_pattern(&self.patterns_dir)?
            .with_context(|| format!("No patterns in {}", self.patterns_dir.display()))?;

        self.load_pattern(&path)?;
        Ok(path)
    }

    pub fn save_pattern(&self, path: &Path) -> anyhow::Result<()> {
        self.simulation
            .save_to_path(path)
            .with_context(|| format!("Couldn't save pattern to {}", path.display()))
    }

    pub fn load_pattern(&mut self, path: &Path) -> anyhow::Result<()> {
        self.simulation
            .load_from_path(path)
            .with_context(|| format!("Couldn't load pattern from {}", path.display()))
    }

    pub fn status_line(&self) -> String {
        let simulation = &self.simulation;
        let grid = simulation.grid();

        format!(
            "Conway's Game of Life | {}x{} | gen {} | pop {} | {} | {} ms",
            grid.columns(),
            grid.rows(),
            simulation.generation(),
            grid.alive_count(),
            if simulation.is_paused() {
                "Paused"
            } else {
                "Running"
            },
            simulation.interval_ms(),
        )
    }

    /// The grid as text, one line per row, `#` for live cells.
    pub fn render_text(&self) -> String {
        let grid = self.simulation.grid();

        (0..grid.rows())
            .map(|y| {
                (0..grid.columns())
                    .map(|x| {
                        if grid.get(x as isize, y as isize).is_alive() {
                            '#'
                        } else {
                            '.'
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Takes the read lock, recovering the guard if another holder panicked.
pub fn read_state(state_lock: &RwLock<State>) -> RwLockReadGuard<'_, State> {
    state_lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Takes the write lock, recovering the guard if another holder panicked.
pub fn write_state(state_lock: &RwLock<State>) -> RwLockWriteGuard<'_, State> {
    state_lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn latest_pattern(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(dir).with_context(|| format!("Couldn't read {}", dir.display()))? {
        let path = entry?.path();

        if path.extension().is_none_or(|ext| ext != PATTERN_EXTENSION) {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        if latest
            .as_ref()
            .is_none_or(|(latest_modified, _)| modified >= *latest_modified)
        {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

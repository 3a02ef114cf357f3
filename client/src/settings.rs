use std::{fs, io, path::Path};

use anyhow::{Context, bail};
use liblife::board::check_dimensions;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub const SETTINGS_PATH: &str = "settings.json";

/// Pixels per cell at the smallest cell size.
const BASE_CELL_PIXELS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rows: usize,
    pub columns: usize,
    pub interval_ms: u64,

    /// Display scale, 1 (small) to 3 (large).
    pub cell_size: u8,
    pub live_color: CellColor,
    pub dead_color: CellColor,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: 24,
            columns: 32,
            interval_ms: 120,
            cell_size: 1,
            live_color: CellColor::White,
            dead_color: CellColor::Black,
        }
    }
}

impl Settings {
    /// Reads settings from `path`, falling back to the defaults when the file doesn't exist yet.
    pub fn load<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        let settings_serialized = match fs::read(path) {
            Ok(serialized) => serialized,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Couldn't read {}", path.display()));
            }
        };

        let settings: Settings =
            serde_json::from_slice(&settings_serialized).context("Couldn't deserialize settings")?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn save<P>(&self, path: P) -> anyhow::Result<()>
    where
        P: AsRef<Path>,
    {
        let settings_serialized =
            serde_json::to_string_pretty(self).context("Couldn't serialize settings")?;

        let path = path.as_ref();
        if let Some(parent_path) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent_path).context("Couldn't create settings directory")?;
        }

        fs::write(path, settings_serialized)
            .with_context(|| format!("Couldn't write {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        check_dimensions(self.rows, self.columns)?;

        if self.interval_ms == 0 {
            bail!("Interval must be a positive number of milliseconds");
        }

        if !(1..=3).contains(&self.cell_size) {
            bail!("Cell size must be between 1 and 3, got {}", self.cell_size);
        }

        if self.dead_color == CellColor::Random {
            bail!("Dead cells need a fixed color");
        }

        Ok(())
    }

    pub fn cell_pixels(&self) -> u32 {
        BASE_CELL_PIXELS * self.cell_size as u32
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum CellColor {
    Black,
    White,
    Grey,
    Green,
    LimeGreen,
    Teal,
    Turquoise,
    Blue,
    NavyBlue,
    SkyBlue,
    Cyan,
    Purple,
    Red,
    Magenta,
    Pink,
    HotPink,
    Yellow,
    Orange,
    Brown,

    /// Every live cell gets its own color from the palette. Not allowed for dead cells.
    Random,
}

impl CellColor {
    /// `None` for [`CellColor::Random`], which has no single color.
    pub fn rgba(self) -> Option<[u8; 4]> {
        let [r, g, b] = match self {
            CellColor::Black => [0, 0, 0],
            CellColor::White => [255, 255, 255],
            CellColor::Grey => [128, 128, 128],
            CellColor::Green => [0, 128, 0],
            CellColor::LimeGreen => [50, 205, 50],
            CellColor::Teal => [0, 128, 128],
            CellColor::Turquoise => [64, 224, 208],
            CellColor::Blue => [0, 0, 255],
            CellColor::NavyBlue => [0, 0, 128],
            CellColor::SkyBlue => [135, 206, 235],
            CellColor::Cyan => [0, 255, 255],
            CellColor::Purple => [160, 32, 240],
            CellColor::Red => [255, 0, 0],
            CellColor::Magenta => [255, 0, 255],
            CellColor::Pink => [255, 192, 203],
            CellColor::HotPink => [255, 105, 180],
            CellColor::Yellow => [255, 255, 0],
            CellColor::Orange => [255, 165, 0],
            CellColor::Brown => [165, 42, 42],
            CellColor::Random => return None,
        };

        Some([r, g, b, 255])
    }

    /// All colors that map to a single RGBA value.
    pub fn palette() -> impl Iterator<Item = CellColor> {
        CellColor::iter().filter(|color| *color != CellColor::Random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            rows: 40,
            columns: 60,
            interval_ms: 15,
            cell_size: 3,
            live_color: CellColor::Random,
            dead_color: CellColor::NavyBlue,
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "rows": 50, "live_color": "lime-green" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.rows, 50);
        assert_eq!(settings.columns, Settings::default().columns);
        assert_eq!(settings.live_color, CellColor::LimeGreen);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let base = Settings::default();

        let cases = [
            Settings {
                rows: 1,
                ..base.clone()
            },
            Settings {
                columns: 101,
                ..base.clone()
            },
            Settings {
                interval_ms: 0,
                ..base.clone()
            },
            Settings {
                cell_size: 4,
                ..base.clone()
            },
            Settings {
                dead_color: CellColor::Random,
                ..base.clone()
            },
        ];

        for settings in cases {
            assert!(settings.validate().is_err(), "{settings:?}");
        }
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn color_names_parse_case_insensitively() {
        assert_eq!("hot-pink".parse::<CellColor>().unwrap(), CellColor::HotPink);
        assert_eq!("RED".parse::<CellColor>().unwrap(), CellColor::Red);
        assert_eq!(CellColor::SkyBlue.to_string(), "sky-blue");
        assert!("chartreuse".parse::<CellColor>().is_err());
    }

    #[test]
    fn palette_excludes_random() {
        assert_eq!(CellColor::palette().count(), 19);
        assert!(CellColor::palette().all(|color| color.rgba().is_some()));
        assert_eq!(CellColor::Random.rgba(), None);
    }
}

//! Runtime configuration, read once at startup from environment variables.
//!
//! Every value has a default so the dashboard starts with no environment at
//! all as long as `data/hour.csv` and `data/day.csv` exist.
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::data::loader::find_table;
use crate::data::view::RenderSettings;

const DEFAULT_HOURLY_PATH: &str = "data/hour.csv";
const DEFAULT_DAILY_PATH: &str = "data/day.csv";

/// Parse an optional `usize` variable, falling back to `$default`.
macro_rules! parse_env_usize {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<usize>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hourly table (`hour.csv`).
    pub hourly_path: PathBuf,

    /// Daily table (`day.csv`).
    pub daily_path: PathBuf,

    /// Days per year in the top-days chart.
    pub top_n: usize,

    /// Rows in the table preview.
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        let settings = RenderSettings::default();
        Self {
            hourly_path: PathBuf::from(DEFAULT_HOURLY_PATH),
            daily_path: PathBuf::from(DEFAULT_DAILY_PATH),
            top_n: settings.top_n,
            preview_rows: settings.preview_rows,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Optional:
    /// - `BIKESHARE_HOURLY_PATH` – hourly table (default: data/hour.csv)
    /// - `BIKESHARE_DAILY_PATH` – daily table (default: data/day.csv)
    /// - `BIKESHARE_TOP_N` – days per year in the top-days chart (default: 20)
    /// - `BIKESHARE_PREVIEW_ROWS` – rows in the table preview (default: 5)
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let defaults = Config::default();
        let hourly_path = lookup("BIKESHARE_HOURLY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.hourly_path);
        let daily_path = lookup("BIKESHARE_DAILY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.daily_path);
        let top_n = parse_env_usize!(lookup, "BIKESHARE_TOP_N", defaults.top_n);
        let preview_rows = parse_env_usize!(lookup, "BIKESHARE_PREVIEW_ROWS", defaults.preview_rows);

        Ok(Config {
            hourly_path,
            daily_path,
            top_n,
            preview_rows,
        })
    }

    /// Point both tables at `hour.*` / `day.*` inside `dir`.
    pub fn with_data_dir(&self, dir: &Path) -> Result<Config> {
        let hourly_path = find_table(dir, "hour")
            .ok_or_else(|| anyhow!("no hour.csv / hour.parquet / hour.json in {}", dir.display()))?;
        let daily_path = find_table(dir, "day")
            .ok_or_else(|| anyhow!("no day.csv / day.parquet / day.json in {}", dir.display()))?;
        Ok(Config {
            hourly_path,
            daily_path,
            ..self.clone()
        })
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            top_n: self.top_n,
            preview_rows: self.preview_rows,
        }
    }

    pub fn log_config(&self) {
        log::info!("Configuration loaded:");
        log::info!("  BIKESHARE_HOURLY_PATH  : {}", self.hourly_path.display());
        log::info!("  BIKESHARE_DAILY_PATH   : {}", self.daily_path.display());
        log::info!("  BIKESHARE_TOP_N        : {}", self.top_n);
        log::info!("  BIKESHARE_PREVIEW_ROWS : {}", self.preview_rows);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.hourly_path, PathBuf::from("data/hour.csv"));
        assert_eq!(cfg.render_settings(), RenderSettings::default());
    }

    #[test]
    fn overrides_from_environment() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("BIKESHARE_HOURLY_PATH", "/tmp/h.parquet"),
            ("BIKESHARE_TOP_N", " 10 "),
            ("BIKESHARE_PREVIEW_ROWS", "8"),
        ]))
        .unwrap();
        assert_eq!(cfg.hourly_path, PathBuf::from("/tmp/h.parquet"));
        assert_eq!(cfg.daily_path, PathBuf::from("data/day.csv"));
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.preview_rows, 8);
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let err = Config::from_lookup(lookup_from(&[("BIKESHARE_TOP_N", "twenty")])).unwrap_err();
        assert!(err.to_string().contains("BIKESHARE_TOP_N"));
    }

    #[test]
    fn data_dir_picks_available_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hour.parquet"), b"").unwrap();
        std::fs::write(dir.path().join("day.csv"), b"").unwrap();

        let cfg = Config::default().with_data_dir(dir.path()).unwrap();
        assert_eq!(cfg.hourly_path, dir.path().join("hour.parquet"));
        assert_eq!(cfg.daily_path, dir.path().join("day.csv"));
        assert_eq!(cfg.top_n, 20);

        let empty = tempfile::tempdir().unwrap();
        assert!(Config::default().with_data_dir(empty.path()).is_err());
    }
}

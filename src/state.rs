use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::color::YearColors;
use crate::config::Config;
use crate::data::filter::FilterParams;
use crate::data::loader::load_dataset;
use crate::data::model::{Dataset, Season, WeatherSituation};
use crate::data::view::{render, DashboardView};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Loaded tables (None until a load succeeds).
    pub dataset: Option<Dataset>,

    /// Sidebar selections; present whenever `dataset` is.
    pub filters: Option<FilterParams>,

    /// Derived tables for the current filters. `None` while the
    /// selections are invalid.
    pub view: Option<DashboardView>,

    pub year_colors: YearColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dataset: None,
            filters: None,
            view: None,
            year_colors: YearColors::default(),
            status_message: None,
        }
    }

    /// Load the tables named by the current configuration.
    pub fn load(&mut self) {
        let config = self.config.clone();
        self.load_with(config);
    }

    /// Reload from `hour.*` / `day.*` inside `dir`. The current dataset
    /// stays in place if the new one cannot be read.
    pub fn open_folder(&mut self, dir: &Path) {
        match self.config.with_data_dir(dir) {
            Ok(config) => self.load_with(config),
            Err(e) => self.report_error(e),
        }
    }

    fn load_with(&mut self, config: Config) {
        let result: Result<Dataset> = load_dataset(&config.hourly_path, &config.daily_path)
            .with_context(|| {
                format!(
                    "loading {} and {}",
                    config.hourly_path.display(),
                    config.daily_path.display()
                )
            });
        match result {
            Ok(dataset) => {
                self.config = config;
                self.set_dataset(dataset);
            }
            Err(e) => self.report_error(e),
        }
    }

    fn report_error(&mut self, e: anyhow::Error) {
        log::error!("Failed to load dataset: {e:#}");
        self.status_message = Some(format!("Error: {e:#}"));
    }

    /// Add a message to the status line, after any message already shown.
    pub fn push_status(&mut self, msg: String) {
        self.status_message = Some(match self.status_message.take() {
            Some(prev) => format!("{prev} | {msg}"),
            None => msg,
        });
    }

    /// Ingest a newly loaded dataset and reset filters to show everything.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = Some(FilterParams::full(&dataset));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the derived tables after a filter change.
    pub fn refilter(&mut self) {
        let (Some(ds), Some(filters)) = (&self.dataset, &self.filters) else {
            return;
        };
        match render(ds, filters, &self.config.render_settings()) {
            Ok(view) => {
                self.view = Some(view);
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Rejected filter selection: {e}");
                self.view = None;
                self.status_message = Some(format!("Invalid selection: {e}"));
            }
        }
    }

    fn update_filters(&mut self, change: impl FnOnce(&mut FilterParams)) {
        if let Some(filters) = &mut self.filters {
            change(filters);
            self.refilter();
        }
    }

    /// Toggle a single season in the filter.
    pub fn toggle_season(&mut self, season: Season) {
        self.update_filters(|f| {
            if !f.seasons.remove(&season) {
                f.seasons.insert(season);
            }
        });
    }

    pub fn toggle_weather(&mut self, weather: WeatherSituation) {
        self.update_filters(|f| {
            if !f.weather.remove(&weather) {
                f.weather.insert(weather);
            }
        });
    }

    pub fn select_all_seasons(&mut self, all: bool) {
        self.update_filters(|f| {
            f.seasons = if all {
                Season::ALL.into_iter().collect()
            } else {
                Default::default()
            };
        });
    }

    pub fn select_all_weather(&mut self, all: bool) {
        self.update_filters(|f| {
            f.weather = if all {
                WeatherSituation::ALL.into_iter().collect()
            } else {
                Default::default()
            };
        });
    }

    /// Set the first day of the range, bounded to the hourly span.
    pub fn set_start_date(&mut self, start: NaiveDate) {
        let Some(span) = self.dataset.as_ref().map(|ds| ds.span) else {
            return;
        };
        self.update_filters(|f| {
            f.date_range.start = start;
            f.date_range = f.date_range.clamp_to(&span);
        });
    }

    /// Set the last day of the range, bounded to the hourly span.
    pub fn set_end_date(&mut self, end: NaiveDate) {
        let Some(span) = self.dataset.as_ref().map(|ds| ds.span) else {
            return;
        };
        self.update_filters(|f| {
            f.date_range.end = end;
            f.date_range = f.date_range.clamp_to(&span);
        });
    }

    /// Back to all seasons, all weather, full span.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters = Some(FilterParams::full(ds));
            self.refilter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{date, hourly};

    fn state() -> AppState {
        let rows = vec![
            hourly(date(2011, 1, 1), 8, Season::Spring, WeatherSituation::Clear, 5, 20),
            hourly(date(2011, 7, 1), 8, Season::Fall, WeatherSituation::MistCloudy, 30, 90),
            hourly(date(2012, 4, 1), 17, Season::Summer, WeatherSituation::Clear, 25, 140),
        ];
        let mut st = AppState::new(Config::default());
        st.set_dataset(Dataset::new(rows, Vec::new()).unwrap());
        st
    }

    fn visible(st: &AppState) -> usize {
        st.view.as_ref().map(|v| v.filtered_rows).unwrap_or(0)
    }

    #[test]
    fn new_dataset_shows_everything() {
        let st = state();
        assert_eq!(visible(&st), 3);
        assert!(st.status_message.is_none());
    }

    #[test]
    fn toggles_recompute_the_view() {
        let mut st = state();
        st.toggle_season(Season::Fall);
        assert_eq!(visible(&st), 2);
        st.toggle_weather(WeatherSituation::Clear);
        assert_eq!(visible(&st), 0);
        st.toggle_season(Season::Fall);
        assert_eq!(visible(&st), 1);

        st.select_all_weather(true);
        st.select_all_seasons(false);
        assert_eq!(visible(&st), 0);
        assert!(st.view.is_some());

        st.reset_filters();
        assert_eq!(visible(&st), 3);
    }

    #[test]
    fn reversed_dates_clear_the_view_until_fixed() {
        let mut st = state();
        st.set_start_date(date(2012, 1, 1));
        st.set_end_date(date(2011, 6, 1));
        assert!(st.view.is_none());
        assert!(st
            .status_message
            .as_deref()
            .unwrap_or_default()
            .contains("after end date"));

        st.set_end_date(date(2012, 12, 31));
        assert_eq!(visible(&st), 1);
        assert!(st.status_message.is_none());
    }

    #[test]
    fn picked_dates_are_bounded_to_the_span() {
        let mut st = state();
        st.set_start_date(date(2000, 1, 1));
        st.set_end_date(date(2030, 1, 1));
        let range = st.filters.as_ref().unwrap().date_range;
        assert_eq!(range.start, date(2011, 1, 1));
        assert_eq!(range.end, date(2012, 4, 1));
    }

    #[test]
    fn failed_load_keeps_existing_dataset() {
        let mut st = state();
        let empty = tempfile::tempdir().unwrap();
        st.open_folder(empty.path());
        assert!(st.dataset.is_some());
        assert!(st.status_message.as_deref().unwrap_or_default().starts_with("Error"));
    }

    #[test]
    fn later_status_keeps_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = AppState::new(Config::default());
        st.open_folder(dir.path());
        st.push_status("Error: Invalid BIKESHARE_TOP_N".to_string());

        let msg = st.status_message.unwrap_or_default();
        assert!(msg.starts_with("Error"), "{msg}");
        assert!(msg.ends_with("Invalid BIKESHARE_TOP_N"), "{msg}");
        assert!(msg.contains(" | "), "{msg}");
    }
}

use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;

use super::model::{Dataset, DateRange, HourlyRecord, Season, WeatherSituation};

// ---------------------------------------------------------------------------
// Filter predicate: selected seasons, weather situations and date range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// The three sidebar selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub seasons: BTreeSet<Season>,
    pub weather: BTreeSet<WeatherSituation>,
    pub date_range: DateRange,
}

impl FilterParams {
    /// Everything selected over the full hourly span.
    pub fn full(dataset: &Dataset) -> Self {
        FilterParams {
            seasons: Season::ALL.into_iter().collect(),
            weather: WeatherSituation::ALL.into_iter().collect(),
            date_range: dataset.span,
        }
    }

    /// Whether a single record passes all three conditions.
    pub fn matches(&self, rec: &HourlyRecord) -> bool {
        self.seasons.contains(&rec.season)
            && self.weather.contains(&rec.weather)
            && self.date_range.contains(rec.date)
    }
}

/// Borrowed rows of the hourly table that pass the active filter, in table order.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    pub rows: Vec<&'a HourlyRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a HourlyRecord> + '_ {
        self.rows.iter().copied()
    }
}

/// Keep rows whose season and weather are selected and whose date lies in
/// the inclusive range.
///
/// * An empty season or weather set selects nothing → empty view
/// * `start > end` → [`FilterError::InvalidRange`]
pub fn filter<'a>(
    hourly: &'a [HourlyRecord],
    params: &FilterParams,
) -> Result<FilteredView<'a>, FilterError> {
    let range = params.date_range;
    if !range.is_ordered() {
        return Err(FilterError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }

    let rows = hourly.iter().filter(|rec| params.matches(rec)).collect();
    Ok(FilteredView { rows })
}

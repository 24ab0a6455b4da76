use super::aggregate::{
    hourly_mean, monthly_mean, seasonal_mean, top_days, DailyTotal, HourlyMean, MonthlyMean,
    SeasonalMean,
};
use super::filter::{filter, FilterError, FilterParams};
use super::model::{Dataset, HourlyRecord};
use super::stats::{correlation, describe, ColumnSummary, CorrelationMatrix};

// ---------------------------------------------------------------------------
// DashboardView – everything the page shows for one filter state
// ---------------------------------------------------------------------------

/// Sizes of the bounded outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Days per year in the top-days chart.
    pub top_n: usize,
    /// Rows in the table preview.
    pub preview_rows: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            top_n: 20,
            preview_rows: 5,
        }
    }
}

/// Derived tables for one filter state. Owns its data so it outlives the
/// borrowed filtered view it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub preview: Vec<HourlyRecord>,
    pub summary: Vec<ColumnSummary>,
    pub monthly: Vec<MonthlyMean>,
    pub top_days: Vec<DailyTotal>,
    pub hourly: Vec<HourlyMean>,
    pub seasonal: Vec<SeasonalMean>,
    pub correlation: CorrelationMatrix,
}

/// Filter the hourly table and run every transform on the result.
pub fn render(
    dataset: &Dataset,
    params: &FilterParams,
    settings: &RenderSettings,
) -> Result<DashboardView, FilterError> {
    let view = filter(&dataset.hourly, params)?;
    log::debug!(
        "Rendering {} of {} hourly rows",
        view.len(),
        dataset.hourly.len()
    );

    Ok(DashboardView {
        total_rows: dataset.hourly.len(),
        filtered_rows: view.len(),
        preview: view
            .iter()
            .take(settings.preview_rows)
            .cloned()
            .collect(),
        summary: describe(&view),
        monthly: monthly_mean(&view),
        top_days: top_days(&view, settings.top_n),
        hourly: hourly_mean(&view),
        seasonal: seasonal_mean(&view),
        correlation: correlation(&view),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{date, hourly};
    use crate::data::model::{DateRange, Season, WeatherSituation};

    fn dataset() -> Dataset {
        let seasons = Season::ALL;
        let weather = WeatherSituation::ALL;
        let mut rows = Vec::new();
        for d in 0..60u32 {
            let i = d as usize;
            let day = date(2011, 1, 1) + chrono::Duration::days(d as i64 * 12);
            for hour in [7u32, 12, 18] {
                rows.push(hourly(
                    day,
                    hour,
                    seasons[i % 4],
                    weather[(i + hour as usize) % 4],
                    d + hour,
                    d * 3 + hour * 2,
                ));
            }
        }
        Dataset::new(rows, Vec::new()).unwrap()
    }

    #[test]
    fn renders_all_tables() {
        let ds = dataset();
        let view = render(&ds, &FilterParams::full(&ds), &RenderSettings::default()).unwrap();
        assert_eq!(view.total_rows, 180);
        assert_eq!(view.filtered_rows, 180);
        assert_eq!(view.preview.len(), 5);
        assert_eq!(view.preview[0], ds.hourly[0]);
        assert_eq!(view.summary.len(), 16);
        assert!(!view.monthly.is_empty());
        assert!(view.top_days.len() <= 40);
        assert!(!view.hourly.is_empty());
        assert!(!view.seasonal.is_empty());
        assert_eq!(view.correlation.columns.len(), 16);
    }

    #[test]
    fn render_is_deterministic() {
        let ds = dataset();
        let mut params = FilterParams::full(&ds);
        params.weather.remove(&WeatherSituation::Clear);
        let settings = RenderSettings::default();

        let first = render(&ds, &params, &settings).unwrap();
        let second = render(&ds, &params, &settings).unwrap();
        // NaN cells defeat PartialEq; compare the printed form
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn empty_season_selection_renders_empty_tables() {
        let ds = dataset();
        let mut params = FilterParams::full(&ds);
        params.seasons.clear();
        let view = render(&ds, &params, &RenderSettings::default()).unwrap();
        assert_eq!(view.filtered_rows, 0);
        assert!(view.preview.is_empty());
        assert!(view.monthly.is_empty());
        assert!(view.top_days.is_empty());
        assert!(view.hourly.is_empty());
        assert!(view.seasonal.is_empty());
        assert!(view.correlation.is_empty());
    }

    #[test]
    fn single_row_renders_nan_correlation() {
        let ds = dataset();
        let first = ds.hourly[0].clone();
        let params = FilterParams {
            seasons: [first.season].into_iter().collect(),
            weather: [first.weather].into_iter().collect(),
            date_range: DateRange::new(first.date, first.date),
        };
        let view = render(&ds, &params, &RenderSettings::default()).unwrap();
        assert_eq!(view.filtered_rows, 1);
        assert!(view.correlation.values.iter().flatten().all(|v| v.is_nan()));
    }

    #[test]
    fn invalid_range_is_reported() {
        let ds = dataset();
        let mut params = FilterParams::full(&ds);
        params.date_range = DateRange::new(ds.span.end, ds.span.start);
        assert!(matches!(
            render(&ds, &params, &RenderSettings::default()),
            Err(FilterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn top_n_setting_bounds_each_year() {
        let ds = dataset();
        let settings = RenderSettings {
            top_n: 3,
            preview_rows: 0,
        };
        let view = render(&ds, &FilterParams::full(&ds), &settings).unwrap();
        assert!(view.preview.is_empty());
        // 60 days spaced 12 days apart cover 2011 and 2012
        assert_eq!(view.top_days.len(), 6);
    }
}

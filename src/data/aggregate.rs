use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::filter::FilteredView;
use super::model::{HourlyRecord, Season, YearFlag};

// ---------------------------------------------------------------------------
// Group-by helpers
// ---------------------------------------------------------------------------

/// Mean casual / registered / total rentals of a group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RentalMeans {
    pub casual: f64,
    pub registered: f64,
    pub cnt: f64,
}

/// Running sums of the three rental counts.
#[derive(Debug, Clone, Copy, Default)]
struct RentalSums {
    rows: usize,
    casual: u64,
    registered: u64,
    cnt: u64,
}

impl RentalSums {
    fn add(&mut self, rec: &HourlyRecord) {
        self.rows += 1;
        self.casual += rec.casual as u64;
        self.registered += rec.registered as u64;
        self.cnt += rec.cnt as u64;
    }

    fn means(&self) -> RentalMeans {
        let n = self.rows as f64;
        RentalMeans {
            casual: self.casual as f64 / n,
            registered: self.registered as f64 / n,
            cnt: self.cnt as f64 / n,
        }
    }
}

/// Sum rentals per key. Keys come back sorted.
fn group_sums<K, F>(view: &FilteredView<'_>, key: F) -> BTreeMap<K, RentalSums>
where
    K: Ord,
    F: Fn(&HourlyRecord) -> K,
{
    let mut groups: BTreeMap<K, RentalSums> = BTreeMap::new();
    for rec in view.iter() {
        groups.entry(key(rec)).or_default().add(rec);
    }
    groups
}

// ---------------------------------------------------------------------------
// Monthly mean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyMean {
    pub year: YearFlag,
    pub month: u32,
    pub means: RentalMeans,
}

/// Mean rentals per (year, month), one row per pair present.
pub fn monthly_mean(view: &FilteredView<'_>) -> Vec<MonthlyMean> {
    group_sums(view, |r| (r.year, r.month))
        .into_iter()
        .map(|((year, month), sums)| MonthlyMean {
            year,
            month,
            means: sums.means(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Top-N days
// ---------------------------------------------------------------------------

/// Rentals summed over one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTotal {
    pub year: YearFlag,
    pub date: NaiveDate,
    pub casual: u64,
    pub registered: u64,
    pub cnt: u64,
}

/// The `n` busiest days of each year by total rentals, first year's list
/// followed by the second's. Each list is sorted by `cnt` descending; days
/// with equal totals stay in date order.
pub fn top_days(view: &FilteredView<'_>, n: usize) -> Vec<DailyTotal> {
    let days: Vec<DailyTotal> = group_sums(view, |r| (r.year, r.date))
        .into_iter()
        .map(|((year, date), sums)| DailyTotal {
            year,
            date,
            casual: sums.casual,
            registered: sums.registered,
            cnt: sums.cnt,
        })
        .collect();

    let mut out = Vec::new();
    for year in YearFlag::ALL {
        let mut of_year: Vec<DailyTotal> = days.iter().filter(|d| d.year == year).cloned().collect();
        // stable
        of_year.sort_by_key(|d| Reverse(d.cnt));
        of_year.truncate(n);
        out.extend(of_year);
    }
    out
}

// ---------------------------------------------------------------------------
// Hourly mean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyMean {
    pub year: YearFlag,
    pub hour: u32,
    pub means: RentalMeans,
}

/// Mean rentals per (year, hour-of-day).
pub fn hourly_mean(view: &FilteredView<'_>) -> Vec<HourlyMean> {
    group_sums(view, |r| (r.year, r.hour))
        .into_iter()
        .map(|((year, hour), sums)| HourlyMean {
            year,
            hour,
            means: sums.means(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Seasonal mean
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalMean {
    pub year: YearFlag,
    pub season: Season,
    pub means: RentalMeans,
}

impl SeasonalMean {
    pub fn label(&self) -> &'static str {
        self.season.label()
    }
}

/// Mean rentals per (year, season).
pub fn seasonal_mean(view: &FilteredView<'_>) -> Vec<SeasonalMean> {
    group_sums(view, |r| (r.year, r.season))
        .into_iter()
        .map(|((year, season), sums)| SeasonalMean {
            year,
            season,
            means: sums.means(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterParams};
    use crate::data::model::fixtures::{date, hourly};
    use crate::data::model::{DateRange, WeatherSituation};

    fn view_of(rows: &[HourlyRecord]) -> FilteredView<'_> {
        FilteredView {
            rows: rows.iter().collect(),
        }
    }

    /// Two years, every day of January and July, hours 0, 8 and 17.
    fn two_years() -> Vec<HourlyRecord> {
        let mut rows = Vec::new();
        for year in [2011, 2012] {
            for (month, season) in [(1, Season::Spring), (7, Season::Fall)] {
                for day in 1..=31 {
                    for hour in [0u32, 8, 17] {
                        let casual = day * 2 + hour;
                        let registered = day * 5 + hour * 3 + (year as u32 - 2011) * 50;
                        rows.push(hourly(
                            date(year, month, day),
                            hour,
                            season,
                            WeatherSituation::Clear,
                            casual,
                            registered,
                        ));
                    }
                }
            }
        }
        rows
    }

    #[test]
    fn monthly_mean_groups_year_and_month() {
        let rows = two_years();
        let monthly = monthly_mean(&view_of(&rows));
        assert_eq!(monthly.len(), 4);
        assert_eq!(
            monthly.iter().map(|m| (m.year, m.month)).collect::<Vec<_>>(),
            vec![
                (YearFlag::First, 1),
                (YearFlag::First, 7),
                (YearFlag::Second, 1),
                (YearFlag::Second, 7)
            ]
        );
        // casual = 2*day + hour averaged over day 1..=31 and hours {0,8,17}
        let expected_casual = 2.0 * 16.0 + 25.0 / 3.0;
        assert!((monthly[0].means.casual - expected_casual).abs() < 1e-9);
    }

    #[test]
    fn mean_of_total_is_sum_of_means() {
        let rows = two_years();
        let view = view_of(&rows);
        for m in monthly_mean(&view) {
            assert!((m.means.cnt - (m.means.casual + m.means.registered)).abs() < 1e-9);
        }
        for h in hourly_mean(&view) {
            assert!((h.means.cnt - (h.means.casual + h.means.registered)).abs() < 1e-9);
        }
    }

    #[test]
    fn top_days_bounded_and_sorted() {
        let rows = two_years();
        let top = top_days(&view_of(&rows), 20);
        assert_eq!(top.len(), 40);

        for year in YearFlag::ALL {
            let of_year: Vec<_> = top.iter().filter(|d| d.year == year).collect();
            assert_eq!(of_year.len(), 20);
            assert!(of_year.windows(2).all(|w| w[0].cnt >= w[1].cnt));
        }
        // first year's list comes first
        assert!(top[..20].iter().all(|d| d.year == YearFlag::First));
        // day 31 of either month is the busiest
        assert_eq!(top[0].date.format("%d").to_string(), "31");
        assert_eq!(top[0].cnt, top[0].casual + top[0].registered);
    }

    #[test]
    fn top_days_returns_all_when_fewer_than_n() {
        let rows = vec![
            hourly(date(2011, 3, 1), 8, Season::Spring, WeatherSituation::Clear, 5, 50),
            hourly(date(2011, 3, 1), 9, Season::Spring, WeatherSituation::Clear, 5, 40),
            hourly(date(2011, 3, 2), 8, Season::Spring, WeatherSituation::Clear, 1, 10),
            hourly(date(2012, 3, 1), 8, Season::Spring, WeatherSituation::Clear, 7, 70),
        ];
        let top = top_days(&view_of(&rows), 20);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].date, date(2011, 3, 1));
        assert_eq!(top[0].cnt, 100);
        assert_eq!(top[1].date, date(2011, 3, 2));
        assert_eq!(top[2].year, YearFlag::Second);
    }

    #[test]
    fn top_days_ties_keep_date_order() {
        let rows = vec![
            hourly(date(2011, 5, 3), 8, Season::Summer, WeatherSituation::Clear, 10, 10),
            hourly(date(2011, 5, 1), 8, Season::Summer, WeatherSituation::Clear, 10, 10),
            hourly(date(2011, 5, 2), 8, Season::Summer, WeatherSituation::Clear, 30, 30),
        ];
        let top = top_days(&view_of(&rows), 2);
        assert_eq!(
            top.iter().map(|d| d.date).collect::<Vec<_>>(),
            vec![date(2011, 5, 2), date(2011, 5, 1)]
        );
    }

    #[test]
    fn hourly_mean_covers_present_hours() {
        let rows = two_years();
        let hourly = hourly_mean(&view_of(&rows));
        assert_eq!(hourly.len(), 6);
        assert!(hourly.iter().all(|h| h.hour <= 23));
        assert_eq!(
            hourly
                .iter()
                .filter(|h| h.year == YearFlag::Second)
                .map(|h| h.hour)
                .collect::<Vec<_>>(),
            vec![0, 8, 17]
        );
    }

    #[test]
    fn single_season_filter_gives_one_group_per_year() {
        let rows = two_years();
        let mut params = FilterParams {
            seasons: [Season::Spring].into_iter().collect(),
            weather: WeatherSituation::ALL.into_iter().collect(),
            date_range: DateRange::spanning(rows.iter().map(|r| r.date)).unwrap(),
        };
        let view = filter(&rows, &params).unwrap();
        let seasonal = seasonal_mean(&view);
        assert_eq!(seasonal.len(), 2);
        assert!(seasonal.iter().all(|s| s.season == Season::Spring));
        assert_eq!(seasonal[0].label(), "Spring");
        assert_eq!(seasonal[0].year, YearFlag::First);
        assert_eq!(seasonal[1].year, YearFlag::Second);

        // restricted to one year, only that year's group remains
        params.date_range = DateRange::new(date(2012, 1, 1), date(2012, 12, 31));
        let view = filter(&rows, &params).unwrap();
        assert_eq!(seasonal_mean(&view).len(), 1);
    }

    #[test]
    fn empty_view_gives_empty_tables() {
        let view = FilteredView::default();
        assert!(monthly_mean(&view).is_empty());
        assert!(top_days(&view, 20).is_empty());
        assert!(hourly_mean(&view).is_empty());
        assert!(seasonal_mean(&view).is_empty());
    }
}

use super::filter::FilteredView;
use super::model::NumericColumn;

// ---------------------------------------------------------------------------
// Descriptive statistics – one summary per numeric column
// ---------------------------------------------------------------------------

/// count / mean / std / min / quartiles / max of a column.
/// Undefined entries (empty view, std of a single row) are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: NumericColumn,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

fn column_values(view: &FilteredView<'_>, column: NumericColumn) -> Vec<f64> {
    view.iter().map(|rec| column.value(rec)).collect()
}

/// Linear interpolation between the closest ranks of sorted `values`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn summarize(column: NumericColumn, mut values: Vec<f64>) -> ColumnSummary {
    let count = values.len();
    values.sort_by(|a, b| a.total_cmp(b));

    let mean = if count == 0 {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / count as f64
    };
    // sample standard deviation (n - 1)
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    ColumnSummary {
        column,
        count,
        mean,
        std,
        min: values.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied().unwrap_or(f64::NAN),
    }
}

/// Summary of every [`NumericColumn`] over the filtered rows.
pub fn describe(view: &FilteredView<'_>) -> Vec<ColumnSummary> {
    NumericColumn::ALL
        .iter()
        .map(|&col| summarize(col, column_values(view, col)))
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Pairwise Pearson coefficients, `values[i][j]` for `columns[i]` × `columns[j]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Centered values of one column; `None` when the column carries no
/// variance (fewer than two rows or all values equal).
fn centered(values: &[f64]) -> Option<Vec<f64>> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(values.iter().map(|v| v - mean).collect())
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let sab: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let saa: f64 = a.iter().map(|x| x * x).sum();
    let sbb: f64 = b.iter().map(|y| y * y).sum();
    (sab / (saa * sbb).sqrt()).clamp(-1.0, 1.0)
}

/// Pearson correlation between every pair of numeric columns.
///
/// An empty view gives an empty matrix. Pairs involving a column without
/// variance, or any pair when there is a single row, are `NaN`.
pub fn correlation(view: &FilteredView<'_>) -> CorrelationMatrix {
    if view.is_empty() {
        return CorrelationMatrix::default();
    }

    let columns = NumericColumn::ALL.to_vec();
    let centered: Vec<Option<Vec<f64>>> = columns
        .iter()
        .map(|&col| centered(&column_values(view, col)))
        .collect();

    let values = centered
        .iter()
        .map(|a| {
            centered
                .iter()
                .map(|b| match (a, b) {
                    (Some(a), Some(b)) => pearson(a, b),
                    _ => f64::NAN,
                })
                .collect()
        })
        .collect();

    CorrelationMatrix { columns, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{date, hourly};
    use crate::data::model::{HourlyRecord, Season, WeatherSituation};

    fn view_of(rows: &[HourlyRecord]) -> FilteredView<'_> {
        FilteredView {
            rows: rows.iter().collect(),
        }
    }

    fn index(col: NumericColumn) -> usize {
        NumericColumn::ALL.iter().position(|&c| c == col).unwrap()
    }

    fn varied_rows() -> Vec<HourlyRecord> {
        (0..10u32)
            .map(|h| {
                let season = if h < 5 { Season::Spring } else { Season::Summer };
                let weather = if h % 2 == 0 {
                    WeatherSituation::Clear
                } else {
                    WeatherSituation::MistCloudy
                };
                hourly(date(2011, 3 + h / 4, 1 + h), h, season, weather, h * 3, 10 + h * 7)
            })
            .collect()
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.75), 3.25);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn summary_of_known_values() {
        let s = summarize(NumericColumn::Count, vec![5.0, 1.0, 4.0, 2.0, 3.0]);
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.max, 5.0);
        assert!((s.std - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn describe_covers_every_numeric_column() {
        let rows = varied_rows();
        let summary = describe(&view_of(&rows));
        assert_eq!(summary.len(), NumericColumn::ALL.len());
        assert!(summary.iter().all(|s| s.count == rows.len()));
        let hr = &summary[index(NumericColumn::Hour)];
        assert_eq!(hr.min, 0.0);
        assert_eq!(hr.max, 9.0);
        assert_eq!(hr.median, 4.5);
    }

    #[test]
    fn describe_empty_and_single_row() {
        let empty = describe(&FilteredView::default());
        assert!(empty.iter().all(|s| s.count == 0 && s.mean.is_nan() && s.max.is_nan()));

        let rows = vec![varied_rows().remove(3)];
        let one = describe(&view_of(&rows));
        let cnt = &one[index(NumericColumn::Count)];
        assert_eq!(cnt.count, 1);
        assert_eq!(cnt.mean, rows[0].cnt as f64);
        assert!(cnt.std.is_nan());
    }

    #[test]
    fn correlation_of_linear_columns() {
        let rows = varied_rows();
        let m = correlation(&view_of(&rows));
        assert_eq!(m.columns.len(), 16);
        let hr = index(NumericColumn::Hour);
        let casual = index(NumericColumn::Casual);
        let hum = index(NumericColumn::Humidity);

        assert!((m.get(hr, hr) - 1.0).abs() < 1e-12);
        // casual = 3 * hr, hum = 0.8 - 0.01 * hr
        assert!((m.get(hr, casual) - 1.0).abs() < 1e-12);
        assert!((m.get(hr, hum) + 1.0).abs() < 1e-12);
        assert_eq!(m.get(casual, hum), m.get(hum, casual));
        assert!(m.values.iter().flatten().filter(|v| !v.is_nan()).all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn constant_column_yields_nan() {
        let rows = varied_rows();
        let m = correlation(&view_of(&rows));
        // every fixture row has holiday = 0 and yr = 0
        let holiday = index(NumericColumn::Holiday);
        let year = index(NumericColumn::Year);
        for j in 0..m.columns.len() {
            assert!(m.get(holiday, j).is_nan());
            assert!(m.get(j, year).is_nan());
        }
        assert!(!m.get(index(NumericColumn::Temp), index(NumericColumn::Count)).is_nan());
    }

    #[test]
    fn single_row_matrix_is_all_nan() {
        let rows = vec![varied_rows().remove(0)];
        let m = correlation(&view_of(&rows));
        assert_eq!(m.columns.len(), 16);
        assert!(m.values.iter().flatten().all(|v| v.is_nan()));
    }

    #[test]
    fn empty_view_gives_empty_matrix() {
        assert!(correlation(&FilteredView::default()).is_empty());
    }
}

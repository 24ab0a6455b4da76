use eframe::egui::{self, pos2, vec2, Align2, FontId, Rect, Sense, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{coolwarm, text_on, YearColors};
use crate::data::aggregate::{DailyTotal, HourlyMean, MonthlyMean, SeasonalMean};
use crate::data::model::{Season, YearFlag};
use crate::data::stats::CorrelationMatrix;

const CHART_HEIGHT: f32 = 300.0;
const BAR_WIDTH: f64 = 0.38;

/// Left / right offset of a year's bar inside a group.
fn dodge(year: YearFlag) -> f64 {
    match year {
        YearFlag::First => -0.2,
        YearFlag::Second => 0.2,
    }
}

/// Integer grid marks only; `None` between groups.
fn whole_tick(x: f64) -> Option<i64> {
    let rounded = x.round();
    ((x - rounded).abs() < 1e-6).then_some(rounded as i64)
}

fn rank_tick(x: f64) -> String {
    match whole_tick(x) {
        Some(rank) if rank >= 1 => rank.to_string(),
        _ => String::new(),
    }
}

fn season_tick(x: f64) -> String {
    whole_tick(x)
        .and_then(|code| Season::try_from(code).ok())
        .map(|season| season.label().to_string())
        .unwrap_or_default()
}

fn no_rows(ui: &mut Ui) {
    ui.label("No rows match the current filters.");
}

// ---------------------------------------------------------------------------
// Line charts – monthly and hourly means
// ---------------------------------------------------------------------------

/// One line (with markers) per year through `(x, mean cnt)` points.
fn year_lines(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    points: &[(YearFlag, f64, f64)],
    colors: &YearColors,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label("Rentals (mean)")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for year in YearFlag::ALL {
                let series: Vec<[f64; 2]> = points
                    .iter()
                    .filter(|(y, _, _)| *y == year)
                    .map(|&(_, x, v)| [x, v])
                    .collect();
                if series.is_empty() {
                    continue;
                }
                let color = colors.color_for(year);
                plot_ui.line(
                    Line::new(PlotPoints::from(series.clone()))
                        .name(year.label())
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(series))
                        .name(year.label())
                        .color(color)
                        .radius(3.5),
                );
            }
        });
}

/// Mean rentals per month, one line per year.
pub fn monthly_chart(ui: &mut Ui, monthly: &[MonthlyMean], colors: &YearColors) {
    if monthly.is_empty() {
        return no_rows(ui);
    }
    let points: Vec<_> = monthly
        .iter()
        .map(|m| (m.year, m.month as f64, m.means.cnt))
        .collect();
    year_lines(ui, "monthly_chart", "Month", &points, colors);
}

/// Mean rentals per hour of day, one line per year.
pub fn hourly_chart(ui: &mut Ui, hourly: &[HourlyMean], colors: &YearColors) {
    if hourly.is_empty() {
        return no_rows(ui);
    }
    let points: Vec<_> = hourly
        .iter()
        .map(|h| (h.year, h.hour as f64, h.means.cnt))
        .collect();
    year_lines(ui, "hourly_chart", "Hour", &points, colors);
}

// ---------------------------------------------------------------------------
// Grouped bar charts – top days and seasons
// ---------------------------------------------------------------------------

fn year_bars(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    x_tick: fn(f64) -> String,
    bars: Vec<(YearFlag, Bar)>,
    colors: &YearColors,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .x_axis_formatter(move |mark: GridMark, _range| x_tick(mark.value))
        .y_axis_label(y_label)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for year in YearFlag::ALL {
                let of_year: Vec<Bar> = bars
                    .iter()
                    .filter(|(y, _)| *y == year)
                    .map(|(_, b)| b.clone())
                    .collect();
                if of_year.is_empty() {
                    continue;
                }
                plot_ui.bar_chart(
                    BarChart::new(of_year)
                        .name(year.label())
                        .color(colors.color_for(year)),
                );
            }
        });
}

/// Busiest days of each year, side by side by rank. Hovering a bar shows
/// its date.
pub fn top_days_chart(ui: &mut Ui, days: &[DailyTotal], colors: &YearColors) {
    if days.is_empty() {
        return no_rows(ui);
    }
    let mut bars = Vec::with_capacity(days.len());
    for year in YearFlag::ALL {
        let ranked = days.iter().filter(|d| d.year == year).enumerate();
        for (rank, day) in ranked {
            let bar = Bar::new(rank as f64 + 1.0 + dodge(year), day.cnt as f64)
                .width(BAR_WIDTH)
                .name(day.date.format("%Y-%m-%d").to_string());
            bars.push((year, bar));
        }
    }
    year_bars(ui, "top_days_chart", "Rank", "Rentals (total)", rank_tick, bars, colors);
}

/// Mean rentals per season, grouped by year.
pub fn seasonal_chart(ui: &mut Ui, seasonal: &[SeasonalMean], colors: &YearColors) {
    if seasonal.is_empty() {
        return no_rows(ui);
    }
    let bars = seasonal
        .iter()
        .map(|s| {
            let bar = Bar::new(s.season.code() as f64 + dodge(s.year), s.means.cnt)
                .width(BAR_WIDTH)
                .name(s.label());
            (s.year, bar)
        })
        .collect();
    year_bars(
        ui,
        "seasonal_chart",
        "Season",
        "Rentals (mean)",
        season_tick,
        bars,
        colors,
    );
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

const LABEL_WIDTH: f32 = 80.0;
const HEADER_HEIGHT: f32 = 22.0;
const CELL: egui::Vec2 = vec2(54.0, 22.0);

/// Annotated heatmap of the correlation matrix.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        return no_rows(ui);
    }

    let n = matrix.columns.len();
    let size = vec2(
        LABEL_WIDTH + CELL.x * n as f32,
        HEADER_HEIGHT + CELL.y * n as f32,
    );
    let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(rect);
    let font = FontId::proportional(10.0);
    let label_color = ui.visuals().text_color();

    for (j, col) in matrix.columns.iter().enumerate() {
        let center = rect.min + vec2(LABEL_WIDTH + CELL.x * (j as f32 + 0.5), HEADER_HEIGHT * 0.5);
        painter.text(center, Align2::CENTER_CENTER, col.name(), font.clone(), label_color);
    }

    for (i, row_col) in matrix.columns.iter().enumerate() {
        let top = rect.min.y + HEADER_HEIGHT + CELL.y * i as f32;
        painter.text(
            pos2(rect.min.x + LABEL_WIDTH - 6.0, top + CELL.y * 0.5),
            Align2::RIGHT_CENTER,
            row_col.name(),
            font.clone(),
            label_color,
        );

        for j in 0..n {
            let value = matrix.get(i, j);
            let min = pos2(rect.min.x + LABEL_WIDTH + CELL.x * j as f32, top);
            let cell = Rect::from_min_size(min, CELL);
            painter.rect_filled(cell.shrink(0.5), 0.0, coolwarm(value));
            let text = if value.is_nan() {
                "NaN".to_string()
            } else {
                format!("{value:.2}")
            };
            painter.text(cell.center(), Align2::CENTER_CENTER, text, font.clone(), text_on(value));
        }
    }
}

use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::data::model::HourlyRecord;
use crate::data::stats::ColumnSummary;

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.4}")
    }
}

// ---------------------------------------------------------------------------
// Data preview – first rows of the filtered table
// ---------------------------------------------------------------------------

const PREVIEW_HEADERS: [&str; 17] = [
    "instant",
    "dteday",
    "season",
    "yr",
    "mnth",
    "hr",
    "holiday",
    "weekday",
    "workingday",
    "weathersit",
    "temp",
    "atemp",
    "hum",
    "windspeed",
    "casual",
    "registered",
    "cnt",
];

fn preview_cells(rec: &HourlyRecord) -> [String; 17] {
    [
        rec.instant.to_string(),
        rec.date.to_string(),
        rec.season.code().to_string(),
        rec.year.code().to_string(),
        rec.month.to_string(),
        rec.hour.to_string(),
        rec.holiday.to_string(),
        rec.weekday.to_string(),
        rec.workingday.to_string(),
        rec.weather.code().to_string(),
        format!("{:.2}", rec.temp),
        format!("{:.4}", rec.atemp),
        format!("{:.2}", rec.hum),
        format!("{:.4}", rec.windspeed),
        rec.casual.to_string(),
        rec.registered.to_string(),
        rec.cnt.to_string(),
    ]
}

pub fn preview_table(ui: &mut Ui, rows: &[HourlyRecord]) {
    if rows.is_empty() {
        ui.label("No rows match the current filters.");
        return;
    }
    ScrollArea::horizontal()
        .id_salt("preview_scroll")
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("preview_grid")
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    for h in PREVIEW_HEADERS {
                        ui.strong(h);
                    }
                    ui.end_row();
                    for rec in rows {
                        for cell in preview_cells(rec) {
                            ui.monospace(cell);
                        }
                        ui.end_row();
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// One statistic per row, one numeric column per column.
pub fn summary_table(ui: &mut Ui, summary: &[ColumnSummary]) {
    let stats: [(&str, fn(&ColumnSummary) -> String); 8] = [
        ("count", |s| s.count.to_string()),
        ("mean", |s| fmt_stat(s.mean)),
        ("std", |s| fmt_stat(s.std)),
        ("min", |s| fmt_stat(s.min)),
        ("25%", |s| fmt_stat(s.q25)),
        ("50%", |s| fmt_stat(s.median)),
        ("75%", |s| fmt_stat(s.q75)),
        ("max", |s| fmt_stat(s.max)),
    ];

    ScrollArea::horizontal()
        .id_salt("summary_scroll")
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("summary_grid")
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    for s in summary {
                        ui.strong(s.column.name());
                    }
                    ui.end_row();
                    for (name, value) in stats {
                        ui.strong(name);
                        for s in summary {
                            ui.monospace(value(s));
                        }
                        ui.end_row();
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Conclusion – fixed narrative
// ---------------------------------------------------------------------------

const FACTORS: [&str; 4] = [
    "Environmental conditions such as storms and large events.",
    "Working hours (morning, midday, evening).",
    "Air temperature: the warmer it is, the more bikes are rented.",
    "Season: rentals are lowest in spring.",
];

const STRATEGIES: [&str; 4] = [
    "Run seasonal promotions.",
    "Keep more bikes available during rush hours.",
    "Offer subscription packages to casual users.",
    "Place bikes at strategic locations.",
];

pub fn conclusion(ui: &mut Ui) {
    ui.label(RichText::new("Factors that influence bike rentals:").strong());
    for (i, line) in FACTORS.iter().enumerate() {
        ui.label(format!("{}. {line}", i + 1));
    }
    ui.add_space(6.0);
    ui.label(RichText::new("Strategies to increase rentals:").strong());
    for line in STRATEGIES {
        ui.label(format!("• {line}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::NumericColumn;

    #[test]
    fn preview_headers_match_numeric_columns() {
        // every numeric column appears in the preview header, in file order
        let numeric: Vec<&str> = NumericColumn::ALL.iter().map(|c| c.name()).collect();
        let previewed: Vec<&str> = PREVIEW_HEADERS
            .iter()
            .copied()
            .filter(|h| *h != "dteday")
            .collect();
        assert_eq!(numeric, previewed);
    }

    #[test]
    fn undefined_statistics_print_as_nan() {
        assert_eq!(fmt_stat(f64::NAN), "NaN");
        assert_eq!(fmt_stat(0.5), "0.5000");
    }
}

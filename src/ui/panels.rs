use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::{Season, WeatherSituation};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    let (Some(dataset), Some(filters)) = (&state.dataset, &state.filters) else {
        ui.label("No dataset loaded.");
        return;
    };

    // Copy what we need so state can be mutated inside the widgets.
    let span = dataset.span;
    let selected_seasons = filters.seasons.clone();
    let selected_weather = filters.weather.clone();
    let range = filters.date_range;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Seasons ----
            let header = format!("Seasons  ({}/{})", selected_seasons.len(), Season::ALL.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("season_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    all_none_buttons(ui, |all| state.select_all_seasons(all));
                    for season in Season::ALL {
                        let mut checked = selected_seasons.contains(&season);
                        if ui.checkbox(&mut checked, season.label()).changed() {
                            state.toggle_season(season);
                        }
                    }
                });

            // ---- Weather situations ----
            let header = format!(
                "Weather Situations  ({}/{})",
                selected_weather.len(),
                WeatherSituation::ALL.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("weather_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    all_none_buttons(ui, |all| state.select_all_weather(all));
                    for weather in WeatherSituation::ALL {
                        let mut checked = selected_weather.contains(&weather);
                        if ui.checkbox(&mut checked, weather.label()).changed() {
                            state.toggle_weather(weather);
                        }
                    }
                });

            ui.separator();

            // ---- Date range ----
            ui.strong("Date Range");
            egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("From");
                let mut start = range.start;
                if ui
                    .add(DatePickerButton::new(&mut start).id_salt("start_date"))
                    .changed()
                {
                    state.set_start_date(start);
                }
                ui.end_row();

                ui.label("To");
                let mut end = range.end;
                if ui
                    .add(DatePickerButton::new(&mut end).id_salt("end_date"))
                    .changed()
                {
                    state.set_end_date(end);
                }
                ui.end_row();
            });
            ui.small(format!("Available: {span}"));

            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// "All" / "None" pair; calls `apply(true)` or `apply(false)`.
fn all_none_buttons(ui: &mut Ui, mut apply: impl FnMut(bool)) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            apply(true);
        }
        if ui.small_button("None").clicked() {
            apply(false);
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.load();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let visible = state.view.as_ref().map(|v| v.filtered_rows).unwrap_or(0);
            ui.label(format!("{} hourly rows loaded, {visible} visible", ds.hourly.len()));
            ui.separator();
            match ds.daily_span() {
                Some(span) => ui.label(format!("{} days in daily table ({span})", ds.daily.len())),
                None => ui.label("daily table is empty"),
            };
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open folder with hour / day tables")
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Opening data folder {}", dir.display());
        state.open_folder(&dir);
    }
}

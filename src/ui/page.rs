use eframe::egui::{ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{plot, tables};

// ---------------------------------------------------------------------------
// Central page – overview, charts and conclusion
// ---------------------------------------------------------------------------

/// Render the dashboard page for the current view.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data loaded  (File → Open data folder…)");
        });
        return;
    }

    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Fix the filter selection to see the dashboard.");
        });
        return;
    };
    let colors = &state.year_colors;

    ScrollArea::vertical()
        .id_salt("dashboard_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Bike Sharing Rental Analysis");
            ui.label("Rental counts from the Bike Sharing dataset, filtered by season, weather and date.");

            ui.separator();
            ui.heading("Data Overview");
            ui.strong(format!(
                "Data preview ({} of {} rows match)",
                view.filtered_rows, view.total_rows
            ));
            tables::preview_table(ui, &view.preview);
            ui.add_space(8.0);
            ui.strong("Descriptive statistics");
            tables::summary_table(ui, &view.summary);

            ui.separator();
            ui.heading("Average Rentals per Month");
            plot::monthly_chart(ui, &view.monthly, colors);

            ui.separator();
            ui.heading(format!(
                "Top {} Days with the Most Rentals in Each Year",
                state.config.top_n
            ));
            plot::top_days_chart(ui, &view.top_days, colors);

            ui.separator();
            ui.heading("Average Rentals per Hour");
            plot::hourly_chart(ui, &view.hourly, colors);

            ui.separator();
            ui.heading("Average Rentals per Season");
            plot::seasonal_chart(ui, &view.seasonal, colors);

            ui.separator();
            ui.heading("Correlation Between Variables");
            ScrollArea::horizontal()
                .id_salt("heatmap_scroll")
                .show(ui, |ui: &mut Ui| plot::correlation_heatmap(ui, &view.correlation));

            ui.separator();
            ui.heading("Conclusion");
            tables::conclusion(ui);
        });
}

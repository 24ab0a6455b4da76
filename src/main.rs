mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::BikeDashboardApp;
use config::Config;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match Config::from_env() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            (Config::default(), Some(format!("Error: {e:#}")))
        }
    };
    config.log_config();

    // One-time load; the dataset is immutable from here on.
    let mut state = AppState::new(config);
    state.load();
    if let Some(msg) = config_error {
        state.push_status(msg);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bike Sharing Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(BikeDashboardApp::new(state)))),
    )
}

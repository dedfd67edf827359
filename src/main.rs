mod config;
mod fetch;
mod loader;
mod model;
mod query;
mod stats;
mod ui;

use config::Settings;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use ui::SheetApp;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = Settings::load().unwrap_or_else(|e| {
        tracing::warn!("invalid settings file, using defaults: {e:#}");
        Settings::defaults()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window.width, settings.window.height])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Weapons Sheet",
        options,
        Box::new(move |cc| {
            ui::set_custom_style(&cc.egui_ctx);
            Ok(Box::new(SheetApp::new(&cc.egui_ctx, &settings)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}

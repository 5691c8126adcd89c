//! NYU property map entry point

use std::sync::OnceLock;
use zoon::*;

/// Stores the main application task handle to prevent it from being dropped.
static MAIN_TASK: OnceLock<TaskHandle> = OnceLock::new();

mod app;
mod browser_dom;
mod config;
mod dataflow;
mod logging;
mod maplibre;
mod views;

pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();

    let variant = match config::load_variant() {
        Ok(variant) => variant,
        Err(error) => {
            zoon::eprintln!("map configuration invalid: {error}");
            return;
        }
    };
    log::info!("starting map variant '{}'", variant.id);

    let handle = Task::start_droppable(async move {
        let app = app::MapViewerApp::new(variant);
        let root_element = app.root();
        start_app("app", move || root_element);
        // The app owns the viewer actor; park here so it lives as long as the page.
        futures::future::pending::<()>().await;
        drop(app);
    });
    let _ = MAIN_TASK.set(handle);
}

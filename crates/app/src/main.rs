//! DocShelf - egui-based document vault
//!
//! Login, document list, upload form, and a PDF/image viewer, all backed by
//! the flat-file store. Store I/O runs on a background worker thread.

mod app;
mod store_worker;
mod viewer;

use eframe::egui;
use std::path::PathBuf;

fn main() -> eframe::Result {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    // `docshelf <file>` (the CLI's open command) jumps straight to the
    // viewer after login.
    let open_target = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("DocShelf"),
        ..Default::default()
    };

    eframe::run_native(
        "DocShelf",
        options,
        Box::new(move |cc| Ok(Box::new(app::DocShelfApp::new(cc, open_target)))),
    )
}

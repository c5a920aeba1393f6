pub mod app;
pub mod state;
pub mod tasks;
pub mod text_editor;

pub use app::RewriterApp;
pub use tasks::{TaskCommand, TaskController, TaskEvent, TaskKind};

/// Opens the rewriter window. `config_path` defaults to `config.json` in the
/// working directory.
#[cfg(not(target_arch = "wasm32"))]
pub fn run(config_path: Option<std::path::PathBuf>) -> eframe::Result<()> {
    use eframe::NativeOptions;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 880.0]),
        centered: true,
        ..Default::default()
    };
    eframe::run_native(
        "Non-Fiction Paragraph Rewriter",
        options,
        Box::new(move |cc| Box::new(RewriterApp::new(cc, config_path))),
    )
}

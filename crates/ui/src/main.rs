use std::path::PathBuf;

fn main() -> eframe::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    rewriter_ui::run(config_path)
}

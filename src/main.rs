use anyhow::Context as _;
use clap::Parser;
use eframe::egui;

use tileviz::app::TileVizApp;
use tileviz::cli::CliArgs;
use tileviz::config::AppConfig;
use tileviz::logger;
use tileviz::source::SourceImage;

fn main() -> anyhow::Result<()> {
    logger::init();

    let args = CliArgs::parse();
    let config = AppConfig::resolve(&args).context("failed to resolve configuration")?;

    // Decoding happens here; a missing source is reported by the app's
    // start hook before any GPU setup.
    let source = match &config.source {
        Some(path) => Some(
            SourceImage::load(path)
                .with_context(|| format!("failed to load source image {}", path.display()))?,
        ),
        None if args.demo => Some(SourceImage::checkerboard(512, 32)),
        None => None,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 1080.0])
            .with_title("tileviz"),
        ..Default::default()
    };

    eframe::run_native(
        "tileviz",
        options,
        Box::new(move |cc| Box::new(TileVizApp::new(cc, config, source))),
    )
    .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}

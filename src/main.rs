mod app;
mod curriculum;
mod graph;
mod interaction;
mod keystore;
mod palette;
mod physics;
mod producer;
mod viewport;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{AppConfig, StickyGraphApp};
use crate::curriculum::Catalog;
use crate::keystore::KeyStore;
use crate::physics::SimulationConfig;
use crate::producer::SnapshotLibrary;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Chapter catalog JSON. The bundled catalog is used when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory of `<topic>.json` graph snapshots served by "Generate".
    #[arg(long, default_value = "topics")]
    library: PathBuf,

    /// File holding the API key. Defaults to the per-user config directory.
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Chapter title to open on startup instead of the sample graph.
    #[arg(long)]
    chapter: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    charge: Option<f32>,

    #[arg(long)]
    link_distance: Option<f32>,

    #[arg(long)]
    center_strength: Option<f32>,

    /// Fallback filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn simulation_config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        if let Some(charge) = self.charge {
            config.charge_strength = charge;
        }
        if let Some(distance) = self.link_distance {
            config.link_distance = distance;
        }
        if let Some(strength) = self.center_strength {
            config.center_strength = strength;
        }
        config
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::bundled()?,
    };
    if catalog.is_empty() {
        warn!("chapter catalog is empty; only the sample graph and topic library are available");
    } else {
        info!(chapters = catalog.len(), "loaded chapter catalog");
    }
    debug!(titles = ?catalog.titles().collect::<Vec<_>>(), "available chapters");

    let key_store = args
        .key_file
        .clone()
        .map(KeyStore::at)
        .unwrap_or_else(KeyStore::default_location);

    let config = AppConfig {
        catalog,
        producer: Arc::new(SnapshotLibrary::new(args.library.clone())),
        key_store,
        physics: args.simulation_config(),
        initial_chapter: args.chapter.clone(),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sticky Graph",
        options,
        Box::new(move |cc| Ok(Box::new(StickyGraphApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

mod app;
mod config;
mod graph;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{DragEndPolicy, HostBridge, StdoutBridge};
use config::ViewerConfig;
use graph::{DataSource, ViewRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ViewKind {
    /// Every node and link of a dataset.
    Graph,
    /// Triples around one entity, click a node to move on.
    Entity,
    /// Entity frequencies as packed bubbles.
    Bubble,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum BridgeKind {
    #[default]
    None,
    Stdout,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = ViewKind::Graph)]
    view: ViewKind,

    #[arg(long)]
    dataset: String,

    /// Entity to center the `entity` view on.
    #[arg(long, required_if_eq("view", "entity"))]
    entity: Option<String>,

    /// Read the view's JSON from disk instead of the HTTP endpoints.
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave dragged nodes pinned where they were dropped.
    #[arg(long)]
    keep_pinned: bool,

    #[arg(long, value_enum, default_value_t = BridgeKind::None)]
    host_bridge: BridgeKind,

    #[arg(long)]
    graph_endpoint: Option<String>,

    #[arg(long)]
    entity_endpoint: Option<String>,

    #[arg(long)]
    bubble_endpoint: Option<String>,
}

impl Args {
    fn request(&self) -> Result<ViewRequest> {
        let dataset = self.dataset.clone();
        Ok(match self.view {
            ViewKind::Graph => ViewRequest::Graph { dataset },
            ViewKind::Entity => {
                let Some(entity) = self.entity.clone() else {
                    bail!("--entity is required for the entity view");
                };
                ViewRequest::Entity { dataset, entity }
            }
            ViewKind::Bubble => ViewRequest::Bubble { dataset },
        })
    }

    fn apply_overrides(&self, config: &mut ViewerConfig) {
        if let Some(endpoint) = &self.graph_endpoint {
            config.graph_endpoint.clone_from(endpoint);
        }
        if let Some(endpoint) = &self.entity_endpoint {
            config.entity_endpoint.clone_from(endpoint);
        }
        if let Some(endpoint) = &self.bubble_endpoint {
            config.bubble_endpoint.clone_from(endpoint);
        }
        if self.keep_pinned {
            config.drag_end = DragEndPolicy::Keep;
        }
    }

    fn bridge(&self) -> Option<Arc<dyn HostBridge>> {
        match self.host_bridge {
            BridgeKind::None => None,
            BridgeKind::Stdout => Some(Arc::new(StdoutBridge)),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = ViewerConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;

    let request = args.request()?;
    let source = match &args.file {
        Some(path) => DataSource::File(path.clone()),
        None => DataSource::http(config.endpoints()?)?,
    };
    let bridge = args.bridge();
    info!(%request, drag_end = ?config.drag_end, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "kg-lens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::KgLensApp::new(
                cc, config, source, request, bridge,
            )))
        }),
    )
    .map_err(|error| anyhow!("{error}"))
}

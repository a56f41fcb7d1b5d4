use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use url::Url;

use crate::app::DragEndPolicy;
use crate::graph::Endpoints;

/// Viewer settings, read from an optional JSON file. Missing fields fall back
/// to their defaults and command-line flags win over both.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub graph_endpoint: String,
    pub entity_endpoint: String,
    pub bubble_endpoint: String,
    pub image_base: String,
    pub excluded_relations: Vec<String>,
    pub scale_extent: [f32; 2],
    pub bubble_scale_extent: [f32; 2],
    pub preroll_ticks: usize,
    pub drag_end: DragEndPolicy,
    pub propagate_selection: bool,
    pub hover_capable: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            graph_endpoint: "http://localhost:8080/api/graphData".to_owned(),
            entity_endpoint: "http://localhost:8080/graph/entitytripledata".to_owned(),
            bubble_endpoint: "http://localhost:8080/api/peoplebubblechart".to_owned(),
            image_base: "/images".to_owned(),
            excluded_relations: ["텍스트", "방향", "플래시"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            scale_extent: [0.1, 8.0],
            bubble_scale_extent: [0.1, 5.0],
            preroll_ticks: 10,
            drag_end: DragEndPolicy::Release,
            propagate_selection: true,
            hover_capable: true,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for extent in [self.scale_extent, self.bubble_scale_extent] {
            ensure!(
                extent[0] > 0.0 && extent[0] <= extent[1],
                "scale extent {extent:?} must be positive and ordered"
            );
        }
        self.endpoints().map(|_| ())
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        let parse = |name: &str, raw: &str| {
            Url::parse(raw).with_context(|| format!("{name} endpoint {raw:?} is not a valid URL"))
        };

        Ok(Endpoints {
            graph: parse("graph", &self.graph_endpoint)?,
            entity: parse("entity", &self.entity_endpoint)?,
            bubble: parse("bubble", &self.bubble_endpoint)?,
        })
    }

    /// Where a media node's picture lives for `dataset`.
    pub fn image_path(&self, dataset: &str, label: &str) -> String {
        format!(
            "{}/{dataset}/{label}",
            self.image_base.trim_end_matches('/')
        )
    }
}

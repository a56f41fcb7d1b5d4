mod interaction;
mod view;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::info;

use crate::config::ViewerConfig;
use crate::graph::{Graph, NodeIndex, RawGraph, RelationFilter};

use super::interaction::{HostBridge, InteractionConfig, InteractionController};
use super::physics::{Simulation, entity_graph, full_graph};
use super::render_sync::{HitShape, SceneGeometry};
use super::render_utils::{ENTITY_NODE_COLOR, GroupPalette};
use super::viewport::Viewport;

pub(in crate::app) use interaction::read_canvas_gesture;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum GraphKind {
    /// Every node and relation of a dataset.
    Full,
    /// One entity's triples, clicking a node moves on to that entity.
    Entity,
}

enum NodePaint {
    ByGroup(GroupPalette),
    Uniform,
}

pub(in crate::app) struct GraphScene {
    pub(in crate::app) dataset: String,
    pub(in crate::app) graph: Graph,
    pub(in crate::app) simulation: Simulation,
    pub(in crate::app) geometry: Rc<RefCell<SceneGeometry>>,
    pub(in crate::app) controller: InteractionController,
    pub(in crate::app) viewport: Viewport,
    paint: NodePaint,
}

impl GraphScene {
    /// Builds the scene for a freshly fetched payload. `None` when nothing
    /// survives filtering, in which case no simulation is started.
    pub(in crate::app) fn new(
        raw: &RawGraph,
        kind: GraphKind,
        dataset: String,
        config: &ViewerConfig,
        bridge: Option<Arc<dyn HostBridge>>,
    ) -> Option<Self> {
        let filter = match kind {
            GraphKind::Full => RelationFilter::PassThrough,
            GraphKind::Entity => RelationFilter::exclude(config.excluded_relations.iter().cloned()),
        };
        let graph = Graph::build(raw, &filter);
        if graph.is_empty() {
            info!(%dataset, "nothing to lay out after filtering");
            return None;
        }

        let node_count = graph.nodes.len();
        let mut simulation = match kind {
            GraphKind::Full => full_graph(node_count, graph.endpoints()),
            GraphKind::Entity => entity_graph(node_count, graph.endpoints()),
        };
        let geometry = SceneGeometry::new(graph.endpoints()).attach(&mut simulation);
        if kind == GraphKind::Entity {
            simulation.preroll(config.preroll_ticks);
        }

        let controller = InteractionController::new(
            InteractionConfig {
                drag_end: config.drag_end,
                propagate_selection: config.propagate_selection,
                navigate_on_click: kind == GraphKind::Entity,
                hover_capable: config.hover_capable,
                ..InteractionConfig::default()
            },
            dataset.clone(),
            bridge,
        );

        let paint = match kind {
            GraphKind::Full => {
                NodePaint::ByGroup(GroupPalette::new(graph.nodes.iter().map(|node| node.group)))
            }
            GraphKind::Entity => NodePaint::Uniform,
        };

        info!(
            %dataset,
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "graph scene ready"
        );

        Some(Self {
            dataset,
            graph,
            simulation,
            geometry,
            controller,
            viewport: Viewport::new(config.scale_extent),
            paint,
        })
    }

    pub(in crate::app) fn node_color(&self, node: NodeIndex) -> eframe::egui::Color32 {
        match &self.paint {
            NodePaint::ByGroup(palette) => self
                .graph
                .nodes
                .get(node)
                .map(|entry| palette.color(entry.group))
                .unwrap_or(ENTITY_NODE_COLOR),
            NodePaint::Uniform => ENTITY_NODE_COLOR,
        }
    }

    fn hit_shape(&self, node: NodeIndex) -> HitShape {
        HitShape::for_node(self.graph.nodes.get(node).is_some_and(|entry| entry.is_media()))
    }

    pub(in crate::app) fn is_busy(&self) -> bool {
        self.simulation.is_running() || self.viewport.is_animating() || self.controller.is_dragging()
    }

    pub(in crate::app) fn stop(&mut self) {
        self.simulation.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawGraph {
        serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": 1, "label": "A", "group": 1},
                    {"id": 2, "label": "img.jpg", "group": 0},
                    {"id": 3, "label": "C", "group": 4}
                ],
                "links": [
                    {"source": 1, "target": 2, "type": "near"},
                    {"source": 1, "target": 3, "type": "텍스트"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn entity_scene_filters_and_prerolls() {
        let scene = GraphScene::new(
            &raw(),
            GraphKind::Entity,
            "db".to_owned(),
            &ViewerConfig::default(),
            None,
        )
        .unwrap();

        assert_eq!(scene.graph.nodes.len(), 2);
        assert_eq!(scene.simulation.tick_count(), 10);
        assert_eq!(scene.geometry.borrow().nodes.len(), 2);
        assert!(scene.controller.config.navigate_on_click);
    }

    #[test]
    fn full_scene_keeps_everything() {
        let scene = GraphScene::new(
            &raw(),
            GraphKind::Full,
            "db".to_owned(),
            &ViewerConfig::default(),
            None,
        )
        .unwrap();

        assert_eq!(scene.graph.nodes.len(), 3);
        assert_eq!(scene.simulation.tick_count(), 0);
        assert!(!scene.controller.config.navigate_on_click);
        assert_ne!(scene.node_color(0), scene.node_color(2));
    }

    #[test]
    fn empty_payload_builds_no_scene() {
        let config = ViewerConfig {
            excluded_relations: vec!["near".to_owned(), "텍스트".to_owned()],
            ..ViewerConfig::default()
        };
        assert!(GraphScene::new(&raw(), GraphKind::Entity, "db".to_owned(), &config, None).is_none());
    }
}

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use eframe::egui::Vec2;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::graph::{Graph, LinkIndex, NodeIndex};

use super::physics::Simulation;
use super::viewport::{Transform, TransitionAction, Viewport};

/// Receives the label of a clicked media node. Implemented by whatever embeds
/// the viewer.
pub trait HostBridge: Send + Sync {
    fn receive_photo_name(&self, label: &str);
}

/// Writes one `receivePhotoName\t<label>` line per click to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutBridge;

impl HostBridge for StdoutBridge {
    fn receive_photo_name(&self, label: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(error) = writeln!(stdout, "receivePhotoName\t{label}").and_then(|()| stdout.flush())
        {
            warn!(%error, label, "host bridge write failed");
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragEndPolicy {
    /// Clear the pin so the node rejoins the layout.
    #[default]
    Release,
    /// Leave the node where it was dropped.
    Keep,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
    pub dataset: String,
    pub entity: String,
}

#[derive(Clone, Copy, Debug)]
pub struct InteractionConfig {
    pub drag_end: DragEndPolicy,
    pub propagate_selection: bool,
    pub navigate_on_click: bool,
    pub selectable: bool,
    pub hover_capable: bool,
    pub drag_alpha_target: f32,
    pub focus_scale: f32,
    pub focus_duration: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_end: DragEndPolicy::Release,
            propagate_selection: true,
            navigate_on_click: false,
            selectable: true,
            hover_capable: true,
            drag_alpha_target: 0.3,
            focus_scale: 1.5,
            focus_duration: 0.5,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InteractionState {
    pub selected: Option<NodeIndex>,
    pub toggled_links: HashSet<LinkIndex>,
    pub selection_links: HashSet<LinkIndex>,
    pub hovered_link: Option<LinkIndex>,
    /// Link under the pointer in a side panel, independent of the canvas.
    pub previewed_link: Option<LinkIndex>,
    pub dragging: Option<NodeIndex>,
}

pub struct InteractionController {
    pub config: InteractionConfig,
    pub state: InteractionState,
    dataset: String,
    bridge: Option<Arc<dyn HostBridge>>,
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("dataset", &self.dataset)
            .field("bridge", &self.bridge.is_some())
            .finish()
    }
}

impl InteractionController {
    pub fn new(
        config: InteractionConfig,
        dataset: impl Into<String>,
        bridge: Option<Arc<dyn HostBridge>>,
    ) -> Self {
        Self {
            config,
            state: InteractionState::default(),
            dataset: dataset.into(),
            bridge,
        }
    }

    pub fn drag_start(&mut self, sim: &mut Simulation, viewport: &mut Viewport, node: NodeIndex) {
        let Some(position) = sim.position(node) else {
            return;
        };

        viewport.interrupt();
        sim.pin(node, position);
        sim.set_alpha_target(self.config.drag_alpha_target);
        sim.restart();
        self.state.dragging = Some(node);
    }

    pub fn drag_move(&mut self, sim: &mut Simulation, world: Vec2) {
        if let Some(node) = self.state.dragging {
            sim.pin(node, world);
        }
    }

    pub fn drag_end(&mut self, sim: &mut Simulation) {
        let Some(node) = self.state.dragging.take() else {
            return;
        };

        sim.set_alpha_target(0.0);
        if self.config.drag_end == DragEndPolicy::Release {
            sim.unpin(node);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging.is_some()
    }

    /// No-op on displays without a hover-capable pointer.
    pub fn link_hover(&mut self, link: Option<LinkIndex>) {
        if !self.config.hover_capable {
            return;
        }
        self.state.hovered_link = link;
    }

    pub fn preview_link(&mut self, link: Option<LinkIndex>) {
        self.state.previewed_link = link;
    }

    pub fn link_click(&mut self, link: LinkIndex) {
        if !self.state.toggled_links.remove(&link) {
            self.state.toggled_links.insert(link);
        }
    }

    pub fn select(&mut self, graph: &Graph, node: NodeIndex) {
        if node >= graph.nodes.len() {
            return;
        }

        self.state.selected = Some(node);
        self.state.selection_links.clear();
        if self.config.propagate_selection {
            self.state
                .selection_links
                .extend(graph.incident_links(node).iter().copied());
        }
    }

    pub fn background_click(&mut self) {
        self.state.selected = None;
        self.state.selection_links.clear();
    }

    pub fn node_click(
        &mut self,
        graph: &Graph,
        sim: &Simulation,
        viewport: &mut Viewport,
        node: NodeIndex,
    ) {
        if !self.config.selectable {
            return;
        }
        let Some(entry) = graph.nodes.get(node) else {
            return;
        };

        self.select(graph, node);

        if entry.is_media() {
            match &self.bridge {
                Some(bridge) => bridge.receive_photo_name(&entry.label),
                None => info!(label = %entry.label, "no host bridge attached, photo click stays local"),
            }
        }

        if !self.config.navigate_on_click {
            return;
        }
        let Some(position) = sim.position(node) else {
            return;
        };

        let scale = self.config.focus_scale;
        let request = NavigationRequest {
            dataset: self.dataset.clone(),
            entity: entry.label.clone(),
        };
        debug!(entity = %request.entity, "focusing node before navigation");
        viewport.animate_to(
            Transform {
                translate: -position * scale,
                scale,
            },
            self.config.focus_duration,
            TransitionAction::Navigate(request),
        );
    }

    /// Handles a finished viewport transition. Navigation resets the view
    /// first so the next scene starts from the identity transform.
    pub fn on_transition_end(
        &mut self,
        action: TransitionAction,
        viewport: &mut Viewport,
    ) -> Option<NavigationRequest> {
        match action {
            TransitionAction::Settle => None,
            TransitionAction::Navigate(request) => {
                viewport.set_transform(Transform::IDENTITY);
                info!(dataset = %request.dataset, entity = %request.entity, "navigating");
                Some(request)
            }
        }
    }

    pub fn is_selected(&self, node: NodeIndex) -> bool {
        self.state.selected == Some(node)
    }

    pub fn is_link_active(&self, link: LinkIndex) -> bool {
        self.state.toggled_links.contains(&link)
            || self.state.selection_links.contains(&link)
            || self.state.hovered_link == Some(link)
            || self.state.previewed_link == Some(link)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use eframe::egui::vec2;

    use crate::app::physics::{entity_graph, full_graph};
    use crate::graph::{RawGraph, RelationFilter};

    use super::*;

    #[derive(Default)]
    struct RecordingBridge {
        labels: Mutex<Vec<String>>,
    }

    impl HostBridge for RecordingBridge {
        fn receive_photo_name(&self, label: &str) {
            if let Ok(mut labels) = self.labels.lock() {
                labels.push(label.to_owned());
            }
        }
    }

    fn sample_graph() -> Graph {
        let raw: RawGraph = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "label": "A", "group": 1},
                    {"id": "b", "label": "img.jpg", "group": 0},
                    {"id": "c", "label": "C", "group": 2}
                ],
                "links": [
                    {"source": "a", "target": "b", "type": "near"},
                    {"source": "a", "target": "c", "type": "knows"}
                ]
            }"#,
        )
        .unwrap();
        Graph::build(&raw, &RelationFilter::PassThrough)
    }

    fn simulation_for(graph: &Graph) -> Simulation {
        full_graph(graph.nodes.len(), graph.endpoints())
    }

    #[test]
    fn selection_is_exclusive() {
        let graph = sample_graph();
        let sim = simulation_for(&graph);
        let mut viewport = Viewport::default();
        let mut controller = InteractionController::new(InteractionConfig::default(), "db", None);

        controller.node_click(&graph, &sim, &mut viewport, 0);
        controller.node_click(&graph, &sim, &mut viewport, 2);

        assert!(controller.is_selected(2));
        assert!(!controller.is_selected(0));
    }

    #[test]
    fn selection_propagates_to_incident_links() {
        let graph = sample_graph();
        let mut controller = InteractionController::new(InteractionConfig::default(), "db", None);

        controller.select(&graph, 2);
        assert!(controller.is_link_active(1));
        assert!(!controller.is_link_active(0));

        controller.config.propagate_selection = false;
        controller.select(&graph, 0);
        assert!(!controller.is_link_active(0));
        assert!(!controller.is_link_active(1));
    }

    #[test]
    fn toggled_links_survive_selection_changes() {
        let graph = sample_graph();
        let mut controller = InteractionController::new(InteractionConfig::default(), "db", None);

        controller.link_click(0);
        controller.select(&graph, 2);
        controller.background_click();
        assert!(controller.is_link_active(0));
        assert!(controller.state.selected.is_none());

        controller.link_click(0);
        assert!(!controller.is_link_active(0));
    }

    #[test]
    fn media_click_reaches_the_bridge() {
        let graph = sample_graph();
        let sim = simulation_for(&graph);
        let mut viewport = Viewport::default();
        let bridge = Arc::new(RecordingBridge::default());
        let mut controller = InteractionController::new(
            InteractionConfig::default(),
            "db",
            Some(bridge.clone() as Arc<dyn HostBridge>),
        );

        controller.node_click(&graph, &sim, &mut viewport, 1);
        controller.node_click(&graph, &sim, &mut viewport, 0);

        assert_eq!(*bridge.labels.lock().unwrap(), ["img.jpg"]);
        assert!(controller.is_selected(0));
    }

    #[test]
    fn navigation_waits_for_the_transition() {
        let graph = sample_graph();
        let sim = simulation_for(&graph);
        let mut viewport = Viewport::default();
        let config = InteractionConfig {
            navigate_on_click: true,
            ..InteractionConfig::default()
        };
        let mut controller = InteractionController::new(config, "db", None);

        controller.node_click(&graph, &sim, &mut viewport, 2);
        assert!(viewport.is_animating());
        assert_eq!(viewport.advance(0.25), None);

        let action = viewport.advance(0.3).unwrap();
        let request = controller.on_transition_end(action, &mut viewport);
        assert_eq!(
            request,
            Some(NavigationRequest {
                dataset: "db".to_owned(),
                entity: "C".to_owned(),
            })
        );
        assert_eq!(viewport.transform(), Transform::IDENTITY);
    }

    #[test]
    fn hover_is_ignored_without_hover_capability() {
        let config = InteractionConfig {
            hover_capable: false,
            ..InteractionConfig::default()
        };
        let mut controller = InteractionController::new(config, "db", None);

        controller.link_hover(Some(1));
        assert!(!controller.is_link_active(1));

        controller.config.hover_capable = true;
        controller.link_hover(Some(1));
        assert!(controller.is_link_active(1));
        controller.link_hover(None);
        assert!(!controller.is_link_active(1));
    }

    #[test]
    fn panel_preview_outlives_canvas_hover_updates() {
        let mut controller = InteractionController::new(InteractionConfig::default(), "db", None);

        controller.preview_link(Some(2));
        controller.link_hover(None);
        assert!(controller.is_link_active(2));

        controller.preview_link(None);
        assert!(!controller.is_link_active(2));
    }

    #[test]
    fn drag_pins_then_releases() {
        let graph = sample_graph();
        let mut sim = entity_graph(graph.nodes.len(), graph.endpoints());
        let mut viewport = Viewport::default();
        let mut controller = InteractionController::new(InteractionConfig::default(), "db", None);

        controller.drag_start(&mut sim, &mut viewport, 1);
        assert!(sim.is_pinned(1));
        assert_eq!(sim.alpha_target(), 0.3);

        controller.drag_move(&mut sim, vec2(80.0, -20.0));
        sim.tick();
        assert_eq!(sim.position(1), Some(vec2(80.0, -20.0)));

        controller.drag_end(&mut sim);
        assert!(!sim.is_pinned(1));
        assert_eq!(sim.alpha_target(), 0.0);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn keep_policy_leaves_the_pin() {
        let graph = sample_graph();
        let mut sim = simulation_for(&graph);
        let mut viewport = Viewport::default();
        let config = InteractionConfig {
            drag_end: DragEndPolicy::Keep,
            ..InteractionConfig::default()
        };
        let mut controller = InteractionController::new(config, "db", None);

        controller.drag_start(&mut sim, &mut viewport, 0);
        controller.drag_end(&mut sim);
        assert!(sim.is_pinned(0));
    }

    #[test]
    fn drag_interrupts_a_pending_navigation() {
        let graph = sample_graph();
        let mut sim = simulation_for(&graph);
        let mut viewport = Viewport::default();
        let config = InteractionConfig {
            navigate_on_click: true,
            ..InteractionConfig::default()
        };
        let mut controller = InteractionController::new(config, "db", None);

        controller.node_click(&graph, &sim, &mut viewport, 0);
        controller.drag_start(&mut sim, &mut viewport, 2);
        assert!(!viewport.is_animating());
        assert_eq!(viewport.advance(1.0), None);
    }
}

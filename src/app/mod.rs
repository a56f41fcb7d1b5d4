use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use eframe::egui::Context;
use tracing::{error, info, warn};

use crate::config::ViewerConfig;
use crate::graph::{DataSource, Payload, RawGraph, ViewRequest, fetch};

mod bubble;
mod graph;
mod interaction;
mod loader;
mod physics;
mod render_sync;
mod render_utils;
mod ui;
mod viewport;

use bubble::BubbleScene;
use graph::{GraphKind, GraphScene};
use interaction::NavigationRequest;
use loader::Loader;

pub use interaction::{DragEndPolicy, HostBridge, StdoutBridge};

enum Scene {
    Graph(Box<GraphScene>),
    Bubble(Box<BubbleScene>),
}

impl Scene {
    fn stop(&mut self) {
        match self {
            Self::Graph(scene) => scene.stop(),
            Self::Bubble(scene) => scene.stop(),
        }
    }
}

/// The last graph payload that was installed. Kept apart from the scene so
/// the exclusion list stays editable when it filters everything away.
#[derive(Clone, Debug)]
struct GraphPayload {
    raw: RawGraph,
    kind: GraphKind,
    dataset: String,
}

#[derive(Clone, Debug, PartialEq)]
enum LoadStatus {
    Loading,
    Ready,
    /// The payload arrived but left nothing to draw.
    Empty,
    Failed(String),
}

pub struct KgLensApp {
    config: ViewerConfig,
    source: DataSource,
    request: ViewRequest,
    loader: Loader<Payload>,
    scene: Option<Scene>,
    graph_payload: Option<GraphPayload>,
    status: LoadStatus,
    bridge: Option<Arc<dyn HostBridge>>,
    search: String,
}

impl KgLensApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: ViewerConfig,
        source: DataSource,
        request: ViewRequest,
        bridge: Option<Arc<dyn HostBridge>>,
    ) -> Self {
        let mut app = Self::idle(config, source, request, bridge);
        app.start_load();
        app
    }

    fn idle(
        config: ViewerConfig,
        source: DataSource,
        request: ViewRequest,
        bridge: Option<Arc<dyn HostBridge>>,
    ) -> Self {
        Self {
            config,
            source,
            request,
            loader: Loader::new(),
            scene: None,
            graph_payload: None,
            status: LoadStatus::Loading,
            bridge,
            search: String::new(),
        }
    }

    fn start_load(&mut self) {
        info!(request = %self.request, "loading view");
        let source = self.source.clone();
        let request = self.request.clone();
        self.loader.request(move || fetch(&source, &request));
        self.status = LoadStatus::Loading;
    }

    fn navigate(&mut self, navigation: NavigationRequest) {
        self.request = ViewRequest::Entity {
            dataset: navigation.dataset,
            entity: navigation.entity,
        };
        self.search.clear();
        self.start_load();
    }

    fn poll_loader(&mut self) {
        if let Some(result) = self.loader.poll() {
            self.apply_result(result);
        }
    }

    /// A failed load keeps whatever scene is currently shown.
    fn apply_result(&mut self, result: Result<Payload>) {
        match result {
            Ok(payload) => self.install(payload),
            Err(load_error) => {
                let message = format!("{load_error:#}");
                error!(request = %self.request, error = %message, "failed to load view");
                self.status = LoadStatus::Failed(message);
            }
        }
    }

    fn install(&mut self, payload: Payload) {
        let dataset = self.request.dataset().to_owned();
        let scene = match (&self.request, payload) {
            (ViewRequest::Graph { .. }, Payload::Graph(raw)) => {
                self.graph_payload = Some(GraphPayload {
                    raw,
                    kind: GraphKind::Full,
                    dataset,
                });
                self.build_graph_scene()
            }
            (ViewRequest::Entity { .. }, Payload::Graph(raw)) => {
                self.graph_payload = Some(GraphPayload {
                    raw,
                    kind: GraphKind::Entity,
                    dataset,
                });
                self.build_graph_scene()
            }
            (ViewRequest::Bubble { .. }, Payload::Bubbles(records)) => {
                self.graph_payload = None;
                BubbleScene::new(&records, dataset, &self.config)
                    .map(|scene| Scene::Bubble(Box::new(scene)))
            }
            (request, _) => {
                warn!(%request, "payload shape does not match the requested view");
                self.status = LoadStatus::Failed(format!("unexpected payload for {request}"));
                return;
            }
        };

        self.replace_scene(scene);
    }

    fn build_graph_scene(&self) -> Option<Scene> {
        let payload = self.graph_payload.as_ref()?;
        GraphScene::new(
            &payload.raw,
            payload.kind,
            payload.dataset.clone(),
            &self.config,
            self.bridge.clone(),
        )
        .map(|scene| Scene::Graph(Box::new(scene)))
    }

    /// Swaps in `scene` and hands back the previous one, already stopped.
    fn replace_scene(&mut self, scene: Option<Scene>) -> Option<Scene> {
        self.status = if scene.is_some() {
            LoadStatus::Ready
        } else {
            LoadStatus::Empty
        };

        let mut previous = std::mem::replace(&mut self.scene, scene)?;
        previous.stop();
        Some(previous)
    }

    /// Rebuilds the graph scene from the cached payload with a new exclusion
    /// list, without fetching again. The selected node survives by id.
    fn refilter(&mut self, excluded: Vec<String>) {
        self.config.excluded_relations = excluded;
        if self.graph_payload.is_none() {
            return;
        }

        let selected_id = match &self.scene {
            Some(Scene::Graph(current)) => current
                .controller
                .state
                .selected
                .and_then(|index| current.graph.nodes.get(index))
                .map(|node| node.id.clone()),
            _ => None,
        };

        let mut rebuilt = self.build_graph_scene();
        if let (Some(Scene::Graph(scene)), Some(id)) = (rebuilt.as_mut(), selected_id)
            && let Some(index) = scene.graph.index_of(&id)
        {
            scene.controller.select(&scene.graph, index);
        }

        self.replace_scene(rebuilt);
    }
}

impl eframe::App for KgLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        if self.loader.is_pending() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let actions = self.show_shell(ctx);

        if let Some(excluded) = actions.refilter {
            self.refilter(excluded);
        }
        if let Some(navigation) = actions.navigate {
            self.navigate(navigation);
        } else if actions.reload && !self.loader.is_pending() {
            self.start_load();
        }
    }
}

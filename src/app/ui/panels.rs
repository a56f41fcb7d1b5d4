use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui};

use super::super::interaction::NavigationRequest;
use super::super::{KgLensApp, LoadStatus, Scene};

/// What the panels asked for during one frame. Applied after drawing.
#[derive(Debug, Default)]
pub(in crate::app) struct ShellActions {
    pub(in crate::app) reload: bool,
    pub(in crate::app) navigate: Option<NavigationRequest>,
    pub(in crate::app) refilter: Option<Vec<String>>,
}

impl KgLensApp {
    pub(in crate::app) fn show_shell(&mut self, ctx: &Context) -> ShellActions {
        let mut actions = ShellActions::default();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("kg-lens");
                    ui.separator();
                    ui.label(self.request.to_string());
                    if let Some(counts) = self.scene_counts() {
                        ui.label(counts);
                    }

                    let label = if matches!(self.status, LoadStatus::Failed(_)) {
                        "Retry"
                    } else {
                        "Reload"
                    };
                    let reload_button =
                        ui.add_enabled(!self.loader.is_pending(), egui::Button::new(label));
                    if reload_button.clicked() {
                        actions.reload = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        self.draw_status(ui);
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui, &mut actions));
            });

        if matches!(self.scene, Some(Scene::Graph(_))) {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| self.draw_details(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| match self.scene.as_mut() {
                Some(Scene::Graph(scene)) => {
                    actions.navigate = scene.show(ui, &self.search);
                }
                Some(Scene::Bubble(scene)) => scene.show(ui),
                None => self.draw_placeholder(ui),
            });

        actions
    }

    fn scene_counts(&self) -> Option<String> {
        match self.scene.as_ref()? {
            Scene::Graph(scene) => Some(format!(
                "nodes: {}  links: {}",
                scene.graph.nodes.len(),
                scene.graph.links.len()
            )),
            Scene::Bubble(scene) => Some(format!("bubbles: {}", scene.bubbles.len())),
        }
    }

    fn draw_status(&self, ui: &mut Ui) {
        match &self.status {
            LoadStatus::Loading => {
                ui.spinner();
                ui.label("Loading...");
            }
            LoadStatus::Ready => {
                ui.label(RichText::new("Ready").color(Color32::from_rgb(126, 204, 126)));
            }
            LoadStatus::Empty => {
                ui.label("Nothing to display");
            }
            LoadStatus::Failed(message) => {
                ui.label(RichText::new("Load failed").color(Color32::from_rgb(235, 110, 100)))
                    .on_hover_text(message.as_str());
            }
        }
    }

    fn draw_placeholder(&self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            match &self.status {
                LoadStatus::Loading => {
                    ui.heading(format!("Loading {}...", self.request));
                    ui.add_space(8.0);
                    ui.spinner();
                }
                LoadStatus::Empty | LoadStatus::Ready => {
                    ui.heading("This view has no nodes or relations to show.");
                }
                LoadStatus::Failed(message) => {
                    ui.heading("Failed to load the view");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                }
            }
        });
    }
}

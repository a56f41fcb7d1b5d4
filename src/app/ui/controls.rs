use eframe::egui::{self, RichText, Ui};

use crate::util::short_label;

use crate::graph::RawGraph;

use super::super::graph::{GraphKind, GraphScene};
use super::super::interaction::DragEndPolicy;
use super::super::physics::{CollideRadius, Force, NamedForce, Simulation};
use super::super::viewport::{Transform, TransitionAction, Viewport};
use super::super::{KgLensApp, Scene};
use super::ShellActions;

const SEARCH_RESULT_ROWS: usize = 12;
const REHEAT_ALPHA: f32 = 0.3;
const RESET_VIEW_SECONDS: f32 = 0.5;

fn reheat(simulation: &mut Simulation) {
    if simulation.alpha() < REHEAT_ALPHA {
        simulation.set_alpha(REHEAT_ALPHA);
    }
    simulation.restart();
}

fn slider(ui: &mut Ui, value: &mut f32, range: std::ops::RangeInclusive<f32>, text: &str) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .changed()
}

/// Per-force tuning widgets. Returns whether anything changed.
fn draw_force(ui: &mut Ui, entry: &mut NamedForce) -> bool {
    let mut changed = ui
        .checkbox(&mut entry.enabled, entry.name)
        .on_hover_text("Include this force in every tick.")
        .changed();

    ui.add_enabled_ui(entry.enabled, |ui| {
        ui.indent(entry.name, |ui| match &mut entry.force {
            Force::Link(link) => {
                changed |= slider(ui, &mut link.distance, 20.0..=500.0, "Rest length");
                changed |= slider(ui, &mut link.strength_scale, 0.1..=2.0, "Strength scale");
            }
            Force::ManyBody(charge) => {
                changed |= slider(ui, &mut charge.strength, -3000.0..=0.0, "Strength");
                changed |= slider(ui, &mut charge.theta, 0.3..=1.5, "Theta");
            }
            Force::Collide(collide) => {
                if let CollideRadius::Fixed(radius) = &mut collide.radius {
                    changed |= slider(ui, radius, 0.0..=150.0, "Radius");
                }
                changed |= slider(ui, &mut collide.strength, 0.0..=1.0, "Strength");
            }
            Force::Center(center) => {
                changed |= slider(ui, &mut center.strength, 0.0..=1.0, "Strength");
            }
            Force::X(axis) | Force::Y(axis) => {
                changed |= slider(ui, &mut axis.strength, 0.0..=1.0, "Strength");
            }
        });
    });

    changed
}

fn draw_simulation(ui: &mut Ui, simulation: &mut Simulation) {
    ui.label(format!(
        "alpha {:.3}  target {:.2}  ticks {}",
        simulation.alpha(),
        simulation.alpha_target(),
        simulation.tick_count()
    ));

    ui.horizontal(|ui| {
        if ui
            .button("Reheat")
            .on_hover_text("Restart the layout from full temperature.")
            .clicked()
        {
            simulation.set_alpha(1.0);
            simulation.restart();
        }
        if ui.button("Stop").clicked() {
            simulation.stop();
        }
    });

    let enabled = simulation
        .forces()
        .iter()
        .filter(|entry| entry.enabled)
        .count();
    let mut forces_changed = false;
    egui::CollapsingHeader::new(format!("Forces ({enabled}/{} on)", simulation.forces().len()))
        .id_salt("forces")
        .default_open(true)
        .show(ui, |ui| {
            for entry in simulation.forces_mut() {
                forces_changed |= draw_force(ui, entry);
            }
        });
    if forces_changed {
        reheat(simulation);
    }
}

impl GraphScene {
    fn draw_search_results(&mut self, ui: &mut Ui, search: &str) {
        let matches = self.search_matches(search);
        if search.trim().is_empty() {
            return;
        }
        if matches.is_empty() {
            ui.label("No matching labels.");
            return;
        }

        for index in matches.into_iter().take(SEARCH_RESULT_ROWS) {
            let Some(node) = self.graph.nodes.get(index) else {
                continue;
            };
            let selected = self.controller.is_selected(index);
            if ui
                .selectable_label(selected, short_label(&node.label, 32).into_owned())
                .on_hover_text(node.id.as_str())
                .clicked()
            {
                self.controller.select(&self.graph, index);
            }
        }
    }
}

fn draw_view(ui: &mut Ui, viewport: &mut Viewport) {
    let [low, high] = viewport.scale_extent();
    ui.horizontal(|ui| {
        ui.label(format!("zoom {:.2}x  ({low}..{high})", viewport.scale()));
        if ui
            .button("Reset view")
            .on_hover_text("Ease back to the origin at zoom 1.")
            .clicked()
        {
            viewport.animate_to(
                Transform::IDENTITY,
                RESET_VIEW_SECONDS,
                TransitionAction::Settle,
            );
        }
    });
}

/// Entity views only. Changes are applied after the frame as a refilter.
fn draw_relation_filter(
    ui: &mut Ui,
    raw: &RawGraph,
    excluded: &[String],
    actions: &mut ShellActions,
) {
    egui::CollapsingHeader::new("Hidden relations")
        .default_open(false)
        .show(ui, |ui| {
            let mut next = excluded.to_vec();
            let mut changed = false;
            for relation in raw.relation_types() {
                let mut hidden = next.iter().any(|entry| entry == relation);
                if ui.checkbox(&mut hidden, relation).changed() {
                    changed = true;
                    if hidden {
                        next.push(relation.to_owned());
                    } else {
                        next.retain(|entry| entry != relation);
                    }
                }
            }
            if changed {
                actions.refilter = Some(next);
            }
        });
}

impl KgLensApp {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, actions: &mut ShellActions) {
        ui.heading("Layout Controls");
        ui.separator();
        ui.add_space(4.0);

        let Self {
            scene,
            graph_payload,
            search,
            config,
            ..
        } = self;

        let filterable = graph_payload
            .as_ref()
            .filter(|payload| payload.kind == GraphKind::Entity);

        let Some(scene) = scene.as_mut() else {
            match filterable {
                Some(payload) => {
                    ui.label("Every relation in this view is hidden.");
                    draw_relation_filter(ui, &payload.raw, &config.excluded_relations, actions);
                }
                None => {
                    ui.label("Waiting for data.");
                }
            }
            return;
        };

        match scene {
            Scene::Graph(scene) => {
                ui.label("Search labels")
                    .on_hover_text("Fuzzy-highlight matching nodes, click a result to select it.");
                ui.text_edit_singleline(search);
                scene.draw_search_results(ui, search);

                ui.separator();
                ui.label(RichText::new("Interaction").strong());

                let mut keep_pinned = scene.controller.config.drag_end == DragEndPolicy::Keep;
                if ui
                    .checkbox(&mut keep_pinned, "Keep nodes pinned after drag")
                    .changed()
                {
                    let policy = if keep_pinned {
                        DragEndPolicy::Keep
                    } else {
                        DragEndPolicy::Release
                    };
                    scene.controller.config.drag_end = policy;
                    config.drag_end = policy;
                }

                if ui
                    .checkbox(
                        &mut scene.controller.config.propagate_selection,
                        "Highlight links of the selected node",
                    )
                    .changed()
                {
                    config.propagate_selection = scene.controller.config.propagate_selection;
                    if let Some(selected) = scene.controller.state.selected {
                        scene.controller.select(&scene.graph, selected);
                    }
                }

                if ui
                    .checkbox(
                        &mut scene.controller.config.hover_capable,
                        "Highlight links on hover",
                    )
                    .changed()
                {
                    config.hover_capable = scene.controller.config.hover_capable;
                    scene.controller.state.hovered_link = None;
                }

                if ui.button("Release all pins").clicked() {
                    for index in 0..scene.graph.nodes.len() {
                        scene.simulation.unpin(index);
                    }
                    reheat(&mut scene.simulation);
                }

                if let Some(payload) = filterable {
                    draw_relation_filter(ui, &payload.raw, &config.excluded_relations, actions);
                }

                ui.separator();
                draw_view(ui, &mut scene.viewport);
                ui.label(RichText::new("Simulation").strong());
                draw_simulation(ui, &mut scene.simulation);
            }
            Scene::Bubble(scene) => {
                draw_view(ui, &mut scene.viewport);
                ui.label(RichText::new("Simulation").strong());
                draw_simulation(ui, &mut scene.simulation);
            }
        }
    }
}

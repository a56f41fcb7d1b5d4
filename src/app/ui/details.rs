use eframe::egui::{self, RichText, Ui};

use crate::graph::{Graph, LinkIndex, NodeIndex};
use crate::util::short_label;

use super::super::{KgLensApp, Scene};

/// One row of the incident-relations list.
struct RelationRow {
    link: LinkIndex,
    key: String,
    other: NodeIndex,
    relation: String,
    other_label: String,
    outgoing: bool,
    active: bool,
}

fn relation_rows(
    graph: &Graph,
    node: NodeIndex,
    is_active: impl Fn(LinkIndex) -> bool,
) -> Vec<RelationRow> {
    let mut rows = graph
        .incident_links(node)
        .iter()
        .filter_map(|&link| {
            let entry = graph.links.get(link)?;
            let other = graph.other_end(link, node)?;
            Some(RelationRow {
                link,
                key: graph.link_key(link),
                other,
                relation: entry.relation.clone(),
                other_label: graph.nodes.get(other)?.label.clone(),
                outgoing: entry.source == node,
                active: is_active(link),
            })
        })
        .collect::<Vec<_>>();

    rows.sort_by(|a, b| {
        a.relation
            .cmp(&b.relation)
            .then_with(|| a.other_label.cmp(&b.other_label))
    });
    rows
}

fn group_name(group: i64) -> String {
    if group == 0 {
        "media".to_owned()
    } else {
        group.to_string()
    }
}

impl KgLensApp {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(Scene::Graph(scene)) = self.scene.as_mut() else {
            return;
        };
        scene.controller.preview_link(None);

        let active_links = (0..scene.graph.links.len())
            .filter(|&link| scene.controller.is_link_active(link))
            .count();
        ui.label(format!("Highlighted links: {active_links}"));

        if let Some(link) = scene.controller.state.hovered_link
            && let Some(entry) = scene.graph.links.get(link)
        {
            let source = &scene.graph.nodes[entry.source].label;
            let target = &scene.graph.nodes[entry.target].label;
            ui.label(format!("Hovering: {source} -[{}]-> {target}", entry.relation));
        }

        if !scene.controller.state.toggled_links.is_empty()
            && ui
                .small_button("Clear toggled links")
                .on_hover_text("Links clicked on the canvas stay highlighted until cleared.")
                .clicked()
        {
            scene.controller.state.toggled_links.clear();
        }

        ui.separator();

        let Some(selected) = scene.controller.state.selected else {
            ui.label("Click a node on the canvas or pick a search result.");
            return;
        };
        let Some(node) = scene.graph.nodes.get(selected) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Group: {}", group_name(node.group)));
        if node.is_media() {
            let path = self.config.image_path(&scene.dataset, &node.label);
            ui.label(format!("Image: {path}"));
        }

        let pinned = scene.simulation.is_pinned(selected);
        ui.horizontal(|ui| {
            ui.label(if pinned { "Pinned" } else { "Free" });
            if pinned && ui.small_button("Release").clicked() {
                scene.simulation.unpin(selected);
                scene.simulation.restart();
            }
        });

        let rows = relation_rows(&scene.graph, selected, |link| {
            scene.controller.is_link_active(link)
        });

        ui.separator();
        ui.label(RichText::new(format!("Relations ({})", rows.len())).strong());
        if rows.is_empty() {
            ui.label("This node has no visible relations.");
            return;
        }

        let mut follow = None;
        let mut previewed = None;
        egui::ScrollArea::vertical()
            .id_salt("relations_scroll")
            .max_height(360.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, rows.len(), |ui, row_range| {
                for row in &rows[row_range] {
                    let arrow = if row.outgoing { "->" } else { "<-" };
                    let mut text = RichText::new(format!(
                        "{arrow} {}  {}",
                        row.relation,
                        short_label(&row.other_label, 24)
                    ));
                    if row.active {
                        text = text.strong();
                    }

                    let response = ui
                        .link(text)
                        .on_hover_text(format!("{}\n{}", row.other_label, row.key));
                    if response.clicked() {
                        follow = Some(row.other);
                    }
                    if response.hovered() {
                        previewed = Some(row.link);
                    }
                }
            });

        scene.controller.preview_link(previewed);
        if let Some(other) = follow {
            scene.controller.select(&scene.graph, other);
        }
    }
}

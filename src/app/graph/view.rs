use std::collections::HashSet;

use eframe::egui::epaint::TextShape;
use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui,
    vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::NodeIndex;
use crate::util::short_label;

use super::super::interaction::NavigationRequest;
use super::super::render_sync::{MEDIA_HIT_HALF_EXTENT, NODE_HIT_RADIUS};
use super::super::render_utils::{circle_visible, dim_color, draw_background, edge_visible};
use super::GraphScene;

const MEDIA_TILE_SIZE: f32 = 60.0;
const LINK_LABEL_FONT: f32 = 11.0;
const NODE_LABEL_FONT: f32 = 15.0;
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const ACTIVE_LINK_COLOR: Color32 = Color32::from_rgb(241, 146, 94);
const CANVAS_COLOR: Color32 = Color32::from_rgb(19, 23, 29);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Draws `text` centered on `anchor`, rotated by `angle` radians about it.
pub(in crate::app) fn paint_rotated_text(
    painter: &Painter,
    anchor: Pos2,
    angle: f32,
    text: &str,
    font: FontId,
    color: Color32,
) {
    let galley = painter.layout_no_wrap(text.to_owned(), font, color);
    let half = galley.size() * 0.5;
    let (sin, cos) = angle.sin_cos();
    let offset = vec2(-half.x * cos + half.y * sin, -half.x * sin - half.y * cos);
    painter.add(TextShape::new(anchor + offset, galley, color).with_angle(angle));
}

impl GraphScene {
    /// Node indices whose label fuzzily matches `query`, best match first.
    pub(in crate::app) fn search_matches(&self, query: &str) -> Vec<NodeIndex> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                fuzzy_match_score(&matcher, &node.label, query).map(|score| (score, index))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, index)| index).collect()
    }

    pub(in crate::app) fn show(&mut self, ui: &mut Ui, search: &str) -> Option<NavigationRequest> {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_input(ui, rect, &response);

        let dt = ui.input(|input| input.stable_dt).min(0.1);
        let navigation = self.advance(dt);
        if self.is_busy() {
            ui.ctx().request_repaint();
        }

        draw_background(&painter, rect, self.viewport.transform());
        let matches = self.search_matches(search).into_iter().collect::<HashSet<_>>();
        self.paint_links(&painter, rect);
        self.paint_nodes(&painter, rect, &matches, !search.trim().is_empty());
        self.paint_hover_caption(&painter, rect);

        navigation
    }

    fn paint_links(&self, painter: &Painter, rect: Rect) {
        let geometry = self.geometry.borrow();
        let center = rect.center();
        let scale = self.viewport.scale();
        let label_font = FontId::proportional((LINK_LABEL_FONT * scale).clamp(5.0, 40.0));
        let draw_labels = scale > 0.3;

        for (index, (link, shape)) in self.graph.links.iter().zip(&geometry.links).enumerate() {
            let start = self.viewport.world_to_screen(center, shape.start);
            let end = self.viewport.world_to_screen(center, shape.end);
            if !edge_visible(rect, start, end, 30.0 * scale) {
                continue;
            }

            let active = self.controller.is_link_active(index);
            let stroke = if active {
                Stroke::new((2.6 * scale).clamp(1.4, 6.0), ACTIVE_LINK_COLOR)
            } else {
                Stroke::new(
                    (1.2 * scale).clamp(0.6, 3.0),
                    Color32::from_rgba_unmultiplied(150, 156, 166, 200),
                )
            };
            painter.line_segment([start, end], stroke);

            if !draw_labels {
                continue;
            }

            let corners = shape
                .background_corners()
                .map(|corner| self.viewport.world_to_screen(center, corner));
            painter.add(Shape::convex_polygon(
                corners.to_vec(),
                CANVAS_COLOR,
                Stroke::NONE,
            ));

            let text_color = if active {
                ACTIVE_LINK_COLOR
            } else {
                Color32::from_rgb(126, 204, 126)
            };
            paint_rotated_text(
                painter,
                self.viewport.world_to_screen(center, shape.midpoint),
                shape.label_angle_rad(),
                &short_label(&link.relation, 14),
                label_font.clone(),
                text_color,
            );
        }
    }

    fn paint_nodes(
        &self,
        painter: &Painter,
        rect: Rect,
        matches: &HashSet<NodeIndex>,
        search_active: bool,
    ) {
        let geometry = self.geometry.borrow();
        let center = rect.center();
        let scale = self.viewport.scale();
        let draw_labels = scale > 0.25;
        let label_font = FontId::proportional((NODE_LABEL_FONT * scale).clamp(6.0, 48.0));

        for (index, node) in self.graph.nodes.iter().enumerate() {
            let Some(&world) = geometry.nodes.get(index) else {
                continue;
            };
            let position = self.viewport.world_to_screen(center, world);
            if !circle_visible(rect, position, MEDIA_HIT_HALF_EXTENT * 1.5 * scale) {
                continue;
            }

            let selected = self.controller.is_selected(index);
            let matched = matches.contains(&index);

            if node.is_media() {
                if selected {
                    painter.rect_filled(
                        Rect::from_center_size(position, vec2(70.0, 70.0) * scale),
                        0.0,
                        Color32::from_rgba_unmultiplied(255, 34, 34, 128),
                    );
                }

                let tile = Rect::from_center_size(position, vec2(MEDIA_TILE_SIZE, MEDIA_TILE_SIZE) * scale);
                painter.rect_filled(tile, 3.0, Color32::from_rgb(62, 72, 88));
                painter.rect_stroke(
                    tile,
                    3.0,
                    Stroke::new(
                        if matched { 2.0 } else { 1.0 },
                        if matched { MATCH_COLOR } else { Color32::from_gray(120) },
                    ),
                    StrokeKind::Inside,
                );
                if draw_labels {
                    painter.text(
                        position,
                        Align2::CENTER_CENTER,
                        short_label(&node.label, 10),
                        FontId::proportional((9.0 * scale).clamp(5.0, 30.0)),
                        Color32::from_gray(225),
                    );
                }
                continue;
            }

            let radius = NODE_HIT_RADIUS * scale;
            let base_color = self.node_color(index);
            let color = if search_active && !matched && !selected {
                dim_color(base_color, 0.45)
            } else {
                base_color
            };
            painter.circle_filled(position, radius, color);

            if selected {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.4, SELECTED_COLOR));
            } else if matched {
                painter.circle_stroke(position, radius + 2.0, Stroke::new(1.8, MATCH_COLOR));
            }

            if draw_labels {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    short_label(&node.label, 8),
                    label_font.clone(),
                    Color32::from_gray(15),
                );
            }
        }
    }

    fn paint_hover_caption(&self, painter: &Painter, rect: Rect) {
        let Some(link) = self
            .controller
            .state
            .hovered_link
            .and_then(|index| self.graph.links.get(index))
        else {
            return;
        };

        let caption = format!(
            "{}  -[{}]->  {}",
            self.graph.nodes[link.source].label, link.relation, self.graph.nodes[link.target].label
        );
        painter.text(
            rect.left_top() + egui::vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            caption,
            FontId::proportional(13.0),
            Color32::from_gray(240),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ViewerConfig;
    use crate::graph::RawGraph;

    use super::super::GraphKind;
    use super::*;

    #[test]
    fn search_ranks_closer_labels_first() {
        let raw: RawGraph = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "label": "Seoul Station", "group": 1},
                    {"id": "b", "label": "Busan", "group": 1},
                    {"id": "c", "label": "Seoul", "group": 1}
                ],
                "links": [
                    {"source": "a", "target": "b", "type": "train"},
                    {"source": "b", "target": "c", "type": "train"}
                ]
            }"#,
        )
        .unwrap();
        let scene = GraphScene::new(
            &raw,
            GraphKind::Full,
            "db".to_owned(),
            &ViewerConfig::default(),
            None,
        )
        .unwrap();

        let matches = scene.search_matches("seoul");
        assert_eq!(matches.len(), 2);
        assert!(!matches.contains(&1));
        assert!(scene.search_matches("   ").is_empty());
    }
}

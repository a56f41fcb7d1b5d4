use eframe::egui::{Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use super::super::render_utils::{circle_visible, draw_background};
use super::BubbleScene;

impl BubbleScene {
    pub(in crate::app) fn show(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_input(ui, rect, &response);

        let dt = ui.input(|input| input.stable_dt).min(0.1);
        self.simulation.step();
        self.viewport.advance(dt);
        if self.is_busy() {
            ui.ctx().request_repaint();
        }

        draw_background(&painter, rect, self.viewport.transform());

        let geometry = self.geometry.borrow();
        let center = rect.center();
        let scale = self.viewport.scale();

        for (bubble, &world) in self.bubbles.iter().zip(&geometry.nodes) {
            let position = self.viewport.world_to_screen(center, world);
            let radius = bubble.radius * scale;
            if !circle_visible(rect, position, radius) {
                continue;
            }

            painter.circle_filled(position, radius, bubble.color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 120)),
            );

            let font_size = bubble.font_size * scale;
            if font_size >= 4.0 {
                painter.text(
                    position + vec2(0.0, 5.0 * scale),
                    Align2::CENTER_CENTER,
                    bubble.entity.as_str(),
                    FontId::proportional(font_size),
                    Color32::from_gray(235),
                );
            }
        }
    }
}

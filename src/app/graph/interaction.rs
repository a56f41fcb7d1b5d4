use eframe::egui::{self, Rect, Ui, Vec2};

use super::super::interaction::NavigationRequest;
use super::super::render_sync::LINK_HOVER_BAND;
use super::super::viewport::Viewport;
use super::GraphScene;

/// Pointer state for one frame, already mapped into world coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub(in crate::app) struct CanvasGesture {
    pub(in crate::app) pointer_world: Option<Vec2>,
    pub(in crate::app) press_world: Option<Vec2>,
    pub(in crate::app) drag_started: bool,
    pub(in crate::app) dragging: bool,
    pub(in crate::app) drag_stopped: bool,
    pub(in crate::app) drag_delta: Vec2,
    pub(in crate::app) clicked: bool,
}

/// Reads the canvas response and applies wheel zoom to `viewport` directly.
pub(in crate::app) fn read_canvas_gesture(
    ui: &Ui,
    rect: Rect,
    response: &egui::Response,
    viewport: &mut Viewport,
) -> CanvasGesture {
    let center = rect.center();

    if response.hovered() {
        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() > f32::EPSILON {
            let pointer = ui
                .input(|input| input.pointer.hover_pos())
                .unwrap_or(center);
            let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
            viewport.zoom_at(pointer - center, factor);
        }
    }

    let (latest, press_origin) =
        ui.input(|input| (input.pointer.latest_pos(), input.pointer.press_origin()));
    let pointer_world = latest
        .filter(|pointer| rect.contains(*pointer) || response.dragged())
        .map(|pointer| viewport.screen_to_world(center, pointer));

    CanvasGesture {
        pointer_world,
        press_world: press_origin.map(|origin| viewport.screen_to_world(center, origin)),
        drag_started: response.drag_started(),
        dragging: response.dragged(),
        drag_stopped: response.drag_stopped(),
        drag_delta: response.drag_delta(),
        clicked: response.clicked(),
    }
}

impl GraphScene {
    pub(in crate::app) fn handle_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let gesture = read_canvas_gesture(ui, rect, response, &mut self.viewport);

        let (hovered_node, hovered_link, pressed_node) = {
            let geometry = self.geometry.borrow();
            let node_at = |world: Vec2| geometry.node_at(world, |index| self.hit_shape(index));
            let hovered_node = gesture.pointer_world.and_then(node_at);
            let hovered_link = match (hovered_node, gesture.pointer_world) {
                (None, Some(world)) => {
                    geometry.link_at(world, LINK_HOVER_BAND * 0.5 / self.viewport.scale())
                }
                _ => None,
            };
            let pressed_node = if gesture.drag_started {
                gesture.press_world.and_then(node_at)
            } else {
                None
            };
            (hovered_node, hovered_link, pressed_node)
        };

        if gesture.drag_started {
            match pressed_node {
                Some(node) => {
                    self.controller
                        .drag_start(&mut self.simulation, &mut self.viewport, node);
                }
                None => self.viewport.interrupt(),
            }
        }

        if gesture.dragging {
            if self.controller.is_dragging() {
                if let Some(world) = gesture.pointer_world {
                    self.controller.drag_move(&mut self.simulation, world);
                }
            } else {
                self.viewport.pan_by(gesture.drag_delta);
            }
        }

        if gesture.drag_stopped {
            self.controller.drag_end(&mut self.simulation);
        }

        if !self.controller.is_dragging() {
            self.controller.link_hover(hovered_link);
        }

        if gesture.clicked {
            match (hovered_node, hovered_link) {
                (Some(node), _) => self.controller.node_click(
                    &self.graph,
                    &self.simulation,
                    &mut self.viewport,
                    node,
                ),
                (None, Some(link)) => self.controller.link_click(link),
                (None, None) => self.controller.background_click(),
            }
        }

        if hovered_node.is_some() || hovered_link.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }
    }

    /// Per-frame driver: one simulation step and the viewport transition.
    pub(in crate::app) fn advance(&mut self, dt: f32) -> Option<NavigationRequest> {
        self.simulation.step();

        let action = self.viewport.advance(dt)?;
        self.controller.on_transition_end(action, &mut self.viewport)
    }
}

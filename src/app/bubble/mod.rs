mod view;

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::{self, Color32, Rect, Ui};
use tracing::info;

use crate::config::ViewerConfig;
use crate::graph::BubbleRecord;

use super::graph::read_canvas_gesture;
use super::interaction::{DragEndPolicy, InteractionConfig, InteractionController};
use super::physics::{Simulation, bubble};
use super::render_sync::{HitShape, SceneGeometry};
use super::render_utils::hsl_color;
use super::viewport::Viewport;

const MIN_RADIUS: f32 = 5.0;
const MIN_FONT_SIZE: f32 = 7.0;

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct Bubble {
    pub(in crate::app) entity: String,
    pub(in crate::app) frequency: f64,
    pub(in crate::app) radius: f32,
    pub(in crate::app) color: Color32,
    pub(in crate::app) font_size: f32,
}

impl Bubble {
    fn new(record: &BubbleRecord, index: usize, count: usize) -> Self {
        let frequency = record.frequency as f32;
        let hue = index as f32 / count.max(1) as f32 * 360.0;

        Self {
            entity: record.entity.clone(),
            frequency: record.frequency,
            radius: (frequency * 10.0).max(MIN_RADIUS),
            color: hsl_color(hue, 0.9, 0.5, 0.5),
            font_size: (frequency * 2.0).max(MIN_FONT_SIZE),
        }
    }

    fn collide_radius(&self) -> f32 {
        self.frequency as f32 * 10.0 + 3.0
    }
}

/// Frequency bubbles. Draggable, nothing selectable.
pub(in crate::app) struct BubbleScene {
    pub(in crate::app) bubbles: Vec<Bubble>,
    pub(in crate::app) simulation: Simulation,
    pub(in crate::app) geometry: Rc<RefCell<SceneGeometry>>,
    pub(in crate::app) controller: InteractionController,
    pub(in crate::app) viewport: Viewport,
}

impl BubbleScene {
    pub(in crate::app) fn new(
        records: &[BubbleRecord],
        dataset: String,
        config: &ViewerConfig,
    ) -> Option<Self> {
        if records.is_empty() {
            info!(%dataset, "no bubble records to lay out");
            return None;
        }

        let bubbles = records
            .iter()
            .enumerate()
            .map(|(index, record)| Bubble::new(record, index, records.len()))
            .collect::<Vec<_>>();
        let mut simulation = bubble(bubbles.iter().map(Bubble::collide_radius).collect());
        let geometry = SceneGeometry::new(Vec::new()).attach(&mut simulation);

        let controller = InteractionController::new(
            InteractionConfig {
                drag_end: DragEndPolicy::Release,
                propagate_selection: false,
                navigate_on_click: false,
                selectable: false,
                hover_capable: config.hover_capable,
                ..InteractionConfig::default()
            },
            dataset.as_str(),
            None,
        );

        info!(%dataset, bubbles = bubbles.len(), "bubble scene ready");

        Some(Self {
            bubbles,
            simulation,
            geometry,
            controller,
            viewport: Viewport::new(config.bubble_scale_extent),
        })
    }

    pub(in crate::app) fn handle_input(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let gesture = read_canvas_gesture(ui, rect, response, &mut self.viewport);

        if gesture.drag_started {
            let pressed = gesture.press_world.and_then(|world| {
                self.geometry.borrow().node_at(world, |index| {
                    HitShape::Circle(self.bubbles.get(index).map_or(0.0, |bubble| bubble.radius))
                })
            });
            match pressed {
                Some(index) => {
                    self.controller
                        .drag_start(&mut self.simulation, &mut self.viewport, index);
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

    fn record(entity: &str, frequency: f64) -> BubbleRecord {
        BubbleRecord {
            entity: entity.to_owned(),
            frequency,
        }
    }

    #[test]
    fn bubble_sizes_follow_frequency() {
        let small = Bubble::new(&record("a", 0.2), 0, 2);
        let large = Bubble::new(&record("b", 6.0), 1, 2);

        assert_eq!(small.radius, MIN_RADIUS);
        assert_eq!(small.font_size, MIN_FONT_SIZE);
        assert_eq!(large.radius, 60.0);
        assert_eq!(large.font_size, 12.0);
        assert_eq!(large.collide_radius(), 63.0);
    }

    #[test]
    fn bubble_colors_spread_over_the_hue_circle() {
        let first = Bubble::new(&record("a", 1.0), 0, 3);
        assert_eq!(first.color, hsl_color(0.0, 0.9, 0.5, 0.5));
        assert_eq!(first.color.a(), 128);

        let second = Bubble::new(&record("b", 1.0), 1, 3);
        assert_eq!(second.color, hsl_color(120.0, 0.9, 0.5, 0.5));
    }

    #[test]
    fn empty_records_build_no_scene() {
        assert!(BubbleScene::new(&[], "db".to_owned(), &ViewerConfig::default()).is_none());
    }

    #[test]
    fn scene_uses_bubble_extent_and_cannot_select() {
        let records = [record("a", 2.0), record("b", 3.0)];
        let scene = BubbleScene::new(&records, "db".to_owned(), &ViewerConfig::default()).unwrap();

        assert_eq!(scene.viewport.scale_extent(), [0.1, 5.0]);
        assert!(!scene.controller.config.selectable);
        assert_eq!(scene.geometry.borrow().nodes.len(), 2);
    }
}

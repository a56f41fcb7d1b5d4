use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::{Vec2, vec2};

use crate::graph::{LinkIndex, NodeIndex};

use super::physics::{Body, Simulation};

pub const LABEL_BACKGROUND_SIZE: Vec2 = vec2(40.0, 12.0);
pub const LINK_HOVER_BAND: f32 = 10.0;
pub const NODE_HIT_RADIUS: f32 = 30.0;
pub const MEDIA_HIT_HALF_EXTENT: f32 = 35.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitShape {
    Circle(f32),
    Square(f32),
}

impl HitShape {
    /// Hit area of a graph node, tiles for media and circles otherwise.
    pub fn for_node(is_media: bool) -> Self {
        if is_media {
            Self::Square(MEDIA_HIT_HALF_EXTENT)
        } else {
            Self::Circle(NODE_HIT_RADIUS)
        }
    }

    fn contains(self, offset: Vec2) -> bool {
        match self {
            Self::Circle(radius) => offset.length_sq() <= radius * radius,
            Self::Square(half_extent) => {
                offset.x.abs() <= half_extent && offset.y.abs() <= half_extent
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkGeometry {
    /// Path endpoints ordered left to right.
    pub start: Vec2,
    pub end: Vec2,
    pub midpoint: Vec2,
    /// 180 when the link runs right to left, so its label stays upright.
    pub label_rotation_deg: f32,
    /// Direction of source to target, used for the label background.
    pub background_angle_deg: f32,
}

impl LinkGeometry {
    pub fn from_endpoints(source: Vec2, target: Vec2) -> Self {
        let reversed = source.x > target.x;
        let (start, end) = if reversed {
            (target, source)
        } else {
            (source, target)
        };
        let direction = target - source;

        Self {
            start,
            end,
            midpoint: (source + target) * 0.5,
            label_rotation_deg: if reversed { 180.0 } else { 0.0 },
            background_angle_deg: direction.y.atan2(direction.x).to_degrees(),
        }
    }

    pub fn label_angle_rad(&self) -> f32 {
        (self.background_angle_deg + self.label_rotation_deg).to_radians()
    }

    /// Corners of the rotated label background, clockwise from top left.
    pub fn background_corners(&self) -> [Vec2; 4] {
        let angle = self.background_angle_deg.to_radians();
        let (sin, cos) = angle.sin_cos();
        let half = LABEL_BACKGROUND_SIZE * 0.5;
        let rotate = |offset: Vec2| vec2(offset.x * cos - offset.y * sin, offset.x * sin + offset.y * cos);

        [
            vec2(-half.x, -half.y),
            vec2(half.x, -half.y),
            vec2(half.x, half.y),
            vec2(-half.x, half.y),
        ]
        .map(|corner| self.midpoint + rotate(corner))
    }
}

/// Derived geometry for one scene, refreshed from the simulation after each
/// driven tick. Reads bodies, never writes them.
#[derive(Clone, Debug, Default)]
pub struct SceneGeometry {
    endpoints: Vec<(NodeIndex, NodeIndex)>,
    pub nodes: Vec<Vec2>,
    pub links: Vec<LinkGeometry>,
}

impl SceneGeometry {
    pub fn new(endpoints: Vec<(NodeIndex, NodeIndex)>) -> Self {
        Self {
            links: vec![LinkGeometry::default(); endpoints.len()],
            endpoints,
            nodes: Vec::new(),
        }
    }

    /// Shares the geometry with the simulation's tick listeners and seeds it
    /// from the current bodies.
    pub fn attach(self, sim: &mut Simulation) -> Rc<RefCell<Self>> {
        let shared = Rc::new(RefCell::new(self));
        shared.borrow_mut().sync(sim.bodies());

        let listener = Rc::clone(&shared);
        sim.on_tick(move |bodies| listener.borrow_mut().sync(bodies));
        shared
    }

    pub fn sync(&mut self, bodies: &[Body]) {
        self.nodes.clear();
        self.nodes.extend(bodies.iter().map(|body| body.position));

        for (geometry, &(source, target)) in self.links.iter_mut().zip(&self.endpoints) {
            let (Some(&from), Some(&to)) = (self.nodes.get(source), self.nodes.get(target)) else {
                continue;
            };
            *geometry = LinkGeometry::from_endpoints(from, to);
        }
    }

    /// Topmost node under `world`, later nodes are drawn above earlier ones.
    pub fn node_at(&self, world: Vec2, shape: impl Fn(NodeIndex) -> HitShape) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find(|&(index, &position)| shape(index).contains(world - position))
            .map(|(index, _)| index)
    }

    /// Closest link within `tolerance` world units of `world`.
    pub fn link_at(&self, world: Vec2, tolerance: f32) -> Option<LinkIndex> {
        self.links
            .iter()
            .enumerate()
            .map(|(index, link)| (index, distance_to_segment(world, link.start, link.end)))
            .filter(|&(_, distance)| distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

pub fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length();
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::physics::full_graph;

    fn body(x: f32, y: f32) -> Body {
        Body {
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }

    #[test]
    fn right_to_left_links_flip_their_label() {
        let geometry = LinkGeometry::from_endpoints(vec2(100.0, 40.0), vec2(0.0, 0.0));

        assert_eq!(geometry.label_rotation_deg, 180.0);
        assert_eq!(geometry.start, vec2(0.0, 0.0));
        assert_eq!(geometry.end, vec2(100.0, 40.0));
        assert_eq!(geometry.midpoint, vec2(50.0, 20.0));

        let angle = geometry.label_angle_rad().to_degrees().rem_euclid(360.0);
        assert!(!(90.0..270.0).contains(&angle), "upside down at {angle}");
    }

    #[test]
    fn left_to_right_links_keep_their_label() {
        let geometry = LinkGeometry::from_endpoints(vec2(0.0, 0.0), vec2(10.0, 10.0));

        assert_eq!(geometry.label_rotation_deg, 0.0);
        assert_eq!(geometry.start, vec2(0.0, 0.0));
        assert!((geometry.background_angle_deg - 45.0).abs() < 1e-4);
    }

    #[test]
    fn background_is_centered_on_the_midpoint() {
        let geometry = LinkGeometry::from_endpoints(vec2(-20.0, 5.0), vec2(60.0, -35.0));
        let corners = geometry.background_corners();
        let center = corners.iter().fold(Vec2::ZERO, |sum, corner| sum + *corner) / 4.0;

        assert!((center - geometry.midpoint).length() < 1e-4);
        assert!(((corners[1] - corners[0]).length() - LABEL_BACKGROUND_SIZE.x).abs() < 1e-4);
        assert!(((corners[2] - corners[1]).length() - LABEL_BACKGROUND_SIZE.y).abs() < 1e-4);
    }

    #[test]
    fn sync_follows_bodies() {
        let mut geometry = SceneGeometry::new(vec![(0, 1)]);
        geometry.sync(&[body(0.0, 0.0), body(-30.0, 8.0)]);

        assert_eq!(geometry.nodes, [vec2(0.0, 0.0), vec2(-30.0, 8.0)]);
        assert_eq!(geometry.links[0].start, vec2(-30.0, 8.0));
        assert_eq!(geometry.links[0].label_rotation_deg, 180.0);
    }

    #[test]
    fn attached_geometry_tracks_driven_ticks() {
        let mut sim = full_graph(3, vec![(0, 1), (1, 2)]);
        let geometry = SceneGeometry::new(vec![(0, 1), (1, 2)]).attach(&mut sim);

        sim.step();
        assert_eq!(geometry.borrow().nodes[2], sim.bodies()[2].position);

        sim.tick();
        assert_ne!(geometry.borrow().nodes[2], sim.bodies()[2].position);
    }

    #[test]
    fn hit_testing() {
        let mut geometry = SceneGeometry::new(vec![(0, 1)]);
        geometry.sync(&[body(0.0, 0.0), body(200.0, 0.0)]);

        let shape = |media: bool| move |index: NodeIndex| HitShape::for_node(media && index == 1);
        assert_eq!(geometry.node_at(vec2(25.0, 10.0), shape(false)), Some(0));
        assert_eq!(geometry.node_at(vec2(232.0, 32.0), shape(true)), Some(1));
        assert_eq!(geometry.node_at(vec2(232.0, 32.0), shape(false)), None);
        assert_eq!(geometry.node_at(vec2(50.0, 0.0), |_| HitShape::Circle(60.0)), Some(0));

        assert_eq!(geometry.link_at(vec2(100.0, 4.0), LINK_HOVER_BAND / 2.0), Some(0));
        assert_eq!(geometry.link_at(vec2(100.0, 12.0), LINK_HOVER_BAND / 2.0), None);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let distance = distance_to_segment(vec2(-3.0, 4.0), Vec2::ZERO, vec2(10.0, 0.0));
        assert!((distance - 5.0).abs() < 1e-5);
    }
}

use eframe::egui::Vec2;

use crate::util::jiggle;

use super::Body;
use super::quadtree::QuadNode;

/// Spring toward a rest length between linked bodies. Without an explicit
/// strength each link is weighted by `1 / min(degree)` so hubs are not
/// dragged around by their many neighbours.
#[derive(Clone, Debug)]
pub struct LinkForce {
    links: Vec<(usize, usize)>,
    pub distance: f32,
    pub strength_scale: f32,
    strengths: Vec<f32>,
    biases: Vec<f32>,
}

impl LinkForce {
    pub fn new(links: Vec<(usize, usize)>, node_count: usize, distance: f32) -> Self {
        let mut degree = vec![0usize; node_count];
        for &(source, target) in &links {
            if source < node_count && target < node_count {
                degree[source] += 1;
                degree[target] += 1;
            }
        }

        let degree_of = |index: usize| degree.get(index).copied().unwrap_or(0);
        let strengths = links
            .iter()
            .map(|&(source, target)| 1.0 / degree_of(source).min(degree_of(target)).max(1) as f32)
            .collect();
        let biases = links
            .iter()
            .map(|&(source, target)| {
                let total = degree_of(source) + degree_of(target);
                if total == 0 {
                    0.5
                } else {
                    degree_of(source) as f32 / total as f32
                }
            })
            .collect();

        Self {
            links,
            distance,
            strength_scale: 1.0,
            strengths,
            biases,
        }
    }

    fn apply(&self, bodies: &mut [Body], alpha: f32) {
        let body_count = bodies.len();
        for (index, &(source, target)) in self.links.iter().enumerate() {
            if source >= body_count || target >= body_count || source == target {
                continue;
            }

            let from = bodies[source];
            let to = bodies[target];
            let mut delta = (to.position + to.velocity) - (from.position + from.velocity);
            if delta.x == 0.0 {
                delta.x = jiggle(index * 2);
            }
            if delta.y == 0.0 {
                delta.y = jiggle(index * 2 + 1);
            }

            let length = delta.length();
            let stretch =
                (length - self.distance) / length * alpha * self.strengths[index] * self.strength_scale;
            delta *= stretch;

            let bias = self.biases[index];
            bodies[target].velocity -= delta * bias;
            bodies[source].velocity += delta * (1.0 - bias);
        }
    }
}

/// N-body charge, negative strength repels. Far cells are approximated by
/// their centre of mass once `side / distance < theta`.
#[derive(Clone, Copy, Debug)]
pub struct ManyBodyForce {
    pub strength: f32,
    pub theta: f32,
    pub distance_min: f32,
    pub distance_max: f32,
}

impl ManyBodyForce {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            theta: 0.9,
            distance_min: 1.0,
            distance_max: f32::INFINITY,
        }
    }

    fn apply(&self, bodies: &mut [Body], alpha: f32) {
        let positions = bodies.iter().map(|body| body.position).collect::<Vec<_>>();
        let Some(quadtree) = QuadNode::build(&positions) else {
            return;
        };

        let params = ChargeParams {
            strength: self.strength * alpha,
            theta_sq: self.theta * self.theta,
            distance_min_sq: self.distance_min * self.distance_min,
            distance_max_sq: self.distance_max * self.distance_max,
        };

        for (index, body) in bodies.iter_mut().enumerate() {
            let mut delta = Vec2::ZERO;
            accumulate_charge_for_node(&quadtree, index, &positions, params, &mut delta);
            body.velocity += delta;
        }
    }
}

#[derive(Clone, Debug)]
pub enum CollideRadius {
    Fixed(f32),
    PerNode(Vec<f32>),
}

impl CollideRadius {
    pub fn of(&self, index: usize) -> f32 {
        match self {
            Self::Fixed(radius) => *radius,
            Self::PerNode(radii) => radii.get(index).copied().unwrap_or(0.0),
        }
    }
}

/// Keeps bodies at least `radius(i) + radius(j)` apart, looking one step
/// ahead at `position + velocity`. Not scaled by alpha.
#[derive(Clone, Debug)]
pub struct CollideForce {
    pub radius: CollideRadius,
    pub strength: f32,
    pub iterations: usize,
}

impl CollideForce {
    pub fn new(radius: CollideRadius) -> Self {
        Self {
            radius,
            strength: 1.0,
            iterations: 1,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    fn apply(&self, bodies: &mut [Body]) {
        let radii = (0..bodies.len())
            .map(|index| self.radius.of(index))
            .collect::<Vec<_>>();
        let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
        if max_radius <= 0.0 {
            return;
        }

        let mut deltas = vec![Vec2::ZERO; bodies.len()];
        for _ in 0..self.iterations.max(1) {
            let predicted = bodies
                .iter()
                .map(|body| body.position + body.velocity)
                .collect::<Vec<_>>();
            let Some(quadtree) = QuadNode::build(&predicted) else {
                return;
            };

            deltas.fill(Vec2::ZERO);
            let reach = max_radius * 2.0;
            accumulate_collision_pairs(
                &quadtree,
                &quadtree,
                true,
                &predicted,
                &radii,
                CollisionParams {
                    strength: self.strength,
                    max_distance_sq: reach * reach,
                },
                &mut deltas,
            );

            for (body, delta) in bodies.iter_mut().zip(&deltas) {
                body.velocity += *delta;
            }
        }
    }
}

/// Translates every body so the mean position sits on `center`.
#[derive(Clone, Copy, Debug)]
pub struct CenterForce {
    pub center: Vec2,
    pub strength: f32,
}

impl CenterForce {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            strength: 1.0,
        }
    }

    fn apply(&self, bodies: &mut [Body]) {
        if bodies.is_empty() {
            return;
        }

        let mean = bodies
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / bodies.len() as f32;
        let shift = (mean - self.center) * self.strength;
        for body in bodies {
            body.position -= shift;
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PositionForce {
    pub target: f32,
    pub strength: f32,
}

impl PositionForce {
    pub fn new(target: f32, strength: f32) -> Self {
        Self { target, strength }
    }
}

#[derive(Clone, Debug)]
pub enum Force {
    Link(LinkForce),
    ManyBody(ManyBodyForce),
    Collide(CollideForce),
    Center(CenterForce),
    X(PositionForce),
    Y(PositionForce),
}

impl Force {
    pub(super) fn apply(&self, bodies: &mut [Body], alpha: f32) {
        match self {
            Self::Link(force) => force.apply(bodies, alpha),
            Self::ManyBody(force) => force.apply(bodies, alpha),
            Self::Collide(force) => force.apply(bodies),
            Self::Center(force) => force.apply(bodies),
            Self::X(force) => {
                for body in bodies {
                    body.velocity.x += (force.target - body.position.x) * force.strength * alpha;
                }
            }
            Self::Y(force) => {
                for body in bodies {
                    body.velocity.y += (force.target - body.position.y) * force.strength * alpha;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
struct ChargeParams {
    strength: f32,
    theta_sq: f32,
    distance_min_sq: f32,
    distance_max_sq: f32,
}

fn charge_between(point: Vec2, other: Vec2, mass: f32, params: ChargeParams, seed: usize) -> Vec2 {
    let mut offset = other - point;
    if offset.x == 0.0 {
        offset.x = jiggle(seed);
    }
    if offset.y == 0.0 {
        offset.y = jiggle(seed.wrapping_add(1));
    }

    let mut distance_sq = offset.length_sq();
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }

    offset * (params.strength * mass / distance_sq)
}

fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    delta: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *delta += charge_between(
                point,
                positions[other_index],
                1.0,
                params,
                index.wrapping_mul(31) ^ other_index,
            );
        }
        return;
    }

    let distance_sq = (node.center_of_mass - point).length_sq();
    let side = node.bounds.side_length();
    let can_approximate = !node.bounds.contains(point)
        && distance_sq > 0.0
        && (side * side / params.theta_sq) < distance_sq;

    if can_approximate {
        *delta += charge_between(point, node.center_of_mass, node.mass, params, index);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_node(child, index, positions, params, delta);
    }
}

#[derive(Clone, Copy)]
struct CollisionParams {
    strength: f32,
    max_distance_sq: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let (radius_from, radius_to) = (radii[from], radii[to]);
    let reach = radius_from + radius_to;
    let mut offset = positions[from] - positions[to];
    if offset.length_sq() >= reach * reach {
        return;
    }

    if offset.x == 0.0 {
        offset.x = jiggle(from.wrapping_mul(131) ^ to);
    }
    if offset.y == 0.0 {
        offset.y = jiggle(to.wrapping_mul(131) ^ from);
    }

    let distance = offset.length();
    let push = offset * ((reach - distance) / distance * params.strength);
    let (from_sq, to_sq) = (radius_from * radius_from, radius_to * radius_to);
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, params, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, radii, params, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, deltas);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, deltas);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, deltas);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn bodies_at(points: &[(f32, f32)]) -> Vec<Body> {
        points
            .iter()
            .map(|&(x, y)| Body {
                position: vec2(x, y),
                velocity: Vec2::ZERO,
                pinned: None,
            })
            .collect()
    }

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let mut bodies = bodies_at(&[(-5.0, 0.0), (5.0, 0.0)]);
        Force::ManyBody(ManyBodyForce::new(-30.0)).apply(&mut bodies, 1.0);

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert!((bodies[0].velocity.x + bodies[1].velocity.x).abs() < 1e-5);
    }

    #[test]
    fn barnes_hut_matches_brute_force_for_far_clusters() {
        let mut points = (0..30)
            .map(|index| ((index % 6) as f32 * 3.0, (index / 6) as f32 * 3.0))
            .collect::<Vec<_>>();
        points.push((900.0, 900.0));
        let mut bodies = bodies_at(&points);
        let force = ManyBodyForce::new(-100.0);
        force.apply(&mut bodies, 1.0);

        let lonely = *points.last().unwrap();
        let mut expected = Vec2::ZERO;
        for &(x, y) in &points[..30] {
            let offset = vec2(x - lonely.0, y - lonely.1);
            expected += offset * (-100.0 / offset.length_sq());
        }

        let approximated = bodies[30].velocity;
        assert!((approximated - expected).length() < expected.length() * 0.05);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let mut bodies = bodies_at(&[(0.0, 0.0), (100.0, 0.0)]);
        Force::Link(LinkForce::new(vec![(0, 1)], 2, 30.0)).apply(&mut bodies, 1.0);

        assert!(bodies[0].velocity.x > 0.0);
        assert!(bodies[1].velocity.x < 0.0);
    }

    #[test]
    fn compressed_link_pushes_endpoints_apart() {
        let mut bodies = bodies_at(&[(0.0, 0.0), (10.0, 0.0)]);
        Force::Link(LinkForce::new(vec![(0, 1)], 2, 30.0)).apply(&mut bodies, 1.0);

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
    }

    #[test]
    fn hub_links_are_weakened_by_degree() {
        let force = LinkForce::new(vec![(0, 1), (0, 2), (0, 3), (1, 2)], 4, 10.0);
        assert_eq!(force.strengths[2], 1.0);
        assert_eq!(force.strengths[0], 0.5);
        assert!((force.biases[2] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn overlapping_bodies_are_separated() {
        let mut bodies = bodies_at(&[(0.0, 0.0), (4.0, 0.0), (300.0, 0.0)]);
        Force::Collide(CollideForce::new(CollideRadius::Fixed(10.0))).apply(&mut bodies, 1.0);

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert_eq!(bodies[2].velocity, Vec2::ZERO);
    }

    #[test]
    fn larger_bodies_move_less_in_a_collision() {
        let mut bodies = bodies_at(&[(0.0, 0.0), (10.0, 0.0)]);
        let radius = CollideRadius::PerNode(vec![30.0, 5.0]);
        Force::Collide(CollideForce::new(radius)).apply(&mut bodies, 1.0);

        assert!(bodies[0].velocity.x.abs() < bodies[1].velocity.x.abs());
    }

    #[test]
    fn centering_moves_the_mean_onto_the_center() {
        let mut bodies = bodies_at(&[(10.0, 10.0), (30.0, 50.0)]);
        Force::Center(CenterForce::new(Vec2::ZERO)).apply(&mut bodies, 1.0);

        let mean = (bodies[0].position + bodies[1].position) / 2.0;
        assert!(mean.length() < 1e-4);
    }

    #[test]
    fn axis_pull_scales_with_alpha() {
        let mut bodies = bodies_at(&[(100.0, -50.0)]);
        Force::X(PositionForce::new(0.0, 0.1)).apply(&mut bodies, 0.5);
        Force::Y(PositionForce::new(0.0, 0.1)).apply(&mut bodies, 0.5);

        assert!((bodies[0].velocity.x + 5.0).abs() < 1e-4);
        assert!((bodies[0].velocity.y - 2.5).abs() < 1e-4);
    }
}

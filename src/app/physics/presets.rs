use eframe::egui::Vec2;

use super::{
    CenterForce, CollideForce, CollideRadius, Force, LinkForce, ManyBodyForce, PositionForce,
    Simulation,
};

const LINK_DISTANCE: f32 = 200.0;
const NODE_COLLIDE_RADIUS: f32 = 50.0;
const AXIS_STRENGTH: f32 = 0.1;

/// Whole-dataset layout. Cools to rest from the first frame.
pub fn full_graph(node_count: usize, links: Vec<(usize, usize)>) -> Simulation {
    Simulation::new(node_count)
        .with_force(
            "link",
            Force::Link(LinkForce::new(links, node_count, LINK_DISTANCE)),
        )
        .with_force("charge", Force::ManyBody(ManyBodyForce::new(-1000.0)))
        .with_force(
            "collide",
            Force::Collide(CollideForce::new(CollideRadius::Fixed(NODE_COLLIDE_RADIUS))),
        )
        .with_force("x", Force::X(PositionForce::new(0.0, AXIS_STRENGTH)))
        .with_force("y", Force::Y(PositionForce::new(0.0, AXIS_STRENGTH)))
}

/// Neighbourhood of one entity. Kept warm at `alpha_target = 0.3` with a fast
/// decay so it settles quickly but still reacts to drags.
pub fn entity_graph(node_count: usize, links: Vec<(usize, usize)>) -> Simulation {
    Simulation::new(node_count)
        .with_alpha_target(0.3)
        .with_alpha_decay(0.05)
        .with_force(
            "link",
            Force::Link(LinkForce::new(links, node_count, LINK_DISTANCE)),
        )
        .with_force("charge", Force::ManyBody(ManyBodyForce::new(-1500.0)))
        .with_force(
            "collide",
            Force::Collide(
                CollideForce::new(CollideRadius::Fixed(NODE_COLLIDE_RADIUS)).with_strength(0.7),
            ),
        )
        .with_force("center", Force::Center(CenterForce::new(Vec2::ZERO)))
        .with_force("x", Force::X(PositionForce::new(0.0, AXIS_STRENGTH)))
        .with_force("y", Force::Y(PositionForce::new(0.0, AXIS_STRENGTH)))
}

/// Link-free packing of frequency bubbles around the origin.
pub fn bubble(collide_radii: Vec<f32>) -> Simulation {
    Simulation::new(collide_radii.len())
        .with_force("charge", Force::ManyBody(ManyBodyForce::new(-200.0)))
        .with_force("center", Force::Center(CenterForce::new(Vec2::ZERO)))
        .with_force(
            "collide",
            Force::Collide(CollideForce::new(CollideRadius::PerNode(collide_radii))),
        )
        .with_force("x", Force::X(PositionForce::new(0.0, 0.2)))
        .with_force("y", Force::Y(PositionForce::new(0.0, 0.2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sim: &Simulation) -> Vec<&'static str> {
        sim.forces().iter().map(|entry| entry.name).collect()
    }

    #[test]
    fn presets_register_their_named_forces() {
        assert_eq!(
            names(&full_graph(2, vec![(0, 1)])),
            ["link", "charge", "collide", "x", "y"]
        );
        assert_eq!(
            names(&entity_graph(2, vec![(0, 1)])),
            ["link", "charge", "collide", "center", "x", "y"]
        );
        assert_eq!(
            names(&bubble(vec![13.0, 23.0])),
            ["charge", "center", "collide", "x", "y"]
        );
    }

    #[test]
    fn isolated_nodes_stay_near_the_origin() {
        let chain = (1..5).map(|index| (index - 1, index)).collect();
        let mut sim = full_graph(8, chain);
        for _ in 0..400 {
            sim.tick();
        }

        let farthest = sim
            .bodies()
            .iter()
            .map(|body| body.position.length())
            .fold(0.0_f32, f32::max);
        assert!(farthest < 500.0, "drifted to {farthest}");
    }

    #[test]
    fn entity_graph_stays_warm() {
        let mut sim = entity_graph(3, vec![(0, 1), (1, 2)]);
        for _ in 0..200 {
            sim.step();
        }

        assert!(sim.is_running());
        assert!((sim.alpha() - 0.3).abs() < 0.01);
    }

    #[test]
    fn bubbles_do_not_overlap_once_settled() {
        let radii = vec![13.0, 23.0, 43.0, 8.0];
        let mut sim = bubble(radii.clone());
        for _ in 0..300 {
            sim.tick();
        }

        let bodies = sim.bodies();
        for first in 0..bodies.len() {
            for second in (first + 1)..bodies.len() {
                let distance = (bodies[first].position - bodies[second].position).length();
                assert!(distance > (radii[first] + radii[second]) * 0.8);
            }
        }
    }
}

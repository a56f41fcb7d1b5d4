mod forces;
mod presets;
mod quadtree;

use eframe::egui::{Vec2, vec2};

pub use forces::{
    CenterForce, CollideForce, CollideRadius, Force, LinkForce, ManyBodyForce, PositionForce,
};
pub use presets::{bubble, entity_graph, full_graph};

const DEFAULT_ALPHA_MIN: f32 = 0.001;
const DEFAULT_VELOCITY_DECAY: f32 = 0.6;
const INITIAL_RADIUS: f32 = 10.0;

fn default_alpha_decay() -> f32 {
    1.0 - DEFAULT_ALPHA_MIN.powf(1.0 / 300.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

/// Phyllotaxis spiral, the same arrangement for the same body count.
fn initial_position(index: usize) -> Vec2 {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(radius * angle.cos(), radius * angle.sin())
}

#[derive(Clone, Debug)]
pub struct NamedForce {
    pub name: &'static str,
    pub enabled: bool,
    pub force: Force,
}

type TickListener = Box<dyn FnMut(&[Body])>;

/// Alpha-cooled force layout. Nothing runs on its own: the frame loop calls
/// [`Simulation::step`] and listeners registered with
/// [`Simulation::on_tick`] see the bodies after every driven tick.
pub struct Simulation {
    bodies: Vec<Body>,
    forces: Vec<NamedForce>,
    alpha: f32,
    alpha_min: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
    running: bool,
    ticks: u64,
    listeners: Vec<TickListener>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("bodies", &self.bodies.len())
            .field("forces", &self.forces)
            .field("alpha", &self.alpha)
            .field("alpha_target", &self.alpha_target)
            .field("running", &self.running)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    pub fn new(body_count: usize) -> Self {
        let bodies = (0..body_count)
            .map(|index| Body {
                position: initial_position(index),
                velocity: Vec2::ZERO,
                pinned: None,
            })
            .collect();

        Self {
            bodies,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_decay: default_alpha_decay(),
            alpha_target: 0.0,
            velocity_decay: DEFAULT_VELOCITY_DECAY,
            running: true,
            ticks: 0,
            listeners: Vec::new(),
        }
    }

    pub fn with_force(mut self, name: &'static str, force: Force) -> Self {
        self.forces.retain(|entry| entry.name != name);
        self.forces.push(NamedForce {
            name,
            enabled: true,
            force,
        });
        self
    }

    pub fn with_alpha_target(mut self, alpha_target: f32) -> Self {
        self.alpha_target = alpha_target;
        self
    }

    pub fn with_alpha_decay(mut self, alpha_decay: f32) -> Self {
        self.alpha_decay = alpha_decay.clamp(0.0, 1.0);
        self
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.bodies.get(index).map(|body| body.position)
    }

    pub fn pin(&mut self, index: usize, at: Vec2) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pinned = Some(at);
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pinned = None;
        }
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.bodies
            .get(index)
            .is_some_and(|body| body.pinned.is_some())
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
    }

    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn forces(&self) -> &[NamedForce] {
        &self.forces
    }

    pub fn forces_mut(&mut self) -> &mut [NamedForce] {
        &mut self.forces
    }

    pub fn on_tick(&mut self, listener: impl FnMut(&[Body]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// One integration step. Does not consult `running` and does not notify
    /// listeners.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        for entry in &self.forces {
            if entry.enabled {
                entry.force.apply(&mut self.bodies, self.alpha);
            }
        }

        for body in &mut self.bodies {
            if let Some(pin) = body.pinned {
                body.position = pin;
                body.velocity = Vec2::ZERO;
            } else {
                body.velocity *= self.velocity_decay;
                body.position += body.velocity;
            }
        }

        self.ticks += 1;
    }

    /// Driver entry for the frame loop. Returns whether a tick happened.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.tick();
        self.notify();

        if self.alpha < self.alpha_min {
            self.running = false;
        }
        true
    }

    pub fn preroll(&mut self, ticks: usize) {
        if ticks == 0 {
            return;
        }

        for _ in 0..ticks {
            self.tick();
        }
        self.notify();
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.bodies);
        }
    }
}

use eframe::egui::{Pos2, Vec2};

use super::interaction::NavigationRequest;

pub const DEFAULT_SCALE_EXTENT: [f32; 2] = [0.1, 8.0];

/// `screen = canvas center + translate + world * scale`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            translate: self.translate + (other.translate - self.translate) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// What to do once an animated transition lands.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionAction {
    Settle,
    Navigate(NavigationRequest),
}

#[derive(Clone, Debug)]
struct Transition {
    from: Transform,
    to: Transform,
    elapsed: f32,
    duration: f32,
    action: TransitionAction,
}

fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Clone, Debug)]
pub struct Viewport {
    transform: Transform,
    scale_extent: [f32; 2],
    transition: Option<Transition>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE_EXTENT)
    }
}

impl Viewport {
    pub fn new(scale_extent: [f32; 2]) -> Self {
        let low = scale_extent[0].max(f32::EPSILON);
        let high = scale_extent[1].max(low);
        Self {
            transform: Transform::IDENTITY,
            scale_extent: [low, high],
            transition: None,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn scale_extent(&self) -> [f32; 2] {
        self.scale_extent
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.scale_extent[0], self.scale_extent[1])
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transition = None;
        self.transform = Transform {
            translate: transform.translate,
            scale: self.clamp_scale(transform.scale),
        };
    }

    /// Zooms by `factor` keeping the world point under `pointer` still.
    /// `pointer` is relative to the canvas center.
    pub fn zoom_at(&mut self, pointer: Vec2, factor: f32) {
        self.interrupt();
        let world = (pointer - self.transform.translate) / self.transform.scale;
        self.transform.scale = self.clamp_scale(self.transform.scale * factor);
        self.transform.translate = pointer - world * self.transform.scale;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.interrupt();
        self.transform.translate += delta;
    }

    pub fn animate_to(&mut self, target: Transform, duration: f32, action: TransitionAction) {
        self.transition = Some(Transition {
            from: self.transform,
            to: Transform {
                translate: target.translate,
                scale: self.clamp_scale(target.scale),
            },
            elapsed: 0.0,
            duration: duration.max(0.0),
            action,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Drops a running transition together with its completion action.
    pub fn interrupt(&mut self) {
        self.transition = None;
    }

    /// Moves a running transition forward. Yields its action exactly once,
    /// on the frame the target is reached.
    pub fn advance(&mut self, dt: f32) -> Option<TransitionAction> {
        let transition = self.transition.as_mut()?;
        transition.elapsed += dt.max(0.0);

        let progress = if transition.duration <= 0.0 {
            1.0
        } else {
            (transition.elapsed / transition.duration).min(1.0)
        };
        self.transform = transition
            .from
            .lerp(transition.to, ease_cubic_in_out(progress));

        if progress < 1.0 {
            return None;
        }

        let finished = self.transition.take()?;
        self.transform = finished.to;
        Some(finished.action)
    }

    pub fn world_to_screen(&self, canvas_center: Pos2, world: Vec2) -> Pos2 {
        canvas_center + self.transform.translate + world * self.transform.scale
    }

    pub fn screen_to_world(&self, canvas_center: Pos2, screen: Pos2) -> Vec2 {
        (screen - canvas_center - self.transform.translate) / self.transform.scale
    }
}

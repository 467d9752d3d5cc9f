//! Follow camera: a spring toward a point between the player and the
//! cursor, with zoom steps and screen shake.

use std::f32::consts::PI;

use crate::math::{half_life_decay, Camera2D, Vec2};

/// Spring stiffness toward the follow point.
pub const FOLLOW_FORCE: f32 = 15.0;
pub const FRICTION_HALF_LIFE: f32 = 0.3;
/// Shake magnitude lost per second.
pub const SHAKE_RECOVER: f32 = 20.0;
/// How far from the cursor toward the player the camera settles.
pub const FOLLOW_DIVISOR: f32 = 1.2;
/// Same while aiming, which lets the view reach further ahead.
pub const AIM_DIVISOR: f32 = 1.618_034;
pub const ZOOM_STEP: f32 = 0.1;
pub const MIN_ZOOM_OUT: f32 = 0.4;
pub const MAX_ZOOM_OUT: f32 = 4.0;

/// Follow camera state.
///
/// `zoom_out` is world units per screen pixel: 2.0 shows twice as much
/// of the level as 1.0.
#[derive(Clone, Debug)]
pub struct CameraRig {
    position: Vec2,
    velocity: Vec2,
    zoom_out: f32,
    shake: f32,
    half_screen: Vec2,
    offset: Vec2,
}

impl CameraRig {
    pub fn new(screen_size: Vec2) -> Self {
        let half_screen = screen_size / 2.0;
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            zoom_out: 1.0,
            shake: 0.0,
            half_screen,
            offset: -half_screen,
        }
    }

    /// Start already centred on `focus`.
    #[must_use]
    pub fn with_focus(mut self, focus: Vec2) -> Self {
        self.position = focus;
        self.offset = self.top_left();
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn zoom_out(&self) -> f32 {
        self.zoom_out
    }

    pub fn shake_magnitude(&self) -> f32 {
        self.shake
    }

    /// World position drawn at the top-left pixel, as of the last step.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn screen_size(&self) -> Vec2 {
        self.half_screen * 2.0
    }

    pub fn resize(&mut self, screen_size: Vec2) {
        self.half_screen = screen_size / 2.0;
        self.offset = self.top_left();
    }

    /// The view as a plain [`Camera2D`] for coordinate conversion.
    pub fn camera(&self) -> Camera2D {
        Camera2D {
            position: self.offset,
            zoom: 1.0 / self.zoom_out,
        }
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.camera().screen_to_world(screen)
    }

    /// Raise the shake to at least `magnitude`. Smaller impulses are
    /// absorbed by a stronger one already running.
    pub fn shake(&mut self, magnitude: f32) {
        self.shake = self.shake.max(magnitude);
    }

    /// Zoom in on positive scroll, out on negative.
    pub fn apply_scroll(&mut self, scroll: f32) {
        if scroll > 0.0 && self.zoom_out > MIN_ZOOM_OUT {
            self.zoom_out -= ZOOM_STEP;
        } else if scroll < 0.0 && self.zoom_out < MAX_ZOOM_OUT {
            self.zoom_out += ZOOM_STEP;
        }
    }

    /// Point the camera settles on for a given player and cursor.
    pub fn follow_point(player: Vec2, mouse_world: Vec2, aiming: bool) -> Vec2 {
        let divisor = if aiming { AIM_DIVISOR } else { FOLLOW_DIVISOR };
        mouse_world - (mouse_world - player) / divisor
    }

    /// Advance the spring, then add this frame's shake on top.
    ///
    /// The shake is applied after the offset is taken, so it only shows up
    /// from the next frame.
    pub fn step(
        &mut self,
        player: Vec2,
        mouse_world: Vec2,
        aiming: bool,
        dt: f32,
        rng: &mut fastrand::Rng,
    ) {
        let dest = Self::follow_point(player, mouse_world, aiming);
        self.velocity += (dest - self.position) * (FOLLOW_FORCE * dt);
        self.velocity *= half_life_decay(dt, FRICTION_HALF_LIFE);
        self.position += self.velocity * dt;
        self.offset = self.top_left();

        if self.shake > 0.0 {
            let angle = (rng.f32() * 2.0 - 1.0) * PI;
            self.position += Vec2::from_angle(angle) * self.shake;
        }
        self.shake = (self.shake - SHAKE_RECOVER * dt).max(0.0);
    }

    fn top_left(&self) -> Vec2 {
        self.position - self.half_screen * self.zoom_out
    }
}

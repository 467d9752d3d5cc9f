use std::time::Duration;

use crate::commands::CommandBuffer;
use crate::events::EventSender;
use crate::input::InputState;
use crate::math::Vec2;

/// Frame timing: the per-frame delta and an optional fixed-step
/// accumulator.
#[derive(Debug, Clone)]
pub struct Clock {
    delta_time: Duration,
    fixed_delta_time: Option<Duration>,
    fixed_time_accumulator: Duration,
}

impl Clock {
    pub fn new(fixed_step: Option<f32>) -> Self {
        Self {
            delta_time: Duration::ZERO,
            fixed_delta_time: fixed_step
                .filter(|step| *step > 0.0)
                .map(Duration::from_secs_f32),
            fixed_time_accumulator: Duration::ZERO,
        }
    }

    pub fn update_time(&mut self, delta: Duration) {
        self.delta_time = delta;
        if self.fixed_delta_time.is_some() {
            self.fixed_time_accumulator += delta;
        }
    }

    /// Duration between the current and previous frames.
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    pub fn fixed_delta_time(&self) -> Option<Duration> {
        self.fixed_delta_time
    }

    /// Check if a fixed timestep update should run and consume accumulated time.
    ///
    /// Call this in a loop until it returns `false` to handle multiple fixed
    /// updates per frame. Always `false` without a fixed step.
    pub fn should_run_fixed_update(&mut self) -> bool {
        let Some(step) = self.fixed_delta_time else {
            return false;
        };
        if self.fixed_time_accumulator >= step {
            self.fixed_time_accumulator -= step;
            true
        } else {
            false
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Everything an entity may read or write during one tick.
pub struct TickContext<'a> {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Seconds since the level started.
    pub elapsed: f32,
    pub input: &'a InputState,
    /// Cursor position in world space, from the camera state at the start
    /// of the tick.
    pub mouse_world: Vec2,
    pub rng: &'a mut fastrand::Rng,
    pub commands: &'a mut CommandBuffer,
    pub events: &'a EventSender,
}

impl TickContext<'_> {
    /// Uniform sample in `[-1, 1)`.
    pub fn signed_unit(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }

    /// Uniform sample in `[lo, hi)`.
    pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.rng.f32()
    }
}

/// Owned backing storage for building a [`TickContext`] in unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::events::EventBus;

    pub(crate) struct Harness {
        pub input: InputState,
        pub rng: fastrand::Rng,
        pub commands: CommandBuffer,
        pub bus: EventBus,
        pub mouse_world: Vec2,
        sender: EventSender,
    }

    impl Harness {
        pub fn new(seed: u64) -> Self {
            let bus = EventBus::new();
            let sender = bus.sender();
            Self {
                input: InputState::default(),
                rng: fastrand::Rng::with_seed(seed),
                commands: CommandBuffer::new(),
                bus,
                mouse_world: Vec2::ZERO,
                sender,
            }
        }

        pub fn ctx(&mut self, dt: f32) -> TickContext<'_> {
            TickContext {
                dt,
                elapsed: 0.0,
                input: &self.input,
                mouse_world: self.mouse_world,
                rng: &mut self.rng,
                commands: &mut self.commands,
                events: &self.sender,
            }
        }
    }
}

//! Frame-based animation state.
//!
//! Clips only carry frame geometry: decoding pixels is left to the host.

use std::sync::Arc;

use crate::math::Vec2;

/// Ordered frames of one animation, identified by the asset path they
/// were loaded from.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub path: Arc<str>,
    pub frames: Vec<Vec2>,
}

impl AnimationClip {
    pub fn new(path: impl Into<Arc<str>>, frames: Vec<Vec2>) -> Self {
        Self {
            path: path.into(),
            frames,
        }
    }

    /// A clip of `count` identical frames.
    pub fn uniform(path: impl Into<Arc<str>>, size: Vec2, count: usize) -> Self {
        Self::new(path, vec![size; count])
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Size of frame `index`, or zero when the clip has no such frame.
    pub fn frame_size(&self, index: usize) -> Vec2 {
        self.frames.get(index).copied().unwrap_or(Vec2::ZERO)
    }
}

/// Playback cursor over a clip. The index is fractional and advances by
/// `speed` frames per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animator {
    pub frame_index: f32,
    pub speed: f32,
}

impl Animator {
    pub fn new(speed: f32) -> Self {
        Self {
            frame_index: 0.0,
            speed,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.frame_index += dt * self.speed;
    }

    pub fn restart(&mut self) {
        self.frame_index = 0.0;
    }

    /// True once every frame of a `len`-frame clip has been shown.
    pub fn is_past_end(&self, len: usize) -> bool {
        self.frame_index >= len as f32
    }

    /// Wrap back to the first frame when past the end. Returns whether a
    /// wrap happened.
    pub fn wrap(&mut self, len: usize) -> bool {
        if self.is_past_end(len) {
            self.frame_index = 0.0;
            true
        } else {
            false
        }
    }

    pub fn index(&self) -> usize {
        self.frame_index.max(0.0) as usize
    }

    /// Current frame, holding on the last one once past the end.
    pub fn held_index(&self, len: usize) -> usize {
        self.index().min(len.saturating_sub(1))
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(10.0)
    }
}

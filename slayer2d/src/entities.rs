//! Shared spatial state for everything that is drawn or collides.

use std::sync::Arc;

use crate::math::{Rect, Vec2};

/// Position, extents and draw layer of a visible or collidable thing.
///
/// `rect` is what gets drawn and culled, `hitbox` is what collides. The
/// two may differ in size and offset.
#[derive(Clone, Debug)]
pub struct Body {
    pub rect: Rect,
    pub hitbox: Rect,
    /// Degrees, positive turns clockwise on screen.
    pub rotation: f32,
    pub zindex: f32,
    /// Disabled bodies are kept but never drawn.
    pub disabled: bool,
    alive: bool,
}

impl Body {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            hitbox: rect,
            rotation: 0.0,
            zindex: 0.0,
            disabled: false,
            alive: true,
        }
    }

    pub fn with_hitbox(mut self, hitbox: Rect) -> Self {
        self.hitbox = hitbox;
        self
    }

    pub fn with_zindex(mut self, zindex: f32) -> Self {
        self.zindex = zindex;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Clear the alive flag. Returns `true` only for the call that actually
    /// destroyed the body.
    pub fn destroy(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    /// Composite draw-order key: layer first, then screen height.
    pub fn sort_key(&self) -> f64 {
        f64::from(self.zindex) * 1e9 + f64::from(self.rect.center().y)
    }
}

/// Reference to one frame of an animation clip.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteRef {
    pub clip: Arc<str>,
    pub frame: usize,
    pub flip_x: bool,
    /// 0..=255
    pub alpha: f32,
    /// Brightness added to every channel, 0..=255.
    pub tint_add: f32,
}

impl SpriteRef {
    pub fn new(clip: Arc<str>, frame: usize) -> Self {
        Self {
            clip,
            frame,
            flip_x: false,
            alpha: 255.0,
            tint_add: 0.0,
        }
    }

    pub fn flipped(mut self, flip_x: bool) -> Self {
        self.flip_x = flip_x;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 255.0);
        self
    }

    pub fn with_tint_add(mut self, tint_add: f32) -> Self {
        self.tint_add = tint_add.clamp(0.0, 255.0);
        self
    }
}

/// What a body looks like this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Visual {
    Sprite(SpriteRef),
    /// Straight line between two world points.
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: [u8; 3],
        alpha: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_reports_first_call_only() {
        let mut body = Body::new(Rect::new(0.0, 0.0, 4.0, 4.0));
        assert!(body.destroy());
        assert!(!body.destroy());
        assert!(!body.is_alive());
    }

    #[test]
    fn layer_dominates_sort_key() {
        let low = Body::new(Rect::new(0.0, 5000.0, 4.0, 4.0)).with_zindex(0.5);
        let high = Body::new(Rect::new(0.0, 0.0, 4.0, 4.0)).with_zindex(1.5);
        assert!(low.sort_key() < high.sort_key());
    }
}

//! Frame composition: turns world bodies into an ordered, culled list of
//! screen-space draw commands. Rasterising them is the host's job.

use glam::Mat4;

use crate::camera::CameraRig;
use crate::entities::{Body, Visual};
use crate::math::{Camera2D, Rect, Vec2};

/// Anything that can appear in a frame.
pub trait Drawable {
    fn body(&self) -> &Body;

    /// What to draw this frame.
    fn visual(&self) -> Visual;
}

/// One thing to draw, already mapped to screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    /// Line endpoints are in screen space too.
    pub visual: Visual,
    /// Destination rectangle on screen.
    pub rect: Rect,
    /// Degrees, positive turns clockwise.
    pub rotation: f32,
    pub zindex: f32,
    pub sort_key: f64,
}

/// A composed frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// World to clip space for this frame's camera, for hosts that draw
    /// world-space layers (tiles, debug shapes) under the sprites.
    pub view_projection: Mat4,
    /// Sorted back to front.
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Build the draw list for a frame.
///
/// Disabled bodies are skipped, anything fully off screen is dropped, and
/// the rest is sorted by layer and then by the y of its centre. Ties keep
/// the order they were passed in.
pub fn compose<'a, I>(rig: &CameraRig, drawables: I) -> Frame
where
    I: IntoIterator<Item = &'a dyn Drawable>,
{
    let camera = rig.camera();
    let size = rig.screen_size();
    let screen = Rect::new(0.0, 0.0, size.x, size.y);

    let mut commands: Vec<DrawCommand> = drawables
        .into_iter()
        .filter_map(|drawable| {
            let body = drawable.body();
            if body.disabled || !body.is_alive() {
                return None;
            }
            let visual = drawable.visual();
            let (rect, visual) = match visual {
                Visual::Line {
                    from,
                    to,
                    width,
                    color,
                    alpha,
                } => {
                    let from = camera.world_to_screen(from);
                    let to = camera.world_to_screen(to);
                    let width = width * camera.zoom;
                    let min = Vec2::new(from.x.min(to.x), from.y.min(to.y));
                    let max = Vec2::new(from.x.max(to.x), from.y.max(to.y));
                    // A straight line has a flat bounding box; pad it by the width.
                    let bounds = Rect::from_top_left(min, max - min).inflate(width, width);
                    let line = Visual::Line {
                        from,
                        to,
                        width,
                        color,
                        alpha,
                    };
                    (bounds, line)
                }
                sprite @ Visual::Sprite(_) => (camera.rect_to_screen(&body.rect), sprite),
            };
            if !rect.overlaps(&screen) {
                return None;
            }
            Some(DrawCommand {
                visual,
                rect,
                rotation: body.rotation,
                zindex: body.zindex,
                sort_key: body.sort_key(),
            })
        })
        .collect();

    commands.sort_by(|a, b| a.sort_key.total_cmp(&b.sort_key));
    Frame {
        view_projection: view_projection(&camera, size),
        commands,
    }
}

fn view_projection(camera: &Camera2D, screen: Vec2) -> Mat4 {
    camera.view_projection(screen.x as u32, screen.y as u32)
}

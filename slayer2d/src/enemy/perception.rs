//! Line of sight and relay-point search against obstacle rectangles.

use crate::math::{Rect, Vec2};

/// What an enemy can see from where it stands.
#[derive(Clone, Copy, Debug)]
pub struct Perception<'a> {
    /// `None` sees at any distance.
    pub follow_distance: Option<f32>,
    pub wall_penetrating: bool,
    /// Size of the looker's hitbox. Sight is cast from its corners.
    pub extent: Vec2,
    /// How far the corner offsets are kept at the target end. Small values
    /// narrow the sight cone so targets can hide behind wall edges.
    pub wall_hiding_coef: f32,
    pub obstacles: &'a [Rect],
}

impl Perception<'_> {
    fn within_reach(&self, from: Vec2, to: Vec2) -> bool {
        self.follow_distance
            .map_or(true, |reach| from.distance(to) < reach)
    }

    /// Whether `to` is visible from `from`, casting from the four hitbox
    /// corners toward `to + corner * coef`.
    pub fn can_see(&self, from: Vec2, to: Vec2, coef: f32) -> bool {
        if !self.within_reach(from, to) {
            return false;
        }
        if self.wall_penetrating {
            return true;
        }
        let half = self.extent / 2.0;
        let corners = [
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(-half.x, -half.y),
        ];
        !self.obstacles.iter().any(|wall| {
            corners
                .iter()
                .any(|&corner| wall.clips_line(from + corner, to + corner * coef))
        })
    }

    /// Direct sight using the species' wall-hiding coefficient.
    pub fn sees_target(&self, from: Vec2, target: Vec2) -> bool {
        self.can_see(from, target, self.wall_hiding_coef)
    }

    /// A neighbouring point one hitbox away that is reachable from `from`
    /// and has sight of `target`. Directions toward the target are tried
    /// first.
    pub fn relay_point(&self, from: Vec2, target: Vec2) -> Option<Vec2> {
        if let Some(reach) = self.follow_distance {
            if from.distance(target) > reach {
                return None;
            }
        }
        let (w, h) = (self.extent.x, self.extent.y);
        let mut waypoints = Vec::with_capacity(8);
        if from.x + w / 2.0 > target.x {
            waypoints.push(Vec2::new(-w, 0.0));
        }
        if from.x - w / 2.0 < target.x {
            waypoints.push(Vec2::new(w, 0.0));
        }
        if from.y - h / 2.0 < target.y {
            waypoints.push(Vec2::new(0.0, h));
        }
        if from.y + h / 2.0 > target.y {
            waypoints.push(Vec2::new(0.0, -h));
        }
        waypoints.extend([
            Vec2::new(w, 0.0),
            Vec2::new(-w, 0.0),
            Vec2::new(0.0, h),
            Vec2::new(0.0, -h),
        ]);

        waypoints
            .into_iter()
            .map(|offset| from + offset)
            .find(|&waypoint| self.can_see(from, waypoint, 1.0) && self.can_see(waypoint, target, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eyes(obstacles: &[Rect]) -> Perception<'_> {
        Perception {
            follow_distance: Some(800.0),
            wall_penetrating: false,
            extent: Vec2::new(20.0, 20.0),
            wall_hiding_coef: 0.02,
            obstacles,
        }
    }

    #[test]
    fn open_ground_is_visible() {
        let walls = [];
        assert!(eyes(&walls).sees_target(Vec2::ZERO, Vec2::new(300.0, 0.0)));
    }

    #[test]
    fn distance_gates_sight() {
        let walls = [];
        assert!(!eyes(&walls).sees_target(Vec2::ZERO, Vec2::new(900.0, 0.0)));
        let mut unlimited = eyes(&walls);
        unlimited.follow_distance = None;
        assert!(unlimited.sees_target(Vec2::ZERO, Vec2::new(5000.0, 0.0)));
    }

    #[test]
    fn wall_blocks_unless_penetrating() {
        let walls = [Rect::new(100.0, -50.0, 20.0, 100.0)];
        assert!(!eyes(&walls).sees_target(Vec2::ZERO, Vec2::new(300.0, 0.0)));
        let mut ghost = eyes(&walls);
        ghost.wall_penetrating = true;
        assert!(ghost.sees_target(Vec2::ZERO, Vec2::new(300.0, 0.0)));
    }

    #[test]
    fn relay_steps_around_a_corner() {
        // The wall hangs down to y = -5; the target sits below and beyond it.
        let walls = [Rect::new(40.0, -200.0, 20.0, 195.0)];
        let eyes = eyes(&walls);
        let from = Vec2::new(0.0, -20.0);
        let target = Vec2::new(100.0, 20.0);
        assert!(!eyes.sees_target(from, target));
        assert_eq!(eyes.relay_point(from, target), Some(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn no_relay_when_out_of_reach() {
        let walls = [];
        assert_eq!(eyes(&walls).relay_point(Vec2::ZERO, Vec2::new(2000.0, 0.0)), None);
    }
}

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::geometry::{Vec2f, VecCell, Vector2};
use crate::world::Map;

/// Logical movement actions, independent of any key binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    RotateLeft,
    RotateRight,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Forward,
        Action::Back,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::RotateLeft,
        Action::RotateRight,
    ];

    /// Angle added to the facing direction to get the displacement
    /// direction, or `None` for rotations.
    fn heading_offset(self) -> Option<f32> {
        match self {
            Action::Forward => Some(0.0),
            Action::Back => Some(PI),
            Action::StrafeLeft => Some(-FRAC_PI_2),
            Action::StrafeRight => Some(FRAC_PI_2),
            Action::RotateLeft | Action::RotateRight => None,
        }
    }
}

/// Snapshot of which actions are held this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    held: [bool; 6],
}

impl InputState {
    pub fn set(&mut self, action: Action, down: bool) {
        self.held[action as usize] = down;
    }

    #[inline]
    pub fn is_held(&self, action: Action) -> bool {
        self.held[action as usize]
    }

    pub fn with(mut self, action: Action) -> Self {
        self.set(action, true);
        self
    }
}

/// Movement tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motion {
    /// Blocks per second.
    pub move_rate: f32,
    /// Radians per second.
    pub angular_velocity: f32,
    /// Half-width of the collision square, in blocks.
    pub radius: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            move_rate: 3.0,
            angular_velocity: PI,
            radius: 0.2,
        }
    }
}

/// Player view-point on the grid.
///
/// * `direction` is unit length.
/// * `plane` is `direction` turned a quarter clockwise on screen (+π/2 in
///   y-down coordinates) and scaled by the FoV factor. Both rotate together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    position: VecCell<f32>,
    direction: Vec2f,
    plane: Vec2f,
}

impl Player {
    /// `direction` is normalised; `fov_scale` is the camera-plane length
    /// (0.66 gives roughly a 66° horizontal field of view).
    pub fn new(position: Vec2f, direction: Vec2f, fov_scale: f32) -> Self {
        let direction = direction.normalize();
        Self {
            position: VecCell::new(position),
            direction,
            plane: direction.rotate(FRAC_PI_2) * fov_scale,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2f {
        self.position.get()
    }

    #[inline]
    pub fn direction(&self) -> Vec2f {
        self.direction
    }

    #[inline]
    pub fn plane(&self) -> Vec2f {
        self.plane
    }

    /// Ray through camera-space offset `camera_x` in `[-1, 1]`.
    #[inline]
    pub fn ray_direction(&self, camera_x: f32) -> Vec2f {
        self.direction + self.plane * camera_x
    }

    /// Turn `direction` and `plane` together. Positive is counter-clockwise in
    /// math terms, i.e. a right turn on a y-down screen.
    pub fn rotate(&mut self, theta: f32) {
        self.direction = self.direction.rotate(theta);
        self.plane = self.plane.rotate(theta);
    }

    /// Apply one frame of held actions, then keep the collision square inside
    /// the map.
    pub fn update(&mut self, input: &InputState, dt: f32, map: &Map, motion: &Motion) {
        for action in Action::ALL {
            if !input.is_held(action) {
                continue;
            }
            match action {
                Action::RotateLeft => self.rotate(-motion.angular_velocity * dt),
                Action::RotateRight => self.rotate(motion.angular_velocity * dt),
                _ => {
                    let Some(offset) = action.heading_offset() else {
                        continue;
                    };
                    let heading = self.direction.rotate(offset);
                    let candidate = self.position() + heading * (motion.move_rate * dt);
                    self.try_move(candidate, map, motion.radius);
                }
            }
        }

        let r = motion.radius;
        self.position
            .clamp_axes(r, map.width() as f32 - r, r, map.height() as f32 - r);
    }

    /// Commit `candidate` only if all four corners of the collision square
    /// sit on passable tiles. No sliding: a blocked move is dropped whole.
    pub fn try_move(&mut self, candidate: Vec2f, map: &Map, radius: f32) -> bool {
        if !fits(candidate, map, radius) {
            return false;
        }
        self.position.set(candidate);
        true
    }
}

/// True if the square of half-width `radius` around `p` touches only
/// passable tiles. Probes outside the grid count as blocked.
pub fn fits(p: Vec2f, map: &Map, radius: f32) -> bool {
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];
    p.is_finite()
        && CORNERS
            .iter()
            .all(|&(sx, sy)| map.is_passable((p + Vector2::new(sx, sy) * radius).to_cell()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn demo() -> Map {
        Map::demo().unwrap()
    }

    #[test]
    fn plane_is_perpendicular_and_scaled() {
        let p = Player::new(Vec2f::new(2.0, 2.0), Vec2f::new(-2.0, 0.0), 0.66);
        assert_eq!(p.direction(), Vec2f::new(-1.0, 0.0));
        assert!(p.direction().dot(p.plane()).abs() < 1e-6);
        assert!((p.plane().length() - 0.66).abs() < 1e-6);
    }

    #[test]
    fn rotation_keeps_plane_perpendicular() {
        let mut p = Player::new(Vec2f::new(2.0, 2.0), Vec2f::new(1.0, 0.0), 0.66);
        for _ in 0..1000 {
            p.rotate(0.137);
        }
        assert!(p.direction().dot(p.plane()).abs() < 1e-3);
        assert!((p.direction().length() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn forward_moves_along_direction() {
        let map = demo();
        let mut p = Player::new(Vec2f::new(2.5, 1.5), Vec2f::new(1.0, 0.0), 0.66);
        let input = InputState::default().with(Action::Forward);
        p.update(&input, 0.1, &map, &Motion::default());
        assert!((p.position().x - 2.8).abs() < 1e-5);
        assert!((p.position().y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn strafe_right_is_plane_side() {
        let map = demo();
        // Facing west on a y-down map, the right hand points north (-y).
        let mut p = Player::new(Vec2f::new(2.5, 2.5), Vec2f::new(-1.0, 0.0), 0.66);
        let input = InputState::default().with(Action::StrafeRight);
        p.update(&input, 0.1, &map, &Motion::default());
        assert!(p.position().y < 2.5);
        assert!(p.plane().y < 0.0);
    }

    #[test]
    fn wall_blocks_move() {
        let map = demo();
        // (3, 2) is a pillar; stepping into it must be refused.
        let mut p = Player::new(Vec2f::new(2.5, 2.5), Vec2f::new(1.0, 0.0), 0.66);
        assert!(!p.try_move(Vec2f::new(2.9, 2.5), &map, 0.2));
        assert_eq!(p.position(), Vec2f::new(2.5, 2.5));
        assert!(p.try_move(Vec2f::new(2.7, 2.5), &map, 0.2));
    }

    #[test]
    fn rotate_left_turns_counter_clockwise_on_screen() {
        let map = demo();
        let mut p = Player::new(Vec2f::new(2.5, 2.5), Vec2f::new(1.0, 0.0), 0.66);
        let input = InputState::default().with(Action::RotateLeft);
        p.update(&input, 0.1, &map, &Motion::default());
        // Left of east on a y-down screen is north.
        assert!(p.direction().y < 0.0);
    }

    #[test]
    fn position_clamped_into_map() {
        let map = demo();
        let mut p = Player::new(Vec2f::new(-4.0, 99.0), Vec2f::new(1.0, 0.0), 0.66);
        p.update(&InputState::default(), 0.0, &map, &Motion::default());
        assert!((p.position() - Vec2f::new(0.2, 4.8)).length() < 1e-5);
    }

    #[test]
    fn non_finite_candidate_is_blocked() {
        assert!(!fits(Vec2f::new(f32::NAN, 2.0), &demo(), 0.2));
    }

    proptest! {
        #[test]
        fn blocked_moves_leave_position_unchanged(
            x in 1.2f32..4.8,
            y in 1.2f32..3.8,
            dx in -1.5f32..1.5,
            dy in -1.5f32..1.5,
            radius in 0.05f32..0.45,
        ) {
            let map = demo();
            let start = Vec2f::new(x, y);
            let mut p = Player::new(start, Vec2f::new(1.0, 0.0), 0.66);
            let candidate = start + Vec2f::new(dx, dy);
            let moved = p.try_move(candidate, &map, radius);
            if moved {
                prop_assert!(fits(candidate, &map, radius));
                prop_assert_eq!(p.position(), candidate);
            } else {
                prop_assert_eq!(p.position(), start);
            }
        }
    }
}

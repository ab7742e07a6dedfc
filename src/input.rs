//! Movement input from the browser: the set of currently held keys.

use serde::{Deserialize, Serialize};

/// Held movement keys. `up` is `+y`, `right` is `+x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    /// Build from key names as reported by the browser (`KeyboardEvent.key`,
    /// lowercased). Unknown keys are ignored.
    pub fn from_pressed<S: AsRef<str>>(pressed: &[S]) -> Self {
        let mut keys = Self::default();
        for key in pressed {
            match key.as_ref().to_ascii_lowercase().as_str() {
                "w" | "arrowup" => keys.up = true,
                "s" | "arrowdown" => keys.down = true,
                "a" | "arrowleft" => keys.left = true,
                "d" | "arrowright" => keys.right = true,
                _ => {}
            }
        }
        keys
    }

    /// Unit movement vector, or `None` when opposing keys cancel out.
    pub fn direction(&self) -> Option<(f32, f32)> {
        let dx = (self.right as i8 - self.left as i8) as f32;
        let dy = (self.up as i8 - self.down as i8) as f32;

        if dx == 0.0 && dy == 0.0 {
            return None;
        }

        let len = (dx * dx + dy * dy).sqrt();
        Some((dx / len, dy / len))
    }
}

// ============================================================================
// Direction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Down = 0,
    Left = 1,
    Up = 2,
    Right = 3,
    DownLeft = 4,
    DownRight = 5,
    UpLeft = 6,
    UpRight = 7,
}

impl Direction {
    /// Nearest of eight directions for a vector in the `+y`-up plane.
    pub fn from_velocity(dx: f32, dy: f32) -> Self {
        if dx == 0.0 && dy == 0.0 {
            return Direction::Down;
        }

        let angle = dy.atan2(dx);
        let octant = (angle / std::f32::consts::FRAC_PI_4).round() as i32;

        match octant.rem_euclid(8) {
            0 => Direction::Right,
            1 => Direction::UpRight,
            2 => Direction::Up,
            3 => Direction::UpLeft,
            4 => Direction::Left,
            5 => Direction::DownLeft,
            6 => Direction::Down,
            _ => Direction::DownRight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        let keys = MoveKeys::from_pressed(&["W", "ArrowLeft", " ", "q"]);
        assert_eq!(
            keys,
            MoveKeys {
                up: true,
                down: false,
                left: true,
                right: false
            }
        );
    }

    #[test]
    fn test_direction_is_normalized() {
        let keys = MoveKeys::from_pressed(&["w", "d"]);
        let (dx, dy) = keys.direction().unwrap();
        assert!((dx * dx + dy * dy - 1.0).abs() < 1e-6);
        assert!(dx > 0.0 && dy > 0.0);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let keys = MoveKeys::from_pressed(&["a", "d"]);
        assert_eq!(keys.direction(), None);

        let keys = MoveKeys::from_pressed(&["a", "d", "s"]);
        assert_eq!(keys.direction(), Some((0.0, -1.0)));
    }

    #[test]
    fn test_facing_from_velocity() {
        assert_eq!(Direction::from_velocity(1.0, 0.0), Direction::Right);
        assert_eq!(Direction::from_velocity(0.0, 1.0), Direction::Up);
        assert_eq!(Direction::from_velocity(-1.0, 0.0), Direction::Left);
        assert_eq!(Direction::from_velocity(0.0, -1.0), Direction::Down);
        assert_eq!(Direction::from_velocity(0.7, 0.7), Direction::UpRight);
        assert_eq!(Direction::from_velocity(-0.7, -0.7), Direction::DownLeft);
    }
}

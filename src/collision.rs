//! Collision and proximity in the kitchen's movement plane.
//!
//! All checks work on one 2D plane: `+x` is right, `+y` is up. Obstacles are
//! few (fewer than 20), so every query is a linear scan in list order.

use serde::{Deserialize, Serialize};

/// Longest distance a single movement sub-step may cover.
pub const MAX_MOVE_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned square centered on a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub center: Position,
    pub half: f32,
}

impl Footprint {
    pub fn new(center: Position, size: f32) -> Self {
        Self {
            center,
            half: size / 2.0,
        }
    }

    /// Strict overlap: squares that merely touch do not overlap.
    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.center.x + self.half > other.center.x - other.half
            && self.center.x - self.half < other.center.x + other.half
            && self.center.y + self.half > other.center.y - other.half
            && self.center.y - self.half < other.center.y + other.half
    }

    fn inside_bounds(&self, half_extent: f32) -> bool {
        self.center.x - self.half >= -half_extent
            && self.center.x + self.half <= half_extent
            && self.center.y - self.half >= -half_extent
            && self.center.y + self.half <= half_extent
    }
}

/// Euclidean proximity test used to decide whether the player is "at" something.
pub fn within_reach(a: &Position, b: &Position, radius: f32) -> bool {
    a.distance(b) <= radius
}

/// Static obstacles of one kitchen plus the player's footprint size.
#[derive(Debug, Clone)]
pub struct CollisionMap {
    obstacles: Vec<Footprint>,
    half_extent: f32,
    player_size: f32,
}

impl CollisionMap {
    pub fn new(obstacles: Vec<Footprint>, half_extent: f32, player_size: f32) -> Self {
        Self {
            obstacles,
            half_extent,
            player_size,
        }
    }

    /// True if the player's footprint at `position` overlaps an obstacle or
    /// leaves the kitchen bounds.
    pub fn collides(&self, position: Position) -> bool {
        let player = Footprint::new(position, self.player_size);

        if !player.inside_bounds(self.half_extent) {
            return true;
        }

        self.obstacles.iter().any(|obstacle| player.overlaps(obstacle))
    }

    /// Try to move from `from` to `to`. A blocked move falls back to moving
    /// along a single axis, and finally to staying put.
    pub fn resolve_movement(&self, from: Position, to: Position) -> Position {
        if !self.collides(to) {
            return to;
        }

        // Try moving only on X axis
        let x_only = Position::new(to.x, from.y);
        if x_only != from && !self.collides(x_only) {
            return x_only;
        }

        // Try moving only on Y axis
        let y_only = Position::new(from.x, to.y);
        if y_only != from && !self.collides(y_only) {
            return y_only;
        }

        from
    }

    /// Move along `(dir_x, dir_y)` (expected unit length) for `distance`,
    /// in sub-steps no longer than [`MAX_MOVE_STEP`].
    pub fn sweep(&self, from: Position, dir_x: f32, dir_y: f32, distance: f32) -> Position {
        if distance <= 0.0 {
            return from;
        }

        let steps = (distance / MAX_MOVE_STEP).ceil().max(1.0) as u32;
        let step = distance / steps as f32;

        let mut current = from;
        for _ in 0..steps {
            let next = self.resolve_movement(current, current.offset(dir_x * step, dir_y * step));
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_block() -> CollisionMap {
        CollisionMap::new(vec![Footprint::new(Position::new(0.0, 0.0), 1.0)], 5.0, 0.6)
    }

    #[test]
    fn test_touching_squares_do_not_overlap() {
        let a = Footprint::new(Position::new(0.0, 0.0), 1.0);
        let b = Footprint::new(Position::new(1.0, 0.0), 1.0);
        assert!(!a.overlaps(&b));

        let c = Footprint::new(Position::new(0.9, 0.0), 1.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_collides_with_obstacle_and_bounds() {
        let map = single_block();
        assert!(map.collides(Position::new(0.0, 0.0)));
        assert!(map.collides(Position::new(0.7, 0.0)));
        assert!(!map.collides(Position::new(1.0, 0.0)));

        // Footprint edge beyond the walls
        assert!(map.collides(Position::new(4.9, 2.0)));
        assert!(!map.collides(Position::new(4.5, 2.0)));
    }

    #[test]
    fn test_within_reach() {
        let a = Position::new(0.0, 0.0);
        assert!(within_reach(&a, &Position::new(0.6, 0.8), 1.0));
        assert!(!within_reach(&a, &Position::new(0.6, 0.81), 1.0));
    }

    #[test]
    fn test_resolve_movement_slides_along_obstacle() {
        let map = single_block();
        // Diagonal move into the block's right face keeps the vertical part
        let from = Position::new(1.0, -0.6);
        let to = Position::new(0.7, -0.3);
        let resolved = map.resolve_movement(from, to);
        assert_eq!(resolved, Position::new(1.0, -0.3));
    }

    #[test]
    fn test_sweep_stops_at_wall() {
        let map = CollisionMap::new(vec![], 5.0, 0.6);
        let end = map.sweep(Position::new(0.0, 0.0), 1.0, 0.0, 10.0);
        assert!(end.x <= 4.7 + 1e-4);
        assert!(end.x > 4.5);
        assert_eq!(end.y, 0.0);
    }

    #[test]
    fn test_sweep_cannot_tunnel_through_obstacle() {
        let map = single_block();
        // A single large step would jump over the block entirely
        let end = map.sweep(Position::new(-2.0, 0.0), 1.0, 0.0, 4.0);
        assert!(end.x < -0.8 + 1e-4);
    }
}

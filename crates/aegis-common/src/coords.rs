//! Planar positions and bearings between combatants.
//!
//! Headings are in degrees, measured counter-clockwise from the +X axis.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Location and facing of a combatant on the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// World-space location
    pub location: Vec2,
    /// Facing direction in degrees
    pub heading: f32,
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Position {
    /// Creates a new position facing +X.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            location: Vec2::new(x, y),
            heading: 0.0,
        }
    }

    /// Sets the facing direction.
    #[must_use]
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    /// Distance to another position.
    #[must_use]
    pub fn distance_to(&self, other: &Position) -> f32 {
        self.location.distance(other.location)
    }

    /// Absolute bearing from this position to another, in degrees.
    ///
    /// Coincident positions have a bearing equal to this heading.
    #[must_use]
    pub fn bearing_to(&self, other: &Position) -> f32 {
        let delta = other.location - self.location;
        if delta.length_squared() < f32::EPSILON {
            return self.heading;
        }
        delta.y.atan2(delta.x).to_degrees()
    }

    /// Signed angle between this heading and the bearing to `other`,
    /// normalized to `(-180, 180]`.
    #[must_use]
    pub fn relative_angle_to(&self, other: &Position) -> f32 {
        normalize_angle(self.bearing_to(other) - self.heading)
    }
}

/// Normalizes an angle in degrees to `(-180, 180]`.
#[must_use]
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_relative_angle_in_front() {
        let defender = Position::new(0.0, 0.0).with_heading(90.0);
        let attacker = Position::new(0.0, 5.0);

        assert!(defender.relative_angle_to(&attacker).abs() < 1e-3);
    }

    #[test]
    fn test_relative_angle_side() {
        let defender = Position::new(0.0, 0.0);
        let attacker = Position::new(0.0, -3.0);

        assert!((defender.relative_angle_to(&attacker) + 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn normalized_angle_in_range(angle in -10_000.0f32..10_000.0) {
            let n = normalize_angle(angle);
            prop_assert!(n > -180.0 - 1e-3 && n <= 180.0 + 1e-3);
        }
    }
}

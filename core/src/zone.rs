//! Zones — named regions with a resource tag and a block-box footprint.
//!
//! A Zone is immutable after creation. Its mutable ownership state lives
//! in `checkpoint::Checkpoint`, never here.

use crate::types::ZoneName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of resource categories a zone can produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Money,
    Upgrade,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Money, ResourceKind::Upgrade];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Money   => "Money",
            Self::Upgrade => "Upgrade",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An integer block position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned box spanning two corners, inclusive on every face.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneBounds {
    min: Position,
    max: Position,
}

impl ZoneBounds {
    /// Corners may be given in any order.
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self {
            min: Position::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Position::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn min(&self) -> Position { self.min }
    pub fn max(&self) -> Position { self.max }

    pub fn contains(&self, pos: Position) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// Block at the middle of the box (rounded toward `min`).
    pub fn center(&self) -> Position {
        Position::new(
            self.min.x + (self.max.x - self.min.x) / 2,
            self.min.y + (self.max.y - self.min.y) / 2,
            self.min.z + (self.max.z - self.min.z) / 2,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Zone {
    pub name:   ZoneName,
    pub kind:   ResourceKind,
    pub bounds: ZoneBounds,
}

impl Zone {
    pub fn new(name: impl Into<ZoneName>, kind: ResourceKind, bounds: ZoneBounds) -> Self {
        Self { name: name.into(), kind, bounds }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.bounds.contains(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_accept_corners_in_any_order() {
        let a = ZoneBounds::from_corners(Position::new(5, 0, 5), Position::new(-5, 3, -5));
        let b = ZoneBounds::from_corners(Position::new(-5, 3, -5), Position::new(5, 0, 5));
        assert_eq!(a, b);
        assert_eq!(a.min(), Position::new(-5, 0, -5));
        assert_eq!(a.max(), Position::new(5, 3, 5));
    }

    #[test]
    fn contains_is_inclusive_on_every_face() {
        let bounds = ZoneBounds::from_corners(Position::new(0, 0, 0), Position::new(4, 2, 4));
        assert!(bounds.contains(Position::new(0, 0, 0)));
        assert!(bounds.contains(Position::new(4, 2, 4)));
        assert!(bounds.contains(Position::new(2, 1, 3)));
        assert!(!bounds.contains(Position::new(5, 1, 1)));
        assert!(!bounds.contains(Position::new(1, 3, 1)));
        assert!(!bounds.contains(Position::new(1, 1, -1)));
    }

    #[test]
    fn center_lies_inside() {
        let bounds = ZoneBounds::from_corners(Position::new(10, 60, 10), Position::new(20, 64, 15));
        assert!(bounds.contains(bounds.center()));
    }
}

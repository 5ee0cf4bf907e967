//! Axis-aligned geometry for protected areas
//!
//! - `Interval` - a normalized `[low, high]` range on one axis
//! - `Volume` - three intervals forming a rectangular prism
//! - `Point` - an integer block position

use std::fmt;

/// A normalized, inclusive integer range along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    low: i32,
    high: i32,
}

impl Interval {
    /// Create an interval from two coordinates given in any order
    pub fn new(a: i32, b: i32) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }

    /// Distance between the bounds. A single-block interval has length 0.
    pub fn length(&self) -> u64 {
        (i64::from(self.high) - i64::from(self.low)) as u64
    }

    /// Check whether a coordinate lies within the bounds (inclusive)
    pub fn contains(&self, value: i32) -> bool {
        value >= self.low && value <= self.high
    }

    /// Check whether two intervals share at least one coordinate.
    /// Touching bounds count.
    pub fn overlaps(&self, other: &Interval) -> bool {
        other.high >= self.low && other.low <= self.high
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// An integer block position in the world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
    pub z: i32,
}

impl Point {
    /// Create a new point
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Convert a player's floating point position into a block position.
    ///
    /// Each coordinate is truncated toward zero; out-of-range values saturate.
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
            z: z as i32,
        }
    }

    /// Same point with the vertical coordinate replaced
    pub fn with_height(self, y: i32) -> Self {
        Self { y, ..self }
    }
}

/// An axis-aligned rectangular prism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Volume {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Volume {
    /// Build a volume from per-axis coordinate pairs in any order
    pub fn new(x1: i32, x2: i32, y1: i32, y2: i32, z1: i32, z2: i32) -> Self {
        Self {
            x: Interval::new(x1, x2),
            y: Interval::new(y1, y2),
            z: Interval::new(z1, z2),
        }
    }

    /// Build the volume spanned by two opposite corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x, b.x, a.y, b.y, a.z, b.z)
    }

    /// Horizontal footprint (x length times z length), height ignored
    pub fn footprint(&self) -> u64 {
        self.x.length().saturating_mul(self.z.length())
    }

    /// Check whether a point lies inside the volume
    pub fn contains(&self, point: Point) -> bool {
        self.x.contains(point.x) && self.y.contains(point.y) && self.z.contains(point.z)
    }

    /// Check whether two volumes share any block
    pub fn overlaps(&self, other: &Volume) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && self.z.overlaps(&other.z)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x:{} y:{} z:{}", self.x, self.y, self.z)
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the points and line strokes drawn over a video
//! frame. Stroke coordinates are always content-space: source pixels of
//! the undistorted frame, origin at its top-left corner.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A 2D point (or offset) in either content or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// Palette a stroke can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeColor {
    #[default]
    Red,
    Yellow,
    Cyan,
    Lime,
    White,
}

impl StrokeColor {
    pub const ALL: [StrokeColor; 5] = [
        StrokeColor::Red,
        StrokeColor::Yellow,
        StrokeColor::Cyan,
        StrokeColor::Lime,
        StrokeColor::White,
    ];

    /// sRGB components used when painting the stroke.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            StrokeColor::Red => [239, 68, 68],
            StrokeColor::Yellow => [250, 204, 21],
            StrokeColor::Cyan => [34, 211, 238],
            StrokeColor::Lime => [132, 204, 22],
            StrokeColor::White => [255, 255, 255],
        }
    }
}

/// A committed line annotation. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    start: Point,
    end: Point,
    color: StrokeColor,
}

impl Stroke {
    pub fn new(start: Point, end: Point, color: StrokeColor) -> Self {
        Self { start, end, color }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    /// Length in content-space units.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, 2.0);

        assert_eq!(a + b, Point::new(4.0, 6.0));
        assert_eq!(a - b, Point::new(2.0, 2.0));
        assert_eq!(a * 2.0, Point::new(6.0, 8.0));
        assert_eq!(a / 2.0, Point::new(1.5, 2.0));
        assert!((Point::ZERO.distance(a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_stroke_serializes_lowercase_color() {
        let stroke = Stroke::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0), StrokeColor::Cyan);
        let json = serde_json::to_string(&stroke).unwrap();
        assert!(json.contains("\"cyan\""));

        let back: Stroke = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stroke);
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate transformations between screen space and content space.
//!
//! Content space is the undistorted video frame at 1:1 scale. The on-screen
//! position of its origin is never recomputed from stored zoom/pan state:
//! it is read from the rendered surface through [`SurfaceMeasure`], which
//! already reflects the pan offset. Subtracting pan again here would make
//! strokes drift away from the pointer.

use crate::models::annotation::Point;

/// Where the media surface was actually laid out on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePlacement {
    /// Screen position of the content-space origin (frame top-left as drawn).
    pub origin: Point,
    /// Screen pixels per content unit when the viewport zoom is 1.
    pub fit_scale: f64,
}

/// Measures the rendered media surface.
///
/// Returns `None` while the surface has not been laid out.
pub trait SurfaceMeasure {
    fn measure(&self) -> Option<SurfacePlacement>;
}

impl SurfaceMeasure for SurfacePlacement {
    fn measure(&self) -> Option<SurfacePlacement> {
        Some(*self)
    }
}

impl SurfaceMeasure for Option<SurfacePlacement> {
    fn measure(&self) -> Option<SurfacePlacement> {
        *self
    }
}

/// Convert a screen point to content space.
///
/// `scale` is the on-screen size of one content unit. An unmeasured origin
/// yields the content origin rather than an error.
pub fn to_content_space(screen: Point, container_origin: Option<Point>, scale: f64) -> Point {
    match container_origin {
        Some(origin) if scale > 0.0 && scale.is_finite() => (screen - origin) / scale,
        _ => Point::ZERO,
    }
}

/// Convert a content-space point back to screen space.
pub fn to_screen_space(content: Point, container_origin: Option<Point>, scale: f64) -> Point {
    match container_origin {
        Some(origin) => content * scale + origin,
        None => Point::ZERO,
    }
}

/// Largest rectangle of the given aspect ratio that fits inside `available`,
/// returned as (offset, size, scale) with the content centered.
pub fn fit_centered(content: (f64, f64), available: (f64, f64)) -> (Point, Point, f64) {
    let (content_w, content_h) = content;
    let (avail_w, avail_h) = available;
    if content_w <= 0.0 || content_h <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
        return (Point::ZERO, Point::ZERO, 0.0);
    }

    let scale = (avail_w / content_w).min(avail_h / content_h);
    let size = Point::new(content_w * scale, content_h * scale);
    let offset = Point::new((avail_w - size.x) / 2.0, (avail_h - size.y) / 2.0);
    (offset, size, scale)
}

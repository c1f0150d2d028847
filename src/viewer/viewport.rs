// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Zoom and pan state for the media surface.
//!
//! Content point `p` is displayed at `p * zoom + pan`, where `pan` is in
//! screen pixels relative to the unscaled surface origin.

use crate::models::annotation::Point;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;

/// How a press-drag-release on the surface is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Pan,
    Draw,
    /// Zoomed out with drawing off: the drag does nothing.
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            pan: Point::ZERO,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    /// Change zoom by `delta` keeping the content under `anchor` fixed on screen.
    ///
    /// Reaching the minimum zoom snaps pan back to the origin.
    pub fn zoom_at(&mut self, anchor: Point, delta: f64) {
        if !delta.is_finite() {
            return;
        }

        let new_zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_zoom <= MIN_ZOOM {
            self.zoom = MIN_ZOOM;
            self.pan = Point::ZERO;
            return;
        }

        let ratio = new_zoom / self.zoom;
        self.pan = anchor - (anchor - self.pan) * ratio;
        self.zoom = new_zoom;
    }

    /// Multiplicative zoom (pinch), expressed through [`Viewport::zoom_at`].
    pub fn zoom_by_factor(&mut self, anchor: Point, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom_at(anchor, self.zoom * (factor - 1.0));
        }
    }

    /// Move the surface. Only allowed while zoomed in; returns whether it moved.
    pub fn pan_by(&mut self, delta: Point) -> bool {
        if !self.is_zoomed() {
            return false;
        }
        self.pan = self.pan + delta;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Content point currently displayed under `screen`.
    #[cfg(test)]
    pub fn content_at(&self, screen: Point) -> Point {
        (screen - self.pan) / self.zoom
    }

    pub fn classify_gesture(&self, drawing_mode: bool) -> Gesture {
        if drawing_mode {
            Gesture::Draw
        } else if self.is_zoomed() {
            Gesture::Pan
        } else {
            Gesture::Inert
        }
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Freehand line drawing over the video frame.
//!
//! A drag becomes a [`Stroke`] in content space. Drags no longer than
//! [`MIN_STROKE_LENGTH`] are treated as taps and dropped.

use crate::models::annotation::{Point, Stroke, StrokeColor};

/// Strokes must be strictly longer than this (content units) to be kept.
pub const MIN_STROKE_LENGTH: f64 = 2.0;

/// Line width in content units that renders as `base_width` screen pixels
/// once the surface is scaled by `scale`.
pub fn content_line_width(base_width: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        base_width / scale
    } else {
        base_width
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum DrawState {
    #[default]
    Idle,
    Drawing { start: Point, end: Point },
}

/// Committed strokes of the active video plus the stroke being drawn.
#[derive(Debug, Default)]
pub struct StrokeLayer {
    strokes: Vec<Stroke>,
    state: DrawState,
    color: StrokeColor,
}

impl StrokeLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    #[cfg(test)]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    /// Start a stroke. The initial segment is degenerate until the pointer moves.
    pub fn begin(&mut self, at: Point) {
        self.state = DrawState::Drawing { start: at, end: at };
    }

    pub fn extend(&mut self, to: Point) {
        if let DrawState::Drawing { end, .. } = &mut self.state {
            *end = to;
        }
    }

    /// End the active stroke, committing it if it is long enough.
    pub fn finish(&mut self) -> Option<Stroke> {
        let DrawState::Drawing { start, end } = std::mem::take(&mut self.state) else {
            return None;
        };

        let stroke = Stroke::new(start, end, self.color);
        if stroke.length() > MIN_STROKE_LENGTH {
            self.strokes.push(stroke);
            log::debug!("Committed stroke, total: {}", self.strokes.len());
            Some(stroke)
        } else {
            None
        }
    }

    /// The uncommitted stroke being drawn, for live preview.
    pub fn preview(&self) -> Option<Stroke> {
        match self.state {
            DrawState::Drawing { start, end } => Some(Stroke::new(start, end, self.color)),
            DrawState::Idle => None,
        }
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.state = DrawState::Idle;
    }

    /// Swap in previously saved strokes, abandoning any stroke in progress.
    pub fn replace(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
        self.state = DrawState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_drag_commits_stroke() {
        let mut layer = StrokeLayer::new();
        layer.set_color(StrokeColor::Yellow);
        layer.begin(Point::new(10.0, 10.0));
        layer.extend(Point::new(12.0, 12.0));

        let stroke = layer.finish().expect("stroke should be committed");
        assert_eq!(stroke.start(), Point::new(10.0, 10.0));
        assert_eq!(stroke.end(), Point::new(12.0, 12.0));
        assert_eq!(stroke.color(), StrokeColor::Yellow);
        assert_eq!(layer.strokes().len(), 1);
        assert!(!layer.is_drawing());
    }

    #[test]
    fn test_short_drag_is_discarded() {
        let mut layer = StrokeLayer::new();
        layer.begin(Point::new(10.0, 10.0));
        layer.extend(Point::new(12.0, 10.0));
        assert!(layer.finish().is_none());

        layer.begin(Point::new(50.0, 50.0));
        assert!(layer.finish().is_none());

        assert!(layer.strokes().is_empty());
    }

    #[test]
    fn test_preview_tracks_pointer() {
        let mut layer = StrokeLayer::new();
        assert!(layer.preview().is_none());

        layer.begin(Point::new(1.0, 1.0));
        assert_eq!(layer.preview().unwrap().end(), Point::new(1.0, 1.0));

        layer.extend(Point::new(30.0, 40.0));
        let preview = layer.preview().unwrap();
        assert_eq!(preview.start(), Point::new(1.0, 1.0));
        assert_eq!(preview.end(), Point::new(30.0, 40.0));
        assert!(layer.strokes().is_empty());
    }

    #[test]
    fn test_extend_without_begin_is_ignored() {
        let mut layer = StrokeLayer::new();
        layer.extend(Point::new(30.0, 40.0));
        assert!(layer.preview().is_none());
        assert!(layer.finish().is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut layer = StrokeLayer::new();
        for i in 0..3 {
            layer.begin(Point::new(0.0, i as f64 * 10.0));
            layer.extend(Point::new(100.0, i as f64 * 10.0));
            layer.finish();
        }
        assert_eq!(layer.strokes().len(), 3);

        layer.clear();
        assert!(layer.strokes().is_empty());
    }

    #[test]
    fn test_replace_abandons_active_stroke() {
        let mut layer = StrokeLayer::new();
        layer.begin(Point::new(0.0, 0.0));
        layer.replace(vec![Stroke::new(Point::ZERO, Point::new(9.0, 0.0), StrokeColor::Lime)]);

        assert!(!layer.is_drawing());
        assert_eq!(layer.strokes().len(), 1);
    }

    #[test]
    fn test_line_width_constant_on_screen() {
        for scale in [0.5, 1.0, 3.0, 8.0] {
            let content_width = content_line_width(3.0, scale);
            assert!((content_width * scale - 3.0).abs() < 1e-12);
        }
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video analyzer session.
//!
//! A [`ViewerSession`] owns everything tied to the open video: zoom/pan,
//! strokes, the pointer gesture in progress and the transport. Opening a
//! different video replaces the whole session, so nothing leaks across
//! videos.

pub mod drawing;
pub mod playback;
pub mod sync;
pub mod viewport;

use crate::io::media::MediaSource;
use crate::models::annotation::{Point, Stroke, StrokeColor};
use crate::models::project::VideoFile;
use crate::util::geometry::{to_content_space, SurfaceMeasure};
use drawing::{content_line_width, StrokeLayer};
use playback::PlaybackController;
use std::time::Duration;
use sync::Transport;
use viewport::{Gesture, Viewport};

/// Pointer gesture currently owning the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ActiveGesture {
    Pan { last: Point },
    Draw,
}

pub struct ViewerSession {
    video: VideoFile,
    comparison: Option<VideoFile>,
    viewport: Viewport,
    layer: StrokeLayer,
    drawing_mode: bool,
    gesture: Option<ActiveGesture>,
    transport: Transport,
    base_stroke_width: f64,
}

impl ViewerSession {
    pub fn open(video: VideoFile, media: Box<dyn MediaSource>, base_stroke_width: f64) -> Self {
        log::info!("Opened video '{}' ({})", video.name, video.id);
        Self {
            video,
            comparison: None,
            viewport: Viewport::default(),
            layer: StrokeLayer::new(),
            drawing_mode: false,
            gesture: None,
            transport: Transport::single(PlaybackController::new(media)),
            base_stroke_width,
        }
    }

    /// Show another video as the comparison pane. Strokes stay with the primary.
    pub fn set_comparison(&mut self, video: VideoFile, media: Box<dyn MediaSource>) {
        log::info!("Comparing against '{}' ({})", video.name, video.id);
        self.transport.attach_secondary(PlaybackController::new(media));
        self.comparison = Some(video);
    }

    pub fn clear_comparison(&mut self) {
        self.transport.detach_secondary();
        self.comparison = None;
    }

    pub fn video(&self) -> &VideoFile {
        &self.video
    }

    pub fn comparison(&self) -> Option<&VideoFile> {
        self.comparison.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub fn strokes(&self) -> &[Stroke] {
        self.layer.strokes()
    }

    pub fn preview_stroke(&self) -> Option<Stroke> {
        self.layer.preview()
    }

    pub fn stroke_color(&self) -> StrokeColor {
        self.layer.color()
    }

    pub fn set_stroke_color(&mut self, color: StrokeColor) {
        self.layer.set_color(color);
    }

    pub fn drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    pub fn set_drawing_mode(&mut self, enabled: bool) {
        self.drawing_mode = enabled;
    }

    pub fn clear_strokes(&mut self) {
        let count = self.layer.strokes().len();
        self.layer.clear();
        log::info!("Cleared {} strokes", count);
    }

    /// Replace the strokes with a saved set, e.g. from an export file.
    pub fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        self.gesture = None;
        log::info!("Loaded {} strokes", strokes.len());
        self.layer.replace(strokes);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Stroke width in content units for a surface drawn at `fit_scale`.
    pub fn stroke_content_width(&self, fit_scale: f64) -> f64 {
        content_line_width(self.base_stroke_width, self.viewport.zoom() * fit_scale)
    }

    /// Map a screen point into content space using a fresh measurement.
    pub fn content_point(&self, screen: Point, surface: &dyn SurfaceMeasure) -> Point {
        match surface.measure() {
            Some(placement) => to_content_space(
                screen,
                Some(placement.origin),
                self.viewport.zoom() * placement.fit_scale,
            ),
            None => Point::ZERO,
        }
    }

    pub fn pointer_down(&mut self, screen: Point, surface: &dyn SurfaceMeasure) {
        self.gesture = match self.viewport.classify_gesture(self.drawing_mode) {
            Gesture::Draw => {
                let at = self.content_point(screen, surface);
                self.layer.begin(at);
                Some(ActiveGesture::Draw)
            }
            Gesture::Pan => Some(ActiveGesture::Pan { last: screen }),
            Gesture::Inert => None,
        };
    }

    pub fn pointer_move(&mut self, screen: Point, surface: &dyn SurfaceMeasure) {
        match self.gesture {
            Some(ActiveGesture::Draw) => {
                let to = self.content_point(screen, surface);
                self.layer.extend(to);
            }
            Some(ActiveGesture::Pan { last }) => {
                self.viewport.pan_by(screen - last);
                self.gesture = Some(ActiveGesture::Pan { last: screen });
            }
            None => {}
        }
    }

    /// End the gesture at `screen`, returning a stroke if one was committed.
    pub fn pointer_up(&mut self, screen: Point, surface: &dyn SurfaceMeasure) -> Option<Stroke> {
        self.pointer_move(screen, surface);
        self.pointer_leave()
    }

    /// End the gesture where it last was.
    pub fn pointer_leave(&mut self) -> Option<Stroke> {
        match self.gesture.take() {
            Some(ActiveGesture::Draw) => self.layer.finish(),
            _ => None,
        }
    }

    /// Additive zoom anchored at `anchor`, relative to the unscaled surface origin.
    pub fn zoom_at(&mut self, anchor: Point, delta: f64) {
        self.viewport.zoom_at(anchor, delta);
    }

    pub fn pinch(&mut self, anchor: Point, factor: f64) {
        self.viewport.zoom_by_factor(anchor, factor);
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.transport.tick(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::FakeMedia;
    use crate::util::geometry::{to_screen_space, SurfacePlacement};
    use std::path::Path;

    fn session(duration: f64) -> ViewerSession {
        ViewerSession::open(
            VideoFile::from_path(Path::new("throw.mp4")),
            FakeMedia::loaded(duration, 0.0).boxed(),
            3.0,
        )
    }

    /// Surface laid out at the screen origin with a 1:1 fit, panned like the renderer does.
    fn surface(s: &ViewerSession) -> SurfacePlacement {
        SurfacePlacement {
            origin: s.viewport().pan(),
            fit_scale: 1.0,
        }
    }

    fn screen_of(s: &ViewerSession, content: Point) -> Point {
        let placement = surface(s);
        to_screen_space(content, Some(placement.origin), s.viewport().zoom() * placement.fit_scale)
    }

    fn draw(s: &mut ViewerSession, from: Point, to: Point) -> Option<Stroke> {
        let a = screen_of(s, from);
        let b = screen_of(s, to);
        let placement = surface(s);
        s.pointer_down(a, &placement);
        s.pointer_move(b, &placement);
        s.pointer_up(b, &placement)
    }

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_draw_after_zoom_stores_content_coordinates() {
        let mut s = session(30.0);
        s.zoom_at(Point::new(400.0, 300.0), 2.0);
        assert_eq!(s.viewport().zoom(), 3.0);
        s.set_drawing_mode(true);

        draw(&mut s, Point::new(100.0, 100.0), Point::new(150.0, 160.0)).expect("stroke");

        assert_eq!(s.strokes().len(), 1);
        assert_close(s.strokes()[0].start(), Point::new(100.0, 100.0));
        assert_close(s.strokes()[0].end(), Point::new(150.0, 160.0));
    }

    #[test]
    fn test_strokes_unaffected_by_later_zoom_and_pan() {
        let mut s = session(30.0);
        s.set_drawing_mode(true);
        draw(&mut s, Point::new(10.0, 20.0), Point::new(200.0, 220.0)).expect("stroke");
        let before = s.strokes().to_vec();

        s.zoom_at(Point::new(320.0, 240.0), 3.0);
        s.set_drawing_mode(false);
        let placement = surface(&s);
        s.pointer_down(Point::new(100.0, 100.0), &placement);
        s.pointer_move(Point::new(-250.0, 80.0), &placement);
        s.pointer_up(Point::new(-300.0, 40.0), &placement);
        assert_eq!(s.viewport().pan(), Point::new(320.0, 240.0) * -3.0 + Point::new(-400.0, -60.0));

        assert_eq!(s.strokes(), before.as_slice());
    }

    #[test]
    fn test_tap_does_not_create_stroke() {
        let mut s = session(30.0);
        s.set_drawing_mode(true);
        assert!(draw(&mut s, Point::new(50.0, 50.0), Point::new(51.0, 51.0)).is_none());
        assert!(draw(&mut s, Point::new(50.0, 50.0), Point::new(52.0, 50.0)).is_none());
        assert!(draw(&mut s, Point::new(50.0, 50.0), Point::new(52.5, 50.0)).is_some());
        assert_eq!(s.strokes().len(), 1);
    }

    #[test]
    fn test_drag_at_zoom_one_without_drawing_does_nothing() {
        let mut s = session(30.0);
        let placement = surface(&s);
        s.pointer_down(Point::new(10.0, 10.0), &placement);
        s.pointer_move(Point::new(200.0, 90.0), &placement);
        s.pointer_up(Point::new(200.0, 90.0), &placement);

        assert_eq!(s.viewport().pan(), Point::ZERO);
        assert!(s.strokes().is_empty());
    }

    #[test]
    fn test_drawing_while_zoomed_does_not_pan() {
        let mut s = session(30.0);
        s.zoom_at(Point::ZERO, 1.0);
        s.set_drawing_mode(true);
        let pan = s.viewport().pan();

        draw(&mut s, Point::new(10.0, 10.0), Point::new(40.0, 10.0)).expect("stroke");
        assert_eq!(s.viewport().pan(), pan);
    }

    #[test]
    fn test_pointer_leave_commits_stroke() {
        let mut s = session(30.0);
        s.set_drawing_mode(true);
        let placement = surface(&s);
        s.pointer_down(Point::new(0.0, 0.0), &placement);
        s.pointer_move(Point::new(0.0, 30.0), &placement);

        let stroke = s.pointer_leave().expect("stroke");
        assert_eq!(stroke.end(), Point::new(0.0, 30.0));
        assert!(s.preview_stroke().is_none());
    }

    #[test]
    fn test_content_point_uses_measured_origin_and_fit_scale() {
        let mut s = session(30.0);
        s.zoom_at(Point::ZERO, 1.0);
        let placement = SurfacePlacement {
            origin: Point::new(100.0, 50.0),
            fit_scale: 0.5,
        };
        // Zoom 2 times fit 0.5 gives one screen pixel per source pixel.
        assert_close(s.content_point(Point::new(130.0, 90.0), &placement), Point::new(30.0, 40.0));
        assert_eq!(s.content_point(Point::new(130.0, 90.0), &None::<SurfacePlacement>), Point::ZERO);
    }

    #[test]
    fn test_stroke_width_compensates_zoom() {
        let mut s = session(30.0);
        assert!((s.stroke_content_width(0.5) - 6.0).abs() < 1e-12);
        s.zoom_at(Point::ZERO, 3.0);
        assert!((s.stroke_content_width(0.5) * 4.0 * 0.5 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_comparison_keeps_strokes_and_zoom() {
        let mut s = session(30.0);
        s.set_drawing_mode(true);
        draw(&mut s, Point::new(0.0, 0.0), Point::new(10.0, 10.0)).expect("stroke");
        s.zoom_at(Point::new(5.0, 5.0), 1.0);

        s.set_comparison(
            VideoFile::from_path(Path::new("reference.mp4")),
            FakeMedia::loaded(20.0, 0.0).boxed(),
        );
        assert!(s.transport().has_secondary());
        assert_eq!(s.strokes().len(), 1);
        assert_eq!(s.viewport().zoom(), 2.0);

        s.clear_comparison();
        assert!(s.comparison().is_none());
        assert!(!s.transport().has_secondary());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut s = session(30.0);
        s.set_drawing_mode(true);
        draw(&mut s, Point::new(0.0, 0.0), Point::new(10.0, 10.0)).expect("stroke");
        s.zoom_at(Point::new(50.0, 50.0), 4.0);

        s.clear_strokes();
        s.reset_view();
        assert!(s.strokes().is_empty());
        assert_eq!(*s.viewport(), Viewport::default());
    }
}

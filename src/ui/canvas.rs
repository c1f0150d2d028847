// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video surface with zoom, pan and line drawing.
//!
//! The primary pane owns all pointer interaction. The comparison pane is
//! always drawn fitted to its area.

use crate::models::annotation::{Point, Stroke};
use crate::util::geometry::{fit_centered, to_screen_space, SurfacePlacement};
use crate::viewer::playback::PlaybackController;
use crate::viewer::ViewerSession;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    TogglePlay,
}

/// GPU texture of the last frame shown in a pane.
#[derive(Default)]
pub struct PaneTexture {
    texture: Option<egui::TextureHandle>,
    frame_size: Option<(u32, u32)>,
    shown_at: Option<f64>,
}

impl PaneTexture {
    /// Upload the controller's current frame if the position changed.
    pub fn refresh(&mut self, ctx: &egui::Context, name: &str, controller: &mut PlaybackController) {
        let time = controller.state().current_time;
        if self.texture.is_some() && self.shown_at == Some(time) {
            return;
        }

        let Some(frame) = controller.current_frame() else {
            return;
        };
        let size = [frame.width as usize, frame.height as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
        self.frame_size = Some((frame.width, frame.height));
        self.shown_at = Some(time);

        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture(name, image, egui::TextureOptions::LINEAR)),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }
}

fn to_pos(p: Point) -> egui::Pos2 {
    egui::pos2(p.x as f32, p.y as f32)
}

fn to_point(p: egui::Pos2) -> Point {
    Point::new(p.x as f64, p.y as f64)
}

fn stroke_color(stroke: &Stroke, alpha: u8) -> egui::Color32 {
    let [r, g, b] = stroke.color().rgb();
    egui::Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

/// Fitted placement of a frame inside `rect`: (top-left, size, fit scale).
fn fitted(rect: egui::Rect, frame_size: (u32, u32)) -> (Point, Point, f64) {
    let (offset, size, scale) = fit_centered(
        (frame_size.0 as f64, frame_size.1 as f64),
        (rect.width() as f64, rect.height() as f64),
    );
    (to_point(rect.min) + offset, size, scale)
}

fn placeholder(painter: &egui::Painter, rect: egui::Rect, controller: &PlaybackController) {
    let text = match controller.media().error() {
        Some(error) => format!("Failed to load video: {}", error),
        None => "Loading video...".to_string(),
    };
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(16.0),
        egui::Color32::from_gray(200),
    );
}

/// Display the primary video and route pointer input into the session.
pub fn show_primary(
    ui: &mut egui::Ui,
    session: &mut ViewerSession,
    texture: &PaneTexture,
    wheel_sensitivity: f64,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

    let (Some(handle), Some(frame_size)) = (&texture.texture, texture.frame_size) else {
        placeholder(&painter, rect, session.transport().primary());
        return action;
    };
    let (base_min, base_size, fit_scale) = fitted(rect, frame_size);

    // Zoom first so pointer mapping below sees this frame's surface.
    if response.hovered() {
        if let Some(pointer) = response.hover_pos() {
            let anchor = to_point(pointer) - base_min;
            let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            if scroll != 0.0 {
                session.zoom_at(anchor, scroll as f64 * wheel_sensitivity);
            }
            if pinch != 1.0 {
                session.pinch(anchor, pinch as f64);
            }
        }
    }

    let surface = |session: &ViewerSession| SurfacePlacement {
        origin: base_min + session.viewport().pan(),
        fit_scale,
    };

    if response.drag_started() {
        if let Some(pos) = ui.input(|i| i.pointer.press_origin()) {
            let placement = surface(session);
            session.pointer_down(to_point(pos), &placement);
        }
    }
    if response.dragged() {
        match response.interact_pointer_pos() {
            Some(pos) if rect.contains(pos) => {
                let placement = surface(session);
                session.pointer_move(to_point(pos), &placement);
            }
            _ => {
                session.pointer_leave();
            }
        }
    }
    if response.drag_stopped() {
        match ui.input(|i| i.pointer.latest_pos()) {
            Some(pos) if rect.contains(pos) => {
                let placement = surface(session);
                session.pointer_up(to_point(pos), &placement);
            }
            _ => {
                session.pointer_leave();
            }
        }
    }
    if response.clicked() && !session.drawing_mode() {
        action = CanvasAction::TogglePlay;
    }

    let placement = surface(session);
    let scale = session.viewport().zoom() * fit_scale;
    let image_rect = egui::Rect::from_min_size(
        to_pos(placement.origin),
        egui::vec2(
            (base_size.x * session.viewport().zoom()) as f32,
            (base_size.y * session.viewport().zoom()) as f32,
        ),
    );
    painter.image(
        handle.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    let width = (session.stroke_content_width(fit_scale) * scale) as f32;
    for stroke in session.strokes() {
        draw_stroke(&painter, stroke, placement.origin, scale, width, 255);
    }
    if let Some(preview) = session.preview_stroke() {
        draw_stroke(&painter, &preview, placement.origin, scale, width, 160);
    }

    if session.viewport().is_zoomed() {
        painter.text(
            rect.left_top() + egui::vec2(8.0, 8.0),
            egui::Align2::LEFT_TOP,
            format!("{:.1}x", session.viewport().zoom()),
            egui::FontId::monospace(14.0),
            egui::Color32::WHITE,
        );
    }

    let hover_icon = if session.drawing_mode() {
        egui::CursorIcon::Crosshair
    } else if session.viewport().is_zoomed() {
        egui::CursorIcon::Grab
    } else {
        egui::CursorIcon::PointingHand
    };
    response.on_hover_cursor(hover_icon);

    action
}

fn draw_stroke(painter: &egui::Painter, stroke: &Stroke, origin: Point, scale: f64, width: f32, alpha: u8) {
    let a = to_pos(to_screen_space(stroke.start(), Some(origin), scale));
    let b = to_pos(to_screen_space(stroke.end(), Some(origin), scale));
    let color = stroke_color(stroke, alpha);
    painter.line_segment([a, b], egui::Stroke::new(width, color));
    painter.circle_filled(a, width / 2.0, color);
    painter.circle_filled(b, width / 2.0, color);
}

/// Display the comparison video fitted to the available area.
pub fn show_secondary(ui: &mut egui::Ui, controller: &PlaybackController, texture: &PaneTexture) {
    let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

    match (&texture.texture, texture.frame_size) {
        (Some(handle), Some(frame_size)) => {
            let (min, size, _) = fitted(rect, frame_size);
            painter.image(
                handle.id(),
                egui::Rect::from_min_size(to_pos(min), egui::vec2(size.x as f32, size.y as f32)),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        _ => placeholder(&painter, rect, controller),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::StrokeColor;

    #[test]
    fn test_stroke_end_caps_match_line_width() {
        let ctx = egui::Context::default();
        let stroke = Stroke::new(Point::new(10.0, 10.0), Point::new(40.0, 30.0), StrokeColor::Red);

        let output = ctx.run(egui::RawInput::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            draw_stroke(&painter, &stroke, Point::new(5.0, 5.0), 2.0, 6.0, 255);
        });

        let caps: Vec<(egui::Pos2, f32)> = output
            .shapes
            .iter()
            .filter_map(|clipped| match &clipped.shape {
                egui::Shape::Circle(circle) => Some((circle.center, circle.radius)),
                _ => None,
            })
            .collect();
        assert_eq!(
            caps,
            vec![(egui::pos2(25.0, 25.0), 3.0), (egui::pos2(85.0, 65.0), 3.0)]
        );
    }
}

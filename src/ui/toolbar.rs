// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Analyzer toolbar.
//!
//! Mode selection, stroke colors, zoom reset and comparison linking act on
//! the session directly; navigation is reported back to the app.

use crate::models::annotation::StrokeColor;
use crate::viewer::ViewerSession;

/// Requests the app has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    BackToGallery,
    CloseComparison,
    ToggleCoach,
}

fn swatch(color: StrokeColor) -> egui::Color32 {
    let [r, g, b] = color.rgb();
    egui::Color32::from_rgb(r, g, b)
}

/// Display the toolbar for the open session.
pub fn show(ui: &mut egui::Ui, session: &mut ViewerSession, coach_open: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("⬅ Library").clicked() {
            action = ToolbarAction::BackToGallery;
        }
        ui.label(egui::RichText::new(&session.video().name).strong());

        ui.separator();

        if ui.selectable_label(!session.drawing_mode(), "✋ View").clicked() {
            session.set_drawing_mode(false);
        }
        if ui.selectable_label(session.drawing_mode(), "✏ Draw").clicked() {
            session.set_drawing_mode(true);
        }

        if session.drawing_mode() {
            for color in StrokeColor::ALL {
                let selected = session.stroke_color() == color;
                let text = egui::RichText::new(if selected { "⬤" } else { "●" }).color(swatch(color));
                if ui.selectable_label(selected, text).clicked() {
                    session.set_stroke_color(color);
                }
            }
        }

        let has_strokes = !session.strokes().is_empty();
        if ui.add_enabled(has_strokes, egui::Button::new("🗑 Clear")).clicked() {
            session.clear_strokes();
        }

        ui.separator();

        let zoomed = session.viewport().is_zoomed();
        ui.label(format!("Zoom {:.1}x", session.viewport().zoom()));
        if ui.add_enabled(zoomed, egui::Button::new("⟲ Reset")).clicked() {
            session.reset_view();
        }

        if let Some(comparison) = session.comparison() {
            ui.separator();
            ui.label(format!("vs {}", comparison.name));

            let linked = session.transport().is_linked();
            let link_label = if linked { "🔗 Linked" } else { "⛓ Link" };
            if ui
                .selectable_label(linked, link_label)
                .on_hover_text("Play, pause and seek both videos together")
                .clicked()
            {
                session.transport_mut().toggle_link();
            }
            if linked {
                ui.label(
                    egui::RichText::new(format!("offset {:+.3} s", session.transport().sync().offset()))
                        .weak(),
                );
            }
            if ui.button("✖ Close comparison").clicked() {
                action = ToolbarAction::CloseComparison;
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.selectable_label(coach_open, "💬 Coach").clicked() {
                action = ToolbarAction::ToggleCoach;
            }

            let hint = if session.drawing_mode() {
                "Drag to draw a line"
            } else if zoomed {
                "Drag to pan, scroll to zoom"
            } else {
                "Scroll to zoom, click to play/pause"
            };
            ui.label(egui::RichText::new(hint).italics().weak());
        });
    });

    action
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! AI coach chat panel.

use crate::coach::CoachChat;
use crate::models::chat::ChatRole;

/// Display the conversation and the input box. Returns true when the user
/// submitted `input`.
pub fn show(ui: &mut egui::Ui, chat: &CoachChat, input: &mut String) -> bool {
    let mut submitted = false;

    ui.heading("AI coach");
    ui.label(egui::RichText::new("Questions are asked about the frame on screen.").weak());
    ui.separator();

    let input_height = 64.0;
    egui::ScrollArea::vertical()
        .max_height((ui.available_height() - input_height).max(0.0))
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for message in chat.messages() {
                let (fill, align) = match message.role {
                    ChatRole::User => (egui::Color32::from_rgb(30, 64, 175), egui::Align::Max),
                    ChatRole::Coach => (egui::Color32::from_gray(55), egui::Align::Min),
                };
                ui.with_layout(egui::Layout::top_down(align), |ui| {
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::same(8.0))
                        .show(ui, |ui| {
                            ui.set_max_width(ui.available_width() * 0.85);
                            ui.label(egui::RichText::new(&message.text).color(egui::Color32::WHITE));
                            ui.label(
                                egui::RichText::new(message.timestamp.format("%H:%M").to_string())
                                    .small()
                                    .color(egui::Color32::from_gray(170)),
                            );
                        });
                });
                ui.add_space(4.0);
            }

            if chat.is_pending() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Analyzing frame...");
                });
            }
        });

    ui.separator();
    ui.horizontal(|ui| {
        let edit = ui.add(
            egui::TextEdit::singleline(input)
                .hint_text("Ask about this frame...")
                .desired_width(ui.available_width() - 60.0),
        );
        let enter = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let can_send = !input.trim().is_empty();
        if ui.add_enabled(can_send, egui::Button::new("Send")).clicked() || (enter && can_send) {
            submitted = true;
            edit.request_focus();
        }
    });

    submitted
}

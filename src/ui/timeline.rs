// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber and transport controls.
//!
//! The timeline only reports what the user did; the caller applies the
//! actions to the transport so linked pairs move together.

use crate::viewer::playback::{PlaybackState, StepDirection};
use crate::viewer::sync::Target;

/// Number of tick marks drawn along the scrubber.
const TICK_COUNT: usize = 40;

/// Transport request from the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineAction {
    BeginScrub(Target),
    ScrubTo(Target, f64),
    EndScrub(Target),
    Step(Target, StepDirection),
    TogglePlay(Target),
    Restart(Target),
    CycleRate(Target),
}

/// Format a position with millisecond precision.
pub fn format_time(seconds: f64) -> String {
    format!("{:.3} s", seconds.max(0.0))
}

/// Display the scrubber and transport buttons for one video.
pub fn show(ui: &mut egui::Ui, target: Target, state: &PlaybackState) -> Vec<TimelineAction> {
    let mut actions = Vec::new();

    scrubber(ui, target, state, &mut actions);

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        if ui.button("⏮").on_hover_text("Restart").clicked() {
            actions.push(TimelineAction::Restart(target));
        }
        if ui.button("◀|").on_hover_text("Previous frame (←)").clicked() {
            actions.push(TimelineAction::Step(target, StepDirection::Backward));
        }
        let play_label = if state.is_playing { "⏸" } else { "▶" };
        if ui.button(play_label).on_hover_text("Play/Pause (Space)").clicked() {
            actions.push(TimelineAction::TogglePlay(target));
        }
        if ui.button("|▶").on_hover_text("Next frame (→)").clicked() {
            actions.push(TimelineAction::Step(target, StepDirection::Forward));
        }
        if ui
            .button(format!("{}x", state.playback_rate))
            .on_hover_text("Playback speed")
            .clicked()
        {
            actions.push(TimelineAction::CycleRate(target));
        }

        ui.separator();
        ui.monospace(format!(
            "{} / {}",
            format_time(state.current_time),
            format_time(state.duration)
        ));
    });

    actions
}

fn scrubber(ui: &mut egui::Ui, target: Target, state: &PlaybackState, actions: &mut Vec<TimelineAction>) {
    let desired = egui::vec2(ui.available_width(), 28.0);
    let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click_and_drag());
    let painter = ui.painter_at(rect);

    let track = rect.shrink2(egui::vec2(0.0, 10.0));
    painter.rect_filled(track, 4.0, egui::Color32::from_gray(50));

    for i in 0..TICK_COUNT {
        let x = track.left() + track.width() * i as f32 / (TICK_COUNT - 1) as f32;
        let half = if i % 5 == 0 { 8.0 } else { 4.0 };
        painter.line_segment(
            [egui::pos2(x, rect.center().y - half), egui::pos2(x, rect.center().y + half)],
            egui::Stroke::new(1.0, egui::Color32::from_gray(110)),
        );
    }

    let progress = state.progress() as f32;
    let filled = egui::Rect::from_min_max(
        track.min,
        egui::pos2(track.left() + track.width() * progress, track.max.y),
    );
    painter.rect_filled(filled, 4.0, egui::Color32::from_rgb(59, 130, 246));
    painter.circle_filled(
        egui::pos2(filled.right(), rect.center().y),
        7.0,
        egui::Color32::WHITE,
    );

    if !state.is_loaded() {
        return;
    }

    let scrub_time = || {
        response.interact_pointer_pos().map(|pos| {
            let fraction = ((pos.x - track.left()) / track.width()).clamp(0.0, 1.0);
            fraction as f64 * state.duration
        })
    };

    if response.drag_started() || response.clicked() {
        actions.push(TimelineAction::BeginScrub(target));
    }
    if response.dragged() || response.clicked() {
        if let Some(time) = scrub_time() {
            actions.push(TimelineAction::ScrubTo(target, time));
        }
    }
    if response.drag_stopped() || response.clicked() {
        actions.push(TimelineAction::EndScrub(target));
    }
}

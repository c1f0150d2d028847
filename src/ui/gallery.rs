// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video library listing.

use crate::io::storage::VideoLibrary;
use crate::models::project::VideoFile;

/// Result of gallery interaction.
pub enum GalleryAction {
    None,
    AddVideo,
    AddFrameFolder,
    Open(VideoFile),
    Compare(VideoFile),
    Remove(String),
}

/// Display the library. `current` is the id of the video open in the analyzer.
pub fn show(ui: &mut egui::Ui, library: &VideoLibrary, current: Option<&str>) -> GalleryAction {
    let mut action = GalleryAction::None;

    ui.horizontal(|ui| {
        ui.heading("Training videos");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("📁 Add frame folder...").clicked() {
                action = GalleryAction::AddFrameFolder;
            }
            if ui.button("➕ Add video...").clicked() {
                action = GalleryAction::AddVideo;
            }
        });
    });
    ui.separator();

    if library.videos().is_empty() {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new("No videos yet. Add one to start analyzing.")
                    .color(egui::Color32::from_gray(160)),
            );
        });
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for video in library.videos() {
            let is_current = current == Some(video.id.as_str());
            ui.group(|ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(&video.name).strong());
                        ui.label(
                            egui::RichText::new(format!("{}  ·  {}", video.date, video.path.display()))
                                .weak(),
                        );
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑").on_hover_text("Remove from library").clicked() {
                            action = GalleryAction::Remove(video.id.clone());
                        }
                        if current.is_some() && !is_current && ui.button("Compare").clicked() {
                            action = GalleryAction::Compare(video.clone());
                        }
                        let open_label = if is_current { "Resume" } else { "Open" };
                        if ui.button(open_label).clicked() {
                            action = GalleryAction::Open(video.clone());
                        }
                    });
                });
            });
        }
    });

    action
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It switches between the video library and the
//! analyzer, advances playback once per frame and routes panel actions
//! into the open [`ViewerSession`].

use crate::coach::CoachChat;
use crate::config::AppConfig;
use crate::io::capture::capture_frame;
use crate::io::media::{ClockMedia, MediaSource, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::io::serialization::{export_annotations, import_annotations};
use crate::io::storage::VideoLibrary;
use crate::models::project::{AnnotationExport, VideoFile};
use crate::ui::{canvas, coach_panel, gallery, timeline, toolbar};
use crate::viewer::playback::StepDirection;
use crate::viewer::sync::Target;
use crate::viewer::ViewerSession;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Longest wall-clock step applied to playback in one frame.
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Gallery,
    Analyzer,
}

/// Main application state.
pub struct VelocityViewApp {
    config: AppConfig,
    library: VideoLibrary,
    screen: Screen,

    /// Analyzer state for the open video
    session: Option<ViewerSession>,
    primary_texture: canvas::PaneTexture,
    secondary_texture: canvas::PaneTexture,

    chat: CoachChat,
    chat_input: String,
    coach_open: bool,

    /// Wall-clock time of the previous frame, drives playback
    last_tick: Option<Instant>,

    /// Message shown in the status bar
    status: Option<String>,
}

impl VelocityViewApp {
    pub fn new(config: AppConfig, library: VideoLibrary, chat: CoachChat) -> Self {
        Self {
            config,
            library,
            screen: Screen::Gallery,
            session: None,
            primary_texture: canvas::PaneTexture::default(),
            secondary_texture: canvas::PaneTexture::default(),
            chat,
            chat_input: String::new(),
            coach_open: true,
            last_tick: None,
            status: None,
        }
    }

    fn open_media(&self, video: &VideoFile) -> Box<dyn MediaSource> {
        Box::new(ClockMedia::open(video.path.clone(), self.config.viewer.sequence_fps))
    }

    /// Add a file or frame folder to the library.
    fn add_to_library(&mut self, path: PathBuf) {
        let video = VideoFile::from_path(&path);
        match self.library.add(video) {
            Ok(()) => self.status = Some(format!("Added {}", path.display())),
            Err(e) => {
                log::error!("Failed to save library: {:#}", e);
                self.status = Some(format!("Failed to save library: {}", e));
            }
        }
    }

    fn remove_from_library(&mut self, id: &str) {
        if self.session.as_ref().is_some_and(|s| s.video().id == id) {
            self.close_session();
        }
        if let Err(e) = self.library.remove(id) {
            log::error!("Failed to save library: {:#}", e);
            self.status = Some(format!("Failed to save library: {}", e));
        }
    }

    /// Open `video` in a fresh session. Nothing from the previous video survives.
    fn open_video(&mut self, video: VideoFile) {
        let media = self.open_media(&video);
        self.session = Some(ViewerSession::open(video, media, self.config.viewer.stroke_width));
        self.primary_texture.clear();
        self.secondary_texture.clear();
        self.chat.reset();
        self.chat_input.clear();
        self.last_tick = None;
        self.screen = Screen::Analyzer;
    }

    fn compare_with(&mut self, video: VideoFile) {
        let media = self.open_media(&video);
        if let Some(session) = &mut self.session {
            session.set_comparison(video, media);
            self.secondary_texture.clear();
            self.screen = Screen::Analyzer;
        }
    }

    fn close_session(&mut self) {
        self.session = None;
        self.primary_texture.clear();
        self.secondary_texture.clear();
        self.screen = Screen::Gallery;
    }

    /// Export annotations to a file.
    fn export(&mut self, path: PathBuf) {
        let Some(session) = &self.session else {
            return;
        };
        let (width, height) = self.primary_texture.frame_size().unwrap_or((0, 0));
        let data = AnnotationExport::new(
            session.video().path.to_string_lossy().into_owned(),
            width,
            height,
            session.strokes().to_vec(),
        );

        self.status = Some(match export_annotations(&data, &path) {
            Ok(()) => format!("Exported annotations to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export annotations: {:#}", e);
                format!("Failed to export annotations: {}", e)
            }
        });
    }

    /// Load strokes saved by a previous export into the open video.
    fn import(&mut self, path: PathBuf) {
        let Some(session) = &mut self.session else {
            return;
        };

        self.status = Some(match import_annotations(&path) {
            Ok(data) => {
                let count = data.strokes.len();
                session.load_strokes(data.strokes);
                format!("Loaded {} strokes from {}", count, path.display())
            }
            Err(e) => {
                log::error!("Failed to import annotations: {:#}", e);
                format!("Failed to import annotations: {}", e)
            }
        });
    }

    fn ask_coach(&mut self) {
        let prompt = std::mem::take(&mut self.chat_input);
        let Some(session) = &mut self.session else {
            return;
        };

        let quality = self.config.coach.jpeg_quality;
        let media = session.transport_mut().primary_mut().media_mut();
        match capture_frame(media, quality) {
            Ok(jpeg) => {
                self.chat.ask(&prompt, jpeg);
            }
            Err(e) => self.chat.report_failure(&prompt, &e.to_string()),
        }
    }

    fn apply_timeline(&mut self, actions: Vec<timeline::TimelineAction>) {
        let Some(session) = &mut self.session else {
            return;
        };
        let transport = session.transport_mut();

        for action in actions {
            match action {
                timeline::TimelineAction::BeginScrub(target) => transport.begin_scrub(target),
                timeline::TimelineAction::ScrubTo(target, time) => transport.scrub_to(target, time),
                timeline::TimelineAction::EndScrub(target) => transport.end_scrub(target),
                timeline::TimelineAction::Step(target, direction) => transport.step(target, direction),
                timeline::TimelineAction::TogglePlay(target) => transport.toggle_play_pause(target),
                timeline::TimelineAction::Restart(target) => transport.restart(target),
                timeline::TimelineAction::CycleRate(target) => {
                    let rate = transport.cycle_playback_rate(target);
                    log::info!("Playback rate {}x", rate);
                }
            }
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Ignore shortcuts while a text field has focus
        if ctx.wants_keyboard_input() {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };

        let (left, right, space, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::Escape),
            )
        });

        let transport = session.transport_mut();
        if left {
            transport.step(Target::Primary, StepDirection::Backward);
        }
        if right {
            transport.step(Target::Primary, StepDirection::Forward);
        }
        if space {
            transport.toggle_play_pause(Target::Primary);
        }
        if escape {
            session.pointer_leave();
            session.set_drawing_mode(false);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Add Video...").clicked() {
                        if let Some(path) = pick_video() {
                            self.add_to_library(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Add Frame Folder...").clicked() {
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.add_to_library(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.add_enabled_ui(self.session.is_some(), |ui| {
                        if ui.button("Load Annotations...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("Annotations", &["yaml", "yml", "json"])
                                .pick_file()
                            {
                                self.import(path);
                            }
                            ui.close_menu();
                        }
                        ui.menu_button("Export Annotations", |ui| {
                            if ui.button("Export as YAML...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("YAML", &["yaml", "yml"])
                                    .set_file_name("annotations.yaml")
                                    .save_file()
                                {
                                    self.export(path);
                                }
                                ui.close_menu();
                            }
                            if ui.button("Export as JSON...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("JSON", &["json"])
                                    .set_file_name("annotations.json")
                                    .save_file()
                                {
                                    self.export(path);
                                }
                                ui.close_menu();
                            }
                        });
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Library").clicked() {
                        self.screen = Screen::Gallery;
                        ui.close_menu();
                    }
                    let has_session = self.session.is_some();
                    if ui.add_enabled(has_session, egui::Button::new("Analyzer")).clicked() {
                        self.screen = Screen::Analyzer;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(has_session, egui::Button::new("Reset Zoom")).clicked() {
                        if let Some(session) = &mut self.session {
                            session.reset_view();
                        }
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn gallery_screen(&mut self, ctx: &egui::Context) {
        let current = self.session.as_ref().map(|s| s.video().id.clone());
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| gallery::show(ui, &self.library, current.as_deref()))
            .inner;

        match action {
            gallery::GalleryAction::AddVideo => {
                if let Some(path) = pick_video() {
                    self.add_to_library(path);
                }
            }
            gallery::GalleryAction::AddFrameFolder => {
                if let Some(path) = rfd::FileDialog::new().pick_folder() {
                    self.add_to_library(path);
                }
            }
            gallery::GalleryAction::Open(video) => {
                if current.as_deref() == Some(video.id.as_str()) {
                    self.screen = Screen::Analyzer;
                } else {
                    self.open_video(video);
                }
            }
            gallery::GalleryAction::Compare(video) => self.compare_with(video),
            gallery::GalleryAction::Remove(id) => self.remove_from_library(&id),
            gallery::GalleryAction::None => {}
        }
    }

    fn analyzer_screen(&mut self, ctx: &egui::Context) {
        let Some(session) = &mut self.session else {
            self.screen = Screen::Gallery;
            return;
        };

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, session, self.coach_open))
            .inner;

        let mut timeline_actions = Vec::new();
        egui::TopBottomPanel::bottom("timeline").show(ctx, |ui| {
            ui.add_space(4.0);
            let primary = *session.transport().primary().state();
            timeline_actions.extend(timeline::show(ui, Target::Primary, &primary));
            if let Some(secondary) = session.transport().secondary() {
                let secondary = *secondary.state();
                if !session.transport().is_linked() {
                    ui.separator();
                    ui.label(egui::RichText::new("Comparison").weak());
                    timeline_actions.extend(timeline::show(ui, Target::Secondary, &secondary));
                }
            }
            if let Some(status) = &self.status {
                ui.label(egui::RichText::new(status).weak());
            }
        });

        let mut send = false;
        if self.coach_open {
            egui::SidePanel::right("coach")
                .default_width(320.0)
                .show(ctx, |ui| {
                    send = coach_panel::show(ui, &self.chat, &mut self.chat_input);
                });
        }

        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if session.transport().has_secondary() {
                    let mut action = canvas::CanvasAction::None;
                    ui.columns(2, |columns| {
                        action = canvas::show_primary(
                            &mut columns[0],
                            session,
                            &self.primary_texture,
                            self.config.viewer.wheel_zoom_sensitivity,
                        );
                        if let Some(secondary) = session.transport().secondary() {
                            canvas::show_secondary(&mut columns[1], secondary, &self.secondary_texture);
                        }
                    });
                    action
                } else {
                    canvas::show_primary(
                        ui,
                        session,
                        &self.primary_texture,
                        self.config.viewer.wheel_zoom_sensitivity,
                    )
                }
            })
            .inner;

        if let canvas::CanvasAction::TogglePlay = canvas_action {
            session.transport_mut().toggle_play_pause(Target::Primary);
        }

        match toolbar_action {
            toolbar::ToolbarAction::BackToGallery => self.screen = Screen::Gallery,
            toolbar::ToolbarAction::CloseComparison => {
                session.clear_comparison();
                self.secondary_texture.clear();
            }
            toolbar::ToolbarAction::ToggleCoach => self.coach_open = !self.coach_open,
            toolbar::ToolbarAction::None => {}
        }

        self.apply_timeline(timeline_actions);
        if send {
            self.ask_coach();
        }
    }

    /// Advance playback by the wall-clock time since the previous frame and
    /// upload the frames now on screen.
    fn tick(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        // Idle frames are not repainted, so cap the gap a resumed video can jump
        let elapsed = self
            .last_tick
            .map(|t| (now - t).min(MAX_FRAME_STEP))
            .unwrap_or_default();
        self.last_tick = Some(now);

        let Some(session) = &mut self.session else {
            return;
        };
        session.tick(elapsed);

        let transport = session.transport_mut();
        self.primary_texture
            .refresh(ctx, "primary_frame", transport.primary_mut());
        if let Some(secondary) = transport.secondary_mut() {
            self.secondary_texture.refresh(ctx, "secondary_frame", secondary);
        }

        let loading = !transport.primary().state().is_loaded()
            && transport.primary().media().error().is_none();
        if transport.is_playing(Target::Primary) || transport.is_playing(Target::Secondary) || loading {
            ctx.request_repaint();
        }
    }
}

/// Open a native picker for a video or still image.
fn pick_video() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Videos", VIDEO_EXTENSIONS)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

impl eframe::App for VelocityViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick(ctx);

        if self.chat.poll() > 0 {
            ctx.request_repaint();
        }
        if self.chat.is_pending() {
            // Poll again shortly for the reply
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.menu_bar(ctx);

        match self.screen {
            Screen::Gallery => self.gallery_screen(ctx),
            Screen::Analyzer => {
                self.handle_keyboard(ctx);
                self.analyzer_screen(ctx);
            }
        }
    }
}

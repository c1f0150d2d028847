// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! VelocityView - training video analyzer
//!
//! A cross-platform desktop application for reviewing training videos
//! frame by frame: zoom into the movement, draw lines over the frame,
//! compare two attempts side by side and ask an AI coach about a frame.

mod app;
mod coach;
mod config;
mod io;
mod models;
mod ui;
mod util;
mod viewer;

use anyhow::Result;
use app::VelocityViewApp;
use coach::CoachChat;
use config::AppConfig;
use io::storage::{open_store, VideoLibrary};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let library = VideoLibrary::load(open_store(&config.storage)?);
    let chat = CoachChat::from_config(&config.coach);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("VelocityView"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "VelocityView",
        options,
        Box::new(move |_cc| Ok(Box::new(VelocityViewApp::new(config, library, chat)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}

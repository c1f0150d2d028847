// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the VelocityView application.

pub mod canvas;
pub mod coach_panel;
pub mod gallery;
pub mod timeline;
pub mod toolbar;

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model shared by the viewer, storage and UI.

pub mod annotation;
pub mod chat;
pub mod project;

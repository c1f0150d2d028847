// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video library entries and annotation export documents.

use super::annotation::Stroke;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A training video registered in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    /// Date the video was added, `YYYY-MM-DD`.
    pub date: String,
}

impl VideoFile {
    /// Register a file or frame directory under a fresh id, named after the path.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .or_else(|| path.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            path: path.to_path_buf(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Exported annotations for a single video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationExport {
    pub media_file: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub strokes: Vec<Stroke>,
}

impl AnnotationExport {
    /// Create an export document for the given media file and frame size.
    pub fn new(media_file: String, frame_width: u32, frame_height: u32, strokes: Vec<Stroke>) -> Self {
        Self {
            media_file,
            frame_width,
            frame_height,
            strokes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_file_named_after_stem() {
        let video = VideoFile::from_path(Path::new("/videos/javelin_final.mp4"));
        assert_eq!(video.name, "javelin_final");
        assert_eq!(video.date.len(), 10);
        assert!(!video.id.is_empty());
    }

    #[test]
    fn test_video_ids_are_unique() {
        let a = VideoFile::from_path(Path::new("a.mp4"));
        let b = VideoFile::from_path(Path::new("a.mp4"));
        assert_ne!(a.id, b.id);
    }
}

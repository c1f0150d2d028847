// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation export and import.
//!
//! Strokes are written in content coordinates, so an export lines up with
//! the source frames regardless of the zoom it was drawn at.

use crate::models::project::AnnotationExport;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Export annotations to YAML format.
pub fn export_yaml(data: &AnnotationExport, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Export annotations to JSON format.
pub fn export_json(data: &AnnotationExport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Export in the format named by the file extension.
pub fn export_annotations(data: &AnnotationExport, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "yaml" | "yml" => export_yaml(data, path)?,
        "json" => export_json(data, path)?,
        other => bail!("Unsupported export format: '{}'", other),
    }

    log::info!(
        "Exported {} strokes to {}",
        data.strokes.len(),
        path.display()
    );
    Ok(())
}

/// Import a file written by [`export_annotations`].
pub fn import_annotations(path: &Path) -> Result<AnnotationExport> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let data = match extension.as_str() {
        "yaml" | "yml" => import_yaml(path),
        "json" => import_json(path),
        other => bail!("Unsupported annotation format: '{}'", other),
    }
    .with_context(|| format!("Failed to import {}", path.display()))?;

    log::info!("Imported {} strokes from {}", data.strokes.len(), path.display());
    Ok(data)
}

/// Import annotations from YAML format.
pub fn import_yaml(path: &Path) -> Result<AnnotationExport> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import annotations from JSON format.
pub fn import_json(path: &Path) -> Result<AnnotationExport> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Point, Stroke, StrokeColor};

    fn sample() -> AnnotationExport {
        AnnotationExport::new(
            "sprint.mp4".to_string(),
            1920,
            1080,
            vec![
                Stroke::new(Point::new(100.0, 100.0), Point::new(150.0, 160.0), StrokeColor::Red),
                Stroke::new(Point::new(0.5, 20.0), Point::new(300.0, 20.0), StrokeColor::Cyan),
            ],
        )
    }

    #[test]
    fn test_export_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("strokes.yml");
        export_annotations(&sample(), &yaml_path).unwrap();
        assert_eq!(import_yaml(&yaml_path).unwrap(), sample());

        let json_path = dir.path().join("strokes.JSON");
        export_annotations(&sample(), &json_path).unwrap();
        assert_eq!(import_json(&json_path).unwrap(), sample());
        assert_eq!(import_annotations(&json_path).unwrap(), sample());
    }

    #[test]
    fn test_yaml_uses_lowercase_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strokes.yaml");
        export_yaml(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("media_file: sprint.mp4"));
        assert!(text.contains("color: cyan"));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strokes.txt");
        assert!(export_annotations(&sample(), &path).is_err());
        assert!(!path.exists());
        assert!(import_annotations(&path).is_err());
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Key/value record storage and the video library built on it.

use crate::config::{StorageBackend, StorageConfig};
use crate::models::project::VideoFile;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key holding the serialized video library.
pub const VIDEOS_KEY: &str = "velocityview_videos";

/// String records addressed by key.
pub trait RecordStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Records held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a data directory.
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl RecordStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        std::fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

/// Build the configured backend.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn RecordStore>> {
    match config.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory storage");
            Ok(Box::new(MemoryStore::new()))
        }
        StorageBackend::Local => {
            log::info!("Using local storage in {}", config.data_dir.display());
            Ok(Box::new(LocalStore::open(&config.data_dir)?))
        }
    }
}

/// Videos registered by the user, newest first.
pub struct VideoLibrary {
    store: Box<dyn RecordStore>,
    videos: Vec<VideoFile>,
}

impl VideoLibrary {
    /// Read the library from `store`. A corrupt record starts an empty library.
    pub fn load(store: Box<dyn RecordStore>) -> Self {
        let videos = match store.get(VIDEOS_KEY) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable video library: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        log::info!("Loaded {} videos", videos.len());
        Self { store, videos }
    }

    pub fn videos(&self) -> &[VideoFile] {
        &self.videos
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&VideoFile> {
        self.videos.iter().find(|v| v.id == id)
    }

    pub fn add(&mut self, video: VideoFile) -> Result<()> {
        log::info!("Added '{}' to library", video.name);
        self.videos.insert(0, video);
        self.save()
    }

    /// Returns whether a video was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.videos.len();
        self.videos.retain(|v| v.id != id);
        if self.videos.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.videos)?;
        self.store.set(VIDEOS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("velocityview_a").is_none());
        store.set("velocityview_a", "1").unwrap();
        assert_eq!(store.get("velocityview_a").as_deref(), Some("1"));
        store.remove("velocityview_a").unwrap();
        assert!(store.get("velocityview_a").is_none());
    }

    #[test]
    fn test_local_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        store.set("velocityview_../escape", "{}").unwrap();

        assert!(dir.path().join("velocityview____escape.json").exists());
        assert_eq!(store.get("velocityview_../escape").as_deref(), Some("{}"));

        store.remove("velocityview_../escape").unwrap();
        store.remove("velocityview_../escape").unwrap();
        assert!(store.get("velocityview_../escape").is_none());
    }

    #[test]
    fn test_library_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let first = VideoFile::from_path(Path::new("run_up.mp4"));
        let second = VideoFile::from_path(Path::new("release.mp4"));

        let mut library = VideoLibrary::load(Box::new(LocalStore::open(dir.path()).unwrap()));
        library.add(first.clone()).unwrap();
        library.add(second.clone()).unwrap();

        let mut reloaded = VideoLibrary::load(Box::new(LocalStore::open(dir.path()).unwrap()));
        assert_eq!(reloaded.videos(), &[second.clone(), first.clone()]);
        assert_eq!(reloaded.get(&first.id), Some(&first));

        assert!(reloaded.remove(&second.id).unwrap());
        assert!(!reloaded.remove(&second.id).unwrap());
        let again = VideoLibrary::load(Box::new(LocalStore::open(dir.path()).unwrap()));
        assert_eq!(again.videos(), &[first]);
    }

    #[test]
    fn test_corrupt_library_starts_empty() {
        let mut store = MemoryStore::new();
        store.set(VIDEOS_KEY, "not json").unwrap();
        let library = VideoLibrary::load(Box::new(store));
        assert!(library.videos().is_empty());
    }

    #[test]
    fn test_open_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            data_dir: dir.path().join("data"),
        };
        let mut store = open_store(&config).unwrap();
        store.set(VIDEOS_KEY, "[]").unwrap();
        assert!(dir.path().join("data").join("velocityview_videos.json").exists());
    }
}

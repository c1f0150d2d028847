// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (images and videos).
//!
//! This module handles loading image sequences and video files, extracting
//! frames, and exposing them through the [`MediaSource`] contract the
//! playback controller drives: a readable/writable clock, a duration that
//! stays unknown until metadata arrives, and time-advance notifications.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Duration;

/// Notifications a media source raises while it loads and plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// The playback position advanced on its own.
    TimeUpdate(f64),
    /// Duration became known.
    LoadedMetadata { duration: f64 },
    /// Playback reached the end and stopped.
    Ended,
}

/// A decoded RGBA frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A playable media element.
pub trait MediaSource {
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;
    fn paused(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&mut self, rate: f64);
    /// Drain notifications raised since the last call.
    fn poll_events(&mut self) -> Vec<MediaEvent>;

    /// Let wall-clock time pass. Sources with their own clock ignore this.
    fn advance(&mut self, _elapsed: Duration) {}

    /// Frame at the current position, if one is decoded.
    fn current_frame(&mut self) -> Option<&VideoFrame> {
        None
    }

    /// Loading failure, if any.
    fn error(&self) -> Option<&str> {
        None
    }
}

/// Random access to decoded frames.
pub trait FrameProvider: Send {
    fn duration(&self) -> f64;
    fn frame_at(&mut self, seconds: f64) -> Result<&VideoFrame>;
}

/// Image file extensions accepted as frames.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Container extensions decoded through OpenCV.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm"];

/// Load a single image file as an RGBA frame.
pub fn load_image(path: &Path) -> Result<VideoFrame> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    Ok(VideoFrame {
        width,
        height,
        pixels: img.into_raw(),
    })
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Frames held in memory and played back at a fixed rate.
#[derive(Debug)]
pub struct ImageSequence {
    frames: Vec<VideoFrame>,
    fps: f64,
}

impl ImageSequence {
    pub fn new(frames: Vec<VideoFrame>, fps: f64) -> Result<Self> {
        if frames.is_empty() {
            bail!("Image sequence contains no frames");
        }
        if !(fps > 0.0) {
            bail!("Invalid frame rate {}", fps);
        }
        Ok(Self { frames, fps })
    }

    /// Load a single still image or every image in a directory (sorted by name).
    pub fn open(path: &Path, fps: f64) -> Result<Self> {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read frame directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_extension(p, IMAGE_EXTENSIONS))
                .collect();
            files.sort();

            let frames = files
                .iter()
                .map(|p| load_image(p))
                .collect::<Result<Vec<_>>>()?;
            log::info!("Loaded {} frames from {}", frames.len(), path.display());
            Self::new(frames, fps)
        } else {
            Self::new(vec![load_image(path)?], fps)
        }
    }

    pub fn index_at(&self, seconds: f64) -> usize {
        frame_index(seconds, self.fps).min(self.frames.len() - 1)
    }
}

/// Positions within this many frames below a frame boundary count as that frame.
const FRAME_TOLERANCE: f64 = 1e-6;

/// Frame shown at `seconds`. A position a rounding error below a frame
/// boundary maps to the frame that starts there.
fn frame_index(seconds: f64, fps: f64) -> usize {
    (seconds.max(0.0) * fps + FRAME_TOLERANCE).floor() as usize
}

impl FrameProvider for ImageSequence {
    fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }

    fn frame_at(&mut self, seconds: f64) -> Result<&VideoFrame> {
        let index = self.index_at(seconds);
        Ok(&self.frames[index])
    }
}

#[cfg(feature = "video-opencv")]
mod opencv_video {
    use super::{frame_index, FrameProvider, VideoFrame};
    use anyhow::{bail, Context, Result};
    use opencv::{core::Mat, imgproc, prelude::*, videoio};
    use std::path::Path;

    /// Container video decoded on demand through OpenCV.
    pub struct OpenCvVideo {
        capture: videoio::VideoCapture,
        fps: f64,
        frame_count: f64,
        cached: Option<(i64, VideoFrame)>,
    }

    impl OpenCvVideo {
        pub fn open(path: &Path) -> Result<Self> {
            let path_str = path.to_str().context("Video path is not valid UTF-8")?;
            let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)?;
            if !capture.is_opened()? {
                bail!("OpenCV could not open {}", path.display());
            }

            let fps = capture.get(videoio::CAP_PROP_FPS)?;
            let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
            if fps <= 0.0 || frame_count <= 0.0 {
                bail!("Video {} reports no frames", path.display());
            }

            log::info!("Opened video {} ({} frames @ {:.2} fps)", path.display(), frame_count, fps);
            Ok(Self {
                capture,
                fps,
                frame_count,
                cached: None,
            })
        }
    }

    impl FrameProvider for OpenCvVideo {
        fn duration(&self) -> f64 {
            self.frame_count / self.fps
        }

        fn frame_at(&mut self, seconds: f64) -> Result<&VideoFrame> {
            let last = self.frame_count as i64 - 1;
            let index = (frame_index(seconds, self.fps) as i64).min(last);

            let stale = self.cached.as_ref().map(|(i, _)| *i != index).unwrap_or(true);
            if stale {
                self.capture.set(videoio::CAP_PROP_POS_FRAMES, index as f64)?;
                let mut bgr = Mat::default();
                if !self.capture.read(&mut bgr)? {
                    bail!("Failed to decode frame {}", index);
                }
                let mut rgba = Mat::default();
                imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;

                let frame = VideoFrame {
                    width: rgba.cols() as u32,
                    height: rgba.rows() as u32,
                    pixels: rgba.data_bytes()?.to_vec(),
                };
                self.cached = Some((index, frame));
            }

            self.cached
                .as_ref()
                .map(|(_, frame)| frame)
                .context("Frame cache is empty")
        }
    }
}

/// Open any supported media path as a frame provider.
pub fn open_frames(path: &Path, sequence_fps: f64) -> Result<Box<dyn FrameProvider>> {
    if path.is_file() && has_extension(path, VIDEO_EXTENSIONS) {
        #[cfg(feature = "video-opencv")]
        {
            return Ok(Box::new(opencv_video::OpenCvVideo::open(path)?));
        }
        #[cfg(not(feature = "video-opencv"))]
        bail!(
            "Video files require the `video-opencv` feature; use a directory of frames for {}",
            path.display()
        );
    }

    Ok(Box::new(ImageSequence::open(path, sequence_fps)?))
}

/// A media element whose clock is advanced by the UI loop.
///
/// Frames are decoded on a background thread; until they arrive the
/// duration is unknown and the element behaves like an unloaded video.
pub struct ClockMedia {
    provider: Option<Box<dyn FrameProvider>>,
    loader: Option<Receiver<Result<Box<dyn FrameProvider>, String>>>,
    error: Option<String>,
    position: f64,
    rate: f64,
    paused: bool,
    events: Vec<MediaEvent>,
}

impl ClockMedia {
    /// Start loading `path` in the background.
    pub fn open(path: PathBuf, sequence_fps: f64) -> Self {
        let (sender, receiver) = channel();

        std::thread::spawn(move || {
            let result = open_frames(&path, sequence_fps).map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });

        let mut media = Self::empty();
        media.loader = Some(receiver);
        media
    }

    /// Media backed by an already loaded provider.
    #[cfg(test)]
    pub fn with_provider(provider: Box<dyn FrameProvider>) -> Self {
        let mut media = Self::empty();
        media.attach(provider);
        media
    }

    fn empty() -> Self {
        Self {
            provider: None,
            loader: None,
            error: None,
            position: 0.0,
            rate: 1.0,
            paused: true,
            events: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    fn attach(&mut self, provider: Box<dyn FrameProvider>) {
        let duration = provider.duration();
        self.position = self.position.clamp(0.0, duration);
        self.provider = Some(provider);
        self.events.push(MediaEvent::LoadedMetadata { duration });
    }

    fn check_loader(&mut self) {
        let Some(receiver) = &self.loader else {
            return;
        };

        match receiver.try_recv() {
            Ok(Ok(provider)) => {
                self.loader = None;
                self.attach(provider);
            }
            Ok(Err(message)) => {
                self.loader = None;
                log::error!("Failed to load media: {}", message);
                self.error = Some(message);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.loader = None;
                self.error = Some("Media loader stopped unexpectedly".to_string());
            }
        }
    }
}

impl MediaSource for ClockMedia {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, seconds: f64) {
        let upper = self.duration().unwrap_or(0.0);
        self.position = seconds.clamp(0.0, upper);
    }

    fn duration(&self) -> Option<f64> {
        self.provider.as_ref().map(|p| p.duration())
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn play(&mut self) {
        if let Some(duration) = self.duration() {
            if self.position >= duration {
                self.position = 0.0;
            }
        }
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if rate > 0.0 && rate.is_finite() {
            self.rate = rate;
        }
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.check_loader();
        std::mem::take(&mut self.events)
    }

    fn advance(&mut self, elapsed: Duration) {
        self.check_loader();
        let Some(duration) = self.duration() else {
            return;
        };
        if self.paused {
            return;
        }

        self.position += elapsed.as_secs_f64() * self.rate;
        if self.position >= duration {
            self.position = duration;
            self.paused = true;
            self.events.push(MediaEvent::TimeUpdate(duration));
            self.events.push(MediaEvent::Ended);
        } else {
            self.events.push(MediaEvent::TimeUpdate(self.position));
        }
    }

    fn current_frame(&mut self) -> Option<&VideoFrame> {
        let position = self.position;
        match self.provider.as_mut()?.frame_at(position) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("Failed to decode frame at {:.3}s: {:#}", position, e);
                None
            }
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Scripted media source for controller and sync tests.
#[cfg(test)]
pub mod testing {
    use super::{MediaEvent, MediaSource, VideoFrame};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub struct FakeMedia {
        pub time: f64,
        pub duration: Option<f64>,
        pub paused: bool,
        pub rate: f64,
        pub events: Vec<MediaEvent>,
        pending_duration: Option<f64>,
        frame: Option<VideoFrame>,
    }

    impl FakeMedia {
        pub fn loaded(duration: f64, time: f64) -> Self {
            Self {
                time,
                duration: Some(duration),
                paused: true,
                rate: 1.0,
                events: Vec::new(),
                pending_duration: None,
                frame: None,
            }
        }

        /// Unloaded media whose metadata arrives on the first poll.
        pub fn loading(duration: f64) -> Self {
            Self {
                duration: None,
                pending_duration: Some(duration),
                ..Self::loaded(0.0, 0.0)
            }
        }

        pub fn with_frame(mut self, frame: VideoFrame) -> Self {
            self.frame = Some(frame);
            self
        }

        pub fn boxed(self) -> Box<dyn MediaSource> {
            Box::new(self)
        }
    }

    impl MediaSource for FakeMedia {
        fn current_time(&self) -> f64 {
            self.time
        }

        fn set_current_time(&mut self, seconds: f64) {
            self.time = seconds.clamp(0.0, self.duration.unwrap_or(0.0));
        }

        fn duration(&self) -> Option<f64> {
            self.duration
        }

        fn paused(&self) -> bool {
            self.paused
        }

        fn play(&mut self) {
            self.paused = false;
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn playback_rate(&self) -> f64 {
            self.rate
        }

        fn set_playback_rate(&mut self, rate: f64) {
            self.rate = rate;
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            if let Some(duration) = self.pending_duration.take() {
                self.duration = Some(duration);
                self.events.push(MediaEvent::LoadedMetadata { duration });
            }
            std::mem::take(&mut self.events)
        }

        fn advance(&mut self, elapsed: Duration) {
            let Some(duration) = self.duration else {
                return;
            };
            if self.paused {
                return;
            }
            self.time += elapsed.as_secs_f64() * self.rate;
            if self.time >= duration {
                self.time = duration;
                self.paused = true;
                self.events.push(MediaEvent::TimeUpdate(duration));
                self.events.push(MediaEvent::Ended);
            } else {
                self.events.push(MediaEvent::TimeUpdate(self.time));
            }
        }

        fn current_frame(&mut self) -> Option<&VideoFrame> {
            self.frame.as_ref()
        }
    }
}

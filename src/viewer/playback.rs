// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Transport state for a single media source.
//!
//! [`PlaybackController`] mirrors the media element's clock into a
//! [`PlaybackState`] and owns the difference between a user scrub (the
//! position belongs to the user, media time updates are ignored) and
//! passive playback (the position follows the media).

use crate::io::media::{MediaEvent, MediaSource, VideoFrame};
use std::time::Duration;

/// Fixed frame step used for frame-by-frame review.
pub const FRAME_DURATION: f64 = 1.0 / 30.0;

/// Playback rates cycled through by the speed button.
pub const PLAYBACK_RATES: [f64; 4] = [1.0, 0.5, 0.25, 0.1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

impl StepDirection {
    fn sign(self) -> f64 {
        match self {
            StepDirection::Forward => 1.0,
            StepDirection::Backward => -1.0,
        }
    }
}

/// Rate following `current` in [`PLAYBACK_RATES`]; unknown rates restart the cycle.
pub fn next_playback_rate(current: f64) -> f64 {
    let next = PLAYBACK_RATES
        .iter()
        .position(|r| (r - current).abs() < 1e-9)
        .map(|i| (i + 1) % PLAYBACK_RATES.len())
        .unwrap_or(0);
    PLAYBACK_RATES[next]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
}

impl PlaybackState {
    pub fn is_loaded(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Position as a fraction of the duration, 0 when unloaded.
    pub fn progress(&self) -> f64 {
        if self.is_loaded() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub struct PlaybackController {
    media: Box<dyn MediaSource>,
    state: PlaybackState,
    scrubbing: bool,
}

impl PlaybackController {
    pub fn new(media: Box<dyn MediaSource>) -> Self {
        let state = PlaybackState {
            current_time: media.current_time(),
            duration: media.duration().unwrap_or(0.0),
            is_playing: !media.paused(),
            playback_rate: media.playback_rate(),
        };

        Self {
            media,
            state,
            scrubbing: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn media(&self) -> &dyn MediaSource {
        self.media.as_ref()
    }

    pub fn media_mut(&mut self) -> &mut dyn MediaSource {
        self.media.as_mut()
    }

    pub fn current_frame(&mut self) -> Option<&VideoFrame> {
        self.media.current_frame()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Move to `seconds`, clamped to the media. No-op before metadata has loaded.
    pub fn seek(&mut self, seconds: f64) {
        if !self.state.is_loaded() || !seconds.is_finite() {
            return;
        }

        let target = seconds.clamp(0.0, self.state.duration);
        self.media.set_current_time(target);
        self.state.current_time = target;
    }

    pub fn begin_scrub(&mut self) {
        self.scrubbing = true;
    }

    /// Seek on behalf of a dragging user. Safe to call every frame.
    pub fn scrub_to(&mut self, seconds: f64) {
        self.scrubbing = true;
        self.seek(seconds);
    }

    pub fn end_scrub(&mut self) {
        self.scrubbing = false;
    }

    /// Pause, then move exactly one frame.
    pub fn step(&mut self, direction: StepDirection) {
        if !self.state.is_loaded() {
            return;
        }

        if self.state.is_playing {
            self.pause();
        }
        self.seek(self.state.current_time + direction.sign() * FRAME_DURATION);
    }

    pub fn play(&mut self) {
        self.media.play();
        self.state.is_playing = true;
        if !self.scrubbing {
            self.state.current_time = self.media.current_time();
        }
    }

    /// Stop and adopt the position the media actually stopped at.
    pub fn pause(&mut self) {
        self.media.pause();
        self.state.is_playing = false;
        if !self.scrubbing && self.state.is_loaded() {
            self.state.current_time = self.media.current_time().clamp(0.0, self.state.duration);
        }
    }

    /// Returns whether the media is now playing.
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
        self.state.is_playing
    }

    /// Seek to the start and play.
    pub fn restart(&mut self) {
        self.seek(0.0);
        self.play();
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.media.set_playback_rate(rate);
        self.state.playback_rate = rate;
    }

    /// Advance to the next rate in [`PLAYBACK_RATES`] and return it.
    pub fn cycle_playback_rate(&mut self) -> f64 {
        let rate = next_playback_rate(self.state.playback_rate);
        self.set_playback_rate(rate);
        rate
    }

    /// Let wall-clock time pass and absorb the resulting notifications.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<MediaEvent> {
        self.media.advance(elapsed);
        self.poll_media()
    }

    pub fn poll_media(&mut self) -> Vec<MediaEvent> {
        let events = self.media.poll_events();
        for event in &events {
            self.handle_event(*event);
        }
        events
    }

    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate(seconds) => {
                if !self.scrubbing {
                    self.state.current_time = seconds.clamp(0.0, self.state.duration.max(0.0));
                }
            }
            MediaEvent::LoadedMetadata { duration } => {
                log::debug!("Media metadata loaded, duration {:.3}s", duration);
                self.state.duration = duration;
                self.state.current_time = self.state.current_time.clamp(0.0, duration.max(0.0));
                // Rate chosen before metadata arrived still applies.
                self.media.set_playback_rate(self.state.playback_rate);
            }
            MediaEvent::Ended => {
                self.state.is_playing = false;
                if !self.scrubbing {
                    self.state.current_time = self.state.duration;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::FakeMedia;

    fn controller(duration: f64, at: f64) -> PlaybackController {
        PlaybackController::new(FakeMedia::loaded(duration, at).boxed())
    }

    #[test]
    fn test_seek_clamps_and_mirrors() {
        let mut c = controller(30.0, 0.0);
        c.seek(12.5);
        assert_eq!(c.state().current_time, 12.5);
        assert_eq!(c.media().current_time(), 12.5);

        c.seek(99.0);
        assert_eq!(c.state().current_time, 30.0);
        c.seek(-4.0);
        assert_eq!(c.state().current_time, 0.0);
    }

    #[test]
    fn test_step_forward_is_one_frame_and_pauses() {
        let mut c = controller(30.0, 10.0);
        c.play();
        assert!(c.state().is_playing);

        c.step(StepDirection::Forward);
        assert!(!c.state().is_playing);
        assert!(c.media().paused());
        assert!((c.state().current_time - (10.0 + 1.0 / 30.0)).abs() < 1e-12);

        c.step(StepDirection::Backward);
        assert!((c.state().current_time - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_clamps_at_bounds() {
        let mut c = controller(1.0, 1.0);
        c.step(StepDirection::Forward);
        assert_eq!(c.state().current_time, 1.0);

        c.seek(0.0);
        c.step(StepDirection::Backward);
        assert_eq!(c.state().current_time, 0.0);
    }

    #[test]
    fn test_unloaded_media_ignores_seek_and_step() {
        let mut c = PlaybackController::new(FakeMedia::loading(20.0).boxed());
        c.seek(5.0);
        c.step(StepDirection::Forward);
        assert_eq!(c.state().current_time, 0.0);
        assert_eq!(c.media().current_time(), 0.0);

        let events = c.poll_media();
        assert_eq!(events, vec![MediaEvent::LoadedMetadata { duration: 20.0 }]);
        assert_eq!(c.state().duration, 20.0);

        c.seek(5.0);
        assert_eq!(c.state().current_time, 5.0);
    }

    #[test]
    fn test_rate_chosen_before_metadata_survives_load() {
        let mut c = PlaybackController::new(FakeMedia::loading(20.0).boxed());
        c.cycle_playback_rate();
        c.poll_media();
        assert_eq!(c.media().playback_rate(), 0.5);
    }

    #[test]
    fn test_time_updates_ignored_while_scrubbing() {
        let mut c = controller(30.0, 0.0);
        c.play();
        c.tick(Duration::from_secs(2));
        assert!((c.state().current_time - 2.0).abs() < 1e-9);

        c.begin_scrub();
        c.scrub_to(20.0);
        c.tick(Duration::from_millis(500));
        assert_eq!(c.state().current_time, 20.0);
        c.scrub_to(21.0);
        assert_eq!(c.state().current_time, 21.0);

        c.end_scrub();
        c.tick(Duration::from_millis(500));
        assert!((c.state().current_time - 21.5).abs() < 1e-9);
    }

    #[test]
    fn test_play_keeps_rate() {
        let mut c = controller(30.0, 0.0);
        c.cycle_playback_rate();
        c.cycle_playback_rate();
        assert_eq!(c.state().playback_rate, 0.25);

        assert!(c.toggle_play_pause());
        assert_eq!(c.state().playback_rate, 0.25);
        assert_eq!(c.media().playback_rate(), 0.25);
        assert!(!c.toggle_play_pause());
    }

    #[test]
    fn test_rate_cycle_wraps_after_four() {
        let mut c = controller(30.0, 0.0);
        let seen: Vec<f64> = (0..4).map(|_| c.cycle_playback_rate()).collect();
        assert_eq!(seen, vec![0.5, 0.25, 0.1, 1.0]);
        assert_eq!(c.state().playback_rate, 1.0);
    }

    #[test]
    fn test_unknown_rate_restarts_cycle() {
        assert_eq!(next_playback_rate(2.0), 1.0);
        assert_eq!(next_playback_rate(0.1), 1.0);
    }

    #[test]
    fn test_ended_clears_playing() {
        let mut c = controller(1.0, 0.5);
        c.play();
        let events = c.tick(Duration::from_secs(1));
        assert!(events.contains(&MediaEvent::Ended));
        assert!(!c.state().is_playing);
        assert_eq!(c.state().current_time, 1.0);
    }

    #[test]
    fn test_restart_seeks_to_zero_and_plays() {
        let mut c = controller(10.0, 7.0);
        c.restart();
        assert_eq!(c.state().current_time, 0.0);
        assert!(c.state().is_playing);
    }

    #[test]
    fn test_progress() {
        let mut c = controller(10.0, 0.0);
        c.seek(2.5);
        assert!((c.state().progress() - 0.25).abs() < 1e-12);

        let unloaded = PlaybackController::new(FakeMedia::loading(1.0).boxed());
        assert_eq!(unloaded.state().progress(), 0.0);
    }
}

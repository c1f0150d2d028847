// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Dual-video transport with an optional fixed time offset.
//!
//! While linked, every command is applied to the primary first and then to
//! the secondary at `primary_time + offset`. The secondary is commanded
//! directly, never through a reaction to the primary's notifications, so no
//! echo reaches the primary.
//!
//! When one linked video reaches its end before the other, the finished one
//! stops and the other keeps playing. The pair counts as playing until both
//! have stopped.

use super::playback::{PlaybackController, StepDirection};
use std::time::Duration;

/// Which pane a command was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SyncRelation {
    linked: bool,
    offset: f64,
}

impl SyncRelation {
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// `secondary - primary` captured when the link was made; 0 while unlinked.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Link at the current positions. Already linked relations keep their offset.
    pub fn link(&mut self, primary_time: f64, secondary_time: f64) {
        if !self.linked {
            self.linked = true;
            self.offset = secondary_time - primary_time;
        }
    }

    pub fn unlink(&mut self) {
        self.linked = false;
        self.offset = 0.0;
    }

    pub fn secondary_time_for(&self, primary_time: f64) -> f64 {
        primary_time + self.offset
    }

    pub fn primary_time_for(&self, secondary_time: f64) -> f64 {
        secondary_time - self.offset
    }
}

/// Transport for the primary video and an optional comparison video.
pub struct Transport {
    primary: PlaybackController,
    secondary: Option<PlaybackController>,
    sync: SyncRelation,
    pair_playing: bool,
}

impl Transport {
    pub fn single(primary: PlaybackController) -> Self {
        Self {
            primary,
            secondary: None,
            sync: SyncRelation::default(),
            pair_playing: false,
        }
    }

    /// Replace the comparison video. The pair starts unlinked.
    pub fn attach_secondary(&mut self, secondary: PlaybackController) {
        self.sync.unlink();
        self.pair_playing = false;
        self.secondary = Some(secondary);
    }

    pub fn detach_secondary(&mut self) -> Option<PlaybackController> {
        self.sync.unlink();
        self.pair_playing = false;
        self.secondary.take()
    }

    pub fn primary(&self) -> &PlaybackController {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut PlaybackController {
        &mut self.primary
    }

    pub fn secondary(&self) -> Option<&PlaybackController> {
        self.secondary.as_ref()
    }

    pub fn secondary_mut(&mut self) -> Option<&mut PlaybackController> {
        self.secondary.as_mut()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn sync(&self) -> SyncRelation {
        self.sync
    }

    pub fn is_linked(&self) -> bool {
        self.sync.is_linked()
    }

    /// Whether the linked pair counts as playing.
    #[cfg(test)]
    pub fn pair_playing(&self) -> bool {
        self.pair_playing
    }

    pub fn is_playing(&self, target: Target) -> bool {
        if self.is_linked() {
            return self.pair_playing;
        }
        self.controller(target)
            .map(|c| c.state().is_playing)
            .unwrap_or(false)
    }

    fn controller(&self, target: Target) -> Option<&PlaybackController> {
        match target {
            Target::Primary => Some(&self.primary),
            Target::Secondary => self.secondary.as_ref(),
        }
    }

    fn controller_mut(&mut self, target: Target) -> Option<&mut PlaybackController> {
        match target {
            Target::Primary => Some(&mut self.primary),
            Target::Secondary => self.secondary.as_mut(),
        }
    }

    /// Link or unlink the pair. Linking snapshots the current offset.
    pub fn set_linked(&mut self, linked: bool) {
        let Some(secondary) = self.secondary.as_mut() else {
            return;
        };

        if linked && !self.sync.is_linked() {
            let primary_time = self.primary.state().current_time;
            self.sync.link(primary_time, secondary.state().current_time);
            secondary.set_playback_rate(self.primary.state().playback_rate);
            self.pair_playing = self.primary.state().is_playing || secondary.state().is_playing;
            log::info!("Linked comparison video, offset {:+.3}s", self.sync.offset());
        } else if !linked && self.sync.is_linked() {
            self.sync.unlink();
            self.pair_playing = false;
            log::info!("Unlinked comparison video");
        }
    }

    pub fn toggle_link(&mut self) {
        self.set_linked(!self.is_linked());
    }

    /// Drive the secondary to `primary + offset`.
    fn follow_primary(&mut self) {
        if !self.sync.is_linked() {
            return;
        }
        let target = self.sync.secondary_time_for(self.primary.state().current_time);
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.seek(target);
        }
    }

    /// Primary time that a linked command addressed to `target` at `seconds` means.
    fn linked_primary_time(&self, target: Target, seconds: f64) -> f64 {
        match target {
            Target::Primary => seconds,
            Target::Secondary => self.sync.primary_time_for(seconds),
        }
    }

    pub fn seek(&mut self, target: Target, seconds: f64) {
        if self.is_linked() {
            let primary_time = self.linked_primary_time(target, seconds);
            self.primary.seek(primary_time);
            self.follow_primary();
        } else if let Some(controller) = self.controller_mut(target) {
            controller.seek(seconds);
        }
    }

    pub fn begin_scrub(&mut self, target: Target) {
        if self.is_linked() {
            self.primary.begin_scrub();
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.begin_scrub();
            }
        } else if let Some(controller) = self.controller_mut(target) {
            controller.begin_scrub();
        }
    }

    pub fn scrub_to(&mut self, target: Target, seconds: f64) {
        if self.is_linked() {
            let primary_time = self.linked_primary_time(target, seconds);
            self.primary.scrub_to(primary_time);
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.scrub_to(self.sync.secondary_time_for(self.primary.state().current_time));
            }
        } else if let Some(controller) = self.controller_mut(target) {
            controller.scrub_to(seconds);
        }
    }

    pub fn end_scrub(&mut self, target: Target) {
        if self.is_linked() {
            self.primary.end_scrub();
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.end_scrub();
            }
        } else if let Some(controller) = self.controller_mut(target) {
            controller.end_scrub();
        }
    }

    pub fn step(&mut self, target: Target, direction: StepDirection) {
        if self.is_linked() {
            self.primary.step(direction);
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.pause();
            }
            self.pair_playing = false;
            self.follow_primary();
        } else if let Some(controller) = self.controller_mut(target) {
            controller.step(direction);
        }
    }

    pub fn play(&mut self, target: Target) {
        if self.is_linked() {
            // The primary may restart from its end; the secondary follows it there.
            self.primary.play();
            self.follow_primary();
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.play();
            }
            self.pair_playing = true;
        } else if let Some(controller) = self.controller_mut(target) {
            controller.play();
        }
    }

    pub fn pause(&mut self, target: Target) {
        if self.is_linked() {
            self.primary.pause();
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.pause();
            }
            self.pair_playing = false;
            // Re-align unless the primary already ran out; the secondary
            // then holds its own place.
            let primary = self.primary.state();
            if primary.current_time < primary.duration {
                self.follow_primary();
            }
        } else if let Some(controller) = self.controller_mut(target) {
            controller.pause();
        }
    }

    pub fn toggle_play_pause(&mut self, target: Target) {
        if self.is_playing(target) {
            self.pause(target);
        } else {
            self.play(target);
        }
    }

    pub fn restart(&mut self, target: Target) {
        if self.is_linked() {
            self.seek(Target::Primary, 0.0);
            self.play(Target::Primary);
        } else if let Some(controller) = self.controller_mut(target) {
            controller.restart();
        }
    }

    /// Cycle the speed; a linked pair always shares one rate.
    pub fn cycle_playback_rate(&mut self, target: Target) -> f64 {
        if self.is_linked() {
            let rate = self.primary.cycle_playback_rate();
            if let Some(secondary) = self.secondary.as_mut() {
                secondary.set_playback_rate(rate);
            }
            log::debug!("Linked playback rate set to {}x", rate);
            rate
        } else {
            match self.controller_mut(target) {
                Some(controller) => controller.cycle_playback_rate(),
                None => self.primary.state().playback_rate,
            }
        }
    }

    /// Let wall-clock time pass for both videos and absorb their notifications.
    pub fn tick(&mut self, elapsed: Duration) {
        self.primary.tick(elapsed);
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.tick(elapsed);
        }

        if self.pair_playing {
            let primary_stopped = !self.primary.state().is_playing;
            let secondary_stopped = self
                .secondary
                .as_ref()
                .map(|s| !s.state().is_playing)
                .unwrap_or(true);
            if primary_stopped && secondary_stopped {
                self.pair_playing = false;
                log::debug!("Both linked videos stopped");
            }
        }
    }
}

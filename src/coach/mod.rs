// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! AI coach conversation.
//!
//! Questions are answered on worker threads; replies come back over a
//! channel drained by [`CoachChat::poll`] from the UI loop and are appended
//! in arrival order.

pub mod client;
pub mod gemini;

use crate::config::CoachConfig;
use crate::models::chat::{ChatMessage, ChatRole};
use client::{CoachError, FrameQuery, UnconfiguredCoach, VisionCoach};
use gemini::GeminiCoach;
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// First message of every conversation.
pub const GREETING: &str = "Hi. Pause the video at the key moment and ask me about your technique.";

/// Messages sent along with a question as context.
const HISTORY_LEN: usize = 2;

struct CoachReply {
    request_id: u64,
    result: Result<String, CoachError>,
}

pub struct CoachChat {
    coach: Arc<dyn VisionCoach>,
    messages: Vec<ChatMessage>,
    sender: Sender<CoachReply>,
    receiver: Receiver<CoachReply>,
    next_request_id: u64,
    outstanding: HashSet<u64>,
}

impl CoachChat {
    pub fn new(coach: Arc<dyn VisionCoach>) -> Self {
        let (sender, receiver) = channel();
        Self {
            coach,
            messages: vec![ChatMessage::new(ChatRole::Coach, GREETING)],
            sender,
            receiver,
            next_request_id: 1,
            outstanding: HashSet::new(),
        }
    }

    /// Gemini when an API key is available, otherwise a coach that explains how to configure one.
    pub fn from_config(config: &CoachConfig) -> Self {
        let coach: Arc<dyn VisionCoach> = match config.api_key() {
            Some(key) => match GeminiCoach::new(config, key) {
                Ok(coach) => {
                    log::info!("AI coach using {} (fallback {})", config.model, config.fallback_model);
                    Arc::new(coach)
                }
                Err(e) => {
                    log::error!("Failed to create AI coach client: {:#}", e);
                    Arc::new(UnconfiguredCoach::new(&config.api_key_env))
                }
            },
            None => {
                log::warn!("{} not set, AI coach disabled", config.api_key_env);
                Arc::new(UnconfiguredCoach::new(&config.api_key_env))
            }
        };
        Self::new(coach)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        !self.outstanding.is_empty()
    }

    /// Post a question about `image_jpeg` and dispatch it. Blank prompts are ignored.
    pub fn ask(&mut self, prompt: &str, image_jpeg: Vec<u8>) -> Option<u64> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }

        let history = self.recent_context();
        self.messages.push(ChatMessage::new(ChatRole::User, prompt));

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.outstanding.insert(request_id);

        let query = FrameQuery {
            image_jpeg,
            prompt: prompt.to_string(),
            history,
        };
        let coach = Arc::clone(&self.coach);
        let sender = self.sender.clone();
        log::info!("Coach request {} dispatched", request_id);

        std::thread::spawn(move || {
            let result = coach.analyze_frame(&query);
            let _ = sender.send(CoachReply { request_id, result });
        });

        Some(request_id)
    }

    /// Post a question that could not be sent, with the reason as the coach's reply.
    pub fn report_failure(&mut self, prompt: &str, reason: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return;
        }
        log::warn!("Coach request not sent: {}", reason);
        self.messages.push(ChatMessage::new(ChatRole::User, prompt));
        self.messages.push(ChatMessage::new(
            ChatRole::Coach,
            format!("I couldn't capture the frame: {}", reason),
        ));
    }

    /// Append replies that have arrived. Returns how many were appended.
    pub fn poll(&mut self) -> usize {
        let mut appended = 0;
        while let Ok(reply) = self.receiver.try_recv() {
            if !self.outstanding.remove(&reply.request_id) {
                log::debug!("Dropping reply to stale request {}", reply.request_id);
                continue;
            }

            let text = match reply.result {
                Ok(text) => {
                    log::info!("Coach request {} answered", reply.request_id);
                    text
                }
                Err(e) => {
                    log::error!("Coach request {} failed: {}", reply.request_id, e);
                    e.user_message()
                }
            };
            self.messages.push(ChatMessage::new(ChatRole::Coach, text));
            appended += 1;
        }
        appended
    }

    /// Start a fresh conversation. Replies to earlier questions are discarded.
    pub fn reset(&mut self) {
        self.outstanding.clear();
        self.messages = vec![ChatMessage::new(ChatRole::Coach, GREETING)];
    }

    fn recent_context(&self) -> Vec<String> {
        let start = self.messages.len().saturating_sub(HISTORY_LEN);
        self.messages[start..]
            .iter()
            .map(ChatMessage::as_context_line)
            .collect()
    }
}

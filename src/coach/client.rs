// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Contract for the vision coach and the retry policy shared by backends.

use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// A question about one captured frame.
#[derive(Debug, Clone)]
pub struct FrameQuery {
    pub image_jpeg: Vec<u8>,
    pub prompt: String,
    /// Recent conversation as `role: text` lines, oldest first.
    pub history: Vec<String>,
}

impl FrameQuery {
    /// Prompt text with the conversation context prepended.
    pub fn full_prompt(&self) -> String {
        format!(
            "Previous Context: {}\n\nUser Question: {}",
            self.history.join("\n"),
            self.prompt
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoachError {
    #[error("Rate limited by the coach service")]
    RateLimited,

    #[error("Coach service unavailable")]
    Unavailable,

    #[error("Coach request failed: {0}")]
    Request(String),

    #[error("Coach not configured: set {0}")]
    NotConfigured(String),
}

impl CoachError {
    /// Failures worth retrying after a delay.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoachError::RateLimited | CoachError::Unavailable)
    }

    /// Chat text shown in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            CoachError::RateLimited => {
                "The coach is handling a lot of traffic right now (error 429). Please wait a few seconds and try again."
                    .to_string()
            }
            CoachError::NotConfigured(var) => {
                format!("The AI coach is not configured. Set the {} environment variable and restart.", var)
            }
            _ => "Sorry, there was a problem connecting to the AI coach. Check your connection or try again later."
                .to_string(),
        }
    }
}

/// Sends a frame and a question to an inference service, returns plain text.
pub trait VisionCoach: Send + Sync {
    fn analyze_frame(&self, query: &FrameQuery) -> Result<String, CoachError>;
}

/// Stand-in used when no API key is available.
#[derive(Debug, Clone)]
pub struct UnconfiguredCoach {
    api_key_env: String,
}

impl UnconfiguredCoach {
    pub fn new(api_key_env: impl Into<String>) -> Self {
        Self {
            api_key_env: api_key_env.into(),
        }
    }
}

impl VisionCoach for UnconfiguredCoach {
    fn analyze_frame(&self, _query: &FrameQuery) -> Result<String, CoachError> {
        Err(CoachError::NotConfigured(self.api_key_env.clone()))
    }
}

/// Run `op` up to `attempts` times, sleeping `base_delay * 2^i` plus jitter
/// between transient failures. Permanent failures return immediately.
pub fn with_retry<T>(
    attempts: u32,
    base_delay: Duration,
    mut op: impl FnMut() -> Result<T, CoachError>,
) -> Result<T, CoachError> {
    let attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let wait = backoff_delay(base_delay, attempt);
                log::warn!("{}; retrying in {}ms", e, wait.as_millis());
                std::thread::sleep(wait);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential delay for retry `attempt` with up to half of `base` added as jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let jitter = if base_ms > 1 {
        rand::thread_rng().gen_range(0..base_ms / 2)
    } else {
        0
    };
    Duration::from_millis(base_ms.saturating_mul(1 << attempt.min(16)) + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_retry_recovers_from_transient_errors() {
        let calls = Cell::new(0);
        let result = with_retry(3, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(CoachError::Unavailable)
            } else {
                Ok("ok")
            }
        });
        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(2, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            Err(CoachError::RateLimited)
        });
        assert_eq!(result, Err(CoachError::RateLimited));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(5, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            Err(CoachError::Request("400".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_doubles_with_bounded_jitter() {
        let base = Duration::from_millis(1000);
        for attempt in 0..3 {
            let wait = backoff_delay(base, attempt).as_millis() as u64;
            let floor = 1000 << attempt;
            assert!(wait >= floor && wait < floor + 500, "attempt {attempt}: {wait}");
        }
    }

    #[test]
    fn test_user_messages() {
        assert!(CoachError::RateLimited.user_message().contains("429"));
        assert!(CoachError::Unavailable.user_message().contains("connecting"));
        assert!(CoachError::NotConfigured("GEMINI_API_KEY".into())
            .user_message()
            .contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_full_prompt_includes_history() {
        let query = FrameQuery {
            image_jpeg: Vec::new(),
            prompt: "Is my elbow high enough?".to_string(),
            history: vec!["coach: Hi".to_string(), "user: hello".to_string()],
        };
        assert_eq!(
            query.full_prompt(),
            "Previous Context: coach: Hi\nuser: hello\n\nUser Question: Is my elbow high enough?"
        );
    }
}

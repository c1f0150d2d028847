// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Gemini `generateContent` backend.

use super::client::{with_retry, CoachError, FrameQuery, VisionCoach};
use crate::config::CoachConfig;
use anyhow::Result;
use base64::Engine;
use reqwest::blocking::Client;
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Answer used when the service returns no text.
pub const NO_ANSWER: &str = "I couldn't analyze this frame.";

const SYSTEM_INSTRUCTION: &str = "You are an elite sports biomechanics and technique coach. \
The user is showing you a specific frame from a slow-motion video analysis. \
Analyze the body position, angles and technique visible in this image. \
Be concise, encouraging and technical but easy to understand. \
Answer the user's specific question about this moment in the movement.";

pub struct GeminiCoach {
    client: Client,
    api_key: String,
    model: String,
    fallback_model: String,
    attempts: u32,
    base_delay: Duration,
}

impl GeminiCoach {
    pub fn new(config: &CoachConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("velocityview/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            fallback_model: config.fallback_model.clone(),
            attempts: config.max_retries.max(1),
            base_delay: Duration::from_millis(1000),
        })
    }

    fn generate(&self, model: &str, body: &serde_json::Value) -> Result<String, CoachError> {
        let url = format!("{}/{}:generateContent", API_BASE, model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| CoachError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(classify_status(status, &detail));
        }

        let value: serde_json::Value = response
            .json()
            .map_err(|e| CoachError::Request(e.to_string()))?;
        Ok(extract_text(&value).unwrap_or_else(|| NO_ANSWER.to_string()))
    }
}

impl VisionCoach for GeminiCoach {
    fn analyze_frame(&self, query: &FrameQuery) -> Result<String, CoachError> {
        let body = request_body(query);

        let primary = with_retry(self.attempts, self.base_delay, || self.generate(&self.model, &body));
        match primary {
            Ok(text) => Ok(text),
            Err(e) => {
                log::warn!(
                    "Model {} failed ({}), falling back to {}",
                    self.model,
                    e,
                    self.fallback_model
                );
                with_retry(self.attempts, self.base_delay, || {
                    self.generate(&self.fallback_model, &body)
                })
            }
        }
    }
}

fn request_body(query: &FrameQuery) -> serde_json::Value {
    let image = base64::engine::general_purpose::STANDARD.encode(&query.image_jpeg);

    serde_json::json!({
        "systemInstruction": {
            "parts": [{ "text": SYSTEM_INSTRUCTION }]
        },
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": "image/jpeg",
                        "data": image
                    }
                },
                { "text": query.full_prompt() }
            ]
        }]
    })
}

fn classify_status(status: u16, detail: &str) -> CoachError {
    match status {
        429 => CoachError::RateLimited,
        503 => CoachError::Unavailable,
        _ => CoachError::Request(format!("HTTP {}: {}", status, detail.trim())),
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: &serde_json::Value) -> Option<String> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

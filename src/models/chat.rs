// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coach conversation messages.

use chrono::{DateTime, Local};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Coach,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Coach => "coach",
        }
    }
}

/// One entry in the append-only coach conversation.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    /// `role: text`, the form used as conversation context for the coach.
    pub fn as_context_line(&self) -> String {
        format!("{}: {}", self.role.label(), self.text)
    }
}

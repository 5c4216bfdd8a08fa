use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

/// Facts about the company the concierge represents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompanyProfile {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub industry: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    /// Public key/value facts (founders, locations, services, ...)
    #[serde(default)]
    pub facts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    #[strum(serialize = "User")]
    User,
    #[strum(serialize = "Assistant")]
    Assistant,
}

/// One message of a visitor's conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

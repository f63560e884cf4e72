// Moderation domain models - data structures for language enforcement.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer will convert these to Discord-specific actions.

use crate::core::translation::Translation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Detections below this confidence are never acted on.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Similarity score at which a stored exception phrase exempts a message.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.75;

/// Configuration for language enforcement.
///
/// Built once at startup and handed to the services that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// ISO code every message is measured against
    pub required_language: String,
    /// Append the translation to the rebuke
    pub be_helpful: bool,
    /// Restrict offenders for `mute_timeout`
    pub mute_people: bool,
    /// How long a mute lasts before the restriction is lifted
    pub mute_timeout: Duration,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            required_language: "en".to_string(),
            be_helpful: false,
            mute_people: false,
            mute_timeout: Duration::from_millis(30_000),
        }
    }
}

/// Outcome of checking a translation against the required language.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationContext {
    pub required_language_code: String,
    pub required_language_name: String,
    /// Authoritative language verdict. Always `true` when `translation` is `None`.
    pub is_correct_language: bool,
    pub translation: Option<Translation>,
}

impl ModerationContext {
    /// Context used when no translation could be obtained.
    pub fn fail_open(required_language_code: &str, required_language_name: &str) -> Self {
        Self {
            required_language_code: required_language_code.to_string(),
            required_language_name: required_language_name.to_string(),
            is_correct_language: true,
            translation: None,
        }
    }
}

/// A phrase that admins have exempted from enforcement within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionEntry {
    pub group_id: u64,
    /// Always stored lower-cased.
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ExceptionEntry {
    pub fn new(group_id: u64, text: &str) -> Self {
        Self {
            group_id,
            text: normalize_exception_text(text),
            created_at: Utc::now(),
        }
    }
}

/// Canonical form stored for exception phrases.
pub fn normalize_exception_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Final decision for a single message.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationVerdict {
    pub should_act: bool,
    pub context: ModerationContext,
}

impl ModerationVerdict {
    pub fn no_action(context: ModerationContext) -> Self {
        Self {
            should_act: false,
            context,
        }
    }
}

/// Identifies where a message was posted.
///
/// `group_id` scopes exception lists; `channel_id` is where replies and
/// restrictions go. On platforms without the distinction both are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationId {
    pub group_id: u64,
    pub channel_id: u64,
}

/// A platform-neutral view of an inbound text message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub conversation: ConversationId,
    pub message_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub text: String,
}

/// What the orchestrator decided to do about a message.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationAction {
    /// Nothing to do - message passes
    NoAction,
    /// Reply to the message with a reminder
    Rebuke { message: String },
    /// Reply and restrict the author for `duration`
    RebukeAndMute { message: String, duration: Duration },
}

//! Task classification: calendar triage and voice task extraction.
//!
//! The `Classifier` holds an optional chat service. When the service is
//! missing or any call fails, triage degrades to a heuristic and extraction
//! returns nothing; classification failures are never fatal.

pub mod extract;
pub mod triage;

use std::sync::Arc;

use crate::adapters::{ChatService, OpenAiClient};

pub(crate) const TRIAGE_SYSTEM_PROMPT: &str = "You are my personal assistant. I will give you a list of calendar events. \
You will extract up to 6 urgent, actionable tasks that must be handled TODAY. \
Make sure the tasks are actionable and have a deadline, and is related to me not someone else.\n\
Prefer: meetings starting soon, high priority events, explicit deadlines/times.\n\
Return strict JSON array: [{\"title\": str, \"source\": \"calendar\", \"time\": \"HH:MM\"|null, \"priority\": 1..5, \"link\": str|null}]\n";

pub(crate) const EXTRACT_SYSTEM_PROMPT: &str = "You are a personal assistant that extracts tasks from voice recordings.\n\n\
IMPORTANT: Only extract if the text is about adding/creating tasks, todos, or reminders. \
If the text is just conversation, notes, or not task-related, return null.\n\n\
Extract tasks with these fields:\n\
- title: Clear, actionable task title\n\
- description: Additional details (optional)\n\
- priority: 1 (urgent) to 5 (low), default 3\n\
- start_time: \"HH:MM\" format if mentioned (optional)\n\
- end_time: \"HH:MM\" format if mentioned (optional)\n\
- date: \"YYYY-MM-DD\" format, default to today if not specified\n\
- emoji: Relevant emoji for the task (optional)\n\n\
Return JSON format:\n\
{\"tasks\": [{\"title\": \"...\", \"description\": \"...\", \"priority\": 3, \"start_time\": \"09:00\", \"end_time\": \"10:00\", \"date\": \"2024-01-15\", \"emoji\": \"📅\"}]}\n\n\
Return null if not task-related.";

/// Stateful classification service.
///
/// Built once at startup from the configured credential and rebuilt via
/// `reconfigure` when the credential changes.
pub struct Classifier {
    chat: Option<Arc<dyn ChatService>>,
}

impl Classifier {
    /// Build from an optional API key; no key means heuristic-only operation
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            chat: api_key
                .filter(|k| !k.is_empty())
                .map(|k| Arc::new(OpenAiClient::new(k)) as Arc<dyn ChatService>),
        }
    }

    /// Build around an explicit chat service (tests use a mock here)
    pub fn with_chat(chat: Arc<dyn ChatService>) -> Self {
        Self { chat: Some(chat) }
    }

    /// Rebuild the chat client after a credential change
    pub fn reconfigure(&mut self, api_key: Option<&str>) {
        *self = Self::new(api_key);
    }

    /// Whether a chat service is configured
    pub fn has_service(&self) -> bool {
        self.chat.is_some()
    }

    pub(crate) fn chat(&self) -> Option<&Arc<dyn ChatService>> {
        self.chat.as_ref()
    }
}

//! Voice task extraction: transcript in, structured tasks out.

use chrono::Local;
use tracing::{debug, warn};

use crate::domain::VoiceTask;

use super::{Classifier, EXTRACT_SYSTEM_PROMPT};

impl Classifier {
    /// Extract structured tasks from a transcript.
    ///
    /// Returns `None` when the service is unavailable, the transcript is not
    /// task-related (the service answers `null`), or the response cannot be
    /// parsed. Extraction never surfaces an error.
    pub async fn extract(&self, transcript: &str, recording_id: &str) -> Option<Vec<VoiceTask>> {
        let chat = match self.chat() {
            Some(chat) => chat,
            None => {
                debug!("No chat service configured, skipping extraction");
                return None;
            }
        };

        let today = Local::now().date_naive();
        let user_prompt = format!(
            "TODAY: {}\n\nVOICE TRANSCRIPTION:\n{}",
            today.format("%Y-%m-%d"),
            transcript
        );

        let content = match chat.complete_json(EXTRACT_SYSTEM_PROMPT, &user_prompt).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Task extraction request failed: {:#}", e);
                return None;
            }
        };

        parse_extraction(&content, recording_id)
    }
}

/// Parse the extraction response. `null` (or an empty body) means the
/// transcript was not task-related; anything unparsable is treated the same.
fn parse_extraction(content: &str, recording_id: &str) -> Option<Vec<VoiceTask>> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return None;
    }

    let parsed: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            warn!("Extraction response was not valid JSON: {}", e);
            return None;
        }
    };

    if parsed.is_null() {
        return None;
    }

    let candidates = parsed.get("tasks").and_then(|v| v.as_array())?;

    let today = Local::now().date_naive();
    let mut tasks = Vec::new();

    for candidate in candidates {
        match VoiceTask::from_value(candidate, today, recording_id) {
            Ok(task) => tasks.push(task),
            Err(e) => debug!("Dropping extraction candidate: {}", e),
        }
    }

    if tasks.is_empty() {
        None
    } else {
        Some(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_response_means_not_task_related() {
        assert!(parse_extraction("null", "r").is_none());
        assert!(parse_extraction("  NULL  ", "r").is_none());
        assert!(parse_extraction("", "r").is_none());
    }

    #[test]
    fn test_unparsable_response_is_none() {
        assert!(parse_extraction("I couldn't find any tasks.", "r").is_none());
        assert!(parse_extraction(r#"{"answer": 42}"#, "r").is_none());
        assert!(parse_extraction(r#"{"tasks": []}"#, "r").is_none());
    }

    #[test]
    fn test_extraction_parses_tasks() {
        let content = r#"{
            "tasks": [
                {"title": "Call dentist", "priority": 2, "start_time": "14:30", "emoji": "🦷"},
                {"description": "no title here"}
            ]
        }"#;

        let tasks = parse_extraction(content, "rec42").unwrap();
        assert_eq!(tasks.len(), 2);

        assert_eq!(tasks[0].title, "Call dentist");
        assert_eq!(tasks[0].priority, 2);
        assert_eq!(tasks[0].recording_id, "rec42");

        assert_eq!(tasks[1].title, "Untitled Task");
        assert_eq!(tasks[1].priority, 3);
        assert!(tasks[1].date.is_some());
    }

    #[test]
    fn test_bad_priority_drops_only_that_candidate() {
        let content = r#"{
            "tasks": [
                {"title": "Good", "priority": 1},
                {"title": "Bad", "priority": "very high"}
            ]
        }"#;

        let tasks = parse_extraction(content, "r").unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Good");
    }

    #[tokio::test]
    async fn test_extract_without_service_is_none() {
        let classifier = Classifier::new(None);
        assert!(classifier.extract("buy milk tomorrow", "r").await.is_none());
    }
}

//! Calendar triage: events in, at most six deduplicated urgent tasks out.

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, warn};

use crate::domain::{CalendarEvent, UrgentTask};

use super::{Classifier, TRIAGE_SYSTEM_PROMPT};

/// Hard cap on the number of tasks a triage pass may return
pub const MAX_TASKS: usize = 6;

const HEURISTIC_WINDOW_SECS: i64 = 3 * 3600;

impl Classifier {
    /// Triage today's events into at most six urgent tasks.
    ///
    /// Tries the chat service first; any failure there (no credential,
    /// network error, malformed JSON) falls back to the near-term-meeting
    /// heuristic. Total failure yields an empty list, never an error.
    pub async fn triage(&self, today: NaiveDate, events: &[CalendarEvent]) -> Vec<UrgentTask> {
        let candidates = match self.llm_triage(today, events).await {
            Some(values) => values,
            None => heuristic_triage(events, Local::now()),
        };

        parse_candidates(&candidates)
    }

    async fn llm_triage(
        &self,
        today: NaiveDate,
        events: &[CalendarEvent],
    ) -> Option<Vec<serde_json::Value>> {
        let chat = self.chat()?;

        let event_text = events
            .iter()
            .map(|e| e.prompt_line())
            .collect::<Vec<_>>()
            .join("\n");
        let user_prompt = format!(
            "TODAY: {}\n\nCALENDAR (today):\n{}\n",
            today.format("%Y-%m-%d"),
            event_text
        );

        let content = match chat.complete_json(TRIAGE_SYSTEM_PROMPT, &user_prompt).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Triage request failed, using heuristic: {:#}", e);
                return None;
            }
        };

        let parsed: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Triage response was not valid JSON, using heuristic: {}", e);
                return None;
            }
        };

        // Accept a bare array or an object wrapping one under "tasks"/"items"
        match parsed {
            serde_json::Value::Array(items) => Some(items),
            serde_json::Value::Object(mut obj) => {
                let items = obj
                    .remove("tasks")
                    .or_else(|| obj.remove("items"))
                    .and_then(|v| match v {
                        serde_json::Value::Array(items) => Some(items),
                        _ => None,
                    });
                match items {
                    Some(items) => Some(items),
                    None => {
                        warn!("Triage response had no task array, using heuristic");
                        None
                    }
                }
            }
            _ => {
                warn!("Triage response had unexpected shape, using heuristic");
                None
            }
        }
    }
}

/// Fallback triage: every event not yet ended whose start is at most three
/// hours away (or already past) becomes a priority-5 meeting reminder.
pub fn heuristic_triage(events: &[CalendarEvent], now: DateTime<Local>) -> Vec<serde_json::Value> {
    let mut candidates = Vec::new();

    for event in events {
        if event.end <= now {
            continue;
        }

        let seconds_until_start = (event.start - now).num_seconds();
        if seconds_until_start <= HEURISTIC_WINDOW_SECS {
            candidates.push(serde_json::json!({
                "title": format!("Meeting: {}", event.title),
                "source": "calendar",
                "time": event.start.format("%H:%M").to_string(),
                "priority": 5,
                "link": event.meeting_link,
            }));
        }
    }

    candidates.truncate(MAX_TASKS);
    candidates
}

/// Parse raw candidates into tasks: apply defaults, drop unusable records,
/// dedup by exact title keeping the first, cap at six. Incoming order is
/// preserved.
fn parse_candidates(candidates: &[serde_json::Value]) -> Vec<UrgentTask> {
    let mut seen = std::collections::HashSet::new();
    let mut tasks = Vec::new();

    for candidate in candidates {
        let task = match UrgentTask::from_value(candidate) {
            Ok(task) => task,
            Err(e) => {
                debug!("Dropping triage candidate: {}", e);
                continue;
            }
        };

        if seen.insert(task.title.clone()) {
            tasks.push(task);
        }
        if tasks.len() == MAX_TASKS {
            break;
        }
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn event(id: &str, start: DateTime<Local>, end: DateTime<Local>) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            start,
            end,
            title: format!("Sync {}", id),
            location: None,
            meeting_link: Some("https://meet.example/x".to_string()),
        }
    }

    #[test]
    fn test_heuristic_includes_soon_and_started() {
        let now = Local::now();

        let events = vec![
            // Starts in 179 minutes: inside the window
            event(
                "soon",
                now + Duration::minutes(179),
                now + Duration::minutes(239),
            ),
            // Starts in 181 minutes: outside
            event(
                "later",
                now + Duration::minutes(181),
                now + Duration::minutes(241),
            ),
            // Already started, not ended
            event("ongoing", now - Duration::minutes(10), now + Duration::minutes(20)),
            // Already ended
            event("done", now - Duration::hours(2), now - Duration::hours(1)),
        ];

        let candidates = heuristic_triage(&events, now);
        let titles: Vec<_> = candidates
            .iter()
            .map(|c| c["title"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(titles, vec!["Meeting: Sync soon", "Meeting: Sync ongoing"]);
        assert!(candidates.iter().all(|c| c["priority"] == 5));
    }

    #[test]
    fn test_heuristic_caps_at_six() {
        let now = Local::now();
        let events: Vec<_> = (0..10)
            .map(|i| {
                event(
                    &format!("e{}", i),
                    now + Duration::minutes(5),
                    now + Duration::minutes(35),
                )
            })
            .collect();

        assert_eq!(heuristic_triage(&events, now).len(), MAX_TASKS);
    }

    #[test]
    fn test_parse_candidates_dedups_and_caps() {
        let candidates: Vec<_> = vec![
            json!({"title": "A", "priority": 1}),
            json!({"title": "A", "priority": 2}),
            json!({"title": "B"}),
            json!({"title": "C", "priority": "not a number"}),
            json!({"title": "D"}),
            json!({"title": "E"}),
            json!({"title": "F"}),
            json!({"title": "G"}),
            json!({"title": "H"}),
        ];

        let tasks = parse_candidates(&candidates);
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();

        // First "A" wins, bad-priority "C" dropped, capped at six
        assert_eq!(titles, vec!["A", "B", "D", "E", "F", "G"]);
        assert_eq!(tasks[0].priority, 1);
    }

    #[tokio::test]
    async fn test_triage_without_service_uses_heuristic() {
        let classifier = Classifier::new(None);
        let now = Local::now();

        let events = vec![event(
            "x",
            now + Duration::minutes(30),
            now + Duration::minutes(60),
        )];

        let tasks = classifier.triage(now.date_naive(), &events).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Meeting: Sync x");
        assert_eq!(tasks[0].priority, 5);
        assert_eq!(tasks[0].link.as_deref(), Some("https://meet.example/x"));
    }

    #[tokio::test]
    async fn test_triage_accepts_wrapped_object() {
        use crate::adapters::ChatService;
        use async_trait::async_trait;

        struct Canned(&'static str);

        #[async_trait]
        impl ChatService for Canned {
            fn name(&self) -> &str {
                "canned"
            }

            async fn complete_json(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
                Ok(self.0.to_string())
            }
        }

        let classifier = Classifier::with_chat(std::sync::Arc::new(Canned(
            r#"{"tasks": [{"title": "Prep demo", "time": "14:00", "priority": 2}]}"#,
        )));

        let tasks = classifier.triage(Local::now().date_naive(), &[]).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Prep demo");
        assert_eq!(tasks[0].time.as_deref(), Some("14:00"));
    }
}

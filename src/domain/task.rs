//! Task records and the lenient parsers that build them from classifier JSON.
//!
//! The classifier returns dict-shaped JSON with optional fields. Each record
//! type has an explicit parse function that applies documented defaults and
//! returns a `ParseError` only when a candidate is unusable (bad priority).
//! A dropped candidate never fails the surrounding batch.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum characters kept from a task title
pub const MAX_TITLE_LEN: usize = 140;

/// Maximum characters kept from a source tag
pub const MAX_SOURCE_LEN: usize = 16;

/// Errors from parsing a single task candidate
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("candidate is not a JSON object")]
    NotAnObject,

    #[error("priority is not coercible to an integer: {0}")]
    BadPriority(String),
}

/// A short-lived ranked action item, valid for one refresh cycle only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrgentTask {
    /// Task title (≤140 chars)
    pub title: String,

    /// Origin tag, e.g. "calendar" or "voice" (≤16 chars)
    pub source: String,

    /// Optional 24-hour "HH:MM" time
    pub time: Option<String>,

    /// Priority 1 (most urgent) .. 5 (low)
    pub priority: u8,

    /// Optional URL (e.g. meeting link)
    pub link: Option<String>,
}

impl UrgentTask {
    /// Parse one classifier candidate, applying defaults.
    ///
    /// Missing `title` → "(no title)"; missing `source` → "calendar";
    /// missing `priority` → 3. A priority that cannot be coerced to an
    /// integer drops the candidate.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;

        let title = obj
            .get("title")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("(no title)");

        let source = obj
            .get("source")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("calendar");

        let priority = coerce_priority(obj.get("priority"))?;

        let time = obj
            .get("time")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let link = obj
            .get("link")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(Self {
            title: truncate_chars(title, MAX_TITLE_LEN),
            source: truncate_chars(source, MAX_SOURCE_LEN),
            time,
            priority,
            link,
        })
    }
}

/// A persisted task extracted from a voice recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceTask {
    /// Task title
    pub title: String,

    /// Additional details, if any
    #[serde(default)]
    pub description: Option<String>,

    /// Priority 1 (urgent) .. 5 (low), default 3
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Free-form "H:MM AM/PM" or "HH:MM" start time
    #[serde(default)]
    pub start_time: Option<String>,

    /// Free-form "H:MM AM/PM" or "HH:MM" end time
    #[serde(default)]
    pub end_time: Option<String>,

    /// "YYYY-MM-DD" date the task is for
    #[serde(default)]
    pub date: Option<String>,

    /// Emoji icon, if the classifier picked one
    #[serde(default)]
    pub emoji: Option<String>,

    /// ID of the recording this task came from
    pub recording_id: String,

    /// Always "voice"
    #[serde(default = "default_voice_source")]
    pub source: String,
}

fn default_priority() -> u8 {
    3
}

fn default_voice_source() -> String {
    "voice".to_string()
}

impl VoiceTask {
    /// Parse one extraction candidate, applying defaults.
    ///
    /// Missing `title` → "Untitled Task"; missing `priority` → 3; missing
    /// `date` → `today`. A priority that cannot be coerced drops the
    /// candidate.
    pub fn from_value(
        value: &serde_json::Value,
        today: NaiveDate,
        recording_id: &str,
    ) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;

        let str_field = |key: &str| {
            obj.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        Ok(Self {
            title: str_field("title").unwrap_or_else(|| "Untitled Task".to_string()),
            description: str_field("description"),
            priority: coerce_priority(obj.get("priority"))?,
            start_time: str_field("start_time"),
            end_time: str_field("end_time"),
            date: Some(
                str_field("date").unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            ),
            emoji: str_field("emoji"),
            recording_id: recording_id.to_string(),
            source: "voice".to_string(),
        })
    }

    /// Parsed task date, if the string is present and well-formed
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// Is this task for today?
    ///
    /// Absent or unparsable dates count as today. That leniency is
    /// deliberate: a voice task without a usable date should show up rather
    /// than vanish.
    pub fn is_today(&self) -> bool {
        self.is_today_on(Local::now().date_naive())
    }

    /// `is_today` against an explicit date (for tests)
    pub fn is_today_on(&self, today: NaiveDate) -> bool {
        match &self.date {
            None => true,
            Some(d) => match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
                Ok(date) => date == today,
                Err(_) => true,
            },
        }
    }

    /// Has this task's date/time not yet elapsed?
    pub fn is_not_past_due(&self) -> bool {
        self.is_not_past_due_at(Local::now().naive_local())
    }

    /// `is_not_past_due` against an explicit clock (for tests).
    ///
    /// A dated task before today is past due; after today it never is. On
    /// today (or with no usable date) the task is past due only when its end
    /// time (start time if no end is given) parses and is strictly before
    /// now. No parseable time means not past due.
    pub fn is_not_past_due_at(&self, now: NaiveDateTime) -> bool {
        if let Some(date) = self.parsed_date() {
            if date < now.date() {
                return false;
            }
            if date > now.date() {
                return true;
            }
        }

        let deadline = self
            .end_time
            .as_deref()
            .and_then(parse_clock)
            .or_else(|| self.start_time.as_deref().and_then(parse_clock));

        match deadline {
            Some(t) => t >= now.time(),
            None => true,
        }
    }

    /// "start–end", "start", or nothing, for display
    pub fn time_range(&self) -> Option<String> {
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => Some(format!("{}–{}", start, end)),
            (Some(start), None) => Some(start.clone()),
            _ => None,
        }
    }

    /// Convert to an ephemeral `UrgentTask` for the combiner.
    ///
    /// The free-form start time is normalized to 24-hour "HH:MM" where it
    /// parses; otherwise it is passed through as-is.
    pub fn to_urgent(&self) -> UrgentTask {
        let time = self.start_time.as_deref().map(|raw| {
            parse_clock(raw)
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| raw.to_string())
        });

        UrgentTask {
            title: truncate_chars(&self.title, MAX_TITLE_LEN),
            source: truncate_chars(&self.source, MAX_SOURCE_LEN),
            time,
            priority: self.priority,
            link: None,
        }
    }
}

/// Whether a display line came from a triaged task or a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Task,
    Event,
}

/// A pre-formatted line handed to the layout engine, then discarded.
#[derive(Debug, Clone)]
pub struct DisplayItem {
    /// Fully formatted text line
    pub text: String,

    /// Origin tag
    pub source: String,

    /// Priority 1..5 (synthetic 3 for event fallback)
    pub priority: u8,

    /// Task or event
    pub kind: ItemKind,
}

/// Coerce a JSON value into a priority, defaulting to 3 when absent.
///
/// Accepts integers, floats with integral values, and numeric strings —
/// classifiers are not reliable about JSON number types.
fn coerce_priority(value: Option<&serde_json::Value>) -> Result<u8, ParseError> {
    let value = match value {
        None | Some(serde_json::Value::Null) => return Ok(3),
        Some(v) => v,
    };

    let n = if let Some(n) = value.as_i64() {
        n
    } else if let Some(f) = value.as_f64() {
        f as i64
    } else if let Some(s) = value.as_str() {
        s.trim()
            .parse::<i64>()
            .map_err(|_| ParseError::BadPriority(s.to_string()))?
    } else {
        return Err(ParseError::BadPriority(value.to_string()));
    };

    Ok(n.clamp(1, 5) as u8)
}

/// Truncate to at most `max` characters, respecting char boundaries
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Parse a clock string in 24-hour "HH:MM" or 12-hour "H:MM AM/PM" form
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    let trimmed = s.trim();

    if let Ok(t) = NaiveTime::parse_from_str(trimmed, "%H:%M") {
        return Some(t);
    }

    let upper = trimmed.to_uppercase();
    NaiveTime::parse_from_str(&upper, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(&upper, "%I:%M%p"))
        .ok()
}

/// Minutes since midnight for a clock string; unparsable input counts as 0
pub fn minutes_since_midnight(s: &str) -> u32 {
    use chrono::Timelike;
    parse_clock(s).map(|t| t.hour() * 60 + t.minute()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urgent_task_defaults() {
        let task = UrgentTask::from_value(&json!({})).unwrap();
        assert_eq!(task.title, "(no title)");
        assert_eq!(task.source, "calendar");
        assert_eq!(task.priority, 3);
        assert!(task.time.is_none());
        assert!(task.link.is_none());
    }

    #[test]
    fn test_urgent_task_truncation() {
        let long_title = "x".repeat(200);
        let task = UrgentTask::from_value(&json!({
            "title": long_title,
            "source": "a-very-long-source-tag",
        }))
        .unwrap();

        assert_eq!(task.title.chars().count(), 140);
        assert_eq!(task.source.chars().count(), 16);
    }

    #[test]
    fn test_priority_coercion() {
        let task = UrgentTask::from_value(&json!({"priority": "2"})).unwrap();
        assert_eq!(task.priority, 2);

        let task = UrgentTask::from_value(&json!({"priority": 4.0})).unwrap();
        assert_eq!(task.priority, 4);

        // Out of range clamps rather than drops
        let task = UrgentTask::from_value(&json!({"priority": 9})).unwrap();
        assert_eq!(task.priority, 5);

        // Non-numeric drops the candidate
        assert!(UrgentTask::from_value(&json!({"priority": "high"})).is_err());
    }

    #[test]
    fn test_voice_task_defaults_date_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let task = VoiceTask::from_value(&json!({}), today, "rec1").unwrap();

        assert_eq!(task.title, "Untitled Task");
        assert_eq!(task.priority, 3);
        assert_eq!(task.date.as_deref(), Some("2026-03-02"));
        assert_eq!(task.recording_id, "rec1");
        assert_eq!(task.source, "voice");
    }

    #[test]
    fn test_is_today_leniency() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let mut task =
            VoiceTask::from_value(&json!({"title": "t"}), today, "r").unwrap();

        // Matching date
        assert!(task.is_today_on(today));

        // Different date
        task.date = Some("2026-03-03".to_string());
        assert!(!task.is_today_on(today));

        // Absent date defaults to today
        task.date = None;
        assert!(task.is_today_on(today));

        // Unparsable date also defaults to today
        task.date = Some("next tuesday".to_string());
        assert!(task.is_today_on(today));
    }

    #[test]
    fn test_is_not_past_due() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let noon = today.and_hms_opt(12, 0, 0).unwrap();

        let mut task = VoiceTask::from_value(&json!({"title": "t"}), today, "r").unwrap();

        // Today, no time: not past due
        assert!(task.is_not_past_due_at(noon));

        // Today, end time in the past
        task.end_time = Some("11:00".to_string());
        assert!(!task.is_not_past_due_at(noon));

        // Today, end time ahead
        task.end_time = Some("1:00 PM".to_string());
        assert!(task.is_not_past_due_at(noon));

        // Start time only, already passed
        task.end_time = None;
        task.start_time = Some("09:15".to_string());
        assert!(!task.is_not_past_due_at(noon));

        // Yesterday is past due regardless of time
        task.date = Some("2026-03-01".to_string());
        task.start_time = None;
        assert!(!task.is_not_past_due_at(noon));

        // Tomorrow never is
        task.date = Some("2026-03-03".to_string());
        assert!(task.is_not_past_due_at(noon));
    }

    #[test]
    fn test_parse_clock_formats() {
        assert_eq!(
            parse_clock("09:30"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(
            parse_clock("2:15 PM"),
            NaiveTime::from_hms_opt(14, 15, 0)
        );
        assert_eq!(
            parse_clock("2:15pm"),
            NaiveTime::from_hms_opt(14, 15, 0)
        );
        assert_eq!(parse_clock("soonish"), None);
    }

    #[test]
    fn test_minutes_since_midnight_unparsable_is_zero() {
        assert_eq!(minutes_since_midnight("08:00"), 480);
        assert_eq!(minutes_since_midnight("whenever"), 0);
    }

    #[test]
    fn test_voice_task_to_urgent_normalizes_time() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut task = VoiceTask::from_value(
            &json!({"title": "Call dentist", "start_time": "2:30 PM", "priority": 1}),
            today,
            "r",
        )
        .unwrap();

        let urgent = task.to_urgent();
        assert_eq!(urgent.time.as_deref(), Some("14:30"));
        assert_eq!(urgent.source, "voice");
        assert_eq!(urgent.priority, 1);

        // Unparsable time passes through untouched
        task.start_time = Some("after lunch".to_string());
        assert_eq!(task.to_urgent().time.as_deref(), Some("after lunch"));
    }

    #[test]
    fn test_voice_task_serde_roundtrip() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let task = VoiceTask::from_value(
            &json!({"title": "Buy milk", "emoji": "🥛", "priority": 2}),
            today,
            "rec9",
        )
        .unwrap();

        let json = serde_json::to_string(&task).unwrap();
        let parsed: VoiceTask = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }
}

//! Calendar event snapshot.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One calendar entry for today.
///
/// `end > start` is expected but not enforced; the calendar source filters
/// out events with `end <= now` before they reach the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Provider-assigned event ID
    pub id: String,

    /// Event start (zoned)
    pub start: DateTime<Local>,

    /// Event end (zoned)
    pub end: DateTime<Local>,

    /// Event title
    pub title: String,

    /// Location, if any
    pub location: Option<String>,

    /// Video-meeting link, if any
    pub meeting_link: Option<String>,
}

impl CalendarEvent {
    /// Compact one-line form used in the triage prompt: "HH:MM-HH:MM title"
    pub fn prompt_line(&self) -> String {
        format!(
            "- [event] {}-{} {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.title
        )
    }
}

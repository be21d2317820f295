//! Google Calendar adapter.
//!
//! Read-only fetch of today's events with a bearer token. Token acquisition
//! and refresh live outside this crate; the token is handed in from config.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Deserialize;

use crate::domain::CalendarEvent;

use super::CalendarSource;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Calendar API client
pub struct GoogleCalendar {
    token: String,
    api_base: String,
    calendar_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    #[serde(default)]
    id: String,
    summary: Option<String>,
    location: Option<String>,
    #[serde(rename = "hangoutLink")]
    hangout_link: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

impl GoogleCalendar {
    /// Create a client for the primary calendar
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            calendar_id: "primary".to_string(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the API base URL (for tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Parse the events payload, dropping malformed items and anything that
    /// has already ended
    fn parse_events(response: EventsResponse, now: DateTime<Local>) -> Vec<CalendarEvent> {
        let mut events = Vec::new();

        for item in response.items {
            let start = match item.start.as_ref().and_then(parse_event_time) {
                Some(t) => t,
                None => continue,
            };
            let end = match item.end.as_ref().and_then(parse_event_time) {
                Some(t) => t,
                None => continue,
            };

            // Skip events that have already ended
            if end <= now {
                continue;
            }

            events.push(CalendarEvent {
                id: item.id,
                start,
                end,
                title: item.summary.unwrap_or_else(|| "(no title)".to_string()),
                location: item.location,
                meeting_link: item.hangout_link,
            });
        }

        events
    }
}

/// Parse a calendar timestamp: full `dateTime`, or all-day `date` at local
/// midnight
fn parse_event_time(time: &EventTime) -> Option<DateTime<Local>> {
    if let Some(dt) = &time.date_time {
        return DateTime::parse_from_rfc3339(dt)
            .ok()
            .map(|t| t.with_timezone(&Local));
    }

    let date = time.date.as_deref()?;
    let naive = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&naive.and_hms_opt(0, 0, 0)?)
        .single()
}

#[async_trait]
impl CalendarSource for GoogleCalendar {
    async fn today_events(&self) -> Result<Vec<CalendarEvent>> {
        let now = Local::now();
        let today = now.date_naive();

        let day_start = Local
            .from_local_datetime(&today.and_hms_opt(0, 0, 0).unwrap_or_default())
            .single()
            .context("Failed to resolve local midnight")?;
        let day_end = Local
            .from_local_datetime(&today.and_hms_opt(23, 59, 59).unwrap_or_default())
            .single()
            .context("Failed to resolve local end of day")?;

        let url = format!(
            "{}/calendars/{}/events",
            self.api_base, self.calendar_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", day_start.to_rfc3339()),
                ("timeMax", day_end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .context("Calendar events request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Calendar fetch failed with {}: {}", status, body.trim());
        }

        let parsed: EventsResponse = response
            .json()
            .await
            .context("Failed to parse calendar events response")?;

        Ok(Self::parse_events(parsed, now))
    }
}

//! Merge calendar-triaged and voice-extracted tasks into one ranked list.

use crate::domain::{minutes_since_midnight, UrgentTask, VoiceTask};

/// Hard cap on the combined list
pub const MAX_COMBINED: usize = 6;

/// Combine calendar tasks and voice tasks into one list of at most six.
///
/// Ordered ascending by priority, then timed-before-untimed, then by clock
/// time. The sort is stable, so within a tie calendar tasks stay ahead of
/// voice tasks and incoming order is preserved.
pub fn combine_tasks(calendar: Vec<UrgentTask>, voice: &[VoiceTask]) -> Vec<UrgentTask> {
    let mut combined = calendar;
    combined.extend(voice.iter().map(VoiceTask::to_urgent));

    combined.sort_by_key(sort_key);
    combined.truncate(MAX_COMBINED);
    combined
}

/// (priority, 0 if timed else 1, minutes since midnight).
///
/// An unparsable time string counts as minute 0 but still ranks as timed.
fn sort_key(task: &UrgentTask) -> (u8, u8, u32) {
    match task.time.as_deref() {
        Some(time) => (task.priority, 0, minutes_since_midnight(time)),
        None => (task.priority, 1, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use serde_json::json;

    fn urgent(title: &str, priority: u8, time: Option<&str>) -> UrgentTask {
        UrgentTask {
            title: title.to_string(),
            source: "calendar".to_string(),
            time: time.map(|t| t.to_string()),
            priority,
            link: None,
        }
    }

    fn voice(title: &str, priority: u8, start_time: Option<&str>) -> VoiceTask {
        let mut value = json!({"title": title, "priority": priority});
        if let Some(t) = start_time {
            value["start_time"] = json!(t);
        }
        VoiceTask::from_value(&value, Local::now().date_naive(), "r").unwrap()
    }

    #[test]
    fn test_priority_then_time_presence_then_clock() {
        let calendar = vec![
            urgent("p2 late", 2, Some("16:00")),
            urgent("p1 untimed", 1, None),
            urgent("p2 early", 2, Some("09:00")),
            urgent("p1 timed", 1, Some("11:00")),
        ];

        let combined = combine_tasks(calendar, &[]);
        let titles: Vec<_> = combined.iter().map(|t| t.title.as_str()).collect();

        assert_eq!(titles, vec!["p1 timed", "p1 untimed", "p2 early", "p2 late"]);
    }

    #[test]
    fn test_stable_tie_keeps_calendar_first() {
        let calendar = vec![urgent("from calendar", 3, Some("10:00"))];
        let voice_tasks = vec![voice("from voice", 3, Some("10:00 AM"))];

        let combined = combine_tasks(calendar, &voice_tasks);
        let titles: Vec<_> = combined.iter().map(|t| t.title.as_str()).collect();

        assert_eq!(titles, vec!["from calendar", "from voice"]);
    }

    #[test]
    fn test_unparsable_time_sorts_as_midnight() {
        let calendar = vec![
            urgent("timed", 3, Some("08:00")),
            urgent("vague", 3, Some("whenever")),
            urgent("untimed", 3, None),
        ];

        let combined = combine_tasks(calendar, &[]);
        let titles: Vec<_> = combined.iter().map(|t| t.title.as_str()).collect();

        // "whenever" counts as minute 0, ahead of 08:00; untimed ranks last
        assert_eq!(titles, vec!["vague", "timed", "untimed"]);
    }

    #[test]
    fn test_combined_caps_at_six() {
        let calendar: Vec<_> = (0..5).map(|i| urgent(&format!("c{}", i), 3, None)).collect();
        let voice_tasks: Vec<_> = (0..5).map(|i| voice(&format!("v{}", i), 3, None)).collect();

        assert_eq!(combine_tasks(calendar, &voice_tasks).len(), MAX_COMBINED);
    }

    #[test]
    fn test_voice_time_is_normalized() {
        let voice_tasks = vec![voice("afternoon", 1, Some("2:30 PM"))];
        let combined = combine_tasks(Vec::new(), &voice_tasks);

        assert_eq!(combined[0].time.as_deref(), Some("14:30"));
    }
}

//! Voice task store integration tests.

use chrono::{Duration, Local};
use serde_json::json;
use tempfile::TempDir;

use taskwall::domain::VoiceTask;
use taskwall::store::VoiceTaskStore;

fn task(title: &str, recording_id: &str, date: Option<String>) -> VoiceTask {
    let today = Local::now().date_naive();
    let mut value = json!({"title": title});
    if let Some(d) = &date {
        value["date"] = json!(d);
    }
    let mut task = VoiceTask::from_value(&value, today, recording_id).unwrap();
    if date.is_none() {
        task.date = None;
    }
    task
}

#[test]
fn reprocessing_a_recording_replaces_its_tasks() {
    let dir = TempDir::new().unwrap();
    let store = VoiceTaskStore::new(dir.path().join("voice_tasks.json"));

    // First pass for R1
    assert!(store.add_from_recording(&[
        task("Call dentist", "R1", None),
        task("Book flights", "R1", None),
    ]));

    // Unrelated recording
    assert!(store.add_from_recording(&[task("Water plants", "R2", None)]));

    // Second pass for R1 with a different set
    assert!(store.add_from_recording(&[task("Call dentist at 3", "R1", None)]));

    let titles: Vec<_> = store.load_all().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Water plants", "Call dentist at 3"]);
}

#[test]
fn cleanup_drops_month_old_tasks_but_keeps_dateless() {
    let dir = TempDir::new().unwrap();
    let store = VoiceTaskStore::new(dir.path().join("voice_tasks.json"));

    let today = Local::now().date_naive();
    let stale = (today - Duration::days(31)).format("%Y-%m-%d").to_string();
    let fresh = (today - Duration::days(29)).format("%Y-%m-%d").to_string();

    store.save_all(&[
        task("Stale", "r", Some(stale)),
        task("Fresh", "r", Some(fresh)),
        task("No date", "r", None),
        task("Garbled date", "r", Some("whenever".to_string())),
    ]);

    assert!(store.cleanup_old(30));

    let titles: Vec<_> = store.load_all().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Fresh", "No date", "Garbled date"]);
}

#[test]
fn save_load_roundtrip_preserves_tasks() {
    let dir = TempDir::new().unwrap();
    let store = VoiceTaskStore::new(dir.path().join("voice_tasks.json"));

    let today = Local::now().date_naive();
    let original = vec![
        VoiceTask::from_value(
            &json!({
                "title": "Call dentist",
                "description": "ask about invoice",
                "priority": 2,
                "start_time": "2:30 PM",
                "emoji": "🦷",
            }),
            today,
            "rec1",
        )
        .unwrap(),
        task("Plain", "rec2", None),
    ];

    assert!(store.save_all(&original));
    let loaded = store.load_all();
    assert_eq!(loaded, original);

    // Saving what was loaded converges, aside from the timestamp
    assert!(store.save_all(&loaded));
    assert_eq!(store.load_all(), original);
}

#[test]
fn corrupt_store_degrades_to_empty_and_recovers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("voice_tasks.json");
    std::fs::write(&path, "]]] not json").unwrap();

    let store = VoiceTaskStore::new(&path);
    assert!(store.load_all().is_empty());

    // A later save overwrites the damage
    assert!(store.add_from_recording(&[task("Recovered", "r", None)]));
    assert_eq!(store.load_all().len(), 1);
}

//! Data structures for the task pipeline.
//!
//! - `CalendarEvent`: immutable snapshot of one calendar entry
//! - `UrgentTask`: short-lived ranked action item, recomputed every cycle
//! - `VoiceTask`: persisted task extracted from a voice recording
//! - `DisplayItem`: pre-formatted line handed to the layout engine
//! - `Recording`: metadata for one captured audio file

pub mod event;
pub mod recording;
pub mod task;

pub use event::CalendarEvent;
pub use recording::Recording;
pub use task::{
    minutes_since_midnight, parse_clock, DisplayItem, ItemKind, ParseError, UrgentTask, VoiceTask,
};

//! Pure layout computation for the wallpaper card.
//!
//! Everything here is a function of the inputs, the geometry, and a
//! text-measure callback; no fonts or pixels. Tests drive it with a fake
//! measurer, rasterization consumes the resulting plan.

use chrono::NaiveDate;

use crate::domain::{CalendarEvent, DisplayItem, ItemKind, UrgentTask};

/// Fixed outer margin in pixels (2 inches at 72 DPI)
pub const MARGIN: u32 = 144;

/// Card width ceiling
pub const MAX_CARD_WIDTH: u32 = 600;

/// Card height floor and ceiling
pub const MIN_CARD_HEIGHT: u32 = 150;
pub const MAX_CARD_HEIGHT: u32 = 700;

/// Most items a card will show
pub const MAX_ITEMS: usize = 6;

/// Continuation-line indent for wrapped text
pub const WRAP_INDENT: u32 = 24;

pub const EMPTY_NO_EVENTS: &str = "You're all set for the day! 🌟";
pub const EMPTY_NOTHING_URGENT: &str = "No urgent items right now ✨";

pub const CARD_TITLE: &str = "Today's Agenda";

/// RGBA color
pub type Color = [u8; 4];

const WHITE: Color = [255, 255, 255, 255];
const LIGHT_GREEN: Color = [185, 255, 185, 255];
const LIGHT_BLUE: Color = [200, 220, 255, 255];

/// Measures the pixel width of `text` at a font size
pub trait TextMeasure {
    fn width(&self, text: &str, size: f32) -> u32;
}

impl<F: Fn(&str, f32) -> u32> TextMeasure for F {
    fn width(&self, text: &str, size: f32) -> u32 {
        self(text, size)
    }
}

/// One positioned run of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub size: f32,
    pub color: Color,
    pub shadow_offset: i32,
}

/// One priority marker
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    pub cx: i32,
    pub cy: i32,
    pub radius: i32,
    pub color: Color,
}

/// Card rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub radius: i32,
}

/// A complete, positioned rendering plan
#[derive(Debug, Clone)]
pub struct LayoutPlan {
    pub width: u32,
    pub height: u32,
    pub card: Card,
    pub texts: Vec<TextRun>,
    pub dots: Vec<Dot>,
}

/// Base font size for a wallpaper of the given geometry
pub fn base_font_size(width: u32, height: u32) -> u32 {
    (width.min(height) / 70).clamp(16, 28)
}

/// Priority 1 (green) through 5 (red); anything else gets the neutral blue
pub fn priority_color(priority: u8) -> Color {
    match priority {
        1 => [100, 200, 100, 255],
        2 => [150, 200, 100, 255],
        3 => [200, 200, 100, 255],
        4 => [255, 180, 100, 255],
        5 => [255, 120, 120, 255],
        _ => [100, 150, 255, 255],
    }
}

/// Choose what the card shows: triaged tasks when there are any, otherwise
/// raw events, at most six either way.
pub fn prepare_display_items(tasks: &[UrgentTask], events: &[CalendarEvent]) -> Vec<DisplayItem> {
    if !tasks.is_empty() {
        return tasks
            .iter()
            .take(MAX_ITEMS)
            .map(|task| {
                let when = task
                    .time
                    .as_deref()
                    .map(|t| format!("{} • ", t))
                    .unwrap_or_default();
                DisplayItem {
                    text: format!("{}{}", when, task.title),
                    source: task.source.clone(),
                    priority: task.priority,
                    kind: ItemKind::Task,
                }
            })
            .collect();
    }

    events
        .iter()
        .take(MAX_ITEMS)
        .map(|event| DisplayItem {
            text: format!(
                "{}–{}  {}",
                event.start.format("%H:%M"),
                event.end.format("%H:%M"),
                event.title
            ),
            source: "calendar".to_string(),
            priority: 3,
            kind: ItemKind::Event,
        })
        .collect()
}

/// Greedy word wrap at `max_width` pixels
pub fn wrap_text(text: &str, size: f32, max_width: u32, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let test = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure.width(&test, size) <= max_width || current.is_empty() {
            current = test;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Compute the full rendering plan.
///
/// `events_were_empty` selects the empty-state message when there is nothing
/// to show: a calm "all set" when the calendar itself was empty, a gentler
/// "nothing urgent" when events exist but nothing made the cut.
pub fn compute_layout(
    items: &[DisplayItem],
    events_were_empty: bool,
    (width, height): (u32, u32),
    date: NaiveDate,
    measure: &dyn TextMeasure,
) -> LayoutPlan {
    let base = base_font_size(width, height) as f32;

    let title_size = base * 3.0;
    let h1 = base * 2.2;
    let h2 = base * 1.6;

    let mut texts = Vec::new();
    let mut dots = Vec::new();

    // Header: today's date, top-left at the margin
    texts.push(TextRun {
        x: MARGIN as i32,
        y: MARGIN as i32,
        text: date.format("%A, %b %d").to_string(),
        size: title_size,
        color: WHITE,
        shadow_offset: 3,
    });

    // Card geometry
    let available = width.saturating_sub(2 * MARGIN);
    let card_width = MAX_CARD_WIDTH.min(available);
    let left = (MARGIN + (available - card_width) / 2) as i32;
    let top = (MARGIN + (base * 5.0) as u32) as i32;
    let pad = base * 1.5;
    let line_height = (h2 * 1.4) as i32;

    let total_items = items.len().max(1) as u32;
    let content_height =
        (pad * 3.5) as u32 + total_items * line_height as u32 + (base * 2.0) as u32;
    let card_height = content_height.clamp(MIN_CARD_HEIGHT, MAX_CARD_HEIGHT);

    let card = Card {
        x: left,
        y: top,
        width: card_width,
        height: card_height,
        radius: 28,
    };

    // Card title
    texts.push(TextRun {
        x: left + pad as i32,
        y: top + pad as i32,
        text: CARD_TITLE.to_string(),
        size: h1,
        color: WHITE,
        shadow_offset: 2,
    });

    let mut y = top + (pad * 3.0) as i32;
    let list_left = left + (pad * 1.2) as i32;
    let text_width = card_width.saturating_sub((pad * 2.4) as u32);

    if items.is_empty() {
        let (message, color) = if events_were_empty {
            (EMPTY_NO_EVENTS, LIGHT_GREEN)
        } else {
            (EMPTY_NOTHING_URGENT, LIGHT_BLUE)
        };

        texts.push(TextRun {
            x: list_left,
            y,
            text: message.to_string(),
            size: h2,
            color,
            shadow_offset: 1,
        });

        return LayoutPlan { width, height, card, texts, dots };
    }

    for item in items {
        if item.kind == ItemKind::Task {
            dots.push(Dot {
                cx: list_left - 12,
                cy: y + (h2 * 0.3) as i32,
                radius: 4,
                color: priority_color(item.priority),
            });
        }

        for (idx, line) in wrap_text(&item.text, h2, text_width, measure).iter().enumerate() {
            let indent = if idx == 0 { 0 } else { WRAP_INDENT as i32 };
            texts.push(TextRun {
                x: list_left + indent,
                y,
                text: line.clone(),
                size: h2,
                color: WHITE,
                shadow_offset: 1,
            });
            y += line_height;
        }

        y += (h2 * 0.2) as i32;
    }

    LayoutPlan { width, height, card, texts, dots }
}

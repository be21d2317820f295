//! Wallpaper rendering: layout planning plus PNG rasterization.
//!
//! `layout` is pure and fully testable; `draw` and `font` touch pixels and
//! the filesystem. `render_wallpaper` wires the three together.

pub mod draw;
pub mod font;
pub mod layout;

use std::path::Path;

use ab_glyph::PxScale;
use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::domain::{CalendarEvent, UrgentTask};

pub use layout::{compute_layout, prepare_display_items, LayoutPlan};

/// Render the task card onto a wallpaper-sized PNG at `out_path`.
pub fn render_wallpaper(
    tasks: &[UrgentTask],
    events: &[CalendarEvent],
    size: (u32, u32),
    out_path: &Path,
) -> Result<()> {
    let font = font::load_font()?;

    let measure = |text: &str, px: f32| {
        imageproc::drawing::text_size(PxScale::from(px), &font, text).0
    };

    let items = prepare_display_items(tasks, events);
    let plan = compute_layout(
        &items,
        events.is_empty(),
        size,
        Local::now().date_naive(),
        &measure,
    );

    let img = draw::rasterize(&plan, &font);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    image::DynamicImage::ImageRgba8(img)
        .to_rgb8()
        .save(out_path)
        .with_context(|| format!("Failed to write wallpaper {}", out_path.display()))?;

    info!("Rendered {} items to {}", items.len(), out_path.display());
    Ok(())
}

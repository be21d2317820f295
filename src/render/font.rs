//! System font discovery.

use std::path::Path;

use ab_glyph::FontVec;
use anyhow::{Context, Result};
use tracing::debug;

// macOS system faces first, then the common Linux installs
const FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/SFNS.ttf",
    "/System/Library/Fonts/SFNSDisplay.ttf",
    "/System/Library/Fonts/SFNSRounded.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

/// Load the first usable system font.
///
/// An explicit `TASKWALL_FONT` path wins over the candidate list.
pub fn load_font() -> Result<FontVec> {
    if let Ok(path) = std::env::var("TASKWALL_FONT") {
        return load_from(Path::new(&path))
            .with_context(|| format!("Failed to load font from TASKWALL_FONT={}", path));
    }

    for candidate in FONT_CANDIDATES {
        let path = Path::new(candidate);
        if !path.exists() {
            continue;
        }
        match load_from(path) {
            Ok(font) => {
                debug!("Using font {}", candidate);
                return Ok(font);
            }
            Err(e) => debug!("Skipping font {}: {:#}", candidate, e),
        }
    }

    anyhow::bail!("No usable system font found")
}

fn load_from(path: &Path) -> Result<FontVec> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read font file {}", path.display()))?;

    // Index 0 also covers .ttc collections
    FontVec::try_from_vec_and_index(data, 0)
        .with_context(|| format!("Failed to parse font {}", path.display()))
}

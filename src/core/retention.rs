//! Keep-N cleanup for generated artifacts.
//!
//! Wallpapers and recordings accumulate forever otherwise. Cleanup keeps the
//! N most recently modified files; a file named as currently in use is never
//! deleted regardless of its age.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::Local;
use glob::glob;
use tracing::{debug, warn};

/// Timestamped output path for a new wallpaper
pub fn generate_wallpaper_filename(dir: &Path) -> PathBuf {
    dir.join(format!("wall-{}.png", Local::now().format("%Y%m%d-%H%M%S")))
}

/// Remove old wallpapers, keeping the `keep` newest plus `current`
pub fn cleanup_wallpapers(dir: &Path, keep: usize, current: Option<&Path>) -> Result<usize> {
    cleanup_matching(dir, &["wall-*.png"], keep, current)
}

/// Remove old recordings, keeping the `keep` newest plus `in_use`
pub fn cleanup_recordings(dir: &Path, keep: usize, in_use: Option<&Path>) -> Result<usize> {
    cleanup_matching(dir, &["*.m4a", "*.wav", "*.mp3"], keep, in_use)
}

fn cleanup_matching(
    dir: &Path,
    patterns: &[&str],
    keep: usize,
    protect: Option<&Path>,
) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut files: Vec<(PathBuf, SystemTime)> = Vec::new();

    for pattern in patterns {
        let full = dir.join(pattern);
        let full = full.to_str().context("Non-UTF-8 artifact directory")?;

        for entry in glob(full).context("Invalid artifact glob")? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable artifact: {}", e);
                    continue;
                }
            };
            let modified = match path.metadata().and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(_) => continue,
            };
            files.push((path, modified));
        }
    }

    // Newest first
    files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in files.into_iter().skip(keep) {
        if protect.is_some_and(|p| p == path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed old artifact {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn touch_with_age(dir: &Path, name: &str, age_secs: i64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        let mtime = FileTime::from_unix_time(
            FileTime::now().unix_seconds() - age_secs,
            0,
        );
        set_file_mtime(&path, mtime).unwrap();
        path
    }

    #[test]
    fn test_keeps_newest_n() {
        let dir = TempDir::new().unwrap();
        let oldest = touch_with_age(dir.path(), "wall-1.png", 300);
        let middle = touch_with_age(dir.path(), "wall-2.png", 200);
        let newest = touch_with_age(dir.path(), "wall-3.png", 100);

        let removed = cleanup_wallpapers(dir.path(), 2, None).unwrap();

        assert_eq!(removed, 1);
        assert!(!oldest.exists());
        assert!(middle.exists());
        assert!(newest.exists());
    }

    #[test]
    fn test_current_is_kept_regardless_of_age() {
        let dir = TempDir::new().unwrap();
        let ancient = touch_with_age(dir.path(), "wall-old.png", 1000);
        touch_with_age(dir.path(), "wall-a.png", 100);
        touch_with_age(dir.path(), "wall-b.png", 50);

        let removed = cleanup_wallpapers(dir.path(), 2, Some(&ancient)).unwrap();

        assert_eq!(removed, 0);
        assert!(ancient.exists());
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        let note = touch_with_age(dir.path(), "notes.txt", 500);
        touch_with_age(dir.path(), "wall-1.png", 100);

        let removed = cleanup_wallpapers(dir.path(), 1, None).unwrap();

        assert_eq!(removed, 0);
        assert!(note.exists());
    }

    #[test]
    fn test_missing_directory_is_noop() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_wallpapers(&missing, 3, None).unwrap(), 0);
    }

    #[test]
    fn test_recordings_cleanup_spans_extensions() {
        let dir = TempDir::new().unwrap();
        let old_m4a = touch_with_age(dir.path(), "a.m4a", 400);
        touch_with_age(dir.path(), "b.wav", 200);
        touch_with_age(dir.path(), "c.mp3", 100);

        let removed = cleanup_recordings(dir.path(), 2, None).unwrap();

        assert_eq!(removed, 1);
        assert!(!old_m4a.exists());
    }
}

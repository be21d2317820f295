//! Refresh cycle and artifact retention.

pub mod refresh;
pub mod retention;

pub use refresh::{EngineStatus, RefreshEngine};
pub use retention::{cleanup_recordings, cleanup_wallpapers, generate_wallpaper_filename};

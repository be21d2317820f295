//! Configuration for taskwall paths and settings.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (TASKWALL_HOME, OPENAI_API_KEY, GOOGLE_CALENDAR_TOKEN)
//! 2. Config file (.taskwall/config.yaml)
//! 3. Defaults (~/.taskwall)
//!
//! Config file discovery:
//! - Searches current directory and parents for .taskwall/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub refresh: Option<RefreshConfig>,
    #[serde(default)]
    pub retention: Option<RetentionConfig>,
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
    /// Optional shell command run after each render; "{path}" is replaced
    /// with the wallpaper file path
    #[serde(default)]
    pub wallpaper_command: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub interval_seconds: Option<u64>,
    /// Screen size used when none is supplied, "WIDTHxHEIGHT"
    pub fallback_screen: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub wallpapers_keep: Option<usize>,
    pub recordings_keep: Option<usize>,
    pub voice_task_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub openai_api_key: Option<String>,
    pub google_calendar_token: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to taskwall home (state directory)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Refresh settings
    pub refresh: RefreshSettings,
    /// Retention settings
    pub retention: RetentionSettings,
    /// Classifier/transcription credential
    pub openai_api_key: Option<String>,
    /// Calendar bearer token
    pub google_calendar_token: Option<String>,
    /// Post-render shell hook
    pub wallpaper_command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub interval_seconds: u64,
    pub fallback_screen: (u32, u32),
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            fallback_screen: (1920, 1080),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetentionSettings {
    pub wallpapers_keep: usize,
    pub recordings_keep: usize,
    pub voice_task_days: i64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            wallpapers_keep: 3,
            recordings_keep: 10,
            voice_task_days: 30,
        }
    }
}

impl ResolvedConfig {
    /// Directory holding rendered wallpaper artifacts
    pub fn wallpapers_dir(&self) -> PathBuf {
        self.home.join("wallpapers")
    }

    /// Directory holding captured audio recordings
    pub fn recordings_dir(&self) -> PathBuf {
        self.home.join("recordings")
    }

    /// Path to the voice task store file
    pub fn voice_tasks_path(&self) -> PathBuf {
        self.home.join("voice_tasks.json")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".taskwall").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn parse_screen(spec: &str) -> Option<(u32, u32)> {
    let (w, h) = spec.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".taskwall");

    let config_path = find_config_file();
    let file = match &config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let home = if let Ok(env_home) = std::env::var("TASKWALL_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(path), Some(home_rel)) = (&config_path, &file.paths.home) {
        let config_dir = path.parent().unwrap_or(Path::new("."));
        resolve_path(config_dir, home_rel)
    } else {
        default_home
    };

    let defaults = RefreshSettings::default();
    let refresh = RefreshSettings {
        interval_seconds: file
            .refresh
            .as_ref()
            .and_then(|r| r.interval_seconds)
            .unwrap_or(defaults.interval_seconds),
        fallback_screen: file
            .refresh
            .as_ref()
            .and_then(|r| r.fallback_screen.as_deref())
            .and_then(parse_screen)
            .unwrap_or(defaults.fallback_screen),
    };

    let retention_defaults = RetentionSettings::default();
    let retention = RetentionSettings {
        wallpapers_keep: file
            .retention
            .as_ref()
            .and_then(|r| r.wallpapers_keep)
            .unwrap_or(retention_defaults.wallpapers_keep),
        recordings_keep: file
            .retention
            .as_ref()
            .and_then(|r| r.recordings_keep)
            .unwrap_or(retention_defaults.recordings_keep),
        voice_task_days: file
            .retention
            .as_ref()
            .and_then(|r| r.voice_task_days)
            .unwrap_or(retention_defaults.voice_task_days),
    };

    let openai_api_key = std::env::var("OPENAI_API_KEY").ok().or_else(|| {
        file.credentials
            .as_ref()
            .and_then(|c| c.openai_api_key.clone())
    });

    let google_calendar_token = std::env::var("GOOGLE_CALENDAR_TOKEN").ok().or_else(|| {
        file.credentials
            .as_ref()
            .and_then(|c| c.google_calendar_token.clone())
    });

    Ok(ResolvedConfig {
        home,
        config_file: config_path,
        refresh,
        retention,
        openai_api_key,
        google_calendar_token,
        wallpaper_command: file.wallpaper_command,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Persist the classifier API key into the config file.
///
/// Writes to the discovered config file, or creates `~/.taskwall/config.yaml`
/// when none exists. The in-memory cache is not touched; callers that need
/// the new key immediately should `reconfigure` their classifier instead.
pub fn save_api_key(api_key: &str) -> Result<PathBuf> {
    let path = find_config_file().map(Ok::<_, anyhow::Error>).unwrap_or_else(|| {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".taskwall").join("config.yaml"))
    })?;

    let mut file = if path.exists() {
        load_config_file(&path)?
    } else {
        ConfigFile::default()
    };

    file.credentials
        .get_or_insert_with(CredentialsConfig::default)
        .openai_api_key = Some(api_key.to_string());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(&file)?;
    std::fs::write(&path, yaml)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(path)
}

// ============================================================================
// Convenience functions
// ============================================================================

/// Get the taskwall home directory (state)
pub fn taskwall_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the wallpapers directory ($TASKWALL_HOME/wallpapers)
pub fn wallpapers_dir() -> Result<PathBuf> {
    Ok(config()?.wallpapers_dir())
}

/// Get the recordings directory ($TASKWALL_HOME/recordings)
pub fn recordings_dir() -> Result<PathBuf> {
    Ok(config()?.recordings_dir())
}

/// Get the voice task store path ($TASKWALL_HOME/voice_tasks.json)
pub fn voice_tasks_path() -> Result<PathBuf> {
    Ok(config()?.voice_tasks_path())
}

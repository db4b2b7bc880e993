//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default backend base URL when `OVERLAY_ASSIST_BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Default model requested from the backend.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

fn env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Window-level coordination timing.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Pause after lowering windows so the platform applies the level change
    /// before an OS dialog can appear.
    pub settle_delay: Duration,
    /// Minimum wait before restoring levels after a dialog.
    pub restore_min_delay: Duration,
    /// One-shot safety timer armed by `enable_safety_restore`.
    pub safety_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(150),
            restore_min_delay: Duration::from_millis(500),
            safety_timeout: Duration::from_secs(30),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            settle_delay: env_millis("OVERLAY_ASSIST_SETTLE_MS", defaults.settle_delay),
            restore_min_delay: env_millis(
                "OVERLAY_ASSIST_RESTORE_DELAY_MS",
                defaults.restore_min_delay,
            ),
            safety_timeout: env_millis("OVERLAY_ASSIST_SAFETY_TIMEOUT_MS", defaults.safety_timeout),
        }
    }
}

/// Permission completion polling.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    /// Extra wait after a status change for the OS dialog to finish closing.
    pub dismiss_settle: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_wait: Duration::from_secs(30),
            dismiss_settle: Duration::from_millis(1000),
        }
    }
}

impl DetectorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: env_millis("OVERLAY_ASSIST_POLL_INTERVAL_MS", defaults.poll_interval),
            max_wait: env_millis("OVERLAY_ASSIST_PERMISSION_WAIT_MS", defaults.max_wait),
            dismiss_settle: defaults.dismiss_settle,
        }
    }
}

/// Limits applied while ingesting a streamed body.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Give up if no bytes arrive for this long.
    pub idle_timeout: Duration,
    /// Longest line accepted, complete or still buffered.
    pub max_buffer_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(60),
            max_buffer_bytes: 4 * 1024 * 1024,
        }
    }
}

impl StreamConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            idle_timeout: env_millis("OVERLAY_ASSIST_STREAM_IDLE_MS", defaults.idle_timeout),
            ..defaults
        }
    }
}

/// HTTP backend settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub auth_token: Option<SecretString>,
    pub model: String,
    pub chat_path: String,
    pub screenshot_path: String,
    pub connect_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            auth_token: None,
            model: DEFAULT_MODEL.to_string(),
            chat_path: "/api/chat_protected".to_string(),
            screenshot_path: "/api/screenshot_protected".to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let base_url = std::env::var("OVERLAY_ASSIST_BACKEND_URL")
            .unwrap_or(defaults.base_url)
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "OVERLAY_ASSIST_BACKEND_URL".into(),
                message: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }

        let auth_token = std::env::var("OVERLAY_ASSIST_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(SecretString::from);

        let model = std::env::var("OVERLAY_ASSIST_MODEL").unwrap_or(defaults.model);
        let chat_path = endpoint_path(
            "OVERLAY_ASSIST_CHAT_PATH",
            std::env::var("OVERLAY_ASSIST_CHAT_PATH").ok(),
            defaults.chat_path,
        )?;
        let screenshot_path = endpoint_path(
            "OVERLAY_ASSIST_SCREENSHOT_PATH",
            std::env::var("OVERLAY_ASSIST_SCREENSHOT_PATH").ok(),
            defaults.screenshot_path,
        )?;

        Ok(Self {
            base_url,
            auth_token,
            model,
            chat_path,
            screenshot_path,
            connect_timeout: defaults.connect_timeout,
        })
    }
}

/// An endpoint override must be an absolute path on the backend.
fn endpoint_path(key: &str, value: Option<String>, default: String) -> Result<String, ConfigError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    if !value.starts_with('/') {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a path starting with '/', got '{value}'"),
        });
    }
    Ok(value)
}

/// Update lifecycle settings.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Version of the running binary.
    pub current_version: String,
    /// Delay between the "downloaded" notice and the restart.
    pub install_delay: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            install_delay: Duration::from_secs(2),
        }
    }
}

/// Where the binary keeps logs and the persisted preferences file.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub log_dir: Option<PathBuf>,
    pub preferences_path: PathBuf,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        let log_dir = std::env::var("OVERLAY_ASSIST_LOG_DIR").ok().map(PathBuf::from);
        let preferences_path = std::env::var("OVERLAY_ASSIST_PREFERENCES")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".overlay-assist/preferences.json")
            });
        Self {
            log_dir,
            preferences_path,
        }
    }
}

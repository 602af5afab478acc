//! Configuration management for spoolkeeper

pub mod schema;

pub use schema::Config;

use crate::error::{SpoolError, SpoolResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const APP_DIR: &str = "spoolkeeper";

/// Environment variables naming a login, terminal or SSH session
const SESSION_VARS: &[&str] = &["XDG_SESSION_ID", "TERM_SESSION_ID", "WT_SESSION", "SSH_CONNECTION"];

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Get the long-lived state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Get the session-scoped directory path
    ///
    /// Lives under the login session's runtime directory where one exists,
    /// so its contents disappear when the session ends. The directory name
    /// carries the session identity for platforms without one.
    pub fn session_dir() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("{}-{}", APP_DIR, Self::session_id()))
    }

    /// Identity of the current user session
    pub fn session_id() -> String {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();

        let mut parts = vec![format!("user={}", user)];
        parts.extend(boot_id().map(|id| format!("boot={}", id)));
        parts.extend(session_markers());
        Self::session_id_from(&parts)
    }

    /// Short stable digest of the session parts
    fn session_id_from(parts: &[String]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())[..16].to_string()
    }

    /// Get the image store directory path
    pub fn image_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
            .join("images")
    }

    /// Resolve the stock file, honouring the config override
    pub fn stock_path(config: &Config) -> PathBuf {
        config
            .inventory
            .state_dir
            .clone()
            .unwrap_or_else(Self::state_dir)
            .join("inventory.json")
    }

    /// Resolve the queue file, honouring the config override
    pub fn queue_path(config: &Config) -> PathBuf {
        config
            .inventory
            .session_dir
            .clone()
            .unwrap_or_else(Self::session_dir)
            .join("queue.json")
    }

    /// Resolve the image store directory, honouring the config override
    pub fn images_path(config: &Config) -> PathBuf {
        config
            .images
            .cache_dir
            .clone()
            .unwrap_or_else(Self::image_cache_dir)
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> SpoolResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SpoolResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SpoolError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| SpoolError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> SpoolResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SpoolError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> SpoolResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SpoolError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the inventory state directories exist
    pub async fn ensure_state_dirs(config: &Config) -> SpoolResult<()> {
        let dirs = [Self::stock_path(config), Self::queue_path(config)];

        for dir in dirs.iter().filter_map(|p| p.parent()) {
            fs::create_dir_all(dir).await.map_err(|e| {
                SpoolError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        // The session directory may sit in a shared temp dir
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(session_dir) = Self::queue_path(config).parent() {
                let perms = std::fs::Permissions::from_mode(0o700);
                std::fs::set_permissions(session_dir, perms)
                    .map_err(|e| SpoolError::io("setting session dir permissions", e))?;
            }
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

/// Current boot, so a reboot always starts a new session
fn boot_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/random/boot_id")
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Whatever the platform exposes about the login session
///
/// Falls back to the parent process (normally the user's shell) when no
/// session marker is available.
fn session_markers() -> Vec<String> {
    let mut markers: Vec<String> = SESSION_VARS
        .iter()
        .filter_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}={}", var, value))
        })
        .collect();

    #[cfg(target_os = "linux")]
    {
        // 4294967295 means the process is outside any audited login
        if let Ok(id) = std::fs::read_to_string("/proc/self/sessionid") {
            let id = id.trim();
            if !id.is_empty() && id != "4294967295" {
                markers.push(format!("audit={}", id));
            }
        }
    }

    #[cfg(unix)]
    {
        if markers.is_empty() {
            markers.push(format!("parent={}", std::os::unix::process::parent_id()));
        }
    }

    markers
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

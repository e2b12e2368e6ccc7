//! Settings for rclctl itself.
//!
//! Loads from /etc/rcl/rclctl.toml (or an explicit path) and falls back to
//! built-in defaults. Netblocks, endpoints and the configuration schema are
//! not settings; they ship with the tool.

use crate::error::{RclError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Settings file path
pub const SETTINGS_PATH: &str = "/etc/rcl/rclctl.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Persisted container configuration consumed by the sibling tool
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,

    /// Where run logs are written
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Where previous configuration files are kept
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_runtime_bin")]
    pub runtime_bin: PathBuf,

    #[serde(default = "default_network_manager_bin")]
    pub network_manager_bin: PathBuf,

    /// Entry point of the sibling install/run tool
    #[serde(default = "default_sibling_tool")]
    pub sibling_tool: PathBuf,

    /// The only identity allowed to run the bring-up
    #[serde(default = "default_operator_user")]
    pub operator_user: String,

    /// Substring identifying our image and container instances
    #[serde(default = "default_image_match")]
    pub image_match: String,

    /// TCP port probed on every endpoint
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_config_file() -> PathBuf {
    PathBuf::from("rclmgr.yml")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_runtime_bin() -> PathBuf {
    PathBuf::from("/bin/podman")
}

fn default_network_manager_bin() -> PathBuf {
    PathBuf::from("/bin/nmcli")
}

fn default_sibling_tool() -> PathBuf {
    PathBuf::from("./rclmgr")
}

fn default_operator_user() -> String {
    "rcladmin".to_string()
}

fn default_image_match() -> String {
    "rcl-official".to_string()
}

fn default_probe_port() -> u16 {
    22
}

fn default_probe_timeout() -> u64 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            log_dir: default_log_dir(),
            backup_dir: default_backup_dir(),
            runtime_bin: default_runtime_bin(),
            network_manager_bin: default_network_manager_bin(),
            sibling_tool: default_sibling_tool(),
            operator_user: default_operator_user(),
            image_match: default_image_match(),
            probe_port: default_probe_port(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the system path is used when
    /// present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(SETTINGS_PATH);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    debug!("No settings at {}, using defaults", SETTINGS_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RclError::Settings(format!("{}: {}", path.display(), e)))?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| RclError::Settings(format!("{}: {}", path.display(), e)))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.config_file, PathBuf::from("rclmgr.yml"));
        assert_eq!(s.operator_user, "rcladmin");
        assert_eq!(s.probe_port, 22);
        assert_eq!(s.probe_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "probe_port = 2222\nimage_match = \"rcl-test\"").unwrap();

        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.probe_port, 2222);
        assert_eq!(s.image_match, "rcl-test");
        assert_eq!(s.runtime_bin, PathBuf::from("/bin/podman"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/rclctl.toml"))).unwrap_err();
        assert!(matches!(err, RclError::Settings(_)));
    }
}

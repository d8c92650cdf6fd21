/// Centralized platform-specific path computation
///
/// Provides consistent path handling across Windows, macOS, and Linux following
/// XDG Base Directory specification on Unix-like systems.
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "review-rag";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate data directory for the current platform
    ///
    /// - Windows: %LOCALAPPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_DATA_HOME or ~/.local/share
    pub fn data_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("LOCALAPPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            // Linux/Unix - follow XDG Base Directory specification
            std::env::var("XDG_DATA_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    std::env::var("HOME").map(|home| PathBuf::from(home).join(".local/share"))
                })
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Get the appropriate config directory for the current platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Default data directory for this application
    pub fn default_data_dir() -> PathBuf {
        Self::data_dir().join(APP_DIR)
    }

    /// Default config file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join(APP_DIR).join("config.toml")
    }
}

/// Hash a normalized root path to a short, filesystem-safe identifier
pub fn root_id(normalized_root: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_root.as_bytes());
    // First 16 hex characters are plenty to keep roots apart
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Location of the Lance database under the data directory
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("db")
}

/// Collection name for one indexed root
pub fn collection_for_root(normalized_root: &str) -> String {
    format!("chunks_{}", root_id(normalized_root))
}

/// Manifest path for one indexed root
pub fn manifest_path_for_root(data_dir: &Path, normalized_root: &str) -> PathBuf {
    data_dir
        .join("manifests")
        .join(format!("{}.json", root_id(normalized_root)))
}

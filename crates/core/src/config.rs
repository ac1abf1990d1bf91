//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum buffered request body size in bytes; larger uploads are
    /// rejected at the boundary instead of being accepted partially.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Token id size in bytes.
    #[serde(default = "default_token_id_size")]
    pub token_id_size: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_token_id_size() -> usize {
    crate::DEFAULT_ID_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            token_id_size: default_token_id_size(),
        }
    }
}

/// Blob storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/storage")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Token store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Database file path.
    #[serde(default = "default_metadata_path")]
    pub path: PathBuf,
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("./data/tokens.redb")
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: default_metadata_path(),
        }
    }
}

/// Session credentials for the authenticated endpoints (`/list`, `/create`).
///
/// The transfer endpoints (`/single`, `/transfer`, `/download`) are
/// intentionally unauthenticated: possession of a token id in the URL is the
/// capability. Only the token-management surface sits behind this credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username; also used as the session cookie name.
    pub user: String,
    /// Password; also used as the session cookie value.
    pub pass: String,
}

impl AuthConfig {
    /// Create a test configuration with dummy credentials.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            user: "user".to_string(),
            pass: "pass".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Session credentials (required).
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses default paths and dummy credentials.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            metadata: MetadataConfig::default(),
            auth: AuthConfig::for_testing(),
        }
    }
}

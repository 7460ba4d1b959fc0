//! Typed configuration structures
//!
//! Every section has defaults, so an empty file (or no file) yields a
//! working local setup: widget on :3000 talking to the store server on :8000.

use crate::logging::LoggingConfig;
use crate::store::rest::DEFAULT_REST_BASE_URL;
use crate::voting::Video;
use serde::{Deserialize, Serialize};

/// Default port of the voting web front end
pub const DEFAULT_PORT: u16 = 3000;

/// Default port of the bundled store server
pub const DEFAULT_STORE_PORT: u16 = 8000;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Web front end
    pub server: ServerConfig,
    /// Widget behaviour and media
    pub widget: WidgetConfig,
    /// Backend the widget talks to
    pub store: StoreConfig,
    /// Bundled REST store server
    pub store_server: StoreServerConfig,
    /// Logging
    pub logging: LoggingConfig,
}

/// Web front end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Externally visible base URL; defaults to `http://<bind>:<port>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Idle page sessions are dropped after this many seconds
    pub session_ttl_seconds: u64,
    /// Upper bound on live page sessions; the least recently used is evicted
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            public_url: None,
            session_ttl_seconds: 3600,
            max_sessions: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.bind, self.port))
    }
}

/// Widget settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    /// Page heading
    pub title: String,
    /// The video that is defined as the liar
    pub designated_liar: Video,
    pub video1_url: String,
    pub video2_url: String,
    /// Write an audit entry when an admin session is opened
    pub audit_admin_access: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            title: "Deception Detection".to_string(),
            designated_liar: Video::Video1,
            video1_url: "/assets/Liar.mp4".to_string(),
            video2_url: "/assets/Truth.mp4".to_string(),
            audit_admin_access: true,
        }
    }
}

impl WidgetConfig {
    pub fn video_url(&self, video: Video) -> &str {
        match video {
            Video::Video1 => &self.video1_url,
            Video::Video2 => &self.video2_url,
        }
    }
}

/// Store backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "camelCase")]
pub enum StoreConfig {
    /// JSON REST service (e.g. the bundled store server)
    #[serde(rename_all = "camelCase")]
    Rest {
        base_url: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
    /// Hosted PostgREST-style backend
    #[serde(rename_all = "camelCase")]
    Baas {
        url: String,
        api_key: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
    /// In-process store; votes are lost on restart
    #[serde(rename_all = "camelCase")]
    Memory { admin_secret: String },
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Rest {
            base_url: DEFAULT_REST_BASE_URL.to_string(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Bundled store server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreServerConfig {
    pub bind: String,
    pub port: u16,
    /// Secret handed out by `GET /adminAccess`
    pub admin_secret: Option<String>,
}

impl Default for StoreServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_STORE_PORT,
            admin_secret: None,
        }
    }
}

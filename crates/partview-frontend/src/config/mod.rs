//! Application configuration module
//!
//! This module handles application-wide configuration including the document
//! service connection, renderer settings and UI settings.

mod manager;

pub use manager::{ConfigError, ConfigManager, SharedConfig, create_shared_config};

use partview_renderer::config::RendererConfig;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured API token
pub const TOKEN_ENV_VAR: &str = "PARTVIEW_TOKEN";

/// Document service connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the PDM backend
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Largest payload accepted from the download URL
    pub max_document_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            timeout_secs: 30,
            max_document_bytes: 512 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Token from the environment if set, otherwise the configured one.
    pub fn effective_token(&self) -> Option<String> {
        resolve_token(std::env::var(TOKEN_ENV_VAR).ok(), self.token.as_deref())
    }
}

fn resolve_token(env: Option<String>, configured: Option<&str>) -> Option<String> {
    env.filter(|t| !t.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .filter(|t| !t.trim().is_empty())
}

/// UI theme
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum UiTheme {
    #[default]
    Dark,
    Light,
}

/// UI preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// UI theme
    pub theme: UiTheme,
    /// Font size multiplier
    pub font_size: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: UiTheme::Dark,
            font_size: 1.0,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    /// Document service settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Renderer settings
    #[serde(default)]
    pub renderer: RendererConfig,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = ron::from_str(
            r#"(
                version: 1,
                api: (base_url: "https://pdm.example.com", timeout_secs: 5),
                renderer: (display: (show_grid: false)),
            )"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://pdm.example.com");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.max_document_bytes, ApiConfig::default().max_document_bytes);
        assert!(!config.renderer.display.show_grid);
        assert_eq!(config.renderer.display.highlight_color, 0xffaa00);
        assert_eq!(config.renderer.camera.fov_degrees, 45.0);
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn test_token_resolution() {
        assert_eq!(
            resolve_token(Some("env".into()), Some("file")),
            Some("env".to_string())
        );
        assert_eq!(resolve_token(None, Some("file")), Some("file".to_string()));
        assert_eq!(resolve_token(Some("  ".into()), Some("file")), Some("file".to_string()));
        assert_eq!(resolve_token(None, Some("")), None);
        assert_eq!(resolve_token(None, None), None);
    }
}

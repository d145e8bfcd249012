use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::annotate::SurfaceOptions;
use crate::capture::SnapshotFormat;
use crate::renderer::InkStyle;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub ink_color: [u8; 4],
    pub ink_width: f32,
    pub snapshot_format: SnapshotFormat,
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        let ink = InkStyle::default();
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
            window_width: 800,
            window_height: 600,
            ink_color: ink.color,
            ink_width: ink.width,
            snapshot_format: SnapshotFormat::Png,
            jpeg_quality: 90,
        }
    }
}

impl Config {
    /// Optional JSON file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("MATHSNAP_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(base) = lookup("MATHSNAP_API_BASE") {
            self.api_base = base;
        }
    }

    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            ink: InkStyle {
                color: self.ink_color,
                width: self.ink_width,
            },
            format: self.snapshot_format,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"model": "gpt-4o-mini", "snapshot_format": "jpeg"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.snapshot_format, SnapshotFormat::Jpeg);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.window_width, 800);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("MATHSNAP_API_BASE", "http://localhost:8080/v1"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_mathsnap_key_wins() {
        let mut config = Config::default();
        config.apply_env(|k| match k {
            "MATHSNAP_API_KEY" => Some("sk-own".to_string()),
            "OPENAI_API_KEY" => Some("sk-openai".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-own"));
    }

    #[test]
    fn test_surface_options_follow_config() {
        let config = Config {
            ink_width: 8.0,
            snapshot_format: SnapshotFormat::Jpeg,
            ..Config::default()
        };
        let opts = config.surface_options();
        assert_eq!(opts.ink.width, 8.0);
        assert_eq!(opts.format, SnapshotFormat::Jpeg);
    }
}

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const MODERN_MARKER: &str = "OpenAnimationReplacer";
pub const LEGACY_MARKER: &str = "DynamicAnimationReplacer";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub modern_marker: String,
    pub legacy_marker: String,
    pub config_extension: String,
    pub animation_extension: String,
    pub condition_file: String,
    pub output_folder: String,
    pub default_start_priority: i32,
    pub include_legacy: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            modern_marker: MODERN_MARKER.to_string(),
            legacy_marker: LEGACY_MARKER.to_string(),
            config_extension: "json".to_string(),
            animation_extension: "hkx".to_string(),
            condition_file: "_conditions.txt".to_string(),
            output_folder: "PriOARity_Output".to_string(),
            default_start_priority: 1,
            include_legacy: false,
        }
    }
}

impl ToolConfig {
    /// Reads an explicit config file, or the per-user one if it exists.
    /// Nothing is ever written back.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: ToolConfig = serde_json::from_str(&raw).context("parse config")?;
        Ok(config)
    }

    pub fn is_animation_file(&self, path: &Path) -> bool {
        has_extension(path, &self.animation_extension)
    }

    pub fn is_config_file(&self, path: &Path) -> bool {
        has_extension(path, &self.config_extension)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_local_dir().join("prioarity").join("config.json"))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|value| value.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

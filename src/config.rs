use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::spectrum::FrameParams;
use crate::lighting::settings::RenderSettings;

pub const CONFIG_FILE_NAME: &str = "lightsync.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: FrameParams,
    #[serde(default)]
    pub render: RenderSettings,
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `lightsync.toml` in the working directory, then the user config dirs.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("lightsync").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("lightsync").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

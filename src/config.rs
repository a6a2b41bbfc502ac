use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_variant")]
    pub variant: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            seed: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            smoothing: default_smoothing(),
        }
    }
}

fn default_width() -> u32 { 960 }
fn default_height() -> u32 { 640 }
fn default_fps() -> u32 { 60 }
fn default_variant() -> String { "drift".into() }
fn default_resolution() -> String { "full".into() }
fn default_smoothing() -> f32 { 0.8 }

/// Look for a config file: a local `inktrace.toml` first, then the
/// platform config directory.
pub fn discover() -> Option<PathBuf> {
    let local = PathBuf::from("inktrace.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("inktrace").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("EIGENFACE_CONFIG_PATH").unwrap_or("eigenface.toml"))
});

/// Which images the recognition rate is measured over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Each same-subject candidate against the candidate set itself.
    #[default]
    Subject,
    /// Each same-subject candidate against every other training image.
    Gallery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: PathBuf,
    pub subjects: u32,
    pub training_samples: u32,
    pub eigenfaces: usize,
    pub probe: PathBuf,
    pub output: PathBuf,
    pub seed: Option<u64>,
    pub preprocess_training: bool,
    pub scope: Scope,
    pub save_images: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("orl_faces"),
            subjects: 40,
            training_samples: 4,
            eigenfaces: 4,
            probe: PathBuf::from("orl_faces/s12/5.pgm"),
            output: PathBuf::from("recognition_rate.txt"),
            seed: None,
            preprocess_training: true,
            scope: Scope::Subject,
            save_images: None,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

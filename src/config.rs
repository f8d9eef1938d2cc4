//! Runtime configuration and secret lookup

use crate::extraction::{
    default_frames, load_frames, ExtractionFrame, FrameError, LlmError, LlmSettings,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Name of the secret holding the OpenRouter API key
pub const API_KEY_SECRET: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("secret {0} not found in secret files or environment")]
    MissingSecret(String),

    #[error(transparent)]
    Frames(#[from] FrameError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Everything needed to wire a store, an upload directory and a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_file_size_mb: u64,
    pub llm: LlmSettings,
    /// YAML file overriding the default extraction passes
    pub frames_path: Option<PathBuf>,
    pub extraction_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            upload_dir: PathBuf::from("./uploads"),
            max_file_size_mb: 10,
            llm: LlmSettings::default(),
            frames_path: None,
            extraction_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn extraction_timeout(&self) -> Option<Duration> {
        self.extraction_timeout_secs.map(Duration::from_secs)
    }

    /// The configured extraction passes, or the defaults
    pub fn frames(&self) -> Result<Vec<ExtractionFrame>, ConfigError> {
        match &self.frames_path {
            Some(path) => Ok(load_frames(path)?),
            None => Ok(default_frames()),
        }
    }

    pub fn api_key(&self) -> Result<String, ConfigError> {
        secret_or_env(API_KEY_SECRET)
            .ok_or_else(|| ConfigError::MissingSecret(API_KEY_SECRET.to_string()))
    }
}

/// Default database location (`<data dir>/docanalysis/docanalysis.db`)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("docanalysis").join("docanalysis.db")
}

fn secret_dirs() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("/run/secrets")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".secrets"));
    }
    candidates.push(PathBuf::from("../secrets"));
    candidates
}

/// Read a secret from the first secret directory holding a file called
/// `name`, falling back to the environment variable of the same name.
pub fn secret_or_env(name: &str) -> Option<String> {
    secret_from_files(&secret_dirs(), name).or_else(|| {
        let value = std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        debug!(secret = name, found = value.is_some(), "secret looked up in environment");
        value
    })
}

fn secret_from_files(dirs: &[PathBuf], name: &str) -> Option<String> {
    dirs.iter().find_map(|dir| read_secret(&dir.join(name)))
}

fn read_secret(path: &Path) -> Option<String> {
    let value = std::fs::read_to_string(path).ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    debug!(path = %path.display(), "secret read from file");
    Some(value.to_string())
}

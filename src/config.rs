//! Extraction configuration.
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables. Every field has a default so an empty `{}` is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::fields::DateOrder;

/// Environment variable holding the vision-provider credential.
pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub vision: VisionConfig,
    pub ocr: OcrConfig,
    /// Reading of ambiguous `NN/NN/YYYY` dates.
    pub date_order: DateOrder,
}

/// Remote vision-model settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub api_url: String,
    pub model: String,
    /// Caps the size of the model's answer.
    pub max_tokens: u32,
    /// Whole-request timeout; expiry counts as a provider failure.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

/// Local OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable.
    pub command: String,
    /// Tesseract language code(s), e.g. `eng`.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Load from `path` when given, otherwise defaults; then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: ExtractorConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("VISION_API_URL") {
            self.vision.api_url = url;
        }
        if let Some(model) = lookup("VISION_MODEL") {
            self.vision.model = model;
        }
        if let Some(raw) = lookup("VISION_MAX_TOKENS") {
            match raw.parse() {
                Ok(n) => self.vision.max_tokens = n,
                Err(_) => warn!("Ignoring VISION_MAX_TOKENS={}: not a number", raw),
            }
        }
        if let Some(raw) = lookup("VISION_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(n) => self.vision.timeout_secs = n,
                Err(_) => warn!("Ignoring VISION_TIMEOUT_SECS={}: not a number", raw),
            }
        }
        if let Some(command) = lookup("TESSERACT_CMD") {
            self.ocr.command = command;
        }
        if let Some(language) = lookup("OCR_LANGUAGE") {
            self.ocr.language = language;
        }
        if let Some(raw) = lookup("DATE_ORDER") {
            match raw.to_ascii_lowercase().as_str() {
                "day_first" => self.date_order = DateOrder::DayFirst,
                "month_first" => self.date_order = DateOrder::MonthFirst,
                _ => warn!("Ignoring DATE_ORDER={}: expected day_first or month_first", raw),
            }
        }
    }
}

/// Credential from the environment, if set and non-empty.
pub fn credential_from_env() -> Option<String> {
    std::env::var(CREDENTIAL_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

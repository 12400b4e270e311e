//! Local OCR via the Tesseract engine.

use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use super::{RecognizerKind, TextRecognizer};
use crate::config::OcrConfig;
use crate::error::RecognitionError;

pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait::async_trait]
impl TextRecognizer for TesseractOcr {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::LocalOcr
    }

    async fn recognize(&self, image: &Path) -> Result<String, RecognitionError> {
        debug!("TesseractOcr: running {} on {}", self.command, image.display());

        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| RecognitionError::Engine(format!("failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Engine(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        // Tesseract ends each page with a form feed
        Ok(String::from_utf8_lossy(&output.stdout).replace('\x0c', ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_engine_is_error() {
        let ocr = TesseractOcr::new(&OcrConfig {
            command: "definitely-not-an-ocr-engine".to_string(),
            language: "eng".to_string(),
        });
        let err = ocr.recognize(Path::new("x.jpg")).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Engine(_)));
    }

    #[tokio::test]
    async fn test_missing_engine_degrades_to_empty_text() {
        let config = crate::config::ExtractorConfig {
            ocr: OcrConfig {
                command: "definitely-not-an-ocr-engine".to_string(),
                language: "eng".to_string(),
            },
            ..Default::default()
        };
        let adapter = crate::ocr::RecognitionAdapter::from_config(&config, None);
        let out = adapter.recognize(Path::new("x.jpg")).await;
        assert!(out.text.is_empty());
    }
}

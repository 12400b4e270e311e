//! Text-recognition provider abstraction.
//!
//! Defines the [`TextRecognizer`] trait implemented by the local OCR engine and
//! the remote vision model, and the [`RecognitionAdapter`] that picks one and
//! falls back to local OCR when the remote call fails.

pub mod tesseract;
#[cfg(feature = "vision")]
pub mod vision;

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ExtractorConfig;
use crate::error::RecognitionError;

/// Known recognizer identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognizerKind {
    LocalOcr,
    RemoteVision,
}

impl RecognizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalOcr => "local_ocr",
            Self::RemoteVision => "remote_vision",
        }
    }
}

/// Async trait implemented by each recognition backend.
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    fn kind(&self) -> RecognizerKind;
    async fn recognize(&self, image: &Path) -> Result<String, RecognitionError>;
}

/// Raw text plus the recognizer that actually produced it.
#[derive(Debug, Clone)]
pub struct RecognizedText {
    pub text: String,
    pub kind: RecognizerKind,
}

/// Whether remote vision was compiled into this build.
pub fn vision_available() -> bool {
    cfg!(feature = "vision")
}

/// Selects a recognizer and owns the fallback policy.
///
/// Never fails: a remote failure falls back to local OCR, and a local failure
/// yields empty text.
#[derive(Clone)]
pub struct RecognitionAdapter {
    local: Arc<dyn TextRecognizer>,
    remote: Option<Arc<dyn TextRecognizer>>,
}

impl RecognitionAdapter {
    pub fn new(local: Arc<dyn TextRecognizer>, remote: Option<Arc<dyn TextRecognizer>>) -> Self {
        Self { local, remote }
    }

    /// Local OCR always; remote vision only with a non-empty credential in a
    /// vision-capable build.
    pub fn from_config(config: &ExtractorConfig, credential: Option<&str>) -> Self {
        let local: Arc<dyn TextRecognizer> = Arc::new(tesseract::TesseractOcr::new(&config.ocr));
        let credential = credential.map(str::trim).filter(|key| !key.is_empty());

        let remote = match credential {
            Some(key) if vision_available() => remote_recognizer(config, key),
            Some(_) => {
                warn!("Vision credential supplied but vision support is not compiled in; using local OCR");
                None
            }
            None => None,
        };

        Self::new(local, remote)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn recognize(&self, image: &Path) -> RecognizedText {
        if let Some(remote) = &self.remote {
            match remote.recognize(image).await {
                Ok(text) => {
                    return RecognizedText {
                        text,
                        kind: remote.kind(),
                    }
                }
                Err(e) => warn!(
                    "{} failed, falling back to {}: {}",
                    remote.kind().as_str(),
                    self.local.kind().as_str(),
                    e
                ),
            }
        }

        let text = match self.local.recognize(image).await {
            Ok(text) => text,
            Err(e) => {
                warn!("{} failed, no text recognized: {}", self.local.kind().as_str(), e);
                String::new()
            }
        };
        info!(
            "{} recognized {} chars",
            self.local.kind().as_str(),
            text.len()
        );

        RecognizedText {
            text,
            kind: self.local.kind(),
        }
    }
}

#[cfg(feature = "vision")]
fn remote_recognizer(config: &ExtractorConfig, key: &str) -> Option<Arc<dyn TextRecognizer>> {
    match vision::VisionRecognizer::new(&config.vision, key) {
        Ok(recognizer) => Some(Arc::new(recognizer)),
        Err(e) => {
            warn!("Vision recognizer unavailable, using local OCR: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "vision"))]
fn remote_recognizer(_config: &ExtractorConfig, _key: &str) -> Option<Arc<dyn TextRecognizer>> {
    None
}

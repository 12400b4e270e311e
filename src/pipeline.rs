//! Incident extraction pipeline.
//!
//! image path → timestamp cascade (metadata, then file name)
//!            → text recognition (vision or local OCR) → field parser
//!            → merge into one [`IncidentRecord`].
//!
//! Steps run one after another; each call is independent and keeps no state.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::PipelineError;
use crate::fields::FieldParser;
use crate::ocr::RecognitionAdapter;
use crate::record::{IncidentRecord, Timestamp};
use crate::timestamp::{self, TimestampStrategy};

/// Extraction pipeline orchestrator.
pub struct IncidentExtractor {
    timestamps: Arc<Vec<Box<dyn TimestampStrategy>>>,
    recognition: RecognitionAdapter,
    parser: FieldParser,
}

impl IncidentExtractor {
    /// Standard pipeline. `credential` enables remote vision.
    pub fn new(config: &ExtractorConfig, credential: Option<&str>) -> Self {
        Self::from_parts(
            timestamp::default_strategies(),
            RecognitionAdapter::from_config(config, credential),
            FieldParser::new(config.date_order),
        )
    }

    pub fn from_parts(
        timestamps: Vec<Box<dyn TimestampStrategy>>,
        recognition: RecognitionAdapter,
        parser: FieldParser,
    ) -> Self {
        Self {
            timestamps: Arc::new(timestamps),
            recognition,
            parser,
        }
    }

    /// Run the whole pipeline on one image.
    ///
    /// Fails only when the image does not exist; everything else degrades to
    /// absent fields.
    pub async fn extract(&self, image: &Path) -> Result<IncidentRecord, PipelineError> {
        if !image.exists() {
            return Err(PipelineError::InputMissing(image.to_path_buf()));
        }

        info!("Starting extraction for: {}", image.display());

        let timestamp = self.timestamp(image).await;

        let recognized = self.recognition.recognize(image).await;
        debug!(
            "Recognized text ({}, {} chars):\n{}",
            recognized.kind.as_str(),
            recognized.text.len(),
            recognized.text
        );

        let text_fields = self.parser.parse(&recognized.text);
        let record = IncidentRecord::merge(timestamp.as_ref(), text_fields);

        info!(
            "Extraction complete: date={:?} time={:?} registration={:?} colour={:?} incident_type={:?}",
            record.date_string(),
            record.time_string(),
            record.registration,
            record.colour,
            record.incident_type.map(|t| t.as_str())
        );

        Ok(record)
    }

    pub fn has_remote_recognition(&self) -> bool {
        self.recognition.has_remote()
    }

    /// Timestamp cascade on the blocking pool; EXIF parsing reads the file
    /// synchronously.
    async fn timestamp(&self, image: &Path) -> Option<Timestamp> {
        let strategies = Arc::clone(&self.timestamps);
        let image = image.to_path_buf();

        tokio::task::spawn_blocking(move || timestamp::first_timestamp(&strategies, &image))
            .await
            .unwrap_or_else(|e| {
                warn!("Timestamp lookup aborted: {}", e);
                None
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::tests::{Failing, FixedText};
    use crate::ocr::RecognizerKind;
    use crate::record::IncidentType;
    use crate::timestamp::tests::{jpeg_with_exif_datetime, Counting};
    use crate::timestamp::{ExifTimestamp, FilenameTimestamp};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VISION_ANSWER: &str = "DATE: 2025-12-31\nTIME: 23:59\nREGISTRATION: AB12 CDE\nCOLOUR: Silver\nINCIDENT_TYPE: pavement\nDETAILS: Two wheels on the footway.";

    fn extractor_with_text(text: &str) -> IncidentExtractor {
        IncidentExtractor::from_parts(
            timestamp::default_strategies(),
            RecognitionAdapter::new(Arc::new(FixedText::new(RecognizerKind::LocalOcr, text)), None),
            FieldParser::default(),
        )
    }

    fn write_image(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_input_aborts() {
        let local = Arc::new(FixedText::new(RecognizerKind::LocalOcr, VISION_ANSWER));
        let extractor = IncidentExtractor::from_parts(
            timestamp::default_strategies(),
            RecognitionAdapter::new(local.clone(), None),
            FieldParser::default(),
        );

        let err = extractor
            .extract(Path::new("/nonexistent/PXL_20260203_152754.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InputMissing(_)));
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_metadata_outranks_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "still.jpg", &jpeg_with_exif_datetime("2026:01:01 08:15:42"));

        let record = extractor_with_text(VISION_ANSWER).extract(&path).await.unwrap();
        assert_eq!(record.date_string().as_deref(), Some("2026-01-01"));
        assert_eq!(record.time_string().as_deref(), Some("08:15"));
        assert_eq!(record.day_of_week().as_deref(), Some("Thursday"));
        assert_eq!(record.registration.as_deref(), Some("AB12CDE"));
        assert_eq!(record.colour.as_deref(), Some("silver"));
        assert_eq!(record.incident_type, Some(IncidentType::Pavement));
    }

    #[tokio::test]
    async fn test_filename_outranks_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "PXL_20260203_152754898.jpg", b"no metadata");

        let record = extractor_with_text(VISION_ANSWER).extract(&path).await.unwrap();
        assert_eq!(record.date_string().as_deref(), Some("2026-02-03"));
        assert_eq!(record.time_string().as_deref(), Some("15:27"));
        assert_eq!(record.day_of_week().as_deref(), Some("Tuesday"));
        assert_eq!(record.registration.as_deref(), Some("AB12CDE"));
    }

    #[tokio::test]
    async fn test_text_fills_temporal_fields_without_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "still.jpg", b"no metadata");

        let record = extractor_with_text(VISION_ANSWER).extract(&path).await.unwrap();
        assert_eq!(record.date_string().as_deref(), Some("2025-12-31"));
        assert_eq!(record.time_string().as_deref(), Some("23:59"));
        assert_eq!(record.day_of_week().as_deref(), Some("Wednesday"));
    }

    #[tokio::test]
    async fn test_nothing_found_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "still.jpg", b"no metadata");

        let extractor = IncidentExtractor::from_parts(
            timestamp::default_strategies(),
            RecognitionAdapter::new(Arc::new(Failing(RecognizerKind::LocalOcr)), None),
            FieldParser::default(),
        );
        let record = extractor.extract(&path).await.unwrap();
        assert_eq!(record, IncidentRecord::default());
        assert_eq!(record.day_of_week(), None);
    }

    #[tokio::test]
    async fn test_vision_failure_uses_local_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "still.jpg", b"no metadata");

        let local = Arc::new(FixedText::new(
            RecognizerKind::LocalOcr,
            "COLOUR: NOT VISIBLE\nINCIDENT_TYPE: diagonal\nYX65 ABC",
        ));
        let extractor = IncidentExtractor::from_parts(
            timestamp::default_strategies(),
            RecognitionAdapter::new(
                local.clone(),
                Some(Arc::new(Failing(RecognizerKind::RemoteVision))),
            ),
            FieldParser::default(),
        );

        let record = extractor.extract(&path).await.unwrap();
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
        assert_eq!(record.registration.as_deref(), Some("YX65ABC"));
        assert_eq!(record.colour, None);
        assert_eq!(record.incident_type, None);
    }

    #[tokio::test]
    async fn test_filename_skipped_when_metadata_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(
            &dir,
            "PXL_20250101_000000.jpg",
            &jpeg_with_exif_datetime("2026:02:03 15:27:54"),
        );

        let filename_calls = Arc::new(AtomicUsize::new(0));
        let extractor = IncidentExtractor::from_parts(
            vec![
                Box::new(ExifTimestamp),
                Box::new(Counting {
                    inner: FilenameTimestamp,
                    calls: filename_calls.clone(),
                }),
            ],
            RecognitionAdapter::new(Arc::new(FixedText::new(RecognizerKind::LocalOcr, "")), None),
            FieldParser::default(),
        );

        let record = extractor.extract(&path).await.unwrap();
        assert_eq!(record.date_string().as_deref(), Some("2026-02-03"));
        assert_eq!(filename_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_timestamp_lookup_off_the_runtime_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "still.jpg", &jpeg_with_exif_datetime("2026:02:03 15:27:54"));

        let runtime_thread = std::thread::current().id();
        let seen_on = Arc::new(std::sync::Mutex::new(None));

        struct RecordsThread(Arc<std::sync::Mutex<Option<std::thread::ThreadId>>>);
        impl TimestampStrategy for RecordsThread {
            fn name(&self) -> &str {
                "thread"
            }
            fn extract(&self, image: &Path) -> Option<Timestamp> {
                *self.0.lock().unwrap() = Some(std::thread::current().id());
                ExifTimestamp.extract(image)
            }
        }

        let extractor = IncidentExtractor::from_parts(
            vec![Box::new(RecordsThread(seen_on.clone()))],
            RecognitionAdapter::new(Arc::new(FixedText::new(RecognizerKind::LocalOcr, "")), None),
            FieldParser::default(),
        );

        let record = extractor.extract(&path).await.unwrap();
        assert_eq!(record.date_string().as_deref(), Some("2026-02-03"));
        let strategy_thread = seen_on.lock().unwrap().unwrap();
        assert_ne!(strategy_thread, runtime_thread);
    }

    #[test]
    fn test_remote_recognition_needs_credential() {
        let config = ExtractorConfig::default();
        assert!(!IncidentExtractor::new(&config, None).has_remote_recognition());
    }

    #[tokio::test]
    async fn test_repeat_runs_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "PXL_20240229_120000.jpg", b"no metadata");

        let extractor = extractor_with_text("REGISTRATION: AB12CDE\nCOLOUR: red");
        let first = extractor.extract(&path).await.unwrap();
        let second = extractor.extract(&path).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.day_of_week().as_deref(), Some("Thursday"));
    }
}

//! Remote vision-model recognizer.
//!
//! Sends the image with a fixed structured prompt and returns the model's
//! labelled answer verbatim; parsing happens in `fields`.

use image::ImageFormat;
use std::path::Path;
use tracing::info;

use super::{RecognizerKind, TextRecognizer};
use crate::config::VisionConfig;
use crate::error::RecognitionError;
use crate::vision::VisionClient;

/// Asks for six labelled fields, each a value or `NOT VISIBLE`.
pub const INCIDENT_PROMPT: &str = r#"Analyze this dashcam/street image and extract the following information:
1. Date (look for date stamp on the image)
2. Time (look for time stamp on the image)
3. Vehicle registration number (license plate)
4. Vehicle colour (the main body color of the vehicle in the image)
5. Incident type - determine if this is a:
   - "corner" incident: vehicle parked within 10m of a junction/corner, obscuring visibility at junction, or on dropped kerb near junction
   - "pavement" incident: vehicle parked partly or wholly on pavement/footway, blocking pedestrian access

Please format your response as:
DATE: [date in format YYYY-MM-DD or as shown]
TIME: [time in format HH:MM]
REGISTRATION: [vehicle registration number]
COLOUR: [vehicle colour e.g. silver, blue, white, black, red]
INCIDENT_TYPE: [corner OR pavement]
DETAILS: [brief description of what you see]

If any information is not visible or unclear, write "NOT VISIBLE" for that field."#;

pub struct VisionRecognizer {
    client: VisionClient,
}

impl VisionRecognizer {
    pub fn new(config: &VisionConfig, api_key: &str) -> Result<Self, RecognitionError> {
        Ok(Self {
            client: VisionClient::new(config, api_key)?,
        })
    }
}

#[async_trait::async_trait]
impl TextRecognizer for VisionRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::RemoteVision
    }

    async fn recognize(&self, image: &Path) -> Result<String, RecognitionError> {
        let data = tokio::fs::read(image)
            .await
            .map_err(|source| RecognitionError::Io {
                path: image.to_path_buf(),
                source,
            })?;

        info!(
            "VisionRecognizer: analysing {} ({} bytes) with {}",
            image.display(),
            data.len(),
            self.client.model()
        );

        self.client
            .describe_image(INCIDENT_PROMPT, &data, mime_type(&data))
            .await
    }
}

/// MIME type for the data URL; JPEG unless the bytes say otherwise.
fn mime_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        _ => "image/jpeg",
    }
}

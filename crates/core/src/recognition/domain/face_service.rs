use serde::Deserialize;

use crate::shared::detection::Detection;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::error::ClientError;
use crate::shared::known_face::{KnownFaceEntry, RegistryReply};

/// What the service reported for one submitted image.
///
/// An absent `faces` array means no detections. `error` is set when the
/// service accepted the request but could not process the image.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RecognitionOutcome {
    #[serde(default)]
    pub faces: Vec<Detection>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Remote face recognition. Implementations are called from worker
/// threads, hence `Send + Sync`.
pub trait FaceRecognitionService: Send + Sync {
    fn recognize(&self, image: &EncodedImage) -> Result<RecognitionOutcome, ClientError>;
}

/// Remote registry of named identities the service can match against.
pub trait KnownFacesRegistry: Send + Sync {
    fn list(&self) -> Result<Vec<KnownFaceEntry>, ClientError>;

    fn add(&self, name: &str, image: &EncodedImage) -> Result<RegistryReply, ClientError>;

    fn delete(&self, name: &str) -> Result<RegistryReply, ClientError>;
}

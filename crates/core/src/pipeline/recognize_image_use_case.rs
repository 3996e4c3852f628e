use std::path::Path;
use std::sync::Arc;

use crate::recognition::domain::face_service::FaceRecognitionService;
use crate::shared::detection::Detection;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::error::ClientError;
use crate::ui::notifications::Notice;

/// Detections for a still image plus the line to show the user.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionSummary {
    pub faces: Vec<Detection>,
}

impl RecognitionSummary {
    pub fn message(&self) -> String {
        if self.faces.is_empty() {
            "No faces detected in the image".to_string()
        } else {
            format!("Found {} face(s)", self.faces.len())
        }
    }

    pub fn notice(&self) -> Notice {
        if self.faces.is_empty() {
            Notice::info(self.message())
        } else {
            Notice::success(self.message())
        }
    }
}

/// Recognizes faces in a single user-selected image.
pub struct RecognizeImageUseCase {
    service: Arc<dyn FaceRecognitionService>,
}

impl RecognizeImageUseCase {
    pub fn new(service: Arc<dyn FaceRecognitionService>) -> Self {
        Self { service }
    }

    /// Validates the selection, uploads the file, and summarizes the result.
    pub fn execute(&self, image_path: Option<&Path>) -> Result<RecognitionSummary, ClientError> {
        let path = image_path
            .ok_or_else(|| ClientError::Validation("Please select an image".to_string()))?;
        let image = EncodedImage::from_path(path)?;
        log::info!("Recognizing faces in {}", path.display());
        self.recognize(&image)
    }

    pub fn recognize(&self, image: &EncodedImage) -> Result<RecognitionSummary, ClientError> {
        let outcome = self.service.recognize(image)?;
        if let Some(error) = outcome.error {
            return Err(ClientError::Protocol(error));
        }
        Ok(RecognitionSummary {
            faces: outcome.faces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::face_service::RecognitionOutcome;
    use crate::shared::detection::BoundingBox;
    use crate::ui::notifications::Severity;
    use std::sync::Mutex;

    struct StubService {
        outcome: Result<RecognitionOutcome, ClientError>,
        seen: Mutex<Vec<String>>,
    }

    impl StubService {
        fn new(outcome: Result<RecognitionOutcome, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl FaceRecognitionService for StubService {
        fn recognize(&self, image: &EncodedImage) -> Result<RecognitionOutcome, ClientError> {
            self.seen
                .lock()
                .unwrap()
                .push(image.file_name().to_string());
            self.outcome.clone()
        }
    }

    fn face(name: &str) -> Detection {
        Detection {
            name: name.to_string(),
            confidence: 0.8,
            location: BoundingBox::new(1, 2, 3, 4),
        }
    }

    fn image_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("group.jpg");
        std::fs::write(&path, b"jpeg").unwrap();
        path
    }

    #[test]
    fn test_missing_selection_is_validation_error() {
        let service = StubService::new(Ok(RecognitionOutcome::default()));
        let use_case = RecognizeImageUseCase::new(service.clone());

        let err = use_case.execute(None).unwrap_err();
        assert_eq!(err, ClientError::Validation("Please select an image".into()));
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_summarizes_found_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_file(&dir);
        let service = StubService::new(Ok(RecognitionOutcome {
            faces: vec![face("Alice"), face("Unknown")],
            error: None,
        }));
        let use_case = RecognizeImageUseCase::new(service.clone());

        let summary = use_case.execute(Some(&path)).unwrap();
        assert_eq!(summary.faces.len(), 2);
        assert_eq!(summary.message(), "Found 2 face(s)");
        assert_eq!(summary.notice().severity, Severity::Success);
        assert_eq!(*service.seen.lock().unwrap(), vec!["group.jpg".to_string()]);
    }

    #[test]
    fn test_no_faces_is_informational() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_file(&dir);
        let use_case = RecognizeImageUseCase::new(StubService::new(Ok(
            RecognitionOutcome::default(),
        )));

        let summary = use_case.execute(Some(&path)).unwrap();
        assert_eq!(summary.notice(), Notice::info("No faces detected in the image"));
    }

    #[test]
    fn test_service_error_field_becomes_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_file(&dir);
        let use_case = RecognizeImageUseCase::new(StubService::new(Ok(RecognitionOutcome {
            faces: Vec::new(),
            error: Some("Invalid file type".into()),
        })));

        let err = use_case.execute(Some(&path)).unwrap_err();
        assert_eq!(err, ClientError::Protocol("Invalid file type".into()));
    }

    #[test]
    fn test_network_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_file(&dir);
        let use_case = RecognizeImageUseCase::new(StubService::new(Err(ClientError::Network(
            "connection refused".into(),
        ))));

        assert!(matches!(
            use_case.execute(Some(&path)),
            Err(ClientError::Network(_))
        ));
    }
}

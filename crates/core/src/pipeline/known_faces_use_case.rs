use std::path::Path;
use std::sync::Arc;

use crate::recognition::domain::face_service::KnownFacesRegistry;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::error::ClientError;
use crate::shared::known_face::RegistryReply;
use crate::ui::known_faces_list::KnownFacesList;
use crate::ui::notifications::Notice;

/// Lists, registers, and removes known identities.
pub struct KnownFacesUseCase {
    registry: Arc<dyn KnownFacesRegistry>,
}

impl KnownFacesUseCase {
    pub fn new(registry: Arc<dyn KnownFacesRegistry>) -> Self {
        Self { registry }
    }

    pub fn refresh(&self) -> Result<KnownFacesList, ClientError> {
        let entries = self.registry.list()?;
        log::debug!("Registry lists {} known face(s)", entries.len());
        Ok(KnownFacesList::from_entries(&entries))
    }

    /// Registers `name` using the face in `image_path`.
    ///
    /// The name is trimmed; an empty name or missing image is rejected
    /// before anything is sent.
    pub fn add(&self, name: &str, image_path: Option<&Path>) -> Result<Notice, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation(
                "Please enter a person name".to_string(),
            ));
        }
        let path = image_path
            .ok_or_else(|| ClientError::Validation("Please select an image".to_string()))?;
        let image = EncodedImage::from_path(path)?;

        log::info!("Adding face for {name} from {}", path.display());
        let reply = self.registry.add(name, &image)?;
        Ok(reply_notice(reply, || "Face added successfully!".to_string()))
    }

    pub fn delete(&self, name: &str) -> Result<Notice, ClientError> {
        log::info!("Deleting known face {name}");
        let reply = self.registry.delete(name)?;
        Ok(reply_notice(reply, || format!("Deleted {name}")))
    }
}

fn reply_notice(reply: RegistryReply, on_success: impl FnOnce() -> String) -> Notice {
    if reply.success {
        Notice::success(reply.message.unwrap_or_else(on_success))
    } else {
        let detail = reply
            .message
            .unwrap_or_else(|| "request was rejected".to_string());
        Notice::error(format!("Error: {detail}"))
    }
}

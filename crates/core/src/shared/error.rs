use thiserror::Error;

/// Everything that can go wrong between the client and the camera or the
/// recognition service.
///
/// Payloads are plain strings so errors can be cloned into UI messages and
/// sent across worker channels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    #[error("camera unavailable: {0}")]
    DeviceError(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Protocol(String),
    #[error("{0}")]
    Validation(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Protocol(e.to_string())
    }
}

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct KnownFacesBody {
    #[serde(default)]
    pub faces: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    pub status: String,
}

/// A registered identity as listed by the known-faces registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownFaceEntry {
    pub name: String,
}

impl KnownFaceEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Result of a registry mutation (add or delete).
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct RegistryReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

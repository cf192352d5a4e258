/// Result alias that carries the custom [`OpticalEkgError`] type.
pub type Result<T> = std::result::Result<T, OpticalEkgError>;

/// Common error type for the core crate.
///
/// Runtime lookups (unknown structures, missing camera poses, unmatched EKG
/// segments) degrade silently and never produce one of these. Errors are
/// reserved for catalog loading, validation and the strict selection paths.
#[derive(Debug, thiserror::Error)]
pub enum OpticalEkgError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Catalog or configuration JSON could not be decoded.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// A lesson module id that is not present in the catalog.
    #[error("module `{0}` not found")]
    UnknownModule(String),
    /// An EKG pattern id that is not present in the catalog.
    #[error("ekg pattern `{0}` not found")]
    UnknownPattern(String),
    /// A catalog entry references a name nothing else defines.
    #[error("`{owner}` references unknown `{reference}`")]
    DanglingReference { owner: String, reference: String },
    /// EKG trace geometry that could not be parsed.
    #[error("invalid trace path: {0}")]
    InvalidPath(String),
}

impl OpticalEkgError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn dangling(owner: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::DanglingReference {
            owner: owner.into(),
            reference: reference.into(),
        }
    }
}

impl From<&str> for OpticalEkgError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for OpticalEkgError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

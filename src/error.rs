use thiserror::Error;

/// Error taxonomy for the analysis library boundary.
///
/// `InvalidUrl` and `Config` are fatal (no partial result is produced);
/// `Io` and `Yaml` are transparently wrapped for config loading.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl AnalysisError {
    /// Construct an `InvalidUrl` error from a URL and a human-readable reason.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

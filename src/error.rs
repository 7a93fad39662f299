/// Result alias for the analysis stages.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised while turning PCM into frequency slices.
///
/// Everything downstream of extraction is total and degrades to fallback
/// values instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid analysis configuration: {0}")]
    Configuration(String),
    #[error("invalid audio input: {0}")]
    Input(String),
}

impl AnalysisError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn input<T: Into<String>>(msg: T) -> Self {
        Self::Input(msg.into())
    }
}

/// Errors raised by timeline export/import.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("timeline JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timeline I/O error: {0}")]
    Io(#[from] std::io::Error),
}

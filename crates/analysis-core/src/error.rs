use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    Interpretation(String),

    #[error("{0}")]
    Fetch(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("{0}")]
    Narrative(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable grouping of an [`AnalysisError`] at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Interpretation,
    Fetch,
    Analysis,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Interpretation => "interpretation",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Analysis => "analysis",
        }
    }
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Interpretation(_) => ErrorKind::Interpretation,
            AnalysisError::Fetch(_) => ErrorKind::Fetch,
            AnalysisError::InsufficientData(_)
            | AnalysisError::Narrative(_)
            | AnalysisError::Internal(_) => ErrorKind::Analysis,
        }
    }
}

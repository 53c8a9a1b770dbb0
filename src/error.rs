use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RemixError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("failed to parse track manifest: {0}")]
    ManifestParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("failed to write tags: {0}")]
    Tagging(String),

    #[error("unusable cover art: {0}")]
    CoverArt(String),

    #[error("invalid track name: {0:?}")]
    #[diagnostic(help("track names must not contain path separators"))]
    InvalidTrackName(String),

    #[error("invalid track number: {0}")]
    InvalidTrackNumber(String),

    #[error("invalid download URL: {0}")]
    InvalidUrl(String),

    #[error("track {0} has no instrumental version")]
    MissingInstrumental(u32),

    #[error("unable to resolve the home directory")]
    HomeDirUnavailable,
}

impl RemixError {
    /// True for transport failures and non-success HTTP statuses.
    pub fn is_network(&self) -> bool {
        matches!(self, RemixError::Network(_) | RemixError::HttpStatus { .. })
    }
}

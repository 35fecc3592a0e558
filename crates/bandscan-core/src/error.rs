use crate::node::SourceId;

pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Error taxonomy for directory and playlist operations.
///
/// `Fetch` is transient (re-navigating retries it); `Parse` is not
/// retryable without an upstream change. `CacheCorrupt` never leaves the
/// cache layer; it is logged and treated as a cache miss.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("unrecognised content for {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("corrupt cache file {path}: {reason}")]
    CacheCorrupt { path: String, reason: String },

    #[error("cache persistence failed: {0}")]
    Persist(#[from] std::io::Error),

    #[error("directory source {} is not enabled", .0.label())]
    SourceUnavailable(SourceId),
}

impl DirectoryError {
    pub fn fetch(url: impl Into<String>, err: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    pub fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// True for transport-level failures worth retrying by re-navigating.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Errors that can occur in cross-frame transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The URL has an opaque origin (`data:`, `file:`, ...) and cannot be
    /// used for origin checks.
    #[error("url has an opaque origin: {0}")]
    OpaqueOrigin(String),

    /// The iframe element is not attached to the page.
    #[error("frame element is not attached")]
    FrameDetached,

    /// The iframe exists but has no content window yet.
    #[error("frame content window is not available")]
    ContentWindowUnavailable,

    /// The underlying platform rejected the post.
    #[error("failed to post message: {0}")]
    PostFailed(String),

    /// Navigation of the iframe failed.
    #[error("failed to navigate frame: {0}")]
    NavigationFailed(String),
}

impl TransportError {
    /// True when the failure only means the frame is not ready yet.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            TransportError::FrameDetached | TransportError::ContentWindowUnavailable
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

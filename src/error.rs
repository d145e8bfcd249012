use thiserror::Error;

/// Failures reported by the annotation surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// No photo is displayed yet, so pointer input has nothing to draw on.
    #[error("image not loaded yet; pointer input ignored")]
    ImagePending,
    /// Confirm or cancel already ended this session.
    #[error("annotation session already closed")]
    SessionClosed,
    /// `extend_stroke` arrived without a preceding `begin_stroke`.
    #[error("extend_stroke called with no active stroke")]
    NoActiveStroke,
    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

/// Failures from the hosted recognition endpoint.
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("recognition endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model refused the request: {0}")]
    Refused(String),
    #[error("response carried no message content")]
    EmptyResponse,
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

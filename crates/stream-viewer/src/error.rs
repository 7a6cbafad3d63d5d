use thiserror::Error;

/// Everything that can go wrong between the socket and the point buffer.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("malformed point payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("binary frame of {0} bytes is not UTF-8 text")]
    Binary(usize),
}

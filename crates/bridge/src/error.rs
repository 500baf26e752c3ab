use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Bridge returned an error: {0}")]
    Api(String),

    #[error("Failed to decode bridge response: {0}")]
    Deserialization(String),

    #[error("Bridge is unavailable")]
    Unavailable,
}

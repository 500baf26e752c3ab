use thiserror::Error;

/// Internal fetch-path errors. These never escape a panel: `refresh`
/// converts them into the user-visible error banner and a health report.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge::BridgeError),

    #[error("Malformed bridge payload: {0}")]
    MalformedPayload(String),

    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] analytics::AnalyticsError),
}

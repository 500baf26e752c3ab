use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid aggregation window: {0}ms")]
    InvalidWindow(i64),
}

use thiserror::Error;

/// Failure taxonomy for one alert cycle.
///
/// Every variant is recoverable: the runner logs it and keeps polling.
/// Availability wins over delivery guarantees here, so an occasional
/// duplicate or missed notification is acceptable while a crashed poller
/// is not.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Forecast fetch failed; the cycle is skipped, nothing is persisted.
    #[error("forecast fetch failed: {0}")]
    Fetch(anyhow::Error),

    /// Broadcast delivery failed for one event; remaining events and the
    /// state persist still run.
    #[error("broadcast send failed: {0}")]
    Send(anyhow::Error),

    /// Persisted state could not be read. Treated as empty state upstream;
    /// this variant exists for operator-facing reporting.
    #[error("notification state read failed: {0}")]
    StateRead(anyhow::Error),

    /// Persisted state could not be written. Losing a write risks a
    /// duplicate notification next cycle, which is the accepted degradation.
    #[error("notification state write failed: {0}")]
    StateWrite(anyhow::Error),

    /// Missing or unusable configuration, e.g. the broadcast credential.
    #[error("configuration error: {0}")]
    Config(String),
}

use async_trait::async_trait;
use std::fmt::Debug;

pub mod line;

/// Delivers alert text to every subscriber of the configured channel.
///
/// One attempt per call, no delivery confirmation beyond the API's
/// synchronous acknowledgement.
#[async_trait]
pub trait Broadcaster: Send + Sync + Debug {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

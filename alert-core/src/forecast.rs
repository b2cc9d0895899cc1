use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::ForecastSnapshot;

pub mod open_meteo;

/// A source of forecast data for the deployment coordinate.
///
/// Implementations do a single fetch attempt per call. Retry, if any, is
/// the caller's business via the next scheduled cycle.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self) -> anyhow::Result<ForecastSnapshot>;
}

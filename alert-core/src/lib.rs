//! Core library for the `weather-alert` broadcaster.
//!
//! This crate defines:
//! - Configuration handling and the broadcast credential
//! - The Open-Meteo forecast client
//! - The condition evaluator and its persisted dedup state
//! - The LINE broadcast client and the per-cycle runner
//!
//! It is used by `alert-cli`, but can also be reused by other binaries or services.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod forecast;
pub mod model;
pub mod runner;
pub mod state;

pub use broadcast::{Broadcaster, line::LineBroadcaster};
pub use config::Config;
pub use error::AlertError;
pub use forecast::{ForecastProvider, open_meteo::OpenMeteoProvider};
pub use model::{Event, ForecastSnapshot, HourlyEntry};
pub use state::NotificationState;

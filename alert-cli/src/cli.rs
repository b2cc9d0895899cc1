use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::warn;

use alert_core::{Broadcaster, Config, LineBroadcaster, OpenMeteoProvider, runner};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-alert",
    version,
    about = "Heat and heavy-rain alert broadcaster"
)]
pub struct Cli {
    /// Path to a TOML config file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single check cycle and exit. Intended for cron-style scheduling.
    Once,

    /// Poll on a fixed interval until interrupted.
    Watch {
        /// Override the check interval from the config, in seconds.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        let provider = OpenMeteoProvider::with_base_url(
            config.forecast_base_url.clone(),
            config.latitude,
            config.longitude,
            config.timezone.clone(),
            config.forecast_days,
        )?;

        let broadcaster = LineBroadcaster::from_env(config.broadcast_base_url.clone())?;
        if broadcaster.is_none() {
            warn!(
                "{} is not set; alerts will be computed but not delivered",
                alert_core::broadcast::line::TOKEN_ENV_VAR
            );
        }
        let broadcaster_ref = broadcaster.as_ref().map(|b| b as &dyn Broadcaster);

        let state_path = config.state_file_path()?;

        match self.command {
            Command::Once => {
                let now_local = config.now_local();
                if let Err(e) = runner::run_cycle(
                    &provider,
                    broadcaster_ref,
                    &state_path,
                    now_local,
                    config.heat_threshold_c,
                )
                .await
                {
                    // Errors are logged, not returned: a cron job should not
                    // flap on a transient fetch failure.
                    tracing::error!("cycle failed: {e}");
                }
            }
            Command::Watch { interval_secs } => {
                let interval = interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.check_interval());

                runner::run_loop(
                    &provider,
                    broadcaster_ref,
                    &state_path,
                    config.utc_offset(),
                    interval,
                    config.heat_threshold_c,
                )
                .await;
            }
        }

        Ok(())
    }
}

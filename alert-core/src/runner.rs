use chrono::{FixedOffset, NaiveDateTime, Utc};
use std::{path::Path, time::Duration};
use tracing::{error, info, warn};

use crate::broadcast::Broadcaster;
use crate::error::AlertError;
use crate::evaluate::evaluate;
use crate::forecast::ForecastProvider;
use crate::state::NotificationState;

/// Outcome of one completed cycle, for logging and assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub events: usize,
    pub delivered: usize,
}

/// One check cycle: fetch, evaluate, broadcast new events in order, persist.
///
/// A fetch failure aborts before state is touched: nothing was observed, so
/// there is nothing to prune or save until the next cycle. A send failure
/// is logged per event and the event still counts as notified; silence
/// beats a repeat alert. With no broadcaster configured, events are
/// computed and recorded but not delivered.
pub async fn run_cycle(
    provider: &dyn ForecastProvider,
    broadcaster: Option<&dyn Broadcaster>,
    state_path: &Path,
    now_local: NaiveDateTime,
    heat_threshold: f64,
) -> Result<CycleReport, AlertError> {
    let snapshot = provider.fetch().await.map_err(AlertError::Fetch)?;

    let mut state = NotificationState::load(state_path);
    let events = evaluate(&snapshot, now_local, heat_threshold, &mut state);

    if events.is_empty() {
        info!("no new alert conditions");
    } else {
        info!(count = events.len(), "new alert conditions detected");
    }

    let mut delivered = 0;
    for event in &events {
        match broadcaster {
            Some(b) => match b.send(&event.message()).await {
                Ok(()) => {
                    info!(event = ?event, "alert broadcast");
                    delivered += 1;
                }
                Err(e) => warn!("{}", AlertError::Send(e)),
            },
            None => warn!(
                "{}",
                AlertError::Config(format!(
                    "broadcast token is not set, alert not delivered: {}",
                    event.message()
                ))
            ),
        }
    }

    state.save(state_path).map_err(AlertError::StateWrite)?;

    Ok(CycleReport {
        events: events.len(),
        delivered,
    })
}

/// Poll forever on a fixed interval. Every error is logged and swallowed;
/// a crashed poller is worse than a missed cycle.
pub async fn run_loop(
    provider: &dyn ForecastProvider,
    broadcaster: Option<&dyn Broadcaster>,
    state_path: &Path,
    offset: FixedOffset,
    interval: Duration,
    heat_threshold: f64,
) {
    loop {
        let now_local = Utc::now().with_timezone(&offset).naive_local();
        match run_cycle(provider, broadcaster, state_path, now_local, heat_threshold).await {
            Ok(report) => info!(
                events = report.events,
                delivered = report.delivered,
                "cycle complete"
            ),
            Err(e) => error!("cycle failed: {e}"),
        }
        tokio::time::sleep(interval).await;
    }
}

use chrono::{NaiveDateTime, Timelike};

use crate::model::{Event, ForecastSnapshot};
use crate::state::NotificationState;

/// Default daily-maximum temperature at or above which a heat alert
/// fires, °C. Overridable per deployment via the config.
pub const HEAT_THRESHOLD_C: f64 = 35.0;

/// WMO weather codes treated as heavy rain: rain showers (80-82) and
/// thunderstorms (95, 96, 99).
pub const HEAVY_RAIN_CODES: &[u16] = &[80, 81, 82, 95, 96, 99];

pub fn is_heavy_rain(code: u16) -> bool {
    HEAVY_RAIN_CODES.contains(&code)
}

/// Decide which conditions in `snapshot` are newly notify-worthy.
///
/// Pure apart from mutating `state`: prunes both dedup sets to the calendar
/// date of `now_local`, then emits at most one heat event per day and at
/// most one rain event per forecast hour. Re-running on the same inputs
/// yields no further events, so polling cadence never affects output.
///
/// Missing snapshot fields are not errors, the corresponding check is
/// simply skipped for this cycle.
pub fn evaluate(
    snapshot: &ForecastSnapshot,
    now_local: NaiveDateTime,
    heat_threshold: f64,
    state: &mut NotificationState,
) -> Vec<Event> {
    let today = now_local.date();
    state.prune(today);

    let mut events = Vec::new();

    if let Some(max_temperature) = snapshot.daily_max_temperature
        && max_temperature >= heat_threshold
        && state.notified_heat_dates.insert(today)
    {
        events.push(Event::Heat {
            date: today,
            max_temperature,
        });
    }

    // The rain scan is anchored at the entry for the current hour. If the
    // series does not contain it (clock skew, stale or short forecast),
    // there is nothing actionable this cycle.
    let Some(current_hour) = truncate_to_hour(now_local) else {
        return events;
    };
    let Some(start) = snapshot.hourly.iter().position(|e| e.time == current_hour) else {
        return events;
    };

    // Scan the full remaining horizon, not a short lookahead: per-hour dedup
    // makes the wider window safe and keeps output independent of cadence.
    for entry in &snapshot.hourly[start..] {
        if is_heavy_rain(entry.weather_code) && state.notified_rain_events.insert(entry.time) {
            events.push(Event::Rain { at: entry.time });
        }
    }

    events
}

fn truncate_to_hour(t: NaiveDateTime) -> Option<NaiveDateTime> {
    t.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HourlyEntry;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid test date")
    }

    fn hour(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").expect("valid test timestamp")
    }

    fn snapshot_with_codes(day: &str, codes: &[(u32, u16)]) -> ForecastSnapshot {
        let hourly = (0..24)
            .map(|h| HourlyEntry {
                time: hour(&format!("{day}T{h:02}:00")),
                weather_code: codes
                    .iter()
                    .find(|(ch, _)| *ch == h)
                    .map_or(1, |(_, code)| *code),
            })
            .collect();

        ForecastSnapshot {
            daily_max_temperature: None,
            hourly,
        }
    }

    #[test]
    fn heat_fires_at_exact_threshold() {
        let snapshot = ForecastSnapshot {
            daily_max_temperature: Some(35.0),
            hourly: Vec::new(),
        };
        let mut state = NotificationState::default();

        let events = evaluate(&snapshot, hour("2026-08-30T10:30"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(
            events,
            vec![Event::Heat {
                date: date("2026-08-30"),
                max_temperature: 35.0
            }]
        );
    }

    #[test]
    fn heat_does_not_fire_below_threshold() {
        let snapshot = ForecastSnapshot {
            daily_max_temperature: Some(34.99),
            hourly: Vec::new(),
        };
        let mut state = NotificationState::default();

        assert!(evaluate(&snapshot, hour("2026-08-30T10:30"), HEAT_THRESHOLD_C, &mut state).is_empty());
        assert!(state.notified_heat_dates.is_empty());
    }

    #[test]
    fn configured_threshold_overrides_the_default() {
        let snapshot = ForecastSnapshot {
            daily_max_temperature: Some(31.0),
            hourly: Vec::new(),
        };
        let mut state = NotificationState::default();

        let events = evaluate(&snapshot, hour("2026-08-30T10:30"), 30.0, &mut state);

        assert_eq!(
            events,
            vec![Event::Heat {
                date: date("2026-08-30"),
                max_temperature: 31.0
            }]
        );
    }

    #[test]
    fn heat_event_recorded_in_state() {
        // Scenario A: 36.2 °C with empty prior state.
        let snapshot = ForecastSnapshot {
            daily_max_temperature: Some(36.2),
            hourly: Vec::new(),
        };
        let mut state = NotificationState::default();

        let events = evaluate(&snapshot, hour("2026-08-30T10:30"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(
            events,
            vec![Event::Heat {
                date: date("2026-08-30"),
                max_temperature: 36.2
            }]
        );
        assert!(state.notified_heat_dates.contains(&date("2026-08-30")));
    }

    #[test]
    fn heat_fires_at_most_once_per_date() {
        let snapshot = ForecastSnapshot {
            daily_max_temperature: Some(38.0),
            hourly: Vec::new(),
        };
        let mut state = NotificationState::default();

        assert_eq!(evaluate(&snapshot, hour("2026-08-30T08:00"), HEAT_THRESHOLD_C, &mut state).len(), 1);
        for _ in 0..5 {
            assert!(evaluate(&snapshot, hour("2026-08-30T09:00"), HEAT_THRESHOLD_C, &mut state).is_empty());
        }
    }

    #[test]
    fn yesterdays_heat_key_is_pruned_and_today_fires_again() {
        let snapshot = ForecastSnapshot {
            daily_max_temperature: Some(36.0),
            hourly: Vec::new(),
        };
        let mut state = NotificationState::default();
        state.notified_heat_dates.insert(date("2026-08-29"));

        let events = evaluate(&snapshot, hour("2026-08-30T10:00"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(events.len(), 1);
        assert!(!state.notified_heat_dates.contains(&date("2026-08-29")));
        assert!(state.notified_heat_dates.contains(&date("2026-08-30")));
    }

    #[test]
    fn missing_daily_max_skips_heat_check() {
        let snapshot = ForecastSnapshot::default();
        let mut state = NotificationState::default();

        assert!(evaluate(&snapshot, hour("2026-08-30T10:00"), HEAT_THRESHOLD_C, &mut state).is_empty());
    }

    #[test]
    fn rain_events_fire_in_ascending_order() {
        // Scenario B: thunderstorms at 18:00 and 19:00, now 17:30.
        let snapshot = snapshot_with_codes("2026-08-30", &[(18, 95), (19, 95)]);
        let mut state = NotificationState::default();

        let events = evaluate(&snapshot, hour("2026-08-30T17:30"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(
            events,
            vec![
                Event::Rain {
                    at: hour("2026-08-30T18:00")
                },
                Event::Rain {
                    at: hour("2026-08-30T19:00")
                },
            ]
        );
    }

    #[test]
    fn already_notified_rain_hour_is_skipped() {
        // Scenario C: 18:00 already notified, only 19:00 is new.
        let snapshot = snapshot_with_codes("2026-08-30", &[(18, 95), (19, 95)]);
        let mut state = NotificationState::default();
        state.notified_rain_events.insert(hour("2026-08-30T18:00"));

        let events = evaluate(&snapshot, hour("2026-08-30T17:30"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(
            events,
            vec![Event::Rain {
                at: hour("2026-08-30T19:00")
            }]
        );
    }

    #[test]
    fn current_hour_absent_from_series_skips_rain_check() {
        // Scenario D: the series covers yesterday, now is today. State is
        // still pruned so the heat dedup key rolls over.
        let snapshot = snapshot_with_codes("2026-08-29", &[(18, 95)]);
        let mut state = NotificationState::default();
        state.notified_heat_dates.insert(date("2026-08-29"));
        state.notified_rain_events.insert(hour("2026-08-30T08:00"));

        let events = evaluate(&snapshot, hour("2026-08-30T17:30"), HEAT_THRESHOLD_C, &mut state);

        assert!(events.is_empty());
        assert!(state.notified_heat_dates.is_empty());
        assert!(state.notified_rain_events.contains(&hour("2026-08-30T08:00")));
    }

    #[test]
    fn rain_scan_covers_the_full_remaining_horizon() {
        // A storm ten hours out still fires, not only the next few hours.
        let snapshot = snapshot_with_codes("2026-08-30", &[(23, 82)]);
        let mut state = NotificationState::default();

        let events = evaluate(&snapshot, hour("2026-08-30T13:00"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(
            events,
            vec![Event::Rain {
                at: hour("2026-08-30T23:00")
            }]
        );
    }

    #[test]
    fn rain_scan_ignores_hours_before_now() {
        let snapshot = snapshot_with_codes("2026-08-30", &[(8, 95), (20, 95)]);
        let mut state = NotificationState::default();

        let events = evaluate(&snapshot, hour("2026-08-30T12:00"), HEAT_THRESHOLD_C, &mut state);

        assert_eq!(
            events,
            vec![Event::Rain {
                at: hour("2026-08-30T20:00")
            }]
        );
    }

    #[test]
    fn light_rain_code_does_not_fire() {
        // 61 is light rain, 80 is a rain shower.
        assert!(!is_heavy_rain(61));
        assert!(is_heavy_rain(80));

        let snapshot = snapshot_with_codes("2026-08-30", &[(18, 61)]);
        let mut state = NotificationState::default();

        assert!(evaluate(&snapshot, hour("2026-08-30T17:00"), HEAT_THRESHOLD_C, &mut state).is_empty());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let mut snapshot = snapshot_with_codes("2026-08-30", &[(18, 95), (21, 80)]);
        snapshot.daily_max_temperature = Some(37.5);
        let now = hour("2026-08-30T15:10");

        let mut state = NotificationState::default();
        let first = evaluate(&snapshot, now, HEAT_THRESHOLD_C, &mut state);
        assert_eq!(first.len(), 3);

        let state_after_first = state.clone();
        let second = evaluate(&snapshot, now, HEAT_THRESHOLD_C, &mut state);

        assert!(second.is_empty());
        assert_eq!(state, state_after_first);
    }
}

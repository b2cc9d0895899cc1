use chrono::{NaiveDate, NaiveDateTime};

/// One hour of forecast data, in the target location's local civil time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyEntry {
    pub time: NaiveDateTime,
    pub weather_code: u16,
}

/// Forecast for the deployment coordinate, fetched fresh each check cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSnapshot {
    /// Forecast maximum temperature for the current day, °C.
    pub daily_max_temperature: Option<f64>,
    /// Ascending, at most one entry per hour, from start of day to the end
    /// of the forecast horizon.
    pub hourly: Vec<HourlyEntry>,
}

/// A single notify-worthy occurrence: one day's heat condition or one
/// forecast hour's rain condition. The embedded date/timestamp doubles as
/// the dedup key.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Heat {
        date: NaiveDate,
        max_temperature: f64,
    },
    Rain {
        at: NaiveDateTime,
    },
}

impl Event {
    /// Broadcast message text for this event.
    pub fn message(&self) -> String {
        match self {
            Event::Heat {
                max_temperature, ..
            } => {
                format!(
                    "\u{2600}\u{fe0f} Extreme heat today! Forecast maximum is {max_temperature:.1} \u{b0}C. Stay hydrated and avoid the midday sun."
                )
            }
            Event::Rain { at } => {
                format!(
                    "\u{26c8}\u{fe0f} Heavy rain expected around {}. Plan ahead and stay safe!",
                    at.format("%H:%M")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn heat_message_carries_temperature() {
        let event = Event::Heat {
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            max_temperature: 36.2,
        };
        assert!(event.message().contains("36.2"));
    }

    #[test]
    fn rain_message_carries_hour() {
        let at = NaiveDate::from_ymd_opt(2026, 8, 30)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let event = Event::Rain { at };
        assert!(event.message().contains("18:00"));
    }
}

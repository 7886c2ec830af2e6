use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::time::Duration;

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("bad date {value:?} (should be YYYY-MM-DD)"))
}

pub fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| format!("bad time {value:?} (should be HH:MM)"))
}

/// Start of a new timer: now, or today at `clock` in local time, as UTC.
pub fn start_time(clock: Option<NaiveTime>, now: DateTime<Local>) -> Result<DateTime<Utc>, String> {
    let Some(clock) = clock else {
        return Ok(now.with_timezone(&Utc));
    };
    let local = now.date_naive().and_time(clock);
    Local
        .from_local_datetime(&local)
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        .ok_or_else(|| format!("{} does not exist in the local time zone", clock.format("%H:%M")))
}

pub fn default_report_since(today: NaiveDate) -> NaiveDate {
    today - ChronoDuration::days(1)
}

pub fn elapsed_since(start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - start).to_std().unwrap_or_default()
}

/// `HH:MM:SS`, with hours growing past two digits when needed.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

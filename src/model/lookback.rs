use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Utc};

use crate::config::ConfigError;

/// How many days back from today the source is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    days: u32,
}

impl LookbackWindow {
    pub fn new(days: i64) -> Result<Self, ConfigError> {
        let days = u32::try_from(days).map_err(|_| ConfigError::InvalidLookback(days))?;
        Ok(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Local midnight `days` days before `now`, up to `now`.
    pub fn range_from<Tz: TimeZone>(&self, now: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let first_day = today
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(today);
        let start = now
            .timezone()
            .from_local_datetime(&first_day.and_time(NaiveTime::MIN))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| first_day.and_time(NaiveTime::MIN).and_utc());
        (start, now.with_timezone(&Utc))
    }

    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.range_from(Local::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn negative_days_rejected() {
        let err = LookbackWindow::new(-1).unwrap_err();
        assert_eq!(err.to_string(), "Invalid days: -1");
        assert_eq!(LookbackWindow::new(0).unwrap().days(), 0);
    }

    #[test]
    fn range_starts_at_local_midnight() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2016, 3, 2, 15, 30, 0).unwrap();

        let (start, end) = LookbackWindow::new(1).unwrap().range_from(now);

        assert_eq!(start.to_rfc3339(), "2016-02-29T22:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2016-03-02T13:30:00+00:00");
    }
}

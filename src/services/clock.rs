use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Calendar day of `now` as seen from `offset`.
pub fn calendar_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_calendar_day_respects_offset() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 23, 30, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();

        assert_eq!(calendar_day(now, utc), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(calendar_day(now, tokyo), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(calendar_day(now, new_york), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
    }
}

// src/common/time.rs

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};

/// `[meia-noite de hoje, meia-noite de amanhã)` no fuso de `now`.
pub fn day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);

    (midnight(&tz, today), midnight(&tz, tomorrow))
}

// Dias com horário de verão podem não ter 00:00 local
fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn bounds_are_local_midnights() {
        let riyadh = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = riyadh.with_ymd_and_hms(2026, 10, 16, 1, 30, 0).unwrap();

        let (start, end) = day_bounds(&now);

        assert_eq!(start.to_rfc3339(), "2026-10-16T00:00:00+03:00");
        assert_eq!(end.to_rfc3339(), "2026-10-17T00:00:00+03:00");
        assert!(start <= now && now < end);
    }
}

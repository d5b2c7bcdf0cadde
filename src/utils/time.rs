use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The `count` month starts ending with the month containing `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, count: u32) -> Vec<NaiveDate> {
    let current = month_start(now.date_naive());
    (0..count)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

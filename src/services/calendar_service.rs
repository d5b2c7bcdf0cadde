use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::interview::Slot;
use crate::utils::time::start_of_day;
use crate::utils::token::random_token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed(String),
    Conflict,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn available_slots(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<Vec<Slot>>;
    async fn book(&self, slot: &Slot) -> Result<BookingOutcome>;
    async fn release(&self, booking_ref: &str) -> Result<()>;
}

const DAY_START_HOUR: u32 = 9;
const DAY_END_HOUR: u32 = 18;
const MAX_SUGGESTED_SLOTS: usize = 20;

/// Hourly starts inside weekday business hours (UTC) that fit `duration_minutes`.
///
/// Lazy, so callers that only want the first few starts stop early.
pub fn business_hour_starts(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    duration_minutes: i32,
) -> impl Iterator<Item = DateTime<Utc>> {
    let duration = Duration::minutes(i64::from(duration_minutes));
    std::iter::successors(Some(from.date_naive()), |day| day.succ_opt())
        .take_while(move |day| start_of_day(*day) <= to)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .flat_map(move |day| {
            let close = start_of_day(day) + Duration::hours(i64::from(DAY_END_HOUR));
            (DAY_START_HOUR..DAY_END_HOUR)
                .map(move |hour| start_of_day(day) + Duration::hours(i64::from(hour)))
                .filter(move |start| *start >= from && *start + duration <= close && *start <= to)
        })
}

/// In-process calendar used when no calendar service is configured.
///
/// Bookings live only as long as the process, which is enough to detect
/// double-booking within a single instance.
#[derive(Default)]
pub struct LocalCalendar {
    bookings: Mutex<HashMap<String, Slot>>,
}

impl LocalCalendar {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Slot>>> {
        self.bookings
            .lock()
            .map_err(|_| Error::Internal("calendar lock poisoned".to_string()))
    }
}

#[async_trait]
impl CalendarProvider for LocalCalendar {
    async fn available_slots(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<Vec<Slot>> {
        let bookings = self.lock()?;
        Ok(business_hour_starts(from, to, duration_minutes)
            .map(|start| Slot {
                interviewer_id,
                start,
                duration_minutes,
            })
            .filter(|slot| !bookings.values().any(|b| b.overlaps(slot)))
            .take(MAX_SUGGESTED_SLOTS)
            .collect())
    }

    async fn book(&self, slot: &Slot) -> Result<BookingOutcome> {
        let mut bookings = self.lock()?;
        if bookings.values().any(|b| b.overlaps(slot)) {
            return Ok(BookingOutcome::Conflict);
        }
        let booking_ref = format!("local-{}", random_token(16));
        bookings.insert(booking_ref.clone(), *slot);
        Ok(BookingOutcome::Confirmed(booking_ref))
    }

    async fn release(&self, booking_ref: &str) -> Result<()> {
        self.lock()?.remove(booking_ref);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SlotsResponse {
    #[serde(default)]
    slots: Vec<RemoteSlot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RemoteSlot {
    start: DateTime<Utc>,
    duration_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct BookingResponse {
    booking_ref: String,
}

/// Adapter for an external calendar service speaking JSON over HTTP.
///
/// `409 Conflict` on booking means the slot is taken.
#[derive(Clone)]
pub struct HttpCalendar {
    client: Client,
    base_url: String,
}

impl HttpCalendar {
    pub fn new(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn upstream(context: &str, err: impl std::fmt::Display) -> Error {
    Error::Upstream(format!("Calendar {} failed: {}", context, err))
}

#[async_trait]
impl CalendarProvider for HttpCalendar {
    async fn available_slots(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<Vec<Slot>> {
        let res = self
            .client
            .get(format!("{}/interviewers/{}/availability", self.base_url, interviewer_id))
            .query(&[
                ("from", from.to_rfc3339()),
                ("to", to.to_rfc3339()),
                ("duration_minutes", duration_minutes.to_string()),
            ])
            .timeout(StdDuration::from_secs(15))
            .send()
            .await
            .map_err(|e| upstream("availability", e))?;
        if !res.status().is_success() {
            return Err(upstream("availability", res.status()));
        }
        let body: SlotsResponse = res.json().await.map_err(|e| upstream("availability", e))?;
        Ok(body
            .slots
            .into_iter()
            .map(|s| Slot {
                interviewer_id,
                start: s.start,
                duration_minutes: s.duration_minutes,
            })
            .collect())
    }

    async fn book(&self, slot: &Slot) -> Result<BookingOutcome> {
        let res = self
            .client
            .post(format!("{}/interviewers/{}/bookings", self.base_url, slot.interviewer_id))
            .json(&json!({
                "start": slot.start,
                "end": slot.end(),
                "duration_minutes": slot.duration_minutes,
            }))
            .timeout(StdDuration::from_secs(15))
            .send()
            .await
            .map_err(|e| upstream("booking", e))?;
        match res.status() {
            StatusCode::CONFLICT => Ok(BookingOutcome::Conflict),
            status if status.is_success() => {
                let body: BookingResponse =
                    res.json().await.map_err(|e| upstream("booking", e))?;
                Ok(BookingOutcome::Confirmed(body.booking_ref))
            }
            status => Err(upstream("booking", status)),
        }
    }

    async fn release(&self, booking_ref: &str) -> Result<()> {
        let res = self
            .client
            .delete(format!("{}/bookings/{}", self.base_url, booking_ref))
            .timeout(StdDuration::from_secs(15))
            .send()
            .await
            .map_err(|e| upstream("release", e))?;
        if res.status().is_success() || res.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(upstream("release", res.status()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn business_hours_skip_weekends_and_overflow() {
        // 2024-06-07 is a Friday
        let from = Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 0, 0).unwrap();
        let starts: Vec<_> = business_hour_starts(from, to, 90).collect();
        // 9..=16 fit a 90 minute slot before 18:00, on Friday and Monday only
        assert_eq!(starts.len(), 16);
        assert!(starts.iter().all(|s| s.weekday() != Weekday::Sat && s.weekday() != Weekday::Sun));
        assert_eq!(starts[0].hour(), 9);
        assert_eq!(starts[7].hour(), 16);
    }

    #[tokio::test]
    async fn local_calendar_rejects_overlapping_booking() {
        let calendar = LocalCalendar::default();
        let who = Uuid::new_v4();
        let start = Utc.with_ymd_and_hms(2024, 6, 7, 10, 0, 0).unwrap();
        let first = Slot { interviewer_id: who, start, duration_minutes: 60 };
        let second = Slot { start: start + Duration::minutes(30), ..first };

        let BookingOutcome::Confirmed(booking_ref) = calendar.book(&first).await.unwrap() else {
            panic!("first booking should be confirmed");
        };
        assert_eq!(calendar.book(&second).await.unwrap(), BookingOutcome::Conflict);

        calendar.release(&booking_ref).await.unwrap();
        assert!(matches!(
            calendar.book(&second).await.unwrap(),
            BookingOutcome::Confirmed(_)
        ));
    }

    #[tokio::test]
    async fn local_availability_excludes_booked_hours() {
        let calendar = LocalCalendar::default();
        let who = Uuid::new_v4();
        let from = Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 7, 23, 0, 0).unwrap();
        calendar
            .book(&Slot { interviewer_id: who, start: from + Duration::hours(10), duration_minutes: 60 })
            .await
            .unwrap();
        let slots = calendar.available_slots(who, from, to, 60).await.unwrap();
        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| s.start.hour() != 10));
    }

    #[tokio::test]
    async fn wide_range_stops_after_suggestion_limit() {
        let calendar = LocalCalendar::default();
        let from = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
        let slots = calendar
            .available_slots(Uuid::new_v4(), from, to, 60)
            .await
            .unwrap();
        assert_eq!(slots.len(), MAX_SUGGESTED_SLOTS);
        assert!(slots.iter().all(|s| s.start < from + Duration::days(7)));
    }
}

use crate::domain::model::Reservation;
use crate::utils::error::{DeskError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Inclusive departure window covering whole calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(DeskError::validation(format!(
                "Start date {start_date} is after end date {end_date}"
            )));
        }

        let start_of_day = NaiveTime::from_hms_opt(0, 0, 0)
            .ok_or_else(|| DeskError::validation("invalid start-of-day time"))?;
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| DeskError::validation("invalid end-of-day time"))?;

        Ok(Self {
            start: start_date.and_time(start_of_day).and_utc(),
            end: end_date.and_time(end_of_day).and_utc(),
        })
    }

    /// Both bounds are required; a half-filled range is an input error.
    pub fn from_optional(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            _ => Err(DeskError::validation(
                "Select both a start date and an end date",
            )),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Query-string forms, e.g. `2025-03-01T00:00:00.000Z`.
    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    pub fn apply(&self, reservations: Vec<Reservation>) -> Vec<Reservation> {
        reservations
            .into_iter()
            .filter(|r| self.contains(r.departure_date))
            .collect()
    }
}

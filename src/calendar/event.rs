use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::error::{CalendarError, CalendarResult};

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub const ALL_DAY_START: NaiveTime = match NaiveTime::from_hms_opt(8, 0, 0) {
    Some(time) => time,
    None => panic!("invalid all-day start"),
};
pub const ALL_DAY_END: NaiveTime = match NaiveTime::from_hms_opt(17, 0, 0) {
    Some(time) => time,
    None => panic!("invalid all-day end"),
};

/// A calendar entry. Two events are the same event when subject, start and end agree;
/// the remaining fields never take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventProperty {
    Subject,
    Start,
    End,
    Location,
    Description,
    Status,
}

/// Time-of-day window an all-day event occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllDayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for AllDayWindow {
    fn default() -> Self {
        Self {
            start: ALL_DAY_START,
            end: ALL_DAY_END,
        }
    }
}

impl AllDayWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> CalendarResult<Self> {
        if end < start {
            return Err(CalendarError::unsupported("all-day window ends before it starts"));
        }
        Ok(Self { start, end })
    }

    pub fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.start), date.and_time(self.end))
    }
}

impl Event {
    pub fn new(
        subject: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> CalendarResult<Self> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(CalendarError::InvalidFormat("subject cannot be empty".to_string()));
        }
        if end < start {
            return Err(CalendarError::unsupported("event cannot end before it starts"));
        }

        Ok(Self {
            subject,
            start,
            end,
            location: None,
            description: None,
            status: None,
        })
    }

    pub fn all_day(subject: impl Into<String>, date: NaiveDate, window: AllDayWindow) -> CalendarResult<Self> {
        let (start, end) = window.on(date);
        Self::new(subject, start, end)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            subject: self.subject.clone(),
            start: self.start,
            end: self.end,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn is_single_day(&self) -> bool {
        self.start.date() == self.end.date()
    }

    /// Same event with start and end moved by `delta`.
    pub fn shifted(&self, delta: TimeDelta) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
            ..self.clone()
        }
    }

    /// Same event moved so it starts at `start`, keeping its duration.
    pub fn rescheduled(&self, start: NaiveDateTime) -> Self {
        let duration = self.duration();
        Self {
            start,
            end: start + duration,
            ..self.clone()
        }
    }

    pub fn overlaps_date(&self, date: NaiveDate) -> bool {
        self.start.date() <= date && date <= self.end.date()
    }

    pub fn overlaps_range(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start <= to && from <= self.end
    }

    pub fn occupies(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject && self.start == other.start && self.end == other.end
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subject {} starting on {} at {}, ending on {} at {}",
            self.subject,
            self.start.format(DATE_FORMAT),
            self.start.format(TIME_FORMAT),
            self.end.format(DATE_FORMAT),
            self.end.format(TIME_FORMAT),
        )?;
        if let Some(location) = &self.location
            && !location.is_empty()
        {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

impl EventProperty {
    pub fn is_identity(self) -> bool {
        matches!(self, Self::Subject | Self::Start | Self::End)
    }
}

impl FromStr for EventProperty {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" => Ok(Self::Subject),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "location" => Ok(Self::Location),
            "description" => Ok(Self::Description),
            "status" => Ok(Self::Status),
            other => Err(CalendarError::InvalidFormat(format!("unknown property '{}'", other))),
        }
    }
}

impl FromStr for EventStatus {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(CalendarError::InvalidFormat(format!("unknown status '{}'", other))),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "PUBLIC"),
            Self::Private => write!(f, "PRIVATE"),
        }
    }
}

pub fn parse_date_time(raw: &str) -> CalendarResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
        .map_err(|_| CalendarError::InvalidFormat(format!("invalid date-time '{}', expected YYYY-MM-DDThh:mm", raw)))
}

pub fn parse_date(raw: &str) -> CalendarResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidFormat(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

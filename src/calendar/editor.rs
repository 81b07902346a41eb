use chrono::NaiveDateTime;

use super::error::{CalendarError, CalendarResult};
use super::event::{parse_date_time, Event, EventProperty, EventStatus};

/// A typed new value for one event property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEdit {
    Subject(String),
    Start(NaiveDateTime),
    End(NaiveDateTime),
    Location(Option<String>),
    Description(Option<String>),
    Status(Option<EventStatus>),
}

impl EventEdit {
    pub fn property(&self) -> EventProperty {
        match self {
            Self::Subject(_) => EventProperty::Subject,
            Self::Start(_) => EventProperty::Start,
            Self::End(_) => EventProperty::End,
            Self::Location(_) => EventProperty::Location,
            Self::Description(_) => EventProperty::Description,
            Self::Status(_) => EventProperty::Status,
        }
    }

    /// Parses a raw textual value for `property`. Blank text clears optional fields.
    pub fn parse(property: EventProperty, raw: &str) -> CalendarResult<Self> {
        let optional = |raw: &str| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        match property {
            EventProperty::Subject => Ok(Self::Subject(raw.trim().to_string())),
            EventProperty::Start => parse_date_time(raw).map(Self::Start),
            EventProperty::End => parse_date_time(raw).map(Self::End),
            EventProperty::Location => Ok(Self::Location(optional(raw))),
            EventProperty::Description => Ok(Self::Description(optional(raw))),
            EventProperty::Status => match optional(raw) {
                Some(status) => status.parse().map(|s| Self::Status(Some(s))),
                None => Ok(Self::Status(None)),
            },
        }
    }
}

/// Produces the snapshot `event` becomes after `edit`. A new start keeps the
/// event's duration; a new end may not precede the start.
pub fn apply(event: &Event, edit: &EventEdit) -> CalendarResult<Event> {
    let mut edited = event.clone();
    match edit {
        EventEdit::Subject(subject) => {
            if subject.trim().is_empty() {
                return Err(CalendarError::InvalidFormat("subject cannot be empty".to_string()));
            }
            edited.subject = subject.clone();
        }
        EventEdit::Start(start) => edited = event.rescheduled(*start),
        EventEdit::End(end) => {
            if *end < event.start {
                return Err(CalendarError::unsupported("event cannot end before it starts"));
            }
            edited.end = *end;
        }
        EventEdit::Location(location) => edited.location = location.clone(),
        EventEdit::Description(description) => edited.description = description.clone(),
        EventEdit::Status(status) => edited.status = *status,
    }
    Ok(edited)
}

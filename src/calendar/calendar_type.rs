use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use std::fmt;
use uuid::Uuid;

use super::editor::EventEdit;
use super::error::{CalendarError, CalendarResult};
use super::event::{AllDayWindow, Event, EventKey};
use super::recurrence::{RecurrenceRule, Termination, WeekdaySet};
use super::series::{self, EditScope};
use super::store::EventStore;
use super::zone::convert_wall_clock;

/// Stable handle for a calendar; survives renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarId(Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Busy,
    Available,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "Busy"),
            Self::Available => write!(f, "Available"),
        }
    }
}

/// One named, time-zoned set of events. Event times are wall-clock times in the
/// calendar's zone.
#[derive(Debug)]
pub struct Calendar {
    id: CalendarId,
    name: String,
    timezone: Tz,
    all_day: AllDayWindow,
    store: EventStore,
}

impl Calendar {
    pub fn new(name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            id: CalendarId(Uuid::new_v4()),
            name: name.into(),
            timezone,
            all_day: AllDayWindow::default(),
            store: EventStore::new(),
        }
    }

    pub fn with_all_day_window(mut self, window: AllDayWindow) -> Self {
        self.all_day = window;
        self
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Moves the calendar to `timezone`, rewriting every event so it keeps its
    /// absolute instant.
    pub(crate) fn change_timezone(&mut self, timezone: Tz) -> CalendarResult<()> {
        let from = self.timezone;
        self.store.remap_all(|event| Event {
            start: convert_wall_clock(event.start, from, timezone),
            end: convert_wall_clock(event.end, from, timezone),
            ..event.clone()
        })?;
        self.timezone = timezone;
        Ok(())
    }

    pub fn create_event(&mut self, event: Event) -> CalendarResult<()> {
        self.store.add_single(event)
    }

    pub fn create_all_day_event(&mut self, subject: &str, date: NaiveDate) -> CalendarResult<Event> {
        let event = Event::all_day(subject, date, self.all_day)?;
        self.store.add_single(event.clone())?;
        Ok(event)
    }

    /// Creates one instance of `template` per date the rule produces.
    pub fn create_series(&mut self, template: Event, rule: RecurrenceRule) -> CalendarResult<Vec<Event>> {
        let rule_id = self.store.add_series(rule, &template)?;
        tracing::info!("Created series '{}' in calendar '{}'", template.subject, self.name);
        Ok(self.store.members(rule_id))
    }

    pub fn create_all_day_series(
        &mut self,
        subject: &str,
        first: NaiveDate,
        rule: RecurrenceRule,
    ) -> CalendarResult<Vec<Event>> {
        let template = Event::all_day(subject, first, self.all_day)?;
        self.create_series(template, rule)
    }

    /// Edits the one event with exactly this identity.
    pub fn edit_event(&mut self, key: &EventKey, edit: &EventEdit) -> CalendarResult<Event> {
        let event = self
            .store
            .get(key)
            .ok_or_else(|| CalendarError::EventNotFound(format!("{} at {}", key.subject, key.start)))?;
        series::edit_single(&mut self.store, &event, edit)
    }

    /// Edits the event starting at `start` and, when it belongs to a series, its later siblings.
    pub fn edit_events(&mut self, subject: &str, start: NaiveDateTime, edit: &EventEdit) -> CalendarResult<()> {
        self.edit_scoped(EditScope::Following, subject, start, edit)
    }

    /// Edits every member of the series the event starting at `start` belongs to.
    pub fn edit_series(&mut self, subject: &str, start: NaiveDateTime, edit: &EventEdit) -> CalendarResult<()> {
        self.edit_scoped(EditScope::Entire, subject, start, edit)
    }

    pub fn edit_scoped(
        &mut self,
        scope: EditScope,
        subject: &str,
        start: NaiveDateTime,
        edit: &EventEdit,
    ) -> CalendarResult<()> {
        let event = self.locate(subject, start)?;
        let rule = self.store.rule_id_of(&event);

        match (scope, rule) {
            (EditScope::Following, Some(rule)) => series::edit_following(&mut self.store, rule, &event, edit),
            (EditScope::Entire, Some(rule)) => series::edit_entire(&mut self.store, rule, &event, edit),
            _ => series::edit_single(&mut self.store, &event, edit).map(|_| ()),
        }
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<Event> {
        self.store.on_date(date)
    }

    pub fn events_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Event> {
        self.store.in_range(from, to)
    }

    pub fn status_at(&self, instant: NaiveDateTime) -> Availability {
        if self.store.filter(|event| event.occupies(instant)).is_empty() {
            Availability::Available
        } else {
            Availability::Busy
        }
    }

    pub fn is_in_series(&self, event: &Event) -> bool {
        self.store.rule_id_of(event).is_some()
    }

    pub fn series_weekdays(&self, event: &Event) -> Option<WeekdaySet> {
        self.store.rule_of(event).map(RecurrenceRule::weekdays)
    }

    pub fn series_termination(&self, event: &Event) -> Option<Termination> {
        self.store.rule_of(event).map(RecurrenceRule::termination)
    }

    fn locate(&self, subject: &str, start: NaiveDateTime) -> CalendarResult<Event> {
        let mut matches = self.store.find(subject, start);
        match matches.len() {
            0 => Err(CalendarError::EventNotFound(format!("{} at {}", subject, start))),
            1 => Ok(matches.remove(0)),
            n => Err(CalendarError::unsupported(format!(
                "{} events named '{}' start at {}",
                n, subject, start
            ))),
        }
    }
}

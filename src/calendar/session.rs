use chrono::{NaiveDate, NaiveDateTime};

use super::calendar_type::{Calendar, CalendarId};
use super::error::{CalendarError, CalendarResult};
use super::event::Event;
use super::registry::{CalendarProperty, CalendarRegistry};
use crate::storage::config::Config;

/// A caller-owned view over a registry that remembers which calendar is in use.
///
/// The active calendar is held by id, so renaming it keeps it active.
#[derive(Debug, Default)]
pub struct Session {
    registry: CalendarRegistry,
    active: Option<CalendarId>,
}

impl Session {
    pub fn new(registry: CalendarRegistry) -> Self {
        Self { registry, active: None }
    }

    /// Builds the configured calendars and activates the default one when it exists.
    pub fn from_config(config: &Config) -> CalendarResult<Self> {
        let mut session = Self::new(CalendarRegistry::from_config(config)?);
        if session.registry.calendar(&config.calendars.default).is_ok() {
            session.activate(&config.calendars.default)?;
        } else {
            tracing::warn!("Default calendar '{}' is not configured", config.calendars.default);
        }
        Ok(session)
    }

    pub fn registry(&self) -> &CalendarRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CalendarRegistry {
        &mut self.registry
    }

    pub fn add_calendar(&mut self, name: &str, zone_id: &str) -> CalendarResult<CalendarId> {
        self.registry.add_calendar(name, zone_id)
    }

    pub fn edit_calendar(&mut self, name: &str, property: CalendarProperty, value: &str) -> CalendarResult<()> {
        self.registry.edit_calendar(name, property, value)
    }

    pub fn activate(&mut self, name: &str) -> CalendarResult<()> {
        let id = self.registry.calendar(name)?.id();
        self.active = Some(id);
        tracing::info!("Using calendar '{}'", name);
        Ok(())
    }

    pub fn active(&self) -> CalendarResult<&Calendar> {
        let id = self.active.ok_or(CalendarError::NilActive)?;
        self.registry.by_id(id).ok_or(CalendarError::NilActive)
    }

    pub fn active_mut(&mut self) -> CalendarResult<&mut Calendar> {
        let id = self.active.ok_or(CalendarError::NilActive)?;
        self.registry.by_id_mut(id).ok_or(CalendarError::NilActive)
    }

    pub fn copy_single_event(
        &mut self,
        subject: &str,
        start: NaiveDateTime,
        target: &str,
        target_start: NaiveDateTime,
    ) -> CalendarResult<Vec<Event>> {
        let source = self.active()?.id();
        self.registry
            .copy_single_event(source, subject, start, target, target_start)
    }

    pub fn copy_events_on_date(
        &mut self,
        date: NaiveDate,
        target: &str,
        target_date: NaiveDate,
    ) -> CalendarResult<Vec<Event>> {
        let source = self.active()?.id();
        self.registry.copy_events_on_date(source, date, target, target_date)
    }

    pub fn copy_events_between(
        &mut self,
        first: NaiveDate,
        last: NaiveDate,
        target: &str,
        target_start: NaiveDate,
    ) -> CalendarResult<Vec<Event>> {
        let source = self.active()?.id();
        self.registry
            .copy_events_between(source, first, last, target, target_start)
    }
}

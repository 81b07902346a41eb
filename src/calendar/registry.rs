use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::calendar_type::{Calendar, CalendarId};
use super::error::{CalendarError, CalendarResult};
use super::event::{AllDayWindow, Event};
use super::recurrence::{RecurrenceRule, RuleId, Termination};
use super::store::sort_by_start;
use super::zone::{convert_wall_clock, resolve_zone};
use crate::storage::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarProperty {
    Name,
    Timezone,
}

impl FromStr for CalendarProperty {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "timezone" => Ok(Self::Timezone),
            other => Err(CalendarError::InvalidFormat(format!("unknown calendar property '{}'", other))),
        }
    }
}

/// Named calendars in creation order, plus the algorithms that copy events
/// between them. Copies always name their source calendar explicitly.
#[derive(Debug, Default)]
pub struct CalendarRegistry {
    calendars: Vec<Calendar>,
    all_day: AllDayWindow,
}

impl CalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all_day_window(mut self, window: AllDayWindow) -> Self {
        self.all_day = window;
        self
    }

    /// Builds one calendar per configured entry, in configuration order.
    pub fn from_config(config: &Config) -> CalendarResult<Self> {
        let mut registry = Self::new().with_all_day_window(config.all_day_window()?);
        for entry in &config.calendars.entries {
            registry.add_calendar(&entry.name, &entry.timezone)?;
        }
        Ok(registry)
    }

    pub fn add_calendar(&mut self, name: &str, zone_id: &str) -> CalendarResult<CalendarId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CalendarError::InvalidFormat("calendar name cannot be empty".to_string()));
        }
        if self.position(name).is_some() {
            return Err(CalendarError::AlreadyExists(format!("calendar '{}'", name)));
        }
        let timezone = resolve_zone(zone_id)?;

        let calendar = Calendar::new(name, timezone).with_all_day_window(self.all_day);
        let id = calendar.id();
        self.calendars.push(calendar);
        tracing::info!("Added calendar '{}' in {}", name, timezone);
        Ok(id)
    }

    pub fn edit_calendar(&mut self, name: &str, property: CalendarProperty, value: &str) -> CalendarResult<()> {
        let index = self.require(name)?;

        match property {
            CalendarProperty::Name => {
                let new_name = value.trim();
                if new_name.is_empty() {
                    return Err(CalendarError::InvalidFormat("calendar name cannot be empty".to_string()));
                }
                if self.position(new_name).is_some_and(|other| other != index) {
                    return Err(CalendarError::AlreadyExists(format!("calendar '{}'", new_name)));
                }
                self.calendars[index].rename(new_name);
                tracing::info!("Renamed calendar '{}' to '{}'", name, new_name);
            }
            CalendarProperty::Timezone => {
                let timezone = resolve_zone(value)?;
                self.calendars[index].change_timezone(timezone)?;
                tracing::info!("Moved calendar '{}' to {}", name, timezone);
            }
        }

        Ok(())
    }

    pub fn calendar(&self, name: &str) -> CalendarResult<&Calendar> {
        let index = self.require(name)?;
        Ok(&self.calendars[index])
    }

    pub fn calendar_mut(&mut self, name: &str) -> CalendarResult<&mut Calendar> {
        let index = self.require(name)?;
        Ok(&mut self.calendars[index])
    }

    pub fn by_id(&self, id: CalendarId) -> Option<&Calendar> {
        self.calendars.iter().find(|calendar| calendar.id() == id)
    }

    pub fn by_id_mut(&mut self, id: CalendarId) -> Option<&mut Calendar> {
        self.calendars.iter_mut().find(|calendar| calendar.id() == id)
    }

    pub fn names(&self) -> Vec<&str> {
        self.calendars.iter().map(Calendar::name).collect()
    }

    pub fn timezone_of(&self, name: &str) -> CalendarResult<Tz> {
        self.calendar(name).map(Calendar::timezone)
    }

    /// Copies every event in `source` named `subject` starting at `start` so that it
    /// starts at `target_start` in `target`. Copies are standalone.
    pub fn copy_single_event(
        &mut self,
        source: CalendarId,
        subject: &str,
        start: NaiveDateTime,
        target: &str,
        target_start: NaiveDateTime,
    ) -> CalendarResult<Vec<Event>> {
        let (from, to) = self.copy_endpoints(source, target)?;

        let matches = self.calendars[from].store().find(subject, start);
        if matches.is_empty() {
            return Err(CalendarError::EventNotFound(format!("{} at {}", subject, start)));
        }
        let copies: Vec<Event> = matches
            .iter()
            .map(|event| event.rescheduled(target_start))
            .collect();

        self.insert_copies(to, copies, Vec::new())
    }

    /// Copies every event touching `date` onto `target_date` in `target`, keeping
    /// each one's absolute instant relative to the day. Copies are standalone.
    pub fn copy_events_on_date(
        &mut self,
        source: CalendarId,
        date: NaiveDate,
        target: &str,
        target_date: NaiveDate,
    ) -> CalendarResult<Vec<Event>> {
        let (from, to) = self.copy_endpoints(source, target)?;

        let selection = self.calendars[from].events_on(date);
        if selection.is_empty() {
            return Err(CalendarError::EventNotFound(format!("no events on {}", date)));
        }

        let translation = Translation::new(&self.calendars[from], &self.calendars[to], target_date - date);
        let copies = selection.iter().map(|event| translation.apply(event)).collect();

        self.insert_copies(to, copies, Vec::new())
    }

    /// Copies every event touching `[first, last]` so the interval begins on
    /// `target_start` in `target`.
    ///
    /// Standalone events are translated one by one. Series members are translated
    /// per series, then snapped forward onto their series' weekdays in start order
    /// and attached to a fresh rule in the target.
    pub fn copy_events_between(
        &mut self,
        source: CalendarId,
        first: NaiveDate,
        last: NaiveDate,
        target: &str,
        target_start: NaiveDate,
    ) -> CalendarResult<Vec<Event>> {
        let (from, to) = self.copy_endpoints(source, target)?;
        if last < first {
            return Err(CalendarError::unsupported("interval ends before it starts"));
        }

        let source_calendar = &self.calendars[from];
        let store = source_calendar.store();
        let selection = store.filter(|event| event.start.date() <= last && first <= event.end.date());
        if selection.is_empty() {
            return Err(CalendarError::EventNotFound(format!("no events between {} and {}", first, last)));
        }

        let delta = target_start - first;
        let translation = Translation::new(source_calendar, &self.calendars[to], delta);

        let mut standalone = Vec::new();
        let mut grouped: BTreeMap<RuleId, Vec<Event>> = BTreeMap::new();
        for event in selection {
            match store.rule_id_of(&event) {
                Some(rule) => grouped.entry(rule).or_default().push(event),
                None => standalone.push(translation.apply(&event)),
            }
        }

        let mut groups = Vec::with_capacity(grouped.len());
        for (rule_id, members) in grouped {
            let rule = store
                .rule(rule_id)
                .ok_or_else(|| CalendarError::EventNotFound(format!("series {}", rule_id)))?;
            groups.push(place_group(rule, &members, &translation, target_start, delta)?);
        }

        self.insert_copies(to, standalone, groups)
    }

    fn copy_endpoints(&self, source: CalendarId, target: &str) -> CalendarResult<(usize, usize)> {
        let from = self
            .calendars
            .iter()
            .position(|calendar| calendar.id() == source)
            .ok_or_else(|| CalendarError::NotFound("source calendar".to_string()))?;
        let to = self.require(target)?;
        if from == to {
            return Err(CalendarError::unsupported("cannot copy events into the same calendar"));
        }
        Ok((from, to))
    }

    /// Validates every copy against the target before inserting any of them.
    fn insert_copies(
        &mut self,
        target: usize,
        standalone: Vec<Event>,
        groups: Vec<(Vec<Event>, RecurrenceRule)>,
    ) -> CalendarResult<Vec<Event>> {
        let calendar = &mut self.calendars[target];

        let mut copied: Vec<Event> = standalone.clone();
        copied.extend(groups.iter().flat_map(|(events, _)| events.iter().cloned()));
        calendar.store().ensure_insertable(&copied, &[])?;

        for event in standalone {
            calendar.store_mut().add_single(event)?;
        }
        for (events, rule) in groups {
            calendar.store_mut().add_group(events, rule)?;
        }

        tracing::info!("Copied {} event(s) into calendar '{}'", copied.len(), calendar.name());
        sort_by_start(&mut copied);
        Ok(copied)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.calendars.iter().position(|calendar| calendar.name() == name)
    }

    fn require(&self, name: &str) -> CalendarResult<usize> {
        self.position(name)
            .ok_or_else(|| CalendarError::NotFound(name.to_string()))
    }
}

/// Zone conversion followed by a whole-day shift.
struct Translation {
    from: Tz,
    to: Tz,
    delta: TimeDelta,
}

impl Translation {
    fn new(source: &Calendar, target: &Calendar, delta: TimeDelta) -> Self {
        Self {
            from: source.timezone(),
            to: target.timezone(),
            delta,
        }
    }

    fn apply(&self, event: &Event) -> Event {
        Event {
            start: convert_wall_clock(event.start, self.from, self.to) + self.delta,
            end: convert_wall_clock(event.end, self.from, self.to) + self.delta,
            ..event.clone()
        }
    }
}

/// Translates the selected members of one series and snaps them onto the
/// series' weekdays, never earlier than their translated date, one date apiece.
fn place_group(
    rule: &RecurrenceRule,
    members: &[Event],
    translation: &Translation,
    target_start: NaiveDate,
    delta: TimeDelta,
) -> CalendarResult<(Vec<Event>, RecurrenceRule)> {
    let weekdays = rule.weekdays();
    let mut cursor = target_start;
    let mut placed = Vec::with_capacity(members.len());

    for member in members {
        let translated = translation.apply(member);
        if !translated.is_single_day() {
            return Err(CalendarError::span_across_days());
        }
        let date = weekdays.next_on_or_after(cursor.max(translated.start.date()));
        placed.push(translated.rescheduled(date.and_time(translated.start.time())));
        cursor = date
            .succ_opt()
            .ok_or_else(|| CalendarError::unsupported("series runs past the last representable date"))?;
    }

    let termination = match rule.termination() {
        Termination::Count(_) => Termination::Count(placed.len() as u32),
        Termination::EndDate(end) => {
            let shifted = end
                .checked_add_signed(delta)
                .ok_or_else(|| CalendarError::unsupported("series end date out of range"))?;
            let last_placed = placed.last().map(|event| event.start.date()).unwrap_or(shifted);
            Termination::EndDate(shifted.max(last_placed))
        }
    };

    Ok((placed, rule.with_termination(termination)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::test_support::{at, date};
    use chrono::Datelike;
    use pretty_assertions::assert_eq;

    fn create_test_registry(target_zone: &str) -> (CalendarRegistry, CalendarId) {
        let mut registry = CalendarRegistry::new();
        let school = registry.add_calendar("School", "America/New_York").unwrap();
        registry.add_calendar("Work", target_zone).unwrap();
        (registry, school)
    }

    fn add_pdp_series(registry: &mut CalendarRegistry, rule: RecurrenceRule) {
        let template = Event::new("PDP", at(2025, 10, 7, 13, 35), at(2025, 10, 7, 15, 15)).unwrap();
        registry.calendar_mut("School").unwrap().create_series(template, rule).unwrap();
    }

    #[test]
    fn rejects_duplicate_calendar_name() {
        let (mut registry, _) = create_test_registry("UTC");

        let err = registry.add_calendar("Work", "UTC").unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let mut registry = CalendarRegistry::new();

        let err = registry.add_calendar("Home", "Nowhere/Special").unwrap_err();

        assert!(matches!(err, CalendarError::InvalidFormat(_)));
        assert!(registry.names().is_empty());
    }

    #[test]
    fn builds_calendars_from_config() {
        let mut config = Config::default();
        config.calendars.entries.push(crate::storage::config::CalendarEntry {
            name: "Travel".to_string(),
            timezone: "Asia/Tokyo".to_string(),
        });

        let registry = CalendarRegistry::from_config(&config).unwrap();

        assert_eq!(registry.names(), vec!["Personal", "Travel"]);
        assert_eq!(registry.timezone_of("Travel").unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn config_with_unknown_zone_is_invalid_format() {
        let mut config = Config::default();
        config.calendars.entries[0].timezone = "Atlantis/Capital".to_string();

        let result = CalendarRegistry::from_config(&config);

        assert!(matches!(result, Err(CalendarError::InvalidFormat(_))));
    }

    #[test]
    fn rename_preserves_listing_order() {
        let (mut registry, _) = create_test_registry("UTC");
        registry.add_calendar("Home", "UTC").unwrap();

        registry.edit_calendar("School", CalendarProperty::Name, "Uni").unwrap();

        assert_eq!(registry.names(), vec!["Uni", "Work", "Home"]);
        assert!(matches!(registry.calendar("School"), Err(CalendarError::NotFound(_))));
    }

    #[test]
    fn rename_onto_taken_name_fails() {
        let (mut registry, _) = create_test_registry("UTC");

        let err = registry.edit_calendar("School", CalendarProperty::Name, "Work").unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
    }

    #[test]
    fn editing_unknown_calendar_is_not_found() {
        let (mut registry, _) = create_test_registry("UTC");

        let err = registry.edit_calendar("Gym", CalendarProperty::Timezone, "UTC").unwrap_err();

        assert!(matches!(err, CalendarError::NotFound(_)));
    }

    #[test]
    fn timezone_edit_converts_every_event() {
        let (mut registry, _) = create_test_registry("UTC");
        add_pdp_series(&mut registry, RecurrenceRule::count("TF".parse().unwrap(), 2).unwrap());

        registry.edit_calendar("School", CalendarProperty::Timezone, "Europe/London").unwrap();

        let school = registry.calendar("School").unwrap();
        assert_eq!(school.timezone(), chrono_tz::Europe::London);
        let starts: Vec<_> = school.store().all().iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![at(2025, 10, 7, 18, 35), at(2025, 10, 10, 18, 35)]);
    }

    #[test]
    fn timezone_edit_folding_events_together_changes_nothing() {
        let (mut registry, _) = create_test_registry("UTC");
        let work = registry.calendar_mut("Work").unwrap();
        // 05:30 and 06:30 UTC both read 01:30 in New York on the fall-back night.
        let daylight = Event::new("Backup", at(2025, 11, 2, 5, 30), at(2025, 11, 2, 5, 45)).unwrap();
        let standard = Event::new("Backup", at(2025, 11, 2, 6, 30), at(2025, 11, 2, 6, 45)).unwrap();
        work.create_event(daylight).unwrap();
        work.create_event(standard).unwrap();
        let template = Event::new("Sync", at(2025, 11, 3, 14, 0), at(2025, 11, 3, 15, 0)).unwrap();
        let rule = RecurrenceRule::count("M".parse().unwrap(), 2).unwrap();
        work.create_series(template, rule).unwrap();
        let before = work.store().all();

        let err = registry
            .edit_calendar("Work", CalendarProperty::Timezone, "America/New_York")
            .unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        let work = registry.calendar("Work").unwrap();
        assert_eq!(work.timezone(), chrono_tz::UTC);
        assert_eq!(work.store().len(), 4);
        assert_eq!(work.store().rule_count(), 1);
        assert_eq!(work.store().all(), before);
    }

    #[test]
    fn copy_single_event_anchors_at_target_start() {
        let (mut registry, school) = create_test_registry("Asia/Tokyo");
        add_pdp_series(&mut registry, RecurrenceRule::count("TF".parse().unwrap(), 2).unwrap());

        let copies = registry
            .copy_single_event(school, "PDP", at(2025, 10, 10, 13, 35), "Work", at(2025, 11, 3, 8, 0))
            .unwrap();

        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].end, at(2025, 11, 3, 9, 40));
        let work = registry.calendar("Work").unwrap();
        assert!(!work.is_in_series(&copies[0]));
        assert_eq!(work.store().len(), 1);
    }

    #[test]
    fn copy_single_event_collision_inserts_nothing() {
        let (mut registry, school) = create_test_registry("Asia/Tokyo");
        add_pdp_series(&mut registry, RecurrenceRule::count("TF".parse().unwrap(), 2).unwrap());
        registry
            .calendar_mut("Work")
            .unwrap()
            .create_event(Event::new("PDP", at(2025, 11, 3, 8, 0), at(2025, 11, 3, 9, 40)).unwrap())
            .unwrap();
        let template = Event::new("Sync", at(2025, 11, 4, 10, 0), at(2025, 11, 4, 11, 0)).unwrap();
        registry
            .calendar_mut("Work")
            .unwrap()
            .create_series(template, RecurrenceRule::count("T".parse().unwrap(), 2).unwrap())
            .unwrap();

        let err = registry
            .copy_single_event(school, "PDP", at(2025, 10, 10, 13, 35), "Work", at(2025, 11, 3, 8, 0))
            .unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        let work = registry.calendar("Work").unwrap();
        assert_eq!(work.store().len(), 3);
        assert_eq!(work.store().rule_count(), 1);
    }

    #[test]
    fn copy_single_event_without_match_fails() {
        let (mut registry, school) = create_test_registry("UTC");

        let err = registry
            .copy_single_event(school, "PDP", at(2025, 10, 10, 13, 35), "Work", at(2025, 11, 3, 8, 0))
            .unwrap_err();

        assert!(matches!(err, CalendarError::EventNotFound(_)));
    }

    #[test]
    fn copy_into_unknown_calendar_is_not_found() {
        let (mut registry, school) = create_test_registry("UTC");

        let err = registry
            .copy_events_on_date(school, date(2025, 10, 7), "Gym", date(2025, 10, 8))
            .unwrap_err();

        assert!(matches!(err, CalendarError::NotFound(_)));
    }

    #[test]
    fn copy_onto_source_is_unsupported() {
        let (mut registry, school) = create_test_registry("UTC");

        let err = registry
            .copy_events_on_date(school, date(2025, 10, 7), "School", date(2025, 10, 8))
            .unwrap_err();

        assert!(matches!(err, CalendarError::Unsupported(_)));
    }

    #[test]
    fn copy_on_date_includes_multi_day_events_as_standalone() {
        let (mut registry, school) = create_test_registry("America/New_York");
        {
            let calendar = registry.calendar_mut("School").unwrap();
            calendar
                .create_event(Event::new("Standup", at(2025, 3, 10, 9, 0), at(2025, 3, 10, 10, 0)).unwrap())
                .unwrap();
            calendar
                .create_event(Event::new("Conference", at(2025, 3, 9, 18, 0), at(2025, 3, 11, 8, 0)).unwrap())
                .unwrap();
        }

        let copies = registry
            .copy_events_on_date(school, date(2025, 3, 10), "Work", date(2025, 4, 1))
            .unwrap();

        let rendered: Vec<String> = copies.iter().map(Event::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "subject Conference starting on 2025-03-31 at 18:00, ending on 2025-04-02 at 08:00",
                "subject Standup starting on 2025-04-01 at 09:00, ending on 2025-04-01 at 10:00",
            ]
        );
        let work = registry.calendar("Work").unwrap();
        assert!(work.store().all().iter().all(|e| !work.is_in_series(e)));
    }

    #[test]
    fn copy_on_date_converts_timezone() {
        let (mut registry, school) = create_test_registry("Europe/London");
        add_pdp_series(&mut registry, RecurrenceRule::count("TF".parse().unwrap(), 2).unwrap());

        let copies = registry
            .copy_events_on_date(school, date(2025, 10, 7), "Work", date(2025, 10, 8))
            .unwrap();

        assert_eq!(copies[0].start, at(2025, 10, 8, 18, 35));
        assert_eq!(copies[0].end, at(2025, 10, 8, 20, 15));
    }

    #[test]
    fn copy_on_date_collision_inserts_nothing() {
        let (mut registry, school) = create_test_registry("America/New_York");
        registry
            .calendar_mut("School")
            .unwrap()
            .create_event(Event::new("A", at(2025, 3, 10, 9, 0), at(2025, 3, 10, 10, 0)).unwrap())
            .unwrap();
        registry
            .calendar_mut("School")
            .unwrap()
            .create_event(Event::new("B", at(2025, 3, 10, 11, 0), at(2025, 3, 10, 12, 0)).unwrap())
            .unwrap();
        registry
            .calendar_mut("Work")
            .unwrap()
            .create_event(Event::new("B", at(2025, 3, 11, 11, 0), at(2025, 3, 11, 12, 0)).unwrap())
            .unwrap();

        let err = registry
            .copy_events_on_date(school, date(2025, 3, 10), "Work", date(2025, 3, 11))
            .unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        assert_eq!(registry.calendar("Work").unwrap().store().len(), 1);
    }

    #[test]
    fn copy_between_snaps_series_members_onto_pattern() {
        let (mut registry, school) = create_test_registry("America/New_York");
        add_pdp_series(&mut registry, RecurrenceRule::count("TF".parse().unwrap(), 4).unwrap());
        registry
            .calendar_mut("School")
            .unwrap()
            .create_event(Event::new("Lunch", at(2025, 10, 8, 12, 0), at(2025, 10, 8, 13, 0)).unwrap())
            .unwrap();

        let copies = registry
            .copy_events_between(school, date(2025, 10, 7), date(2025, 10, 14), "Work", date(2025, 10, 20))
            .unwrap();

        let work = registry.calendar("Work").unwrap();
        let series: Vec<Event> = copies.iter().filter(|e| e.subject == "PDP").cloned().collect();
        assert_eq!(
            series.iter().map(|e| e.start).collect::<Vec<_>>(),
            vec![at(2025, 10, 21, 13, 35), at(2025, 10, 24, 13, 35), at(2025, 10, 28, 13, 35)]
        );
        let rule = work.store().rule_of(&series[0]).unwrap();
        assert_eq!(rule.termination(), Termination::Count(3));
        assert_eq!(work.store().members(rule.id()).len(), 3);
        assert!(series.iter().all(|e| rule.weekdays().contains(e.start.weekday())));

        let lunch = work.store().find("Lunch", at(2025, 10, 21, 12, 0));
        assert_eq!(lunch.len(), 1);
        assert!(!work.is_in_series(&lunch[0]));
        assert_eq!(registry.calendar("School").unwrap().store().len(), 5);
    }

    #[test]
    fn copy_between_shifts_end_date_rules() {
        let (mut registry, school) = create_test_registry("America/Los_Angeles");
        let rule = RecurrenceRule::until("TF".parse().unwrap(), date(2025, 10, 17)).unwrap();
        add_pdp_series(&mut registry, rule);

        let copies = registry
            .copy_events_between(school, date(2025, 10, 7), date(2025, 10, 14), "Work", date(2025, 10, 21))
            .unwrap();

        assert_eq!(
            copies.iter().map(|e| e.start).collect::<Vec<_>>(),
            vec![at(2025, 10, 21, 10, 35), at(2025, 10, 24, 10, 35), at(2025, 10, 28, 10, 35)]
        );
        let work = registry.calendar("Work").unwrap();
        assert_eq!(
            work.series_termination(&copies[0]),
            Some(Termination::EndDate(date(2025, 10, 31)))
        );
    }

    #[test]
    fn copy_between_rejects_series_pushed_across_midnight() {
        let (mut registry, school) = create_test_registry("Europe/London");
        let template = Event::new("Evening", at(2025, 10, 7, 18, 0), at(2025, 10, 7, 21, 0)).unwrap();
        registry
            .calendar_mut("School")
            .unwrap()
            .create_series(template, RecurrenceRule::count("T".parse().unwrap(), 2).unwrap())
            .unwrap();

        let err = registry
            .copy_events_between(school, date(2025, 10, 7), date(2025, 10, 14), "Work", date(2025, 11, 4))
            .unwrap_err();

        assert!(matches!(err, CalendarError::Unsupported(_)));
        assert!(registry.calendar("Work").unwrap().store().is_empty());
    }

    #[test]
    fn copy_between_collision_inserts_nothing() {
        let (mut registry, school) = create_test_registry("America/New_York");
        add_pdp_series(&mut registry, RecurrenceRule::count("TF".parse().unwrap(), 4).unwrap());
        registry
            .calendar_mut("Work")
            .unwrap()
            .create_event(Event::new("PDP", at(2025, 10, 24, 13, 35), at(2025, 10, 24, 15, 15)).unwrap())
            .unwrap();

        let err = registry
            .copy_events_between(school, date(2025, 10, 7), date(2025, 10, 14), "Work", date(2025, 10, 21))
            .unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        let work = registry.calendar("Work").unwrap();
        assert_eq!(work.store().len(), 1);
        assert_eq!(work.store().rule_count(), 0);
        assert!(work.store().find("PDP", at(2025, 10, 21, 13, 35)).is_empty());
    }

    #[test]
    fn copy_between_empty_interval_fails() {
        let (mut registry, school) = create_test_registry("UTC");

        let err = registry
            .copy_events_between(school, date(2025, 1, 1), date(2025, 1, 31), "Work", date(2025, 2, 1))
            .unwrap_err();

        assert!(matches!(err, CalendarError::EventNotFound(_)));
    }
}

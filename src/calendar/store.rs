use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};

use super::error::{CalendarError, CalendarResult};
use super::event::{Event, EventKey, EventProperty};
use super::recurrence::{RecurrenceRule, RuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EventId(u64);

#[derive(Debug)]
struct Slot {
    event: Event,
    rule: Option<RuleId>,
}

/// Canonical set of events for one calendar.
///
/// Events live in an arena keyed by a generated id; each slot records the rule it
/// belongs to, if any. A secondary index keeps identity keys unique. Every query
/// hands back owned snapshots sorted by start time.
#[derive(Debug, Default)]
pub struct EventStore {
    slots: HashMap<EventId, Slot>,
    keys: HashMap<EventKey, EventId>,
    rules: HashMap<RuleId, RecurrenceRule>,
    next_id: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn add_single(&mut self, event: Event) -> CalendarResult<()> {
        if self.contains(&event.key()) {
            return Err(already_exists(&event));
        }
        tracing::debug!("Adding single event '{}' at {}", event.subject, event.start);
        self.insert_slot(event, None);
        Ok(())
    }

    /// Generates the rule's instances from `template` and stores them all, or none
    /// of them if any instance collides with an existing event.
    pub fn add_series(&mut self, rule: RecurrenceRule, template: &Event) -> CalendarResult<RuleId> {
        let events = rule.generate(template)?;
        if events.is_empty() {
            return Err(CalendarError::unsupported("series has no occurrences"));
        }
        self.add_group(events, rule)
    }

    /// Stores already-dated events as the members of `rule`.
    pub(crate) fn add_group(&mut self, events: Vec<Event>, rule: RecurrenceRule) -> CalendarResult<RuleId> {
        self.swap_group(&[], events, rule)
    }

    /// Removes `outgoing` and stores `incoming` as members of `rule` in one step.
    /// Nothing changes when validation fails.
    pub(crate) fn swap_group(
        &mut self,
        outgoing: &[Event],
        incoming: Vec<Event>,
        rule: RecurrenceRule,
    ) -> CalendarResult<RuleId> {
        self.ensure_present(outgoing)?;
        self.ensure_insertable(&incoming, outgoing)?;
        if incoming.iter().any(|event| !event.is_single_day()) {
            return Err(CalendarError::span_across_days());
        }

        for event in outgoing {
            self.detach(&event.key());
        }

        let rule_id = rule.id();
        tracing::debug!("Registering rule {} with {} members", rule_id, incoming.len());
        self.rules.insert(rule_id, rule);
        for event in incoming {
            self.insert_slot(event, Some(rule_id));
        }
        self.prune_rules();

        Ok(rule_id)
    }

    /// Moves existing events under a newly registered `rule`; their fields are untouched.
    pub(crate) fn regroup(&mut self, members: &[Event], rule: RecurrenceRule) -> CalendarResult<RuleId> {
        self.ensure_present(members)?;

        let rule_id = rule.id();
        self.rules.insert(rule_id, rule);
        for event in members {
            if let Some(slot) = self
                .keys
                .get(&event.key())
                .and_then(|id| self.slots.get_mut(id))
            {
                slot.rule = Some(rule_id);
            }
        }
        self.prune_rules();

        Ok(rule_id)
    }

    /// Swaps `old` for `new`.
    ///
    /// A series member whose start moves to another date leaves its series and the
    /// series' occurrence count drops by one. A member that stays in its series must
    /// start and end on the same date.
    pub fn replace(&mut self, old: &Event, new: Event, changed: EventProperty) -> CalendarResult<()> {
        let old_key = old.key();
        let id = *self
            .keys
            .get(&old_key)
            .ok_or_else(|| CalendarError::EventNotFound(old.to_string()))?;
        let rule = self.slots.get(&id).and_then(|slot| slot.rule);

        let new_key = new.key();
        if new_key != old_key && self.contains(&new_key) {
            return Err(already_exists(&new));
        }

        let detaches = rule.is_some()
            && changed == EventProperty::Start
            && new.start.date() != old.start.date();
        if rule.is_some() && !detaches && !new.is_single_day() {
            return Err(CalendarError::span_across_days());
        }

        self.keys.remove(&old_key);
        self.keys.insert(new_key, id);
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.event = new;
            if detaches {
                slot.rule = None;
            }
        }

        if let Some(rule_id) = rule
            && detaches
        {
            if let Some(rule) = self.rules.get_mut(&rule_id) {
                rule.decrement();
                tracing::debug!("Detached event from rule {}, now {:?}", rule_id, rule.termination());
            }
            self.prune_rules();
        }

        Ok(())
    }

    /// Replaces several events at once, keeping each one's series membership.
    pub fn replace_members(&mut self, changes: Vec<(Event, Event)>) -> CalendarResult<()> {
        let (outgoing, incoming): (Vec<Event>, Vec<Event>) = changes.into_iter().unzip();
        self.ensure_present(&outgoing)?;
        self.ensure_insertable(&incoming, &outgoing)?;
        for (old, new) in outgoing.iter().zip(&incoming) {
            if self.rule_id_of(old).is_some() && !new.is_single_day() {
                return Err(CalendarError::span_across_days());
            }
        }

        let ids: Vec<EventId> = outgoing
            .iter()
            .filter_map(|old| self.keys.remove(&old.key()))
            .collect();
        for (id, new) in ids.into_iter().zip(incoming) {
            self.keys.insert(new.key(), id);
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.event = new;
            }
        }

        Ok(())
    }

    /// Rewrites every stored event through `transform`, keeping membership.
    pub(crate) fn remap_all(&mut self, transform: impl Fn(&Event) -> Event) -> CalendarResult<()> {
        let remapped: Vec<(EventId, Event)> = self
            .slots
            .iter()
            .map(|(id, slot)| (*id, transform(&slot.event)))
            .collect();

        let mut seen = HashSet::new();
        for (_, event) in &remapped {
            if !seen.insert(event.key()) {
                return Err(already_exists(event));
            }
        }

        self.keys.clear();
        for (id, event) in remapped {
            self.keys.insert(event.key(), id);
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.event = event;
            }
        }

        Ok(())
    }

    /// Fails unless every `incoming` event could be stored once `outgoing` is gone.
    pub(crate) fn ensure_insertable(&self, incoming: &[Event], outgoing: &[Event]) -> CalendarResult<()> {
        let leaving: HashSet<EventKey> = outgoing.iter().map(Event::key).collect();
        let mut seen = HashSet::new();

        for event in incoming {
            let key = event.key();
            let taken = self.contains(&key) && !leaving.contains(&key);
            if taken || !seen.insert(key) {
                return Err(already_exists(event));
            }
        }

        Ok(())
    }

    pub fn get(&self, key: &EventKey) -> Option<Event> {
        self.keys
            .get(key)
            .and_then(|id| self.slots.get(id))
            .map(|slot| slot.event.clone())
    }

    pub fn find(&self, subject: &str, start: NaiveDateTime) -> Vec<Event> {
        self.filter(|event| event.subject == subject && event.start == start)
    }

    pub fn filter(&self, predicate: impl Fn(&Event) -> bool) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .slots
            .values()
            .map(|slot| &slot.event)
            .filter(|event| predicate(event))
            .cloned()
            .collect();
        sort_by_start(&mut events);
        events
    }

    pub fn all(&self) -> Vec<Event> {
        self.filter(|_| true)
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<Event> {
        self.filter(|event| event.overlaps_date(date))
    }

    pub fn in_range(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Event> {
        self.filter(|event| event.overlaps_range(from, to))
    }

    pub fn rule_id_of(&self, event: &Event) -> Option<RuleId> {
        self.keys
            .get(&event.key())
            .and_then(|id| self.slots.get(id))
            .and_then(|slot| slot.rule)
    }

    pub fn rule(&self, id: RuleId) -> Option<&RecurrenceRule> {
        self.rules.get(&id)
    }

    pub fn rule_of(&self, event: &Event) -> Option<&RecurrenceRule> {
        self.rule_id_of(event).and_then(|id| self.rule(id))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn members(&self, rule: RuleId) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .slots
            .values()
            .filter(|slot| slot.rule == Some(rule))
            .map(|slot| slot.event.clone())
            .collect();
        sort_by_start(&mut events);
        events
    }

    fn ensure_present(&self, events: &[Event]) -> CalendarResult<()> {
        match events.iter().find(|event| !self.contains(&event.key())) {
            Some(missing) => Err(CalendarError::EventNotFound(missing.to_string())),
            None => Ok(()),
        }
    }

    fn insert_slot(&mut self, event: Event, rule: Option<RuleId>) {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.keys.insert(event.key(), id);
        self.slots.insert(id, Slot { event, rule });
    }

    fn detach(&mut self, key: &EventKey) -> Option<Event> {
        let id = self.keys.remove(key)?;
        self.slots.remove(&id).map(|slot| slot.event)
    }

    fn prune_rules(&mut self) {
        let live: HashSet<RuleId> = self.slots.values().filter_map(|slot| slot.rule).collect();
        let before = self.rules.len();
        self.rules.retain(|id, _| live.contains(id));
        if self.rules.len() != before {
            tracing::debug!("Discarded {} empty rule(s)", before - self.rules.len());
        }
    }
}

pub(crate) fn sort_by_start(events: &mut [Event]) {
    events.sort_by(|a, b| (a.start, a.end, &a.subject).cmp(&(b.start, b.end, &b.subject)));
}

fn already_exists(event: &Event) -> CalendarError {
    CalendarError::AlreadyExists(event.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::test_support::at;
    use crate::calendar::recurrence::Termination;
    use proptest::prelude::*;

    fn create_test_event(subject: &str, start: NaiveDateTime, end: NaiveDateTime) -> Event {
        Event::new(subject, start, end).unwrap()
    }

    fn create_test_series(store: &mut EventStore) -> RuleId {
        let rule = RecurrenceRule::count("TF".parse().unwrap(), 4).unwrap();
        let template = create_test_event("PDP", at(2025, 10, 7, 13, 35), at(2025, 10, 7, 15, 15));
        store.add_series(rule, &template).unwrap()
    }

    #[test]
    fn rejects_duplicate_identity() {
        let mut store = EventStore::new();
        let event = create_test_event("Lunch", at(2025, 1, 1, 12, 0), at(2025, 1, 1, 13, 0));
        store.add_single(event.clone()).unwrap();

        let err = store.add_single(event.with_location("elsewhere")).unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn series_registers_membership_for_every_instance() {
        let mut store = EventStore::new();
        let rule = create_test_series(&mut store);

        assert_eq!(store.members(rule).len(), 4);
        assert!(store.all().iter().all(|e| store.rule_id_of(e) == Some(rule)));
    }

    #[test]
    fn series_insertion_is_all_or_nothing() {
        let mut store = EventStore::new();
        store
            .add_single(create_test_event("PDP", at(2025, 10, 14, 13, 35), at(2025, 10, 14, 15, 15)))
            .unwrap();

        let rule = RecurrenceRule::count("TF".parse().unwrap(), 4).unwrap();
        let template = create_test_event("PDP", at(2025, 10, 7, 13, 35), at(2025, 10, 7, 15, 15));
        let err = store.add_series(rule, &template).unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.rule_count(), 0);
    }

    #[test]
    fn series_without_occurrences_is_rejected() {
        let mut store = EventStore::new();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let rule = RecurrenceRule::until("M".parse().unwrap(), end).unwrap();
        let template = create_test_event("Late", at(2025, 2, 3, 9, 0), at(2025, 2, 3, 10, 0));

        assert!(store.add_series(rule, &template).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn start_change_on_same_date_keeps_membership() {
        let mut store = EventStore::new();
        let rule = create_test_series(&mut store);
        let old = store.members(rule)[1].clone();
        let new = old.rescheduled(at(2025, 10, 10, 9, 0));

        store.replace(&old, new.clone(), EventProperty::Start).unwrap();

        assert_eq!(store.rule_id_of(&new), Some(rule));
        assert_eq!(store.rule(rule).unwrap().termination(), Termination::Count(4));
    }

    #[test]
    fn start_change_to_other_date_detaches_and_decrements() {
        let mut store = EventStore::new();
        let rule = create_test_series(&mut store);
        let old = store.members(rule)[1].clone();
        let new = old.rescheduled(at(2025, 10, 11, 13, 35));

        store.replace(&old, new.clone(), EventProperty::Start).unwrap();

        assert_eq!(store.rule_id_of(&new), None);
        assert_eq!(store.members(rule).len(), 3);
        assert_eq!(store.rule(rule).unwrap().termination(), Termination::Count(3));
    }

    #[test]
    fn detaching_last_member_discards_rule() {
        let mut store = EventStore::new();
        let rule = RecurrenceRule::count("T".parse().unwrap(), 1).unwrap();
        let template = create_test_event("Once", at(2025, 10, 7, 9, 0), at(2025, 10, 7, 10, 0));
        let rule_id = store.add_series(rule, &template).unwrap();
        let old = store.members(rule_id)[0].clone();

        store
            .replace(&old, old.rescheduled(at(2025, 10, 9, 9, 0)), EventProperty::Start)
            .unwrap();

        assert_eq!(store.rule_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn member_end_cannot_move_to_next_day() {
        let mut store = EventStore::new();
        let rule = create_test_series(&mut store);
        let old = store.members(rule)[0].clone();
        let new = Event { end: at(2025, 10, 8, 1, 0), ..old.clone() };

        let err = store.replace(&old, new, EventProperty::End).unwrap_err();

        assert_eq!(err, CalendarError::span_across_days());
        assert!(store.contains(&old.key()));
    }

    #[test]
    fn standalone_event_may_span_days_after_edit() {
        let mut store = EventStore::new();
        let old = create_test_event("Trip", at(2025, 6, 1, 9, 0), at(2025, 6, 1, 18, 0));
        store.add_single(old.clone()).unwrap();
        let new = Event { end: at(2025, 6, 3, 18, 0), ..old.clone() };

        store.replace(&old, new, EventProperty::End).unwrap();

        assert_eq!(store.all()[0].end, at(2025, 6, 3, 18, 0));
    }

    #[test]
    fn replace_rejects_identity_collision() {
        let mut store = EventStore::new();
        let a = create_test_event("A", at(2025, 6, 1, 9, 0), at(2025, 6, 1, 10, 0));
        let b = create_test_event("B", at(2025, 6, 1, 9, 0), at(2025, 6, 1, 10, 0));
        store.add_single(a.clone()).unwrap();
        store.add_single(b).unwrap();

        let renamed = Event { subject: "B".to_string(), ..a.clone() };
        let err = store.replace(&a, renamed, EventProperty::Subject).unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        assert!(store.contains(&a.key()));
    }

    #[test]
    fn replace_members_is_atomic() {
        let mut store = EventStore::new();
        let rule = create_test_series(&mut store);
        let members = store.members(rule);
        store
            .add_single(create_test_event("Renamed", at(2025, 10, 17, 13, 35), at(2025, 10, 17, 15, 15)))
            .unwrap();

        let changes = members
            .iter()
            .map(|e| (e.clone(), Event { subject: "Renamed".to_string(), ..e.clone() }))
            .collect();
        let err = store.replace_members(changes).unwrap_err();

        assert!(matches!(err, CalendarError::AlreadyExists(_)));
        assert_eq!(store.members(rule), members);
    }

    #[test]
    fn swap_group_retires_emptied_rule() {
        let mut store = EventStore::new();
        let rule = create_test_series(&mut store);
        let members = store.members(rule);
        let replacement = store.rule(rule).unwrap().fresh_clone();
        let hour = chrono::TimeDelta::hours(1);
        let shifted: Vec<Event> = members.iter().map(|e| e.shifted(hour)).collect();

        let new_rule = store.swap_group(&members, shifted, replacement).unwrap();

        assert!(store.rule(rule).is_none());
        assert_eq!(store.members(new_rule).len(), 4);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn queries_return_sorted_snapshots() {
        let mut store = EventStore::new();
        store
            .add_single(create_test_event("Late", at(2025, 6, 1, 15, 0), at(2025, 6, 1, 16, 0)))
            .unwrap();
        store
            .add_single(create_test_event("Early", at(2025, 6, 1, 8, 0), at(2025, 6, 1, 9, 0)))
            .unwrap();
        store
            .add_single(create_test_event("Other day", at(2025, 6, 2, 8, 0), at(2025, 6, 2, 9, 0)))
            .unwrap();

        let day: Vec<String> = store
            .on_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .into_iter()
            .map(|e| e.subject)
            .collect();

        assert_eq!(day, vec!["Early", "Late"]);
        assert_eq!(store.in_range(at(2025, 6, 1, 15, 30), at(2025, 6, 2, 8, 0)).len(), 2);
    }

    proptest! {
        #[test]
        fn store_never_holds_duplicate_keys(
            inserts in proptest::collection::vec((0u8..4, 0u32..6, 1u32..3), 1..40)
        ) {
            let mut store = EventStore::new();
            let mut accepted = HashSet::new();

            for (subject, hour, length) in inserts {
                let start = at(2025, 1, 1, hour, 0);
                let end = at(2025, 1, 1, hour + length, 0);
                let event = create_test_event(&format!("S{}", subject), start, end);
                let fresh = !accepted.contains(&event.key());
                prop_assert_eq!(store.add_single(event.clone()).is_ok(), fresh);
                accepted.insert(event.key());
            }

            let keys: HashSet<EventKey> = store.all().iter().map(Event::key).collect();
            prop_assert_eq!(keys.len(), store.len());
            prop_assert_eq!(store.len(), accepted.len());
        }
    }
}

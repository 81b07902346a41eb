use chrono::NaiveDateTime;

use super::editor::{self, EventEdit};
use super::error::{CalendarError, CalendarResult};
use super::event::Event;
use super::recurrence::{RuleId, Termination};
use super::store::EventStore;

/// How far an edit reaches within a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Only the addressed instance.
    Single,
    /// The addressed instance and every later member of its series.
    Following,
    /// Every member of the series.
    Entire,
}

pub fn edit_single(store: &mut EventStore, event: &Event, edit: &EventEdit) -> CalendarResult<Event> {
    let updated = editor::apply(event, edit)?;
    store.replace(event, updated.clone(), edit.property())?;
    Ok(updated)
}

/// Applies `edit` to `pivot` and every later member of `rule`.
///
/// A new start splits the series: earlier members move to a rule ending the day
/// before the pivot, and the rest are regenerated from the new anchor date and
/// the weekday pattern rather than shifted.
pub fn edit_following(
    store: &mut EventStore,
    rule: RuleId,
    pivot: &Event,
    edit: &EventEdit,
) -> CalendarResult<()> {
    let (past, future): (Vec<Event>, Vec<Event>) = store
        .members(rule)
        .into_iter()
        .partition(|member| member.start < pivot.start);

    match edit {
        EventEdit::Start(anchor) => split(store, rule, pivot, &past, &future, *anchor),
        EventEdit::End(end) => retime_ends(store, pivot, &future, *end),
        _ => replace_each(store, &future, edit),
    }
}

/// Applies `edit` to every member of `rule`. Start changes may move the time of
/// day but never the date.
pub fn edit_entire(
    store: &mut EventStore,
    rule: RuleId,
    pivot: &Event,
    edit: &EventEdit,
) -> CalendarResult<()> {
    let members = store.members(rule);

    match edit {
        EventEdit::Start(new_start) => {
            let shift = *new_start - pivot.start;
            let shifted: Vec<Event> = members.iter().map(|member| member.shifted(shift)).collect();
            let moves_date = members
                .iter()
                .zip(&shifted)
                .any(|(before, after)| before.start.date() != after.start.date());
            if moves_date {
                tracing::warn!("Rejected series start change for '{}' crossing a date", pivot.subject);
                return Err(CalendarError::unsupported("cannot change date for the entire series"));
            }

            let replacement = store
                .rule(rule)
                .ok_or_else(|| CalendarError::EventNotFound(pivot.to_string()))?
                .fresh_clone();
            store.swap_group(&members, shifted, replacement)?;
            Ok(())
        }
        EventEdit::End(end) => retime_ends(store, pivot, &members, *end),
        _ => replace_each(store, &members, edit),
    }
}

fn split(
    store: &mut EventStore,
    rule: RuleId,
    pivot: &Event,
    past: &[Event],
    future: &[Event],
    anchor: NaiveDateTime,
) -> CalendarResult<()> {
    let original = store
        .rule(rule)
        .ok_or_else(|| CalendarError::EventNotFound(pivot.to_string()))?;

    let termination = match original.termination() {
        Termination::Count(_) => Termination::Count(future.len() as u32),
        Termination::EndDate(last) => Termination::EndDate(last),
    };
    let future_rule = original.with_termination(termination);

    let past_rule = if past.is_empty() {
        None
    } else {
        let day_before = pivot
            .start
            .date()
            .pred_opt()
            .ok_or_else(|| CalendarError::unsupported("series cannot be split before its first date"))?;
        Some(original.with_termination(Termination::EndDate(day_before)))
    };

    let regenerated = future_rule.generate(&pivot.rescheduled(anchor))?;
    if regenerated.is_empty() {
        return Err(CalendarError::unsupported("series has no occurrences after the new start"));
    }

    tracing::info!(
        "Splitting series '{}' at {}: {} kept, {} regenerated from {}",
        pivot.subject,
        pivot.start,
        past.len(),
        regenerated.len(),
        anchor
    );

    store.swap_group(future, regenerated, future_rule)?;
    if let Some(past_rule) = past_rule {
        store.regroup(past, past_rule)?;
    }
    Ok(())
}

fn retime_ends(
    store: &mut EventStore,
    pivot: &Event,
    members: &[Event],
    end: NaiveDateTime,
) -> CalendarResult<()> {
    if end.date() != pivot.start.date() {
        return Err(CalendarError::unsupported("series end time must stay on the start date"));
    }

    let changes = members
        .iter()
        .map(|member| -> CalendarResult<(Event, Event)> {
            let new_end = member.start.date().and_time(end.time());
            if new_end < member.start {
                return Err(CalendarError::unsupported("event cannot end before it starts"));
            }
            Ok((member.clone(), Event { end: new_end, ..member.clone() }))
        })
        .collect::<CalendarResult<Vec<_>>>()?;

    store.replace_members(changes)
}

fn replace_each(store: &mut EventStore, members: &[Event], edit: &EventEdit) -> CalendarResult<()> {
    let changes = members
        .iter()
        .map(|member| -> CalendarResult<(Event, Event)> { Ok((member.clone(), editor::apply(member, edit)?)) })
        .collect::<CalendarResult<Vec<_>>>()?;

    store.replace_members(changes)
}

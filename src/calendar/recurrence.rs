use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::{CalendarError, CalendarResult};
use super::event::Event;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(Uuid);

impl RuleId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty set of weekdays a series repeats on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> CalendarResult<Self> {
        let mask = days
            .into_iter()
            .fold(0u8, |mask, day| mask | (1 << day.num_days_from_monday()));
        if mask == 0 {
            return Err(CalendarError::unsupported("a series needs at least one weekday"));
        }
        Ok(Self(mask))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(|day| self.contains(*day))
    }

    /// First date on or after `from` whose weekday is in the set.
    pub fn next_on_or_after(&self, from: NaiveDate) -> NaiveDate {
        from.iter_days()
            .take(7)
            .find(|date| self.contains(date.weekday()))
            .unwrap_or(from)
    }
}

impl FromStr for WeekdaySet {
    type Err = CalendarError;

    /// Parses the single-letter form, e.g. `MWF` or `TR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .trim()
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'M' => Ok(Weekday::Mon),
                'T' => Ok(Weekday::Tue),
                'W' => Ok(Weekday::Wed),
                'R' => Ok(Weekday::Thu),
                'F' => Ok(Weekday::Fri),
                'S' => Ok(Weekday::Sat),
                'U' => Ok(Weekday::Sun),
                other => Err(CalendarError::InvalidFormat(format!("unknown weekday letter '{}'", other))),
            })
            .collect::<CalendarResult<Vec<_>>>()?;
        Self::new(days)
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in self.iter() {
            let letter = match day {
                Weekday::Mon => 'M',
                Weekday::Tue => 'T',
                Weekday::Wed => 'W',
                Weekday::Thu => 'R',
                Weekday::Fri => 'F',
                Weekday::Sat => 'S',
                Weekday::Sun => 'U',
            };
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Count(u32),
    EndDate(NaiveDate),
}

/// Generator for a recurring series. The id only groups members; it never
/// takes part in event identity.
#[derive(Debug, PartialEq, Eq)]
pub struct RecurrenceRule {
    id: RuleId,
    weekdays: WeekdaySet,
    termination: Termination,
}

impl RecurrenceRule {
    pub fn new(weekdays: WeekdaySet, termination: Termination) -> CalendarResult<Self> {
        if termination == Termination::Count(0) {
            return Err(CalendarError::unsupported("occurrence count must be positive"));
        }
        Ok(Self {
            id: RuleId::generate(),
            weekdays,
            termination,
        })
    }

    pub fn count(weekdays: WeekdaySet, occurrences: u32) -> CalendarResult<Self> {
        Self::new(weekdays, Termination::Count(occurrences))
    }

    pub fn until(weekdays: WeekdaySet, end_date: NaiveDate) -> CalendarResult<Self> {
        Self::new(weekdays, Termination::EndDate(end_date))
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn weekdays(&self) -> WeekdaySet {
        self.weekdays
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Expands the rule into dated instances of `template`, walking forward one day
    /// at a time from the template's start date. Instances keep the template's
    /// time of day, duration and descriptive fields.
    pub fn generate(&self, template: &Event) -> CalendarResult<Vec<Event>> {
        if !template.is_single_day() {
            return Err(CalendarError::span_across_days());
        }

        let first = template.start.date();
        let matching = first
            .iter_days()
            .filter(|date| self.weekdays.contains(date.weekday()));
        let dates: Vec<NaiveDate> = match self.termination {
            Termination::Count(n) => matching.take(n as usize).collect(),
            Termination::EndDate(last) => matching.take_while(|date| *date <= last).collect(),
        };

        Ok(dates
            .into_iter()
            .map(|date| template.rescheduled(date.and_time(template.start.time())))
            .collect())
    }

    /// One fewer occurrence for count-bound rules; end-date rules are unaffected.
    pub fn decrement(&mut self) {
        if let Termination::Count(n) = self.termination {
            self.termination = Termination::Count(n.saturating_sub(1));
        }
    }

    /// Same pattern and termination under a fresh id.
    pub fn fresh_clone(&self) -> Self {
        self.with_termination(self.termination)
    }

    /// Same pattern under a fresh id with a different termination.
    pub fn with_termination(&self, termination: Termination) -> Self {
        Self {
            id: RuleId::generate(),
            weekdays: self.weekdays,
            termination,
        }
    }
}

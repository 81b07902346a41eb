pub mod calendar;
pub mod storage;

pub use calendar::{
    CalendarError, CalendarRegistry, CalendarResult, Event, EventEdit, EventStatus, RecurrenceRule,
    Session,
};

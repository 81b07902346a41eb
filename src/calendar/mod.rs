pub mod calendar_type;
pub mod editor;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod registry;
pub mod series;
pub mod session;
pub mod store;
pub mod zone;

#[cfg(test)]
mod test_support;

pub use calendar_type::{Availability, Calendar, CalendarId};
pub use editor::EventEdit;
pub use error::{CalendarError, CalendarResult};
pub use event::{AllDayWindow, Event, EventKey, EventProperty, EventStatus};
pub use recurrence::{RecurrenceRule, RuleId, Termination, WeekdaySet};
pub use registry::{CalendarProperty, CalendarRegistry};
pub use series::EditScope;
pub use session::Session;
pub use store::EventStore;

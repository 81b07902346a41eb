use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Calendar not found: {0}")]
    NotFound(String),
    #[error("Event not found: {0}")]
    EventNotFound(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("No active calendar")]
    NilActive,
}

pub type CalendarResult<T> = Result<T, CalendarError>;

impl CalendarError {
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub(crate) fn span_across_days() -> Self {
        Self::unsupported("series event cannot span more than one day")
    }
}

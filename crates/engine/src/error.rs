use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("sign in required")]
    Auth,

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("slot {start_time} on {date} at turf {turf_id} is no longer available")]
    Conflict {
        turf_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    },

    #[error("{0} not found")]
    NotFound(String),

    /// Backend failure. Never retried here; the caller decides.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl BookingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BookingError::Validation(msg.into())
    }
}

pub type EngineResult<T> = Result<T, BookingError>;

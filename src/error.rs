//! Error taxonomy for the HR domain engine.
//!
//! Every failure a store operation can report is a local validation failure
//! discovered before any mutation, so operations either fully succeed or
//! fully fail. The facade surfaces [`HrError::kind`] plus the display
//! message to the tool host.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{EmployeeId, LeaveType, TicketStatus};

pub type HrResult<T> = std::result::Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    /// A referenced entity (employee, meeting, ticket) does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("manager {0} does not exist")]
    UnknownManager(EmployeeId),

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("insufficient {leave_type} leave: requested {requested} days, {remaining} remaining")]
    InsufficientBalance {
        leave_type: LeaveType,
        requested: i64,
        remaining: i64,
    },

    #[error("slot conflicts with '{topic}' scheduled at {start}")]
    SlotConflict {
        topic: String,
        start: DateTime<Utc>,
    },

    /// More than one scheduled meeting matched a cancellation request.
    /// The caller must supply the topic to disambiguate.
    #[error("multiple scheduled meetings match; provide the topic to disambiguate")]
    AmbiguousMatch,

    #[error("invalid ticket transition {from} -> {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// A malformed field caught at construction time (e.g. blank name).
    #[error("{0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl HrError {
    /// Stable kind string surfaced to the tool host alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::DuplicateEmail(_) => "DuplicateEmail",
            Self::UnknownManager(_) => "UnknownManager",
            Self::InvalidRange { .. } => "InvalidRange",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::SlotConflict { .. } => "SlotConflict",
            Self::AmbiguousMatch => "AmbiguousMatch",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::Storage(_) => "Storage",
        }
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Allocator-issued ticket identifier, strictly increasing per store.
pub type TicketId = i64;

/// Lifecycle states. Tickets advance one edge at a time along
/// `Open -> InProgress -> Resolved -> Closed`; no skipping, no going back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// The single legal successor state, if any.
    pub fn next(&self) -> Option<TicketStatus> {
        match self {
            Self::Open => Some(Self::InProgress),
            Self::InProgress => Some(Self::Resolved),
            Self::Resolved => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    pub fn can_transition_to(&self, target: TicketStatus) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(status, timestamp)` pair in a ticket's append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketHistoryEntry {
    pub status: TicketStatus,
    pub at: DateTime<Utc>,
}

/// An equipment/support ticket. Never deleted; `history` records every
/// status the ticket has held, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub employee_id: EmployeeId,
    pub item: String,
    pub reason: String,
    pub status: TicketStatus,
    pub history: Vec<TicketHistoryEntry>,
    pub created_at: DateTime<Utc>,
}

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Fixed policy duration used for conflict-window computation.
pub const MEETING_DURATION_MINUTES: i64 = 30;

/// Whether two meetings starting at `a` and `b` would occupy overlapping
/// `[start, start + duration)` windows.
pub fn windows_overlap(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    let duration = Duration::minutes(MEETING_DURATION_MINUTES);
    a < b + duration && b < a + duration
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar entry. Cancellation flips `status`; rows are kept for audit
/// history and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub employee_id: EmployeeId,
    pub datetime: DateTime<Utc>,
    pub topic: String,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
}

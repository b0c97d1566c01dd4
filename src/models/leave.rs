use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Leave categories. All but `Unpaid` draw from a per-employee balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    Unpaid,
}

impl LeaveType {
    /// The types that carry a balance row, in display order.
    pub const BALANCE_TYPES: [LeaveType; 3] = [Self::Casual, Self::Sick, Self::Earned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Sick => "sick",
            Self::Earned => "earned",
            Self::Unpaid => "unpaid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "casual" => Some(Self::Casual),
            "sick" => Some(Self::Sick),
            "earned" => Some(Self::Earned),
            "unpaid" => Some(Self::Unpaid),
            _ => None,
        }
    }

    /// Days allotted per accounting period, or `None` for types exempt
    /// from balance checks.
    pub fn allotment(&self) -> Option<i64> {
        match self {
            Self::Casual => Some(12),
            Self::Sick => Some(10),
            Self::Earned => Some(15),
            Self::Unpaid => None,
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current balance for one `(employee, leave_type)` pair.
/// Invariant: `consumed <= allotted` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub leave_type: LeaveType,
    pub allotted: i64,
    pub consumed: i64,
}

impl LeaveBalance {
    pub fn remaining(&self) -> i64 {
        self.allotted - self.consumed
    }
}

/// An immutable entry in the leave ledger. The balance update is committed
/// atomically with the append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    /// Inclusive range: `start_date <= end_date`.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive day count derived from the range.
    pub days: i64,
    pub applied_at: DateTime<Utc>,
}

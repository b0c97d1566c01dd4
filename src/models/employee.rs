use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Allocator-issued employee identifier, strictly increasing per store.
pub type EmployeeId = i64;

/// A directory record. `id` and `email` are immutable after creation;
/// employees are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    /// Reporting manager, absent for top-level employees. Must resolve to
    /// an existing employee when present.
    pub manager_id: Option<EmployeeId>,
    /// Unique across the directory, compared case-insensitively.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Input for adding an employee to the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub manager_id: Option<EmployeeId>,
    pub email: String,
}

//! Request and response types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{Employee, LeaveApplication, LeaveBalance, Meeting, Ticket};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddEmployeeRequest {
    #[schemars(description = "Full name of the new employee")]
    pub name: String,
    #[schemars(description = "Employee id of the reporting manager, omit for top-level employees")]
    pub manager_id: Option<i64>,
    #[schemars(description = "Email address, must be unique across the directory")]
    pub email: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetEmployeeDetailsRequest {
    #[schemars(
        description = "Employee name to look up. Exact matches are preferred; substring matches are the fallback. All matches are returned."
    )]
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SendEmailRequest {
    #[schemars(description = "Email subject line")]
    pub subject: String,
    #[schemars(description = "Email body text")]
    pub body: String,
    #[schemars(description = "Recipient email addresses")]
    pub to_emails: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTicketRequest {
    #[schemars(description = "Id of the employee the ticket is for")]
    pub employee_id: i64,
    #[schemars(description = "The item being requested, e.g. 'laptop'")]
    pub item: String,
    #[schemars(description = "Why the item is needed")]
    pub reason: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTicketStatusRequest {
    #[schemars(description = "Id of the ticket to update")]
    pub ticket_id: i64,
    #[schemars(
        description = "New status: 'in_progress', 'resolved', or 'closed'. Tickets advance one step at a time along open -> in_progress -> resolved -> closed."
    )]
    pub status: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTicketsRequest {
    #[schemars(description = "Id of the employee whose tickets to list")]
    pub employee_id: i64,
    #[schemars(
        description = "Optional status filter: 'open', 'in_progress', 'resolved', or 'closed'. Omit to list all."
    )]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScheduleMeetingRequest {
    #[schemars(description = "Id of the employee to schedule for")]
    pub employee_id: i64,
    #[schemars(description = "Meeting start time, RFC 3339 (e.g. 2026-09-01T10:00:00Z)")]
    pub datetime: String,
    #[schemars(description = "Meeting topic")]
    pub topic: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMeetingsRequest {
    #[schemars(description = "Id of the employee whose meetings to fetch")]
    pub employee_id: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CancelMeetingRequest {
    #[schemars(description = "Id of the employee the meeting belongs to")]
    pub employee_id: i64,
    #[schemars(description = "Exact start time of the meeting to cancel, RFC 3339")]
    pub datetime: String,
    #[schemars(
        description = "Meeting topic, required only when multiple meetings share the start time"
    )]
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetLeaveBalanceRequest {
    #[schemars(description = "Id of the employee whose balance to fetch")]
    pub employee_id: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApplyLeaveRequest {
    #[schemars(description = "Id of the employee applying for leave")]
    pub employee_id: i64,
    #[schemars(description = "Leave type: 'casual', 'sick', 'earned', or 'unpaid'")]
    pub leave_type: String,
    #[schemars(description = "First day of leave, YYYY-MM-DD")]
    pub start_date: String,
    #[schemars(description = "Last day of leave (inclusive), YYYY-MM-DD")]
    pub end_date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetLeaveHistoryRequest {
    #[schemars(description = "Id of the employee whose leave history to fetch")]
    pub employee_id: i64,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmployeeInfo {
    pub id: i64,
    pub name: String,
    pub manager_id: Option<i64>,
    pub email: String,
    pub created_at: String,
}

impl From<Employee> for EmployeeInfo {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            name: e.name,
            manager_id: e.manager_id,
            email: e.email,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// All directory matches for a name query. More than one entry means the
/// caller must disambiguate; this is not an error.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmployeeDetailsResponse {
    pub matches: Vec<EmployeeInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LeaveBalanceInfo {
    pub leave_type: String,
    pub allotted: i64,
    pub consumed: i64,
    pub remaining: i64,
}

impl From<LeaveBalance> for LeaveBalanceInfo {
    fn from(b: LeaveBalance) -> Self {
        Self {
            leave_type: b.leave_type.as_str().to_string(),
            allotted: b.allotted,
            consumed: b.consumed,
            remaining: b.remaining(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LeaveBalanceResponse {
    pub employee_id: i64,
    pub balances: Vec<LeaveBalanceInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LeaveApplicationInfo {
    pub employee_id: i64,
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub days: i64,
    pub applied_at: String,
}

impl From<LeaveApplication> for LeaveApplicationInfo {
    fn from(a: LeaveApplication) -> Self {
        Self {
            employee_id: a.employee_id,
            leave_type: a.leave_type.as_str().to_string(),
            start_date: a.start_date.to_string(),
            end_date: a.end_date.to_string(),
            days: a.days,
            applied_at: a.applied_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LeaveHistoryResponse {
    pub employee_id: i64,
    pub applications: Vec<LeaveApplicationInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MeetingInfo {
    pub id: i64,
    pub employee_id: i64,
    pub datetime: String,
    pub topic: String,
    pub status: String,
}

impl From<Meeting> for MeetingInfo {
    fn from(m: Meeting) -> Self {
        Self {
            id: m.id,
            employee_id: m.employee_id,
            datetime: m.datetime.to_rfc3339(),
            topic: m.topic,
            status: m.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MeetingListResponse {
    pub employee_id: i64,
    pub meetings: Vec<MeetingInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TicketHistoryInfo {
    pub status: String,
    pub at: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TicketInfo {
    pub id: i64,
    pub employee_id: i64,
    pub item: String,
    pub reason: String,
    pub status: String,
    pub history: Vec<TicketHistoryInfo>,
    pub created_at: String,
}

impl From<Ticket> for TicketInfo {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            employee_id: t.employee_id,
            item: t.item,
            reason: t.reason,
            status: t.status.as_str().to_string(),
            history: t
                .history
                .into_iter()
                .map(|h| TicketHistoryInfo {
                    status: h.status.as_str().to_string(),
                    at: h.at.to_rfc3339(),
                })
                .collect(),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TicketListResponse {
    pub employee_id: i64,
    pub tickets: Vec<TicketInfo>,
}

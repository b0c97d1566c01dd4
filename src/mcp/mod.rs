//! MCP facade over the HR domain engine.
//!
//! Each tool translates host arguments into domain calls on [`Database`],
//! logs the invocation, and returns either a JSON success payload or an
//! error carrying the domain failure kind and message. The facade holds no
//! state of its own.

mod types;

pub use types::*;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};

use crate::db::Database;
use crate::email::{LogMailer, Mailer, OutboundEmail};
use crate::error::HrError;
use crate::models::*;

const DEFAULT_SENDER: &str = "hr-assist@localhost";

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    mailer: Arc<dyn Mailer>,
    sender: String,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(db: Database) -> Self {
        let sender =
            std::env::var("HR_ASSIST_SENDER").unwrap_or_else(|_| DEFAULT_SENDER.to_string());
        Self::with_mailer(db, Arc::new(LogMailer), sender)
    }

    pub fn with_mailer(db: Database, mailer: Arc<dyn Mailer>, sender: String) -> Self {
        Self {
            db,
            mailer,
            sender,
            tool_router: Self::tool_router(),
        }
    }

    fn domain_error(err: HrError) -> McpError {
        match err {
            HrError::Storage(_) => McpError::internal_error(err.to_string(), None),
            _ => McpError::invalid_params(format!("{}: {}", err.kind(), err), None),
        }
    }

    /// Parse a meeting instant. RFC 3339 preferred; a bare
    /// `YYYY-MM-DDTHH:MM:SS` is accepted and read as UTC.
    fn parse_instant(s: &str) -> Result<DateTime<Utc>, McpError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(|naive| naive.and_utc())
            .map_err(|e| McpError::invalid_params(format!("Invalid datetime '{s}': {e}"), None))
    }

    fn parse_day(s: &str) -> Result<NaiveDate, McpError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| McpError::invalid_params(format!("Invalid date '{s}': {e}"), None))
    }

    fn parse_leave_type(s: &str) -> Result<LeaveType, McpError> {
        LeaveType::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid leave_type '{s}'. Must be: casual, sick, earned, or unpaid"),
                None,
            )
        })
    }

    fn parse_ticket_status(s: &str) -> Result<TicketStatus, McpError> {
        TicketStatus::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid status '{s}'. Must be: open, in_progress, resolved, or closed"),
                None,
            )
        })
    }

    // ============================================================
    // Tool logic - shared by the tool router and integration tests
    // ============================================================

    pub fn test_add_employee(
        &self,
        name: &str,
        manager_id: Option<i64>,
        email: &str,
    ) -> Result<EmployeeInfo, McpError> {
        let employee = self
            .db
            .add_employee(NewEmployee {
                name: name.to_string(),
                manager_id,
                email: email.to_string(),
            })
            .map_err(Self::domain_error)?;
        Ok(employee.into())
    }

    pub fn test_get_employee_details(
        &self,
        name: &str,
    ) -> Result<EmployeeDetailsResponse, McpError> {
        let ids = self
            .db
            .search_employees_by_name(name)
            .map_err(Self::domain_error)?;
        if ids.is_empty() {
            return Err(McpError::invalid_params(
                format!("NotFound: no employee matches '{name}'"),
                None,
            ));
        }

        let mut matches = Vec::with_capacity(ids.len());
        for id in ids {
            let employee = self.db.get_employee(id).map_err(Self::domain_error)?;
            matches.push(employee.into());
        }
        Ok(EmployeeDetailsResponse { matches })
    }

    pub fn test_send_email(
        &self,
        subject: &str,
        body: &str,
        to_emails: Vec<String>,
    ) -> Result<(), McpError> {
        let mail = OutboundEmail {
            subject: subject.to_string(),
            body: body.to_string(),
            to: to_emails,
            from: self.sender.clone(),
        };
        self.mailer
            .send(&mail)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    pub fn test_create_ticket(
        &self,
        employee_id: i64,
        item: &str,
        reason: &str,
    ) -> Result<TicketInfo, McpError> {
        let ticket = self
            .db
            .create_ticket(employee_id, item, reason)
            .map_err(Self::domain_error)?;
        Ok(ticket.into())
    }

    pub fn test_update_ticket_status(
        &self,
        ticket_id: i64,
        status: &str,
    ) -> Result<TicketInfo, McpError> {
        let status = Self::parse_ticket_status(status)?;
        let ticket = self
            .db
            .update_ticket_status(ticket_id, status)
            .map_err(Self::domain_error)?;
        Ok(ticket.into())
    }

    pub fn test_list_tickets(
        &self,
        employee_id: i64,
        status: Option<&str>,
    ) -> Result<TicketListResponse, McpError> {
        let status = status.map(Self::parse_ticket_status).transpose()?;
        let tickets = self
            .db
            .list_tickets(employee_id, status)
            .map_err(Self::domain_error)?;
        Ok(TicketListResponse {
            employee_id,
            tickets: tickets.into_iter().map(Into::into).collect(),
        })
    }

    pub fn test_schedule_meeting(
        &self,
        employee_id: i64,
        datetime: &str,
        topic: &str,
    ) -> Result<MeetingInfo, McpError> {
        let instant = Self::parse_instant(datetime)?;
        let meeting = self
            .db
            .schedule_meeting(employee_id, instant, topic)
            .map_err(Self::domain_error)?;
        Ok(meeting.into())
    }

    pub fn test_get_meetings(&self, employee_id: i64) -> Result<MeetingListResponse, McpError> {
        let meetings = self
            .db
            .get_meetings(employee_id)
            .map_err(Self::domain_error)?;
        Ok(MeetingListResponse {
            employee_id,
            meetings: meetings.into_iter().map(Into::into).collect(),
        })
    }

    pub fn test_cancel_meeting(
        &self,
        employee_id: i64,
        datetime: &str,
        topic: Option<&str>,
    ) -> Result<MeetingInfo, McpError> {
        let instant = Self::parse_instant(datetime)?;
        let meeting = self
            .db
            .cancel_meeting(employee_id, instant, topic)
            .map_err(Self::domain_error)?;
        Ok(meeting.into())
    }

    pub fn test_get_leave_balance(
        &self,
        employee_id: i64,
    ) -> Result<LeaveBalanceResponse, McpError> {
        let balances = self
            .db
            .get_leave_balance(employee_id)
            .map_err(Self::domain_error)?;
        Ok(LeaveBalanceResponse {
            employee_id,
            balances: balances.into_iter().map(Into::into).collect(),
        })
    }

    pub fn test_apply_leave(
        &self,
        employee_id: i64,
        leave_type: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<LeaveApplicationInfo, McpError> {
        let leave_type = Self::parse_leave_type(leave_type)?;
        let start = Self::parse_day(start_date)?;
        let end = Self::parse_day(end_date)?;
        let application = self
            .db
            .apply_leave(employee_id, leave_type, start, end)
            .map_err(Self::domain_error)?;
        Ok(application.into())
    }

    pub fn test_get_leave_history(
        &self,
        employee_id: i64,
    ) -> Result<LeaveHistoryResponse, McpError> {
        let applications = self
            .db
            .get_leave_history(employee_id)
            .map_err(Self::domain_error)?;
        Ok(LeaveHistoryResponse {
            employee_id,
            applications: applications.into_iter().map(Into::into).collect(),
        })
    }
}

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl McpServer {
    // ============================================================
    // Employee Directory
    // ============================================================

    #[tool(
        description = "Add a new employee to the HR system. The manager_id, when given, must reference an existing employee; the email must be unique. Returns the stored record including the allocated employee id. Side effect: provisions the employee's leave balances (casual=12, sick=10, earned=15)."
    )]
    async fn add_employee(
        &self,
        params: Parameters<AddEmployeeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(name = %req.name, manager_id = ?req.manager_id, email = %req.email, "adding employee");

        let info = self.test_add_employee(&req.name, req.manager_id, &req.email)?;
        tracing::info!(id = info.id, "employee added");
        json_result(&info)
    }

    #[tool(
        description = "Look up employee details by name. Exact (case-insensitive) matches are preferred, falling back to substring matches. Returns every match; when there is more than one, pick the right employee id before calling other tools."
    )]
    async fn get_employee_details(
        &self,
        params: Parameters<GetEmployeeDetailsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(name = %req.name, "searching employee details");

        let response = self.test_get_employee_details(&req.name)?;
        json_result(&response)
    }

    // ============================================================
    // Email
    // ============================================================

    #[tool(
        description = "Send an email to one or more recipients. Delivery goes through the configured mail transport; the default deployment records the message in the server log."
    )]
    async fn send_email(
        &self,
        params: Parameters<SendEmailRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(subject = %req.subject, to = ?req.to_emails, "sending email");

        self.test_send_email(&req.subject, &req.body, req.to_emails)?;
        Ok(CallToolResult::success(vec![Content::text(
            "Email sent successfully",
        )]))
    }

    // ============================================================
    // Ticket Tracker
    // ============================================================

    #[tool(
        description = "Raise an equipment/support ticket for an employee. The ticket starts in status 'open' and carries an append-only status history. Returns the new ticket including its allocated id."
    )]
    async fn create_ticket(
        &self,
        params: Parameters<CreateTicketRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, item = %req.item, "creating ticket");

        let info = self.test_create_ticket(req.employee_id, &req.item, &req.reason)?;
        tracing::info!(ticket_id = info.id, "ticket created");
        json_result(&info)
    }

    #[tool(
        description = "Advance a ticket to its next lifecycle status. Tickets move one step at a time along open -> in_progress -> resolved -> closed; skipping a step or moving backwards is rejected with InvalidTransition."
    )]
    async fn update_ticket_status(
        &self,
        params: Parameters<UpdateTicketStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(ticket_id = req.ticket_id, status = %req.status, "updating ticket status");

        let info = self.test_update_ticket_status(req.ticket_id, &req.status)?;
        json_result(&info)
    }

    #[tool(
        description = "List an employee's tickets ordered by creation time, optionally filtered by exact status. Each ticket includes its full status history."
    )]
    async fn list_tickets(
        &self,
        params: Parameters<ListTicketsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, status = ?req.status, "listing tickets");

        let response = self.test_list_tickets(req.employee_id, req.status.as_deref())?;
        json_result(&response)
    }

    // ============================================================
    // Meeting Calendar
    // ============================================================

    #[tool(
        description = "Schedule a 30-minute meeting for an employee. Fails with SlotConflict if the window overlaps another scheduled meeting on the employee's calendar."
    )]
    async fn schedule_meeting(
        &self,
        params: Parameters<ScheduleMeetingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, datetime = %req.datetime, topic = %req.topic, "scheduling meeting");

        let info = self.test_schedule_meeting(req.employee_id, &req.datetime, &req.topic)?;
        json_result(&info)
    }

    #[tool(
        description = "Fetch all meetings for an employee, cancelled ones included, ordered by start time ascending."
    )]
    async fn get_meetings(
        &self,
        params: Parameters<GetMeetingsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, "fetching meetings");

        let response = self.test_get_meetings(req.employee_id)?;
        json_result(&response)
    }

    #[tool(
        description = "Cancel a scheduled meeting identified by employee and exact start time. Provide the topic when multiple meetings share the start time; an ambiguous match is rejected rather than guessed. Cancellation keeps the record with status 'cancelled'."
    )]
    async fn cancel_meeting(
        &self,
        params: Parameters<CancelMeetingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, datetime = %req.datetime, topic = ?req.topic, "cancelling meeting");

        let info =
            self.test_cancel_meeting(req.employee_id, &req.datetime, req.topic.as_deref())?;
        json_result(&info)
    }

    // ============================================================
    // Leave Ledger
    // ============================================================

    #[tool(
        description = "Get an employee's leave balances: allotted, consumed, and remaining days per leave type."
    )]
    async fn get_employee_leave_balance(
        &self,
        params: Parameters<GetLeaveBalanceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, "fetching leave balance");

        let response = self.test_get_leave_balance(req.employee_id)?;
        json_result(&response)
    }

    #[tool(
        description = "Apply for leave over an inclusive date range. The day count is deducted from the balance immediately; an application exceeding the remaining balance is rejected with InsufficientBalance and deducts nothing. Unpaid leave is exempt from balance checks."
    )]
    async fn apply_leave(
        &self,
        params: Parameters<ApplyLeaveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(
            employee_id = req.employee_id,
            leave_type = %req.leave_type,
            start = %req.start_date,
            end = %req.end_date,
            "applying leave"
        );

        let info = self.test_apply_leave(
            req.employee_id,
            &req.leave_type,
            &req.start_date,
            &req.end_date,
        )?;
        tracing::info!(days = info.days, "leave applied");
        json_result(&info)
    }

    #[tool(
        description = "Get an employee's full leave application history, oldest first, unpaid leave included."
    )]
    async fn get_leave_history(
        &self,
        params: Parameters<GetLeaveHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        tracing::info!(employee_id = req.employee_id, "fetching leave history");

        let response = self.test_get_leave_history(req.employee_id)?;
        json_result(&response)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "hr-assist".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"HR Assist manages an employee directory, leave ledger, meeting calendar,
and ticket tracker.

IDENTIFIERS:
- Employees and tickets get small integer ids allocated by the server.
- Most tools take an employee_id. Use get_employee_details to resolve a
  name to an id first; if several employees match, ask which one is meant
  instead of picking arbitrarily.

LEAVE:
- Types: casual (12 days), sick (10), earned (15), unpaid (no limit).
- apply_leave deducts immediately; there is no separate approval step.
- Date ranges are inclusive: 2026-03-02 to 2026-03-06 is 5 days.

MEETINGS:
- Every meeting occupies a 30-minute window; overlapping windows on the
  same calendar are rejected. Pick a later slot on SlotConflict.
- Cancelling keeps the record with status 'cancelled'.

TICKETS:
- Lifecycle: open -> in_progress -> resolved -> closed, one step at a time.

ONBOARDING A NEW EMPLOYEE:
1. add_employee with their name, manager's employee id, and email.
2. send_email: a welcome message to the new employee.
3. send_email: notify the manager about the new joiner.
4. create_ticket for a laptop, id card, and other equipment they need.
5. schedule_meeting for an introduction with the manager, if asked.
Only schedule meetings when explicitly asked to."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

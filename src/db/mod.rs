//! The record stores behind the HR engine.
//!
//! [`Database`] owns a single SQLite connection behind a mutex. Every public
//! operation acquires the lock for its whole validate-then-mutate span, so
//! two concurrent callers can never both pass validation against a stale
//! snapshot and both commit. That one discipline covers every invariant in
//! the engine: balance arithmetic, meeting-conflict checks, ticket
//! transitions, and identifier allocation.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::error::{HrError, HrResult};
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "hr-assist")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("hr-assist.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Employee directory
    // ============================================================

    pub fn add_employee(&self, input: NewEmployee) -> HrResult<Employee> {
        if input.name.trim().is_empty() {
            return Err(HrError::InvalidArgument(
                "employee name must not be blank".into(),
            ));
        }
        if input.email.trim().is_empty() {
            return Err(HrError::InvalidArgument(
                "employee email must not be blank".into(),
            ));
        }

        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let duplicates: i64 = tx.query_row(
            "SELECT COUNT(*) FROM employees WHERE lower(email) = lower(?1)",
            [&input.email],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            return Err(HrError::DuplicateEmail(input.email));
        }

        if let Some(manager_id) = input.manager_id {
            let found: i64 = tx.query_row(
                "SELECT COUNT(*) FROM employees WHERE id = ?1",
                [manager_id],
                |row| row.get(0),
            )?;
            if found == 0 {
                return Err(HrError::UnknownManager(manager_id));
            }
        }

        let id = next_id(&tx, "employees")?;
        let now = Utc::now();

        tx.execute(
            "INSERT INTO employees (id, name, manager_id, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, &input.name, input.manager_id, &input.email, now.to_rfc3339()],
        )?;

        // Provision the ledger alongside the directory entry.
        for leave_type in LeaveType::BALANCE_TYPES {
            let Some(allotted) = leave_type.allotment() else {
                continue;
            };
            tx.execute(
                "INSERT INTO leave_balances (employee_id, leave_type, allotted, consumed)
                 VALUES (?1, ?2, ?3, 0)",
                params![id, leave_type.as_str(), allotted],
            )?;
        }
        tx.commit()?;

        Ok(Employee {
            id,
            name: input.name,
            manager_id: input.manager_id,
            email: input.email,
            created_at: now,
        })
    }

    /// Case-insensitive name search. Exact matches win; when there are none,
    /// falls back to substring matching. Multiple hits are returned as-is
    /// for the caller to disambiguate.
    pub fn search_employees_by_name(&self, query: &str) -> HrResult<Vec<EmployeeId>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().expect("database lock poisoned");

        let mut stmt =
            conn.prepare("SELECT id FROM employees WHERE lower(name) = lower(?1) ORDER BY id")?;
        let exact = stmt
            .query_map([query], |row| row.get(0))?
            .collect::<Result<Vec<EmployeeId>, _>>()?;
        if !exact.is_empty() {
            return Ok(exact);
        }

        let mut stmt = conn.prepare(
            "SELECT id FROM employees WHERE instr(lower(name), lower(?1)) > 0 ORDER BY id",
        )?;
        let partial = stmt
            .query_map([query], |row| row.get(0))?
            .collect::<Result<Vec<EmployeeId>, _>>()?;

        Ok(partial)
    }

    pub fn get_employee(&self, id: EmployeeId) -> HrResult<Employee> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_employee(&conn, id)
    }

    // ============================================================
    // Leave ledger
    // ============================================================

    pub fn get_leave_balance(&self, employee_id: EmployeeId) -> HrResult<Vec<LeaveBalance>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        ensure_employee(&conn, employee_id)?;

        let mut stmt = conn.prepare(
            "SELECT leave_type, allotted, consumed FROM leave_balances WHERE employee_id = ?1",
        )?;
        let mut balances = stmt
            .query_map([employee_id], |row| {
                Ok(LeaveBalance {
                    leave_type: LeaveType::from_str(&row.get::<_, String>(0)?)
                        .unwrap_or(LeaveType::Unpaid),
                    allotted: row.get(1)?,
                    consumed: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        balances.sort_by_key(|b| {
            LeaveType::BALANCE_TYPES
                .iter()
                .position(|t| *t == b.leave_type)
        });

        Ok(balances)
    }

    /// Apply for leave over an inclusive date range. For balance-carrying
    /// types the deduction is all-or-nothing: the application is appended and
    /// `consumed` incremented together, or nothing changes at all.
    pub fn apply_leave(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> HrResult<LeaveApplication> {
        if start_date > end_date {
            return Err(HrError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        // Deduction and append commit together or not at all; dropping the
        // transaction on any error path rolls both back.
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        ensure_employee(&tx, employee_id)?;

        let days = (end_date - start_date).num_days() + 1;

        if leave_type.allotment().is_some() {
            let (allotted, consumed): (i64, i64) = tx.query_row(
                "SELECT allotted, consumed FROM leave_balances
                 WHERE employee_id = ?1 AND leave_type = ?2",
                params![employee_id, leave_type.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            if consumed + days > allotted {
                return Err(HrError::InsufficientBalance {
                    leave_type,
                    requested: days,
                    remaining: allotted - consumed,
                });
            }

            tx.execute(
                "UPDATE leave_balances SET consumed = consumed + ?1
                 WHERE employee_id = ?2 AND leave_type = ?3",
                params![days, employee_id, leave_type.as_str()],
            )?;
        }

        let now = Utc::now();
        tx.execute(
            "INSERT INTO leave_applications (employee_id, leave_type, start_date, end_date, days, applied_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                employee_id,
                leave_type.as_str(),
                start_date.to_string(),
                end_date.to_string(),
                days,
                now.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        Ok(LeaveApplication {
            employee_id,
            leave_type,
            start_date,
            end_date,
            days,
            applied_at: now,
        })
    }

    pub fn get_leave_history(&self, employee_id: EmployeeId) -> HrResult<Vec<LeaveApplication>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        ensure_employee(&conn, employee_id)?;

        let mut stmt = conn.prepare(
            "SELECT employee_id, leave_type, start_date, end_date, days, applied_at
             FROM leave_applications WHERE employee_id = ?1 ORDER BY id",
        )?;
        let applications = stmt
            .query_map([employee_id], |row| {
                Ok(LeaveApplication {
                    employee_id: row.get(0)?,
                    leave_type: LeaveType::from_str(&row.get::<_, String>(1)?)
                        .unwrap_or(LeaveType::Unpaid),
                    start_date: parse_date(row.get::<_, String>(2)?),
                    end_date: parse_date(row.get::<_, String>(3)?),
                    days: row.get(4)?,
                    applied_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(applications)
    }

    // ============================================================
    // Meeting calendar
    // ============================================================

    /// Schedule a meeting unless its `[datetime, datetime + duration)` window
    /// overlaps an existing scheduled meeting for the same employee.
    pub fn schedule_meeting(
        &self,
        employee_id: EmployeeId,
        datetime: DateTime<Utc>,
        topic: &str,
    ) -> HrResult<Meeting> {
        if topic.trim().is_empty() {
            return Err(HrError::InvalidArgument(
                "meeting topic must not be blank".into(),
            ));
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        ensure_employee(&conn, employee_id)?;

        let mut stmt = conn.prepare(
            "SELECT datetime, topic FROM meetings
             WHERE employee_id = ?1 AND status = 'scheduled'",
        )?;
        let scheduled = stmt
            .query_map([employee_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        for (existing_raw, existing_topic) in scheduled {
            let existing = parse_datetime(existing_raw);
            if windows_overlap(existing, datetime) {
                return Err(HrError::SlotConflict {
                    topic: existing_topic,
                    start: existing,
                });
            }
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO meetings (employee_id, datetime, topic, status, created_at)
             VALUES (?1, ?2, ?3, 'scheduled', ?4)",
            params![employee_id, datetime.to_rfc3339(), topic, now.to_rfc3339()],
        )?;

        Ok(Meeting {
            id: conn.last_insert_rowid(),
            employee_id,
            datetime,
            topic: topic.to_string(),
            status: MeetingStatus::Scheduled,
            created_at: now,
        })
    }

    /// All meetings for the employee, cancelled ones included, ordered by
    /// start time ascending.
    pub fn get_meetings(&self, employee_id: EmployeeId) -> HrResult<Vec<Meeting>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        ensure_employee(&conn, employee_id)?;

        let mut stmt = conn.prepare(
            "SELECT id, employee_id, datetime, topic, status, created_at
             FROM meetings WHERE employee_id = ?1 ORDER BY datetime, id",
        )?;
        let meetings = stmt
            .query_map([employee_id], |row| {
                Ok(Meeting {
                    id: row.get(0)?,
                    employee_id: row.get(1)?,
                    datetime: parse_datetime(row.get::<_, String>(2)?),
                    topic: row.get(3)?,
                    status: MeetingStatus::from_str(&row.get::<_, String>(4)?)
                        .unwrap_or(MeetingStatus::Scheduled),
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meetings)
    }

    /// Cancel the scheduled meeting at exactly `datetime`. When `topic` is
    /// given it must match exactly too. Only scheduled meetings are
    /// considered, so cancelling twice reports `NotFound`; more than one
    /// match reports `AmbiguousMatch` rather than guessing.
    pub fn cancel_meeting(
        &self,
        employee_id: EmployeeId,
        datetime: DateTime<Utc>,
        topic: Option<&str>,
    ) -> HrResult<Meeting> {
        let conn = self.conn.lock().expect("database lock poisoned");
        ensure_employee(&conn, employee_id)?;

        let mut stmt = conn.prepare(
            "SELECT id, datetime, topic, created_at FROM meetings
             WHERE employee_id = ?1 AND status = 'scheduled'",
        )?;
        let candidates = stmt
            .query_map([employee_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    parse_datetime(row.get::<_, String>(1)?),
                    row.get::<_, String>(2)?,
                    parse_datetime(row.get::<_, String>(3)?),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        let mut matches: Vec<_> = candidates
            .into_iter()
            .filter(|(_, dt, t, _)| *dt == datetime && topic.is_none_or(|wanted| wanted == t))
            .collect();

        if matches.is_empty() {
            return Err(HrError::NotFound("matching scheduled meeting".into()));
        }
        if matches.len() > 1 {
            return Err(HrError::AmbiguousMatch);
        }

        let (id, dt, matched_topic, created_at) = matches.remove(0);
        conn.execute(
            "UPDATE meetings SET status = 'cancelled' WHERE id = ?1",
            [id],
        )?;

        Ok(Meeting {
            id,
            employee_id,
            datetime: dt,
            topic: matched_topic,
            status: MeetingStatus::Cancelled,
            created_at,
        })
    }

    // ============================================================
    // Ticket tracker
    // ============================================================

    pub fn create_ticket(
        &self,
        employee_id: EmployeeId,
        item: &str,
        reason: &str,
    ) -> HrResult<Ticket> {
        if item.trim().is_empty() {
            return Err(HrError::InvalidArgument(
                "ticket item must not be blank".into(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(HrError::InvalidArgument(
                "ticket reason must not be blank".into(),
            ));
        }

        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        ensure_employee(&tx, employee_id)?;

        let id = next_id(&tx, "tickets")?;
        let now = Utc::now();

        tx.execute(
            "INSERT INTO tickets (id, employee_id, item, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'open', ?5)",
            params![id, employee_id, item, reason, now.to_rfc3339()],
        )?;
        tx.execute(
            "INSERT INTO ticket_history (ticket_id, status, at) VALUES (?1, 'open', ?2)",
            params![id, now.to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(Ticket {
            id,
            employee_id,
            item: item.to_string(),
            reason: reason.to_string(),
            status: TicketStatus::Open,
            history: vec![TicketHistoryEntry {
                status: TicketStatus::Open,
                at: now,
            }],
            created_at: now,
        })
    }

    /// Advance a ticket along `Open -> InProgress -> Resolved -> Closed`.
    /// Skipping edges and moving backwards are both rejected.
    pub fn update_ticket_status(
        &self,
        ticket_id: TicketId,
        new_status: TicketStatus,
    ) -> HrResult<Ticket> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let mut ticket = load_ticket(&tx, ticket_id)?;

        if !ticket.status.can_transition_to(new_status) {
            return Err(HrError::InvalidTransition {
                from: ticket.status,
                to: new_status,
            });
        }

        let now = Utc::now();
        tx.execute(
            "UPDATE tickets SET status = ?1 WHERE id = ?2",
            params![new_status.as_str(), ticket_id],
        )?;
        tx.execute(
            "INSERT INTO ticket_history (ticket_id, status, at) VALUES (?1, ?2, ?3)",
            params![ticket_id, new_status.as_str(), now.to_rfc3339()],
        )?;
        tx.commit()?;

        ticket.status = new_status;
        ticket.history.push(TicketHistoryEntry {
            status: new_status,
            at: now,
        });

        Ok(ticket)
    }

    /// Tickets for the employee ordered by creation, optionally filtered by
    /// exact status.
    pub fn list_tickets(
        &self,
        employee_id: EmployeeId,
        status: Option<TicketStatus>,
    ) -> HrResult<Vec<Ticket>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        ensure_employee(&conn, employee_id)?;

        let mut stmt =
            conn.prepare("SELECT id FROM tickets WHERE employee_id = ?1 ORDER BY created_at, id")?;
        let ids = stmt
            .query_map([employee_id], |row| row.get(0))?
            .collect::<Result<Vec<TicketId>, _>>()?;
        drop(stmt);

        let mut tickets = Vec::with_capacity(ids.len());
        for id in ids {
            let ticket = load_ticket(&conn, id)?;
            if status.is_none_or(|s| ticket.status == s) {
                tickets.push(ticket);
            }
        }

        Ok(tickets)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Helpers (callers hold the connection lock)
// ============================================================

/// Advance the counter for `namespace` and return the new value. Runs under
/// the store lock held by the enclosing operation, so issued identifiers are
/// unique and strictly increasing even if that operation later fails.
fn next_id(conn: &Connection, namespace: &str) -> HrResult<i64> {
    let id = conn.query_row(
        "UPDATE counters SET value = value + 1 WHERE namespace = ?1 RETURNING value",
        [namespace],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn ensure_employee(conn: &Connection, id: EmployeeId) -> HrResult<()> {
    let found: i64 = conn.query_row(
        "SELECT COUNT(*) FROM employees WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if found == 0 {
        return Err(HrError::NotFound(format!("employee {id}")));
    }
    Ok(())
}

fn load_employee(conn: &Connection, id: EmployeeId) -> HrResult<Employee> {
    let mut stmt = conn.prepare(
        "SELECT id, name, manager_id, email, created_at FROM employees WHERE id = ?1",
    )?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Employee {
            id: row.get(0)?,
            name: row.get(1)?,
            manager_id: row.get(2)?,
            email: row.get(3)?,
            created_at: parse_datetime(row.get::<_, String>(4)?),
        }),
        None => Err(HrError::NotFound(format!("employee {id}"))),
    }
}

fn load_ticket(conn: &Connection, id: TicketId) -> HrResult<Ticket> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_id, item, reason, status, created_at FROM tickets WHERE id = ?1",
    )?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Err(HrError::NotFound(format!("ticket {id}")));
    };

    let ticket = Ticket {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        item: row.get(2)?,
        reason: row.get(3)?,
        status: TicketStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(TicketStatus::Open),
        history: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(5)?),
    };
    drop(rows);
    drop(stmt);

    let mut stmt = conn
        .prepare("SELECT status, at FROM ticket_history WHERE ticket_id = ?1 ORDER BY rowid")?;
    let history = stmt
        .query_map([id], |row| {
            Ok(TicketHistoryEntry {
                status: TicketStatus::from_str(&row.get::<_, String>(0)?)
                    .unwrap_or(TicketStatus::Open),
                at: parse_datetime(row.get::<_, String>(1)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Ticket { history, ..ticket })
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_default()
}

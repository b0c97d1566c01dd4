//! Demo data for local development: a small org chart with a pending
//! leave application, a meeting, and an open ticket.

use chrono::{Duration, Utc};

use crate::db::Database;
use crate::error::{HrError, HrResult};
use crate::models::{LeaveType, NewEmployee};

pub fn seed(db: &Database) -> HrResult<()> {
    let priya = match db.add_employee(NewEmployee {
        name: "Priya Nair".to_string(),
        manager_id: None,
        email: "priya.nair@example.com".to_string(),
    }) {
        Ok(employee) => employee,
        Err(HrError::DuplicateEmail(_)) => {
            tracing::info!("store already seeded, leaving it unchanged");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let rahul = db.add_employee(NewEmployee {
        name: "Rahul Verma".to_string(),
        manager_id: Some(priya.id),
        email: "rahul.verma@example.com".to_string(),
    })?;
    let meera = db.add_employee(NewEmployee {
        name: "Meera Iyer".to_string(),
        manager_id: Some(priya.id),
        email: "meera.iyer@example.com".to_string(),
    })?;

    let today = Utc::now().date_naive();
    db.apply_leave(rahul.id, LeaveType::Casual, today + Duration::days(7), today + Duration::days(8))?;

    let next_monday = Utc::now() + Duration::days(3);
    db.schedule_meeting(priya.id, next_monday, "weekly 1:1")?;

    db.create_ticket(meera.id, "laptop", "battery no longer holds charge")?;

    tracing::info!(
        employees = 3,
        "seeded demo data (employees {}, {}, {})",
        priya.id,
        rahul.id,
        meera.id
    );
    Ok(())
}

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hr_assist::db::Database;
use hr_assist::error::HrError;
use hr_assist::models::*;
use speculate2::speculate;

fn add_test_employee(db: &Database, name: &str, email: &str) -> Employee {
    db.add_employee(NewEmployee {
        name: name.to_string(),
        manager_id: None,
        email: email.to_string(),
    })
    .expect("Failed to add employee")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "employee directory" {
        describe "add_employee" {
            it "allocates increasing ids starting at 1" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                assert_eq!(asha.id, 1);

                let bo = db.add_employee(NewEmployee {
                    name: "Bo".to_string(),
                    manager_id: Some(asha.id),
                    email: "bo@x.com".to_string(),
                }).expect("Failed to add employee");
                assert_eq!(bo.id, 2);
                assert_eq!(bo.manager_id, Some(1));
            }

            it "round-trips through get_employee" {
                let created = add_test_employee(&db, "Asha", "asha@x.com");

                let found = db.get_employee(created.id).expect("Query failed");
                assert_eq!(found.id, created.id);
                assert_eq!(found.name, "Asha");
                assert_eq!(found.manager_id, None);
                assert_eq!(found.email, "asha@x.com");
                assert_eq!(found.created_at, created.created_at);
            }

            it "rejects a duplicate email" {
                add_test_employee(&db, "Asha", "asha@x.com");

                let err = db.add_employee(NewEmployee {
                    name: "Imposter".to_string(),
                    manager_id: None,
                    email: "asha@x.com".to_string(),
                }).unwrap_err();
                assert!(matches!(err, HrError::DuplicateEmail(_)));
            }

            it "compares emails case-insensitively" {
                add_test_employee(&db, "Asha", "asha@x.com");

                let err = db.add_employee(NewEmployee {
                    name: "Imposter".to_string(),
                    manager_id: None,
                    email: "ASHA@X.COM".to_string(),
                }).unwrap_err();
                assert!(matches!(err, HrError::DuplicateEmail(_)));
            }

            it "rejects an unknown manager" {
                let err = db.add_employee(NewEmployee {
                    name: "Bo".to_string(),
                    manager_id: Some(42),
                    email: "bo@x.com".to_string(),
                }).unwrap_err();
                assert!(matches!(err, HrError::UnknownManager(42)));
            }

            it "rejects a blank name" {
                let err = db.add_employee(NewEmployee {
                    name: "   ".to_string(),
                    manager_id: None,
                    email: "blank@x.com".to_string(),
                }).unwrap_err();
                assert!(matches!(err, HrError::InvalidArgument(_)));
            }
        }

        describe "search_employees_by_name" {
            it "prefers exact matches over substring matches" {
                add_test_employee(&db, "Ann", "ann@x.com");
                add_test_employee(&db, "Annabel", "annabel@x.com");

                let ids = db.search_employees_by_name("ann").expect("Search failed");
                assert_eq!(ids, vec![1]);
            }

            it "falls back to substring matching" {
                add_test_employee(&db, "Annabel", "annabel@x.com");
                add_test_employee(&db, "Joanna", "joanna@x.com");

                let ids = db.search_employees_by_name("ann").expect("Search failed");
                assert_eq!(ids, vec![1, 2]);
            }

            it "is case-insensitive" {
                add_test_employee(&db, "Asha", "asha@x.com");

                let ids = db.search_employees_by_name("ASHA").expect("Search failed");
                assert_eq!(ids, vec![1]);
            }

            it "returns an empty list for no matches or a blank query" {
                add_test_employee(&db, "Asha", "asha@x.com");

                assert!(db.search_employees_by_name("zzz").expect("Search failed").is_empty());
                assert!(db.search_employees_by_name("  ").expect("Search failed").is_empty());
            }
        }

        describe "get_employee" {
            it "reports NotFound for an unknown id" {
                let err = db.get_employee(7).unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }
    }

    describe "leave ledger" {
        describe "get_leave_balance" {
            it "provisions policy allotments with nothing consumed" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                let balances = db.get_leave_balance(asha.id).expect("Query failed");
                assert_eq!(balances.len(), 3);
                assert_eq!(balances[0].leave_type, LeaveType::Casual);
                assert_eq!(balances[0].allotted, 12);
                assert_eq!(balances[0].consumed, 0);
                assert_eq!(balances[1].leave_type, LeaveType::Sick);
                assert_eq!(balances[1].allotted, 10);
                assert_eq!(balances[2].leave_type, LeaveType::Earned);
                assert_eq!(balances[2].allotted, 15);
            }

            it "reports NotFound for an unknown employee" {
                let err = db.get_leave_balance(7).unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }

        describe "apply_leave" {
            it "deducts the inclusive day count" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                let application = db
                    .apply_leave(asha.id, LeaveType::Casual, day(2026, 3, 2), day(2026, 3, 6))
                    .expect("Apply failed");
                assert_eq!(application.days, 5);

                let balances = db.get_leave_balance(asha.id).expect("Query failed");
                assert_eq!(balances[0].consumed, 5);
                assert_eq!(balances[0].remaining(), 7);
            }

            it "rejects an application exceeding the remaining balance without deducting" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                db.apply_leave(asha.id, LeaveType::Casual, day(2026, 3, 2), day(2026, 3, 6))
                    .expect("Apply failed");

                // 8 more days would exceed the 12-day allotment
                let err = db
                    .apply_leave(asha.id, LeaveType::Casual, day(2026, 3, 12), day(2026, 3, 19))
                    .unwrap_err();
                assert!(matches!(err, HrError::InsufficientBalance { requested: 8, remaining: 7, .. }));

                let balances = db.get_leave_balance(asha.id).expect("Query failed");
                assert_eq!(balances[0].consumed, 5);
            }

            it "allows consuming the balance exactly" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                db.apply_leave(asha.id, LeaveType::Sick, day(2026, 4, 1), day(2026, 4, 10))
                    .expect("Apply failed");

                let balances = db.get_leave_balance(asha.id).expect("Query failed");
                assert_eq!(balances[1].consumed, 10);
                assert_eq!(balances[1].remaining(), 0);
            }

            it "rejects a reversed date range" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                let err = db
                    .apply_leave(asha.id, LeaveType::Casual, day(2026, 3, 6), day(2026, 3, 2))
                    .unwrap_err();
                assert!(matches!(err, HrError::InvalidRange { .. }));
            }

            it "exempts unpaid leave from balance checks" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                let application = db
                    .apply_leave(asha.id, LeaveType::Unpaid, day(2026, 5, 1), day(2026, 5, 30))
                    .expect("Apply failed");
                assert_eq!(application.days, 30);

                // No balance touched
                let balances = db.get_leave_balance(asha.id).expect("Query failed");
                assert!(balances.iter().all(|b| b.consumed == 0));
            }

            it "reports NotFound for an unknown employee" {
                let err = db
                    .apply_leave(7, LeaveType::Casual, day(2026, 3, 2), day(2026, 3, 2))
                    .unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }

        describe "get_leave_history" {
            it "returns applications oldest first, unpaid included" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                db.apply_leave(asha.id, LeaveType::Casual, day(2026, 3, 2), day(2026, 3, 3))
                    .expect("Apply failed");
                db.apply_leave(asha.id, LeaveType::Unpaid, day(2026, 6, 1), day(2026, 6, 1))
                    .expect("Apply failed");
                db.apply_leave(asha.id, LeaveType::Earned, day(2026, 7, 6), day(2026, 7, 10))
                    .expect("Apply failed");

                let history = db.get_leave_history(asha.id).expect("Query failed");
                assert_eq!(history.len(), 3);
                assert_eq!(history[0].leave_type, LeaveType::Casual);
                assert_eq!(history[1].leave_type, LeaveType::Unpaid);
                assert_eq!(history[2].leave_type, LeaveType::Earned);
                assert_eq!(history[0].start_date, day(2026, 3, 2));
            }
        }
    }

    describe "meeting calendar" {
        describe "schedule_meeting" {
            it "detects overlapping windows for the same employee" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");

                let err = db
                    .schedule_meeting(asha.id, t + Duration::minutes(10), "standup")
                    .unwrap_err();
                assert!(matches!(err, HrError::SlotConflict { .. }));

                db.schedule_meeting(asha.id, t + Duration::minutes(60), "standup")
                    .expect("Schedule failed");
            }

            it "allows back-to-back meetings" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");
                db.schedule_meeting(asha.id, t + Duration::minutes(30), "next")
                    .expect("Schedule failed");
            }

            it "keeps calendars independent between employees" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let bo = add_test_employee(&db, "Bo", "bo@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");
                db.schedule_meeting(bo.id, t, "1:1").expect("Schedule failed");
            }

            it "ignores cancelled meetings when checking conflicts" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");
                db.cancel_meeting(asha.id, t, None).expect("Cancel failed");

                db.schedule_meeting(asha.id, t, "replacement")
                    .expect("Schedule failed");
            }

            it "reports NotFound for an unknown employee" {
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
                let err = db.schedule_meeting(7, t, "1:1").unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }

        describe "get_meetings" {
            it "returns all meetings ordered by start time, cancelled included" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

                db.schedule_meeting(asha.id, t + Duration::hours(2), "later")
                    .expect("Schedule failed");
                db.schedule_meeting(asha.id, t, "earlier").expect("Schedule failed");
                db.cancel_meeting(asha.id, t, None).expect("Cancel failed");

                let meetings = db.get_meetings(asha.id).expect("Query failed");
                assert_eq!(meetings.len(), 2);
                assert_eq!(meetings[0].topic, "earlier");
                assert_eq!(meetings[0].status, MeetingStatus::Cancelled);
                assert_eq!(meetings[1].topic, "later");
                assert_eq!(meetings[1].status, MeetingStatus::Scheduled);
            }
        }

        describe "cancel_meeting" {
            it "flips status to cancelled" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");

                let cancelled = db.cancel_meeting(asha.id, t, None).expect("Cancel failed");
                assert_eq!(cancelled.status, MeetingStatus::Cancelled);
                assert_eq!(cancelled.topic, "1:1");
            }

            it "requires the topic to match when given" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");

                let err = db.cancel_meeting(asha.id, t, Some("standup")).unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));

                db.cancel_meeting(asha.id, t, Some("1:1")).expect("Cancel failed");
            }

            it "is not idempotent: cancelling twice reports NotFound" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
                db.schedule_meeting(asha.id, t, "1:1").expect("Schedule failed");

                db.cancel_meeting(asha.id, t, None).expect("Cancel failed");
                let err = db.cancel_meeting(asha.id, t, None).unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }

            it "reports NotFound when no meeting matches the time" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

                let err = db.cancel_meeting(asha.id, t, None).unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }
    }

    describe "ticket tracker" {
        describe "create_ticket" {
            it "starts open with a single history entry and id 1" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                let ticket = db
                    .create_ticket(asha.id, "laptop", "new hire")
                    .expect("Create failed");
                assert_eq!(ticket.id, 1);
                assert_eq!(ticket.status, TicketStatus::Open);
                assert_eq!(ticket.history.len(), 1);
                assert_eq!(ticket.history[0].status, TicketStatus::Open);
            }

            it "allocates ticket ids independently of employee ids" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let bo = add_test_employee(&db, "Bo", "bo@x.com");

                let first = db.create_ticket(asha.id, "laptop", "new hire").expect("Create failed");
                let second = db.create_ticket(bo.id, "id card", "new hire").expect("Create failed");
                assert_eq!(first.id, 1);
                assert_eq!(second.id, 2);
            }

            it "rejects a blank item or reason" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");

                let err = db.create_ticket(asha.id, "  ", "new hire").unwrap_err();
                assert!(matches!(err, HrError::InvalidArgument(_)));

                let err = db.create_ticket(asha.id, "laptop", "  ").unwrap_err();
                assert!(matches!(err, HrError::InvalidArgument(_)));
            }

            it "reports NotFound for an unknown employee" {
                let err = db.create_ticket(7, "laptop", "new hire").unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }

        describe "update_ticket_status" {
            it "rejects skipping ahead in the lifecycle" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let ticket = db.create_ticket(asha.id, "laptop", "new hire").expect("Create failed");

                let err = db.update_ticket_status(ticket.id, TicketStatus::Closed).unwrap_err();
                assert!(matches!(
                    err,
                    HrError::InvalidTransition { from: TicketStatus::Open, to: TicketStatus::Closed }
                ));

                db.update_ticket_status(ticket.id, TicketStatus::InProgress).expect("Update failed");
                let err = db.update_ticket_status(ticket.id, TicketStatus::Closed).unwrap_err();
                assert!(matches!(err, HrError::InvalidTransition { .. }));
            }

            it "walks the full lifecycle one edge at a time" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let ticket = db.create_ticket(asha.id, "laptop", "new hire").expect("Create failed");

                db.update_ticket_status(ticket.id, TicketStatus::InProgress).expect("Update failed");
                db.update_ticket_status(ticket.id, TicketStatus::Resolved).expect("Update failed");
                let closed = db.update_ticket_status(ticket.id, TicketStatus::Closed).expect("Update failed");

                assert_eq!(closed.status, TicketStatus::Closed);
                let statuses: Vec<_> = closed.history.iter().map(|h| h.status).collect();
                assert_eq!(
                    statuses,
                    vec![
                        TicketStatus::Open,
                        TicketStatus::InProgress,
                        TicketStatus::Resolved,
                        TicketStatus::Closed,
                    ]
                );
            }

            it "rejects backward and repeated transitions" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let ticket = db.create_ticket(asha.id, "laptop", "new hire").expect("Create failed");
                db.update_ticket_status(ticket.id, TicketStatus::InProgress).expect("Update failed");

                let err = db.update_ticket_status(ticket.id, TicketStatus::Open).unwrap_err();
                assert!(matches!(err, HrError::InvalidTransition { .. }));

                let err = db.update_ticket_status(ticket.id, TicketStatus::InProgress).unwrap_err();
                assert!(matches!(err, HrError::InvalidTransition { .. }));
            }

            it "reports NotFound for an unknown ticket" {
                let err = db.update_ticket_status(7, TicketStatus::InProgress).unwrap_err();
                assert!(matches!(err, HrError::NotFound(_)));
            }
        }

        describe "list_tickets" {
            it "filters by status and orders by creation" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let first = db.create_ticket(asha.id, "laptop", "new hire").expect("Create failed");
                db.create_ticket(asha.id, "id card", "new hire").expect("Create failed");
                db.update_ticket_status(first.id, TicketStatus::InProgress).expect("Update failed");

                let all = db.list_tickets(asha.id, None).expect("Query failed");
                assert_eq!(all.len(), 2);
                assert_eq!(all[0].id, first.id);

                let open = db.list_tickets(asha.id, Some(TicketStatus::Open)).expect("Query failed");
                assert_eq!(open.len(), 1);
                assert_eq!(open[0].item, "id card");

                let closed = db.list_tickets(asha.id, Some(TicketStatus::Closed)).expect("Query failed");
                assert!(closed.is_empty());
            }

            it "only returns the employee's own tickets" {
                let asha = add_test_employee(&db, "Asha", "asha@x.com");
                let bo = add_test_employee(&db, "Bo", "bo@x.com");
                db.create_ticket(asha.id, "laptop", "new hire").expect("Create failed");

                let tickets = db.list_tickets(bo.id, None).expect("Query failed");
                assert!(tickets.is_empty());
            }
        }
    }

    describe "concurrency" {
        it "never over-draws a leave balance under concurrent applications" {
            let asha = add_test_employee(&db, "Asha", "asha@x.com");

            // Two 7-day applications against a 12-day allotment: exactly one
            // may commit.
            let handles: Vec<_> = (0..2u32)
                .map(|i| {
                    let db = db.clone();
                    std::thread::spawn(move || {
                        db.apply_leave(
                            asha.id,
                            LeaveType::Casual,
                            day(2026, 3, 2 + i * 10),
                            day(2026, 3, 8 + i * 10),
                        )
                    })
                })
                .collect();

            let results: Vec<_> = handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect();
            let successes = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(successes, 1);

            let balances = db.get_leave_balance(asha.id).expect("Query failed");
            assert_eq!(balances[0].consumed, 7);
        }

        it "never double-books a slot under concurrent scheduling" {
            let asha = add_test_employee(&db, "Asha", "asha@x.com");
            let t = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let db = db.clone();
                    std::thread::spawn(move || db.schedule_meeting(asha.id, t, "1:1"))
                })
                .collect();

            let results: Vec<_> = handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect();
            let successes = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(successes, 1);
        }

        it "allocates unique ids to concurrent additions" {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let db = db.clone();
                    std::thread::spawn(move || {
                        db.add_employee(NewEmployee {
                            name: format!("Employee {i}"),
                            manager_id: None,
                            email: format!("employee{i}@x.com"),
                        })
                        .expect("Failed to add employee")
                        .id
                    })
                })
                .collect();

            let mut ids: Vec<_> = handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        }
    }
}

#[test]
fn file_backed_store_keeps_records_and_counters_across_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("hr.db");

    {
        let db = Database::open(path.clone()).expect("Failed to open database");
        db.migrate().expect("Failed to migrate");
        add_test_employee(&db, "Asha", "asha@x.com");
    }

    let db = Database::open(path).expect("Failed to reopen database");
    db.migrate().expect("Failed to migrate");

    let found = db.get_employee(1).expect("Query failed");
    assert_eq!(found.name, "Asha");

    // The allocator picks up where it left off
    let bo = add_test_employee(&db, "Bo", "bo@x.com");
    assert_eq!(bo.id, 2);
}

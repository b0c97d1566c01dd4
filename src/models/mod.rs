//! Domain models for the HR engine.
//!
//! Four record stores, each with a single owning entity:
//!
//! - [`Employee`]: the root entity; everything else references employees by id.
//! - [`LeaveBalance`] / [`LeaveApplication`]: per-type leave ledger with an
//!   append-only application history.
//! - [`Meeting`]: calendar entries with a fixed conflict window; cancellation
//!   is a status change, never a delete.
//! - [`Ticket`]: equipment/support tickets moving through a one-way lifecycle
//!   with an append-only status history.

mod employee;
mod leave;
mod meeting;
mod ticket;

pub use employee::*;
pub use leave::*;
pub use meeting::*;
pub use ticket::*;

//! HR Assist: an in-process HR domain engine behind an MCP tool facade.
//!
//! The engine maintains four coupled record stores (the employee directory,
//! leave ledger, meeting calendar, and ticket tracker) and enforces the
//! business invariants that keep them consistent under concurrent tool
//! invocations: unique monotonic identifiers, leave-balance arithmetic,
//! meeting-conflict detection, and the ticket lifecycle state machine.

pub mod db;
pub mod email;
pub mod error;
pub mod mcp;
pub mod models;
pub mod seed;

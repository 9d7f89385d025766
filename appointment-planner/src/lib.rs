//! Fair assignment of appointment slots to competing clients.
//!
//! Given a slot catalog, the slots already committed, and a roster of clients
//! with declared per-slot costs, demand quotas and fairness scores, the
//! planner proposes the assignment of the remaining slots that minimizes the
//! mean working score, and keeps each client's fairness score up to date as
//! slots are committed and as time passes.
//!
//! # Modules
//!
//! - **`schedule`**: data model, validation, search, fairness score and the
//!   [`Scheduler`] façade
//! - **`parser`**: JSON snapshots and CSV imports
//! - **`form`**: availability submissions and plan export
//! - **`display`**: human-readable plans
//! - **`config`**: `planner.toml` and environment overrides

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod parser;
pub mod schedule;

pub use config::PlannerConfig;
pub use error::{PlannerError, PlannerResult};
pub use schedule::{
    Assignment, Client, ClientId, DecayPolicy, PlanningSnapshot, Scheduler, SearchOptions, SearchOutcome,
    SearchStrategy, Slot, SlotId,
};

pub mod types;
pub mod validate;
pub mod slot_utils;
pub mod objective;
pub mod search;
pub mod fairness;
pub mod scheduler;

pub use types::{
    Assignment, Client, ClientId, FixedAssignment, PlanningSnapshot, ProposedAssignment, Slot, SlotId,
    DEFAULT_MISSING_PENALTY,
};
pub use search::{search, search_with, SearchOptions, SearchOutcome, SearchStrategy};
pub use fairness::{apply_decay, recompute_score, DecayPolicy};
pub use scheduler::{Commitment, Scheduler};

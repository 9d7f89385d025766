//! Planner error types.

use thiserror::Error;

use crate::schedule::types::{ClientId, SlotId};

/// Errors reported by planning, scoring and snapshot operations.
///
/// Every variant names the input that violated a precondition. The core never
/// retries: the caller is expected to re-supply valid input.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("slot {0} appears more than once in the slot catalog")]
    DuplicateSlot(SlotId),

    #[error("client {0} appears more than once in the roster")]
    DuplicateClient(ClientId),

    #[error("slot not found: {0}")]
    UnknownSlot(SlotId),

    #[error("client not found: {0}")]
    UnknownClient(ClientId),

    #[error("slot {0} is already fixed")]
    SlotAlreadyFixed(SlotId),

    #[error("slot {0} is not fixed")]
    SlotNotFixed(SlotId),

    #[error("client {0} has no requested quota left")]
    QuotaExhausted(ClientId),

    #[error("client {client} declared cost {cost} for slot {slot}, expected a value in [0, 100]")]
    InvalidCost {
        client: ClientId,
        slot: SlotId,
        cost: f64,
    },

    #[error("slot {slot} has non-positive duration {duration}")]
    InvalidDuration { slot: SlotId, duration: f64 },

    #[error("client {client} has invalid score {score}")]
    InvalidScore { client: ClientId, score: f64 },

    #[error("client {client} has non-positive missing penalty {penalty}")]
    InvalidPenalty { client: ClientId, penalty: f64 },

    #[error("{free} free slots exceed the planning ceiling of {ceiling}")]
    TooManyFreeSlots { free: usize, ceiling: usize },

    #[error("search abandoned after visiting {nodes} nodes")]
    SearchBudgetExceeded { nodes: u64 },

    #[error("search cancelled after visiting {nodes} nodes")]
    SearchCancelled { nodes: u64 },

    #[error("availability submission rejected: {0}")]
    Submission(String),

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type PlannerResult<T> = Result<T, PlannerError>;

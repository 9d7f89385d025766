use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Penalty charged per unit of unmet quota when a client declares none
pub const DEFAULT_MISSING_PENALTY: f64 = 150.0;

/// Lowest and highest cost a client may declare for a slot
pub const MIN_COST: f64 = 0.0;
pub const MAX_COST: f64 = 100.0;

/// Opaque slot identifier supplied by the external layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub String);

/// Opaque client identifier supplied by the external layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        SlotId(value.to_string())
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        ClientId(value.to_string())
    }
}

/// A bookable time interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub start: DateTime<Utc>,
    /// Length of the slot in hours
    pub duration: f64,
}

impl Slot {
    pub fn new(id: impl Into<SlotId>, start: DateTime<Utc>, duration: f64) -> Self {
        Self {
            id: id.into(),
            start,
            duration,
        }
    }
}

/// A client competing for slots.
///
/// `availability` is sparse: a slot missing from the map is unavailable to
/// this client, which is different from a declared cost of 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub missing_penalty: Option<f64>,
    #[serde(default)]
    pub requested_quota: u32,
    #[serde(default)]
    pub availability: BTreeMap<SlotId, f64>,
    #[serde(default)]
    pub last_decay: Option<DateTime<Utc>>,
}

impl Client {
    pub fn new(id: impl Into<ClientId>) -> Self {
        Self {
            id: id.into(),
            score: 0.0,
            missing_penalty: None,
            requested_quota: 0,
            availability: BTreeMap::new(),
            last_decay: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_quota(mut self, quota: u32) -> Self {
        self.requested_quota = quota;
        self
    }

    pub fn with_missing_penalty(mut self, penalty: f64) -> Self {
        self.missing_penalty = Some(penalty);
        self
    }

    pub fn with_cost(mut self, slot: impl Into<SlotId>, cost: f64) -> Self {
        self.availability.insert(slot.into(), cost);
        self
    }

    pub fn with_last_decay(mut self, at: DateTime<Utc>) -> Self {
        self.last_decay = Some(at);
        self
    }

    /// Penalty per unmet quota unit, falling back to [`DEFAULT_MISSING_PENALTY`]
    pub fn missing_penalty(&self) -> f64 {
        self.missing_penalty.unwrap_or(DEFAULT_MISSING_PENALTY)
    }

    /// Declared cost for `slot`, `None` when the client is unavailable
    pub fn cost_for(&self, slot: &SlotId) -> Option<f64> {
        self.availability.get(slot).copied()
    }
}

/// A slot bound to a client, either committed or proposed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub slot_id: SlotId,
    pub client_id: ClientId,
}

impl Assignment {
    pub fn new(slot_id: impl Into<SlotId>, client_id: impl Into<ClientId>) -> Self {
        Self {
            slot_id: slot_id.into(),
            client_id: client_id.into(),
        }
    }
}

/// Committed pairing, excluded from every planning run until released
pub type FixedAssignment = Assignment;

/// Candidate pairing produced by the search, not yet committed
pub type ProposedAssignment = Assignment;

/// Everything a planning call runs against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningSnapshot {
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub fixed: Vec<FixedAssignment>,
    #[serde(default)]
    pub clients: Vec<Client>,
}

impl PlanningSnapshot {
    pub fn new(slots: Vec<Slot>, fixed: Vec<FixedAssignment>, clients: Vec<Client>) -> Self {
        Self { slots, fixed, clients }
    }

    pub fn slot(&self, id: &SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == *id)
    }

    pub fn client(&self, id: &ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == *id)
    }

    pub fn client_mut(&mut self, id: &ClientId) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id == *id)
    }

    /// Client a slot is fixed to, if any
    pub fn fixed_client(&self, slot: &SlotId) -> Option<&ClientId> {
        self.fixed
            .iter()
            .find(|a| a.slot_id == *slot)
            .map(|a| &a.client_id)
    }
}

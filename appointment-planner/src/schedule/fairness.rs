//! Fairness score maintenance: the update run on every commitment and the
//! periodic decay that bounds how long past cost weighs on a client.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PlannerResult;
use super::objective::missing_term;
use super::types::{Client, ClientId, FixedAssignment, Slot};
use super::validate::validate_inputs;

pub const DEFAULT_DECAY_CADENCE_DAYS: u32 = 7;
pub const DEFAULT_DECAY_FACTOR: f64 = 2.5;

/// How often scores decay and by how much
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayPolicy {
    pub cadence_days: u32,
    /// Scores are divided by this value once per cadence
    pub factor: f64,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            cadence_days: DEFAULT_DECAY_CADENCE_DAYS,
            factor: DEFAULT_DECAY_FACTOR,
        }
    }
}

impl DecayPolicy {
    pub fn cadence(&self) -> Duration {
        Duration::days(i64::from(self.cadence_days))
    }

    /// A client is due once its last decay is strictly older than one cadence.
    pub fn is_due(&self, last_decay: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        last_decay < now - self.cadence()
    }
}

/// New score for `client_id` against the committed assignments.
///
/// The result is the client's current score, plus the declared cost of each
/// slot fixed to it, plus its missing penalty for every unit of
/// `requested_quota` the fixed set leaves unmet. A fixed slot the client never
/// declared adds nothing.
///
/// Returns `Ok(None)` when the client is not in `clients`; the caller then
/// leaves the stored score untouched.
pub fn recompute_score(
    slots: &[Slot],
    fixed: &[FixedAssignment],
    clients: &[Client],
    client_id: &ClientId,
) -> PlannerResult<Option<f64>> {
    validate_inputs(slots, fixed, clients)?;

    let Some(client) = clients.iter().find(|c| c.id == *client_id) else {
        debug!(client = %client_id, "score update skipped, client not in roster");
        return Ok(None);
    };

    let mut score = client.score;
    let mut assigned = 0u32;
    for assignment in fixed.iter().filter(|a| a.client_id == *client_id) {
        assigned += 1;
        if let Some(cost) = client.cost_for(&assignment.slot_id) {
            score += cost;
        }
    }
    score += missing_term(client, assigned);

    debug!(client = %client_id, previous = client.score, score, assigned, "recomputed fairness score");
    Ok(Some(score))
}

/// Decays every due client in place and returns how many were touched.
///
/// A client that has never been decayed has its timestamp set to `now`
/// without any division, which opens its first window.
pub fn decay_in_place(clients: &mut [Client], now: DateTime<Utc>, policy: &DecayPolicy) -> usize {
    let mut decayed = 0;
    for client in clients.iter_mut() {
        match client.last_decay {
            Some(last) if policy.is_due(last, now) => {
                client.score /= policy.factor;
                client.last_decay = Some(now);
                decayed += 1;
            }
            Some(_) => {}
            None => client.last_decay = Some(now),
        }
    }
    info!(decayed, total = clients.len(), factor = policy.factor, "applied score decay");
    decayed
}

/// Returns the roster with scores decayed as of `now`.
pub fn apply_decay(clients: &[Client], now: DateTime<Utc>, policy: &DecayPolicy) -> Vec<Client> {
    let mut next = clients.to_vec();
    decay_in_place(&mut next, now, policy);
    next
}

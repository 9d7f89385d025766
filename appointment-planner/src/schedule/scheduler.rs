//! Scheduler façade.
//!
//! The seam between the planning core and whatever owns storage. It runs the
//! search on a caller-supplied snapshot and keeps quota, fixed set and score
//! consistent when a slot is committed or released:
//!
//! ```text
//! commit(slot, client):  requires quota > 0
//!                        fixed += (slot, client)
//!                        score += cost(slot) + missing_penalty * (quota - 1)
//!                        quota -= 1
//! release(slot):         fixed -= (slot, _)
//!                        quota += 1
//! ```
//!
//! Each commit charges only its own slot. Earlier commitments are already in
//! the stored score and already taken off the quota, so `quota - 1` is the
//! demand still unmet once this slot is fixed.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::{PlannerError, PlannerResult};
use super::fairness::{apply_decay, decay_in_place, recompute_score, DecayPolicy};
use super::search::{search_with, SearchOptions, SearchOutcome};
use super::types::{
    Assignment, Client, ClientId, FixedAssignment, PlanningSnapshot, ProposedAssignment, Slot, SlotId,
};
use super::validate::validate_inputs;

/// Result of committing one slot
#[derive(Debug, Clone, PartialEq)]
pub struct Commitment {
    pub assignment: FixedAssignment,
    pub previous_score: f64,
    pub score: f64,
    pub remaining_quota: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    options: SearchOptions,
    decay: DecayPolicy,
}

impl Scheduler {
    pub fn new(options: SearchOptions, decay: DecayPolicy) -> Self {
        Self { options, decay }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.search_options(), config.decay)
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn decay_policy(&self) -> &DecayPolicy {
        &self.decay
    }

    /// Read-only planning call.
    pub fn propose_assignment(
        &self,
        slots: &[Slot],
        fixed: &[FixedAssignment],
        clients: &[Client],
    ) -> PlannerResult<Vec<ProposedAssignment>> {
        search_with(slots, fixed, clients, &self.options).map(|o| o.assignments)
    }

    /// Plans a snapshot and keeps the search statistics.
    pub fn plan(&self, snapshot: &PlanningSnapshot) -> PlannerResult<SearchOutcome> {
        search_with(&snapshot.slots, &snapshot.fixed, &snapshot.clients, &self.options)
    }

    /// Score for `client_id` evaluated against `fixed` with its current score
    /// and quota. `Ok(None)` when the client is not in the roster.
    ///
    /// [`Scheduler::commit`] calls this with the new commitment alone, so
    /// slots already folded into the score are not charged twice.
    pub fn update_score_on_commit(
        &self,
        slots: &[Slot],
        fixed: &[FixedAssignment],
        clients: &[Client],
        client_id: &ClientId,
    ) -> PlannerResult<Option<f64>> {
        recompute_score(slots, fixed, clients, client_id)
    }

    /// Roster with due scores decayed as of `now`.
    pub fn apply_decay(&self, clients: &[Client], now: DateTime<Utc>) -> Vec<Client> {
        apply_decay(clients, now, &self.decay)
    }

    /// Decays the snapshot's roster in place.
    pub fn decay_snapshot(&self, snapshot: &mut PlanningSnapshot, now: DateTime<Utc>) -> usize {
        decay_in_place(&mut snapshot.clients, now, &self.decay)
    }

    /// Fixes `slot_id` to `client_id` and updates the client's score and quota.
    ///
    /// The snapshot is only modified once every check has passed.
    pub fn commit(
        &self,
        snapshot: &mut PlanningSnapshot,
        slot_id: &SlotId,
        client_id: &ClientId,
    ) -> PlannerResult<Commitment> {
        validate_inputs(&snapshot.slots, &snapshot.fixed, &snapshot.clients)?;

        if snapshot.slot(slot_id).is_none() {
            return Err(PlannerError::UnknownSlot(slot_id.clone()));
        }
        if snapshot.fixed_client(slot_id).is_some() {
            return Err(PlannerError::SlotAlreadyFixed(slot_id.clone()));
        }
        let Some(client) = snapshot.client(client_id) else {
            return Err(PlannerError::UnknownClient(client_id.clone()));
        };
        if client.requested_quota == 0 {
            return Err(PlannerError::QuotaExhausted(client_id.clone()));
        }
        if client.cost_for(slot_id).is_none() {
            warn!(slot = %slot_id, client = %client_id, "committing a slot the client did not declare");
        }
        let previous_score = client.score;

        let assignment = Assignment {
            slot_id: slot_id.clone(),
            client_id: client_id.clone(),
        };

        // Scored against this commitment alone, with the quota it consumes.
        let score = recompute_score(
            &snapshot.slots,
            std::slice::from_ref(&assignment),
            &snapshot.clients,
            client_id,
        )?
        .ok_or_else(|| PlannerError::UnknownClient(client_id.clone()))?;

        snapshot.fixed.push(assignment.clone());
        let client = snapshot
            .client_mut(client_id)
            .ok_or_else(|| PlannerError::UnknownClient(client_id.clone()))?;
        client.score = score;
        client.requested_quota -= 1;
        let remaining_quota = client.requested_quota;

        info!(
            slot = %slot_id,
            client = %client_id,
            previous_score,
            score,
            remaining_quota,
            "committed slot"
        );

        Ok(Commitment {
            assignment,
            previous_score,
            score,
            remaining_quota,
        })
    }

    /// Releases a fixed slot and hands the quota unit back to its client.
    ///
    /// The score is left as it is. If the client has since left the roster
    /// only the fixed assignment is removed.
    pub fn release(&self, snapshot: &mut PlanningSnapshot, slot_id: &SlotId) -> PlannerResult<FixedAssignment> {
        let Some(position) = snapshot.fixed.iter().position(|a| a.slot_id == *slot_id) else {
            return Err(PlannerError::SlotNotFixed(slot_id.clone()));
        };
        let released = snapshot.fixed.remove(position);

        match snapshot.client_mut(&released.client_id) {
            Some(client) => {
                client.requested_quota += 1;
                info!(
                    slot = %slot_id,
                    client = %released.client_id,
                    quota = client.requested_quota,
                    "released slot"
                );
            }
            None => debug!(slot = %slot_id, client = %released.client_id, "released slot of a client outside the roster"),
        }
        Ok(released)
    }
}

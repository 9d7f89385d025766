use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlannerError, PlannerResult};
use crate::schedule::types::{ClientId, PlanningSnapshot, SlotId};
use crate::schedule::validate::is_valid_cost;

/// One declared cost inside a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredCost {
    pub slot_id: SlotId,
    pub cost: f64,
}

/// A client's full availability for the slots of one snapshot.
/// Applying it replaces everything the client declared for those slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySubmission {
    pub client_id: ClientId,
    #[serde(default)]
    pub availabilities: Vec<DeclaredCost>,
}

/// Validates a submission against the snapshot it targets
pub fn validate_submission(submission: &AvailabilitySubmission, snapshot: &PlanningSnapshot) -> Result<(), String> {
    if snapshot.client(&submission.client_id).is_none() {
        return Err(format!("Unknown client: {}", submission.client_id));
    }

    let mut seen = HashSet::new();
    for declared in &submission.availabilities {
        if snapshot.slot(&declared.slot_id).is_none() {
            return Err(format!("Unknown slot: {}", declared.slot_id));
        }
        if !seen.insert(&declared.slot_id) {
            return Err(format!("Slot {} declared more than once", declared.slot_id));
        }
        if !is_valid_cost(declared.cost) {
            return Err(format!(
                "Cost for slot {} must be between 0 and 100, got {}",
                declared.slot_id, declared.cost
            ));
        }
    }

    Ok(())
}

/// Replaces the client's declarations for the snapshot's slots.
///
/// Declarations for slots outside the snapshot are kept. Returns how many
/// costs the client now declares within the snapshot.
pub fn apply_submission(snapshot: &mut PlanningSnapshot, submission: &AvailabilitySubmission) -> PlannerResult<usize> {
    validate_submission(submission, snapshot).map_err(PlannerError::Submission)?;

    let catalog: HashSet<SlotId> = snapshot.slots.iter().map(|s| s.id.clone()).collect();
    let client = snapshot
        .client_mut(&submission.client_id)
        .ok_or_else(|| PlannerError::UnknownClient(submission.client_id.clone()))?;

    client.availability.retain(|slot, _| !catalog.contains(slot));
    for declared in &submission.availabilities {
        client.availability.insert(declared.slot_id.clone(), declared.cost);
    }

    info!(
        client = %submission.client_id,
        declared = submission.availabilities.len(),
        "replaced client availability"
    );
    Ok(submission.availabilities.len())
}

//! Structural checks run before every planning or scoring call.
//!
//! The core does not sanitize input: it never clamps a cost or drops a
//! duplicate. It either accepts the snapshot as given or names the first
//! input that breaks a precondition.

use std::collections::HashSet;

use crate::error::{PlannerError, PlannerResult};
use super::slot_utils::slot_end;
use super::types::{Client, FixedAssignment, Slot, SlotId, MAX_COST, MIN_COST};

/// Validates a (slots, fixed, clients) triple.
///
/// Fixed assignments naming a client outside `clients` are accepted: the
/// roster handed to a planning round may be narrower than the set of
/// clients that ever held a slot.
pub fn validate_inputs(
    slots: &[Slot],
    fixed: &[FixedAssignment],
    clients: &[Client],
) -> PlannerResult<()> {
    let slot_ids = validate_slots(slots)?;
    validate_clients(clients, &slot_ids)?;
    validate_fixed(fixed, &slot_ids)?;
    Ok(())
}

fn validate_slots(slots: &[Slot]) -> PlannerResult<HashSet<&SlotId>> {
    let mut seen = HashSet::with_capacity(slots.len());
    for slot in slots {
        if !seen.insert(&slot.id) {
            return Err(PlannerError::DuplicateSlot(slot.id.clone()));
        }
        if !slot.duration.is_finite() || slot.duration <= 0.0 {
            return Err(PlannerError::InvalidDuration {
                slot: slot.id.clone(),
                duration: slot.duration,
            });
        }
        slot_end(slot)?;
    }
    Ok(seen)
}

fn validate_clients(clients: &[Client], slot_ids: &HashSet<&SlotId>) -> PlannerResult<()> {
    let mut seen = HashSet::with_capacity(clients.len());
    for client in clients {
        if !seen.insert(&client.id) {
            return Err(PlannerError::DuplicateClient(client.id.clone()));
        }
        if !client.score.is_finite() || client.score < 0.0 {
            return Err(PlannerError::InvalidScore {
                client: client.id.clone(),
                score: client.score,
            });
        }
        if let Some(penalty) = client.missing_penalty {
            if !penalty.is_finite() || penalty <= 0.0 {
                return Err(PlannerError::InvalidPenalty {
                    client: client.id.clone(),
                    penalty,
                });
            }
        }
        // Declarations for slots outside the catalog are ignored, not checked.
        for (slot, &cost) in &client.availability {
            if slot_ids.contains(slot) && !is_valid_cost(cost) {
                return Err(PlannerError::InvalidCost {
                    client: client.id.clone(),
                    slot: slot.clone(),
                    cost,
                });
            }
        }
    }
    Ok(())
}

fn validate_fixed(fixed: &[FixedAssignment], slot_ids: &HashSet<&SlotId>) -> PlannerResult<()> {
    let mut bound = HashSet::with_capacity(fixed.len());
    for assignment in fixed {
        if !slot_ids.contains(&assignment.slot_id) {
            return Err(PlannerError::UnknownSlot(assignment.slot_id.clone()));
        }
        if !bound.insert(&assignment.slot_id) {
            return Err(PlannerError::SlotAlreadyFixed(assignment.slot_id.clone()));
        }
    }
    Ok(())
}

/// Whether `cost` is a finite value in `[0, 100]`
pub fn is_valid_cost(cost: f64) -> bool {
    cost.is_finite() && (MIN_COST..=MAX_COST).contains(&cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::Assignment;
    use chrono::{TimeZone, Utc};

    fn slot(id: &str) -> Slot {
        Slot::new(id, Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(), 1.0)
    }

    #[test]
    fn accepts_well_formed_snapshot() {
        let slots = vec![slot("s1"), slot("s2")];
        let fixed = vec![Assignment::new("s1", "a")];
        let clients = vec![Client::new("a").with_cost("s1", 0.0).with_cost("s2", 100.0)];

        assert!(validate_inputs(&slots, &fixed, &clients).is_ok());
    }

    #[test]
    fn rejects_fixed_assignment_on_unknown_slot() {
        let slots = vec![slot("s1")];
        let fixed = vec![Assignment::new("ghost", "a")];

        let err = validate_inputs(&slots, &fixed, &[]).unwrap_err();
        assert!(matches!(err, PlannerError::UnknownSlot(ref s) if s.0 == "ghost"));
    }

    #[test]
    fn rejects_two_fixed_assignments_for_one_slot() {
        let slots = vec![slot("s1")];
        let fixed = vec![Assignment::new("s1", "a"), Assignment::new("s1", "b")];

        let err = validate_inputs(&slots, &fixed, &[]).unwrap_err();
        assert!(matches!(err, PlannerError::SlotAlreadyFixed(_)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = validate_inputs(&[slot("s1"), slot("s1")], &[], &[]).unwrap_err();
        assert!(matches!(err, PlannerError::DuplicateSlot(_)));

        let clients = vec![Client::new("a"), Client::new("a")];
        let err = validate_inputs(&[], &[], &clients).unwrap_err();
        assert!(matches!(err, PlannerError::DuplicateClient(_)));
    }

    #[test]
    fn rejects_out_of_range_cost() {
        let clients = vec![Client::new("a").with_cost("s1", 100.5)];
        let err = validate_inputs(&[slot("s1")], &[], &clients).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidCost { cost, .. } if cost == 100.5));
    }

    #[test]
    fn ignores_costs_for_slots_outside_catalog() {
        let clients = vec![Client::new("a").with_cost("elsewhere", 250.0)];
        assert!(validate_inputs(&[slot("s1")], &[], &clients).is_ok());
    }

    #[test]
    fn rejects_bad_score_penalty_and_duration() {
        let clients = vec![Client::new("a").with_score(-1.0)];
        assert!(matches!(
            validate_inputs(&[], &[], &clients),
            Err(PlannerError::InvalidScore { .. })
        ));

        let clients = vec![Client::new("a").with_missing_penalty(0.0)];
        assert!(matches!(
            validate_inputs(&[], &[], &clients),
            Err(PlannerError::InvalidPenalty { .. })
        ));

        let mut bad = slot("s1");
        bad.duration = 0.0;
        assert!(matches!(
            validate_inputs(&[bad], &[], &[]),
            Err(PlannerError::InvalidDuration { .. })
        ));

        let mut endless = slot("s1");
        endless.duration = 1e300;
        assert!(matches!(
            validate_inputs(&[endless], &[], &[]),
            Err(PlannerError::InvalidDuration { .. })
        ));
    }
}

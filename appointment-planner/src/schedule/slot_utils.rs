use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::error::{PlannerError, PlannerResult};
use super::types::{Client, FixedAssignment, Slot, SlotId};

/// Slots not bound by a fixed assignment, in catalog order
pub fn free_slots<'a>(slots: &'a [Slot], fixed: &[FixedAssignment]) -> Vec<&'a Slot> {
    let taken: HashSet<&SlotId> = fixed.iter().map(|a| &a.slot_id).collect();
    slots.iter().filter(|s| !taken.contains(&s.id)).collect()
}

/// End of a slot, with the duration rounded to the nearest second.
/// Fails with `InvalidDuration` when the end is not a representable instant.
pub fn slot_end(slot: &Slot) -> PlannerResult<DateTime<Utc>> {
    let seconds = (slot.duration * 3600.0).round();
    let length = if seconds.is_finite() && seconds.abs() < i64::MAX as f64 {
        Duration::try_seconds(seconds as i64)
    } else {
        None
    };
    length
        .and_then(|length| slot.start.checked_add_signed(length))
        .ok_or_else(|| PlannerError::InvalidDuration {
            slot: slot.id.clone(),
            duration: slot.duration,
        })
}

/// Formats a slot for display, e.g. `Mon 02 Mar 09:00-10:30`
pub fn format_slot_time(slot: &Slot) -> PlannerResult<String> {
    Ok(format!(
        "{}-{}",
        slot.start.format("%a %d %b %H:%M"),
        slot_end(slot)?.format("%H:%M")
    ))
}

/// Counts how many clients declared each catalog slot.
/// Slots nobody declared map to 0 so every catalog slot is present.
pub fn slot_demand(slots: &[Slot], clients: &[Client]) -> HashMap<SlotId, u32> {
    let mut demand: HashMap<SlotId, u32> = slots.iter().map(|s| (s.id.clone(), 0)).collect();
    for client in clients {
        for slot in client.availability.keys() {
            if let Some(count) = demand.get_mut(slot) {
                *count += 1;
            }
        }
    }
    demand
}

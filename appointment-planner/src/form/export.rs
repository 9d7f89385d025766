use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::PlannerResult;
use crate::schedule::slot_utils::slot_end;
use crate::schedule::types::{Assignment, PlanningSnapshot};

/// Writes assignments as CSV with columns `slot_id,start,end,client_id,cost`.
///
/// Rows follow slot catalog order. `cost` is blank when the client never
/// declared the slot.
pub fn write_plan_csv<W: Write>(writer: W, snapshot: &PlanningSnapshot, assignments: &[Assignment]) -> PlannerResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(["slot_id", "start", "end", "client_id", "cost"])?;

    for slot in &snapshot.slots {
        let Some(assignment) = assignments.iter().find(|a| a.slot_id == slot.id) else {
            continue;
        };
        let cost = snapshot
            .client(&assignment.client_id)
            .and_then(|c| c.cost_for(&slot.id))
            .map(|c| c.to_string())
            .unwrap_or_default();
        let start = slot.start.to_rfc3339();
        let end = slot_end(slot)?.to_rfc3339();

        wtr.write_record([
            slot.id.0.as_str(),
            start.as_str(),
            end.as_str(),
            assignment.client_id.0.as_str(),
            cost.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a proposed plan to `csv_path`, replacing any existing file
pub fn export_plan_to_csv(csv_path: &Path, snapshot: &PlanningSnapshot, assignments: &[Assignment]) -> PlannerResult<()> {
    let file = File::create(csv_path)?;
    write_plan_csv(file, snapshot, assignments)
}

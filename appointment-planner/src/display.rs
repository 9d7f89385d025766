use std::fs::File;
use std::io::Write;

use crate::error::PlannerResult;
use crate::schedule::objective::working_scores;
use crate::schedule::search::SearchOutcome;
use crate::schedule::slot_utils::{format_slot_time, free_slots, slot_demand};
use crate::schedule::types::{Assignment, PlanningSnapshot};

/// One line per catalog slot: `<time> <client>`, with fixed slots tagged
/// `[FIXED]` and unassigned ones shown as `[EMPTY]`
pub fn format_plan_lines(snapshot: &PlanningSnapshot, proposed: &[Assignment]) -> PlannerResult<Vec<String>> {
    snapshot
        .slots
        .iter()
        .map(|slot| {
            let time = format_slot_time(slot)?;
            Ok(if let Some(client) = snapshot.fixed_client(&slot.id) {
                format!("{} [FIXED] {}", time, client)
            } else if let Some(a) = proposed.iter().find(|a| a.slot_id == slot.id) {
                format!("{} {}", time, a.client_id)
            } else {
                format!("{} [EMPTY]", time)
            })
        })
        .collect()
}

/// Writes a plan to a file, headed by `title`
pub fn write_plan_to_file(
    title: &str,
    snapshot: &PlanningSnapshot,
    proposed: &[Assignment],
    filename: &str,
) -> PlannerResult<()> {
    let lines = format_plan_lines(snapshot, proposed)?;
    let mut file = File::create(filename)?;
    writeln!(file, "** {} **", title)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// Prints a plan with per-slot demand and each client's resulting working score
pub fn print_plan(title: &str, snapshot: &PlanningSnapshot, outcome: &SearchOutcome) -> PlannerResult<()> {
    let lines = format_plan_lines(snapshot, &outcome.assignments)?;

    println!("\n=== {} ===", title);
    println!(
        "Proposed {} of {} free slots (objective {:.2}, {} nodes, {} candidates)",
        outcome.assignments.len(),
        free_slots(&snapshot.slots, &snapshot.fixed).len(),
        outcome.objective,
        outcome.nodes_visited,
        outcome.candidates_evaluated
    );

    let demand = slot_demand(&snapshot.slots, &snapshot.clients);
    println!("\nSchedule by slot:");
    for (slot, line) in snapshot.slots.iter().zip(lines) {
        let requests = demand.get(&slot.id).copied().unwrap_or(0);
        println!("  {} ({} requests)", line, requests);
    }

    let scores = working_scores(&snapshot.clients, &outcome.assignments);
    println!("\nWorking scores:");
    for (client, score) in snapshot.clients.iter().zip(scores) {
        let assigned = outcome
            .assignments
            .iter()
            .filter(|a| a.client_id == client.id)
            .count();
        println!(
            "  {} -> {:.2} (score {:.2}, {} of {} requested)",
            client.id, score, client.score, assigned, client.requested_quota
        );
    }
    Ok(())
}

use std::path::Path;

use anyhow::{bail, Context};
use chrono::Utc;

use appointment_planner::display::{print_plan, write_plan_to_file};
use appointment_planner::form::{apply_submission, export_plan_to_csv, AvailabilitySubmission};
use appointment_planner::parser::{load_snapshot, load_snapshot_from_csv, parse_timestamp, save_snapshot};
use appointment_planner::{ClientId, PlannerConfig, Scheduler, SlotId};

const USAGE: &str = "\
usage:
  appointment-planner plan <snapshot.json> [plan.csv]
  appointment-planner commit <snapshot.json> <slot-id> <client-id>
  appointment-planner release <snapshot.json> <slot-id>
  appointment-planner decay <snapshot.json> [now]
  appointment-planner submit <snapshot.json> <submission.json>
  appointment-planner import <slots.csv> <clients.csv> <availability.csv> <snapshot.json> [fixed.csv]";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,appointment_planner=debug")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = PlannerConfig::load().context("failed to load planner configuration")?;
    let scheduler = Scheduler::from_config(&config);

    match args.get(1).map(String::as_str) {
        Some("plan") if args.len() >= 3 => plan(&scheduler, &args[2], args.get(3).map(String::as_str)),
        Some("commit") if args.len() >= 5 => commit(&scheduler, &args[2], &args[3], &args[4]),
        Some("release") if args.len() >= 4 => release(&scheduler, &args[2], &args[3]),
        Some("decay") if args.len() >= 3 => decay(&scheduler, &args[2], args.get(3).map(String::as_str)),
        Some("submit") if args.len() >= 4 => submit(&args[2], &args[3]),
        Some("import") if args.len() >= 6 => import(&args[2], &args[3], &args[4], &args[5], args.get(6)),
        _ => bail!("{USAGE}"),
    }
}

fn plan(scheduler: &Scheduler, snapshot_path: &str, csv_path: Option<&str>) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot_path).with_context(|| format!("failed to read {snapshot_path}"))?;

    let outcome = scheduler.plan(&snapshot)?;
    print_plan("Proposed Plan", &snapshot, &outcome)?;

    if let Some(csv_path) = csv_path {
        export_plan_to_csv(Path::new(csv_path), &snapshot, &outcome.assignments)?;
        println!("\nPlan exported to {}", csv_path);
    } else {
        write_plan_to_file("Proposed Plan", &snapshot, &outcome.assignments, "plan.txt")?;
        println!("\nPlan saved to plan.txt");
    }
    Ok(())
}

fn commit(scheduler: &Scheduler, snapshot_path: &str, slot: &str, client: &str) -> anyhow::Result<()> {
    let mut snapshot = load_snapshot(snapshot_path).with_context(|| format!("failed to read {snapshot_path}"))?;

    let commitment = scheduler.commit(&mut snapshot, &SlotId::from(slot), &ClientId::from(client))?;
    save_snapshot(snapshot_path, &snapshot)?;

    println!(
        "Fixed {} to {}: score {:.2} -> {:.2}, {} slot(s) still requested",
        commitment.assignment.slot_id,
        commitment.assignment.client_id,
        commitment.previous_score,
        commitment.score,
        commitment.remaining_quota
    );
    Ok(())
}

fn release(scheduler: &Scheduler, snapshot_path: &str, slot: &str) -> anyhow::Result<()> {
    let mut snapshot = load_snapshot(snapshot_path).with_context(|| format!("failed to read {snapshot_path}"))?;

    let released = scheduler.release(&mut snapshot, &SlotId::from(slot))?;
    save_snapshot(snapshot_path, &snapshot)?;

    println!("Released {} from {}", released.slot_id, released.client_id);
    Ok(())
}

fn decay(scheduler: &Scheduler, snapshot_path: &str, now: Option<&str>) -> anyhow::Result<()> {
    let mut snapshot = load_snapshot(snapshot_path).with_context(|| format!("failed to read {snapshot_path}"))?;
    let now = match now {
        Some(raw) => parse_timestamp(raw)?,
        None => Utc::now(),
    };

    let decayed = scheduler.decay_snapshot(&mut snapshot, now);
    save_snapshot(snapshot_path, &snapshot)?;

    println!("Decayed {} of {} client score(s)", decayed, snapshot.clients.len());
    Ok(())
}

fn submit(snapshot_path: &str, submission_path: &str) -> anyhow::Result<()> {
    let mut snapshot = load_snapshot(snapshot_path).with_context(|| format!("failed to read {snapshot_path}"))?;
    let raw = std::fs::read_to_string(submission_path).with_context(|| format!("failed to read {submission_path}"))?;
    let submission: AvailabilitySubmission = serde_json::from_str(&raw)?;

    let declared = apply_submission(&mut snapshot, &submission)?;
    save_snapshot(snapshot_path, &snapshot)?;

    println!("Recorded {} declared slot(s) for {}", declared, submission.client_id);
    Ok(())
}

fn import(
    slots: &str,
    clients: &str,
    availability: &str,
    snapshot_path: &str,
    fixed: Option<&String>,
) -> anyhow::Result<()> {
    let snapshot = load_snapshot_from_csv(slots, clients, availability, fixed.map(String::as_str))?;
    save_snapshot(snapshot_path, &snapshot)?;

    println!(
        "Imported {} slot(s), {} client(s), {} fixed assignment(s) into {}",
        snapshot.slots.len(),
        snapshot.clients.len(),
        snapshot.fixed.len(),
        snapshot_path
    );
    Ok(())
}

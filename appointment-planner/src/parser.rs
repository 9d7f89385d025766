use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PlannerError, PlannerResult};
use crate::schedule::types::{Assignment, Client, ClientId, PlanningSnapshot, Slot, SlotId};

#[derive(Debug, Deserialize)]
struct SlotRecord {
    id: String,
    start: String,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct ClientRecord {
    id: String,
    score: Option<f64>,
    missing_penalty: Option<f64>,
    requested_quota: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityRecord {
    client_id: String,
    slot_id: String,
    cost: f64,
}

#[derive(Debug, Deserialize)]
struct FixedRecord {
    slot_id: String,
    client_id: String,
}

/// Parses a timestamp in RFC 3339, or a naive `YYYY-MM-DD HH:MM[:SS]` taken as UTC
pub fn parse_timestamp(raw: &str) -> PlannerResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(PlannerError::Timestamp(raw.to_string()))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new().trim(Trim::All).from_reader(reader)
}

/// Reads a slot catalog with columns `id,start,duration`
pub fn read_slots<R: Read>(reader: R) -> PlannerResult<Vec<Slot>> {
    let mut slots = Vec::new();
    for record in csv_reader(reader).deserialize() {
        let record: SlotRecord = record?;
        slots.push(Slot {
            id: SlotId(record.id),
            start: parse_timestamp(&record.start)?,
            duration: record.duration,
        });
    }
    Ok(slots)
}

/// Reads a client roster with columns `id,score,missing_penalty,requested_quota`.
/// Empty score or quota cells read as 0, an empty penalty as "use the default".
pub fn read_clients<R: Read>(reader: R) -> PlannerResult<Vec<Client>> {
    let mut clients = Vec::new();
    for record in csv_reader(reader).deserialize() {
        let record: ClientRecord = record?;
        let mut client = Client::new(record.id.as_str())
            .with_score(record.score.unwrap_or(0.0))
            .with_quota(record.requested_quota.unwrap_or(0));
        client.missing_penalty = record.missing_penalty;
        clients.push(client);
    }
    Ok(clients)
}

/// Merges availability rows (`client_id,slot_id,cost`) into `clients`.
///
/// A later row for the same (client, slot) replaces the earlier one. Rows for
/// clients outside the roster are skipped. Returns the number of rows applied.
pub fn read_availability<R: Read>(reader: R, clients: &mut [Client]) -> PlannerResult<usize> {
    let index: HashMap<ClientId, usize> = clients
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    let mut applied = 0;
    for record in csv_reader(reader).deserialize() {
        let record: AvailabilityRecord = record?;
        let client_id = ClientId(record.client_id);
        let Some(&i) = index.get(&client_id) else {
            warn!(client = %client_id, slot = %record.slot_id, "skipping availability for unknown client");
            continue;
        };
        clients[i].availability.insert(SlotId(record.slot_id), record.cost);
        applied += 1;
    }
    Ok(applied)
}

/// Reads committed pairings with columns `slot_id,client_id`
pub fn read_fixed<R: Read>(reader: R) -> PlannerResult<Vec<Assignment>> {
    let mut fixed = Vec::new();
    for record in csv_reader(reader).deserialize() {
        let record: FixedRecord = record?;
        fixed.push(Assignment::new(record.slot_id.as_str(), record.client_id.as_str()));
    }
    Ok(fixed)
}

/// Builds a snapshot from the CSV exports of the surrounding application
pub fn load_snapshot_from_csv<P: AsRef<Path>>(
    slots_path: P,
    clients_path: P,
    availability_path: P,
    fixed_path: Option<P>,
) -> PlannerResult<PlanningSnapshot> {
    let slots = read_slots(File::open(slots_path)?)?;
    let mut clients = read_clients(File::open(clients_path)?)?;
    let rows = read_availability(File::open(availability_path)?, &mut clients)?;
    let fixed = match fixed_path {
        Some(path) => read_fixed(File::open(path)?)?,
        None => Vec::new(),
    };

    debug!(
        slots = slots.len(),
        clients = clients.len(),
        availability_rows = rows,
        fixed = fixed.len(),
        "loaded snapshot from CSV"
    );
    Ok(PlanningSnapshot::new(slots, fixed, clients))
}

/// Loads a JSON snapshot
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> PlannerResult<PlanningSnapshot> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Writes a JSON snapshot, replacing any existing file
pub fn save_snapshot<P: AsRef<Path>>(path: P, snapshot: &PlanningSnapshot) -> PlannerResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

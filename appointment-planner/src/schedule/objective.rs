//! Fairness objective shared by the search and the score update.
//!
//! A client's working score starts at its fairness `score`, grows by the
//! declared cost of every slot it receives and by `missing_penalty` for each
//! unit of quota left unmet. A candidate is judged by the arithmetic mean of
//! all working scores. Lower is better.

use std::collections::HashMap;

use super::types::{Assignment, Client, ClientId};

/// `missing_penalty × max(0, requested_quota − assigned)`
pub fn missing_term(client: &Client, assigned: u32) -> f64 {
    client.missing_penalty() * f64::from(client.requested_quota.saturating_sub(assigned))
}

/// Arithmetic mean, 0 for an empty roster
pub fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Working score of every client under `candidate`, in roster order.
///
/// `candidate` must be listed in slot order for the result to match the
/// search bit for bit. A slot given to a client with no declared cost for it
/// is charged that client's missing penalty.
pub fn working_scores(clients: &[Client], candidate: &[Assignment]) -> Vec<f64> {
    let index: HashMap<&ClientId, usize> = clients
        .iter()
        .enumerate()
        .map(|(i, c)| (&c.id, i))
        .collect();

    let mut scores: Vec<f64> = clients.iter().map(|c| c.score).collect();
    let mut counts = vec![0u32; clients.len()];

    for assignment in candidate {
        let Some(&i) = index.get(&assignment.client_id) else {
            continue;
        };
        let client = &clients[i];
        scores[i] += client
            .cost_for(&assignment.slot_id)
            .unwrap_or_else(|| client.missing_penalty());
        counts[i] += 1;
    }

    for (i, client) in clients.iter().enumerate() {
        scores[i] += missing_term(client, counts[i]);
    }
    scores
}

/// Objective value of a full candidate
pub fn evaluate(clients: &[Client], candidate: &[Assignment]) -> f64 {
    mean(&working_scores(clients, candidate))
}

/// Objective value of leaving every free slot unassigned
pub fn baseline(clients: &[Client]) -> f64 {
    evaluate(clients, &[])
}

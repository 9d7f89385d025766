//! Exact assignment search.
//!
//! Free slots are decided one at a time in catalog order. For each slot the
//! search tries every client in roster order that declared a cost for it and
//! still has quota left on the current branch, then tries leaving the slot
//! empty. Each complete candidate is scored with [`objective`](super::objective)
//! and replaces the incumbent only when strictly better, so among equal
//! candidates the first one enumerated wins.
//!
//! The search is iterative: the partial assignment, per-client counts and the
//! option cursor of every level live in buffers owned by a single call.
//!
//! [`SearchStrategy::BranchAndBound`] additionally discards a branch when an
//! optimistic bound on its best leaf is already worse than the incumbent. The
//! bound relaxes quotas, so it never cuts a branch holding a strictly better
//! candidate, and the result is identical to [`SearchStrategy::Exhaustive`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlannerError, PlannerResult};
use super::objective::{mean, missing_term};
use super::slot_utils::free_slots;
use super::types::{Assignment, Client, FixedAssignment, ProposedAssignment, Slot, SlotId};
use super::validate::validate_inputs;

/// Free slots accepted per planning round unless configured otherwise
pub const DEFAULT_MAX_FREE_SLOTS: usize = 24;

/// Relative slack granted to the bound before a branch is cut
const PRUNE_TOLERANCE: f64 = 1e-9;

/// How often (in nodes) the cancellation flag is polled
const CANCEL_POLL_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    /// Visit every candidate
    Exhaustive,
    /// Skip branches that cannot beat the incumbent
    #[default]
    BranchAndBound,
}

/// Knobs for a single search call
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub strategy: SearchStrategy,
    /// Refuse rounds with more free slots than this
    pub max_free_slots: Option<usize>,
    /// Give up after visiting this many nodes
    pub node_limit: Option<u64>,
    /// Polled while searching; setting it aborts the call
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            max_free_slots: Some(DEFAULT_MAX_FREE_SLOTS),
            node_limit: None,
            cancel: None,
        }
    }
}

/// Best candidate found plus search statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Proposed pairings in slot order
    pub assignments: Vec<ProposedAssignment>,
    /// Mean working score of the returned candidate
    pub objective: f64,
    /// Partial assignments expanded
    pub nodes_visited: u64,
    /// Complete candidates scored
    pub candidates_evaluated: u64,
}

/// Proposes an assignment of the free slots using default options.
pub fn search(
    slots: &[Slot],
    fixed: &[FixedAssignment],
    clients: &[Client],
) -> PlannerResult<Vec<ProposedAssignment>> {
    search_with(slots, fixed, clients, &SearchOptions::default()).map(|o| o.assignments)
}

/// Proposes an assignment of the free slots.
///
/// Fails on structurally invalid input, when the round has more free slots
/// than `options.max_free_slots`, or when the node budget or cancellation
/// flag stops the search before it is proven optimal.
pub fn search_with(
    slots: &[Slot],
    fixed: &[FixedAssignment],
    clients: &[Client],
    options: &SearchOptions,
) -> PlannerResult<SearchOutcome> {
    validate_inputs(slots, fixed, clients)?;

    let free = free_slots(slots, fixed);
    if let Some(ceiling) = options.max_free_slots {
        if free.len() > ceiling {
            warn!(free = free.len(), ceiling, "planning round exceeds free slot ceiling");
            return Err(PlannerError::TooManyFreeSlots {
                free: free.len(),
                ceiling,
            });
        }
    }

    debug!(
        free_slots = free.len(),
        clients = clients.len(),
        strategy = ?options.strategy,
        "starting assignment search"
    );

    let problem = Problem::new(&free, clients);
    let outcome = problem.solve(options)?;

    debug!(
        proposed = outcome.assignments.len(),
        objective = outcome.objective,
        nodes = outcome.nodes_visited,
        candidates = outcome.candidates_evaluated,
        "assignment search finished"
    );
    Ok(outcome)
}

/// Index-addressed view of one planning round.
struct Problem<'a> {
    slots: Vec<&'a SlotId>,
    clients: &'a [Client],
    /// `costs[j][i]`: declared cost of free slot `j` for client `i`
    costs: Vec<Vec<Option<f64>>>,
    penalties: Vec<f64>,
    quotas: Vec<u32>,
    seeds: Vec<f64>,
    /// Sum of working scores with every slot left empty
    baseline_total: f64,
    /// `suffix_gain[j]`: lowest total change slots `j..` can still bring
    suffix_gain: Vec<f64>,
}

impl<'a> Problem<'a> {
    fn new(free: &[&'a Slot], clients: &'a [Client]) -> Self {
        let penalties: Vec<f64> = clients.iter().map(Client::missing_penalty).collect();
        let quotas: Vec<u32> = clients.iter().map(|c| c.requested_quota).collect();
        let seeds: Vec<f64> = clients.iter().map(|c| c.score).collect();
        let costs: Vec<Vec<Option<f64>>> = free
            .iter()
            .map(|slot| clients.iter().map(|c| c.cost_for(&slot.id)).collect())
            .collect();

        let baseline_total = clients
            .iter()
            .map(|c| c.score + missing_term(c, 0))
            .sum();

        // Giving slot j to client i moves the total by cost - penalty, and
        // leaving it empty moves it by nothing.
        let mut suffix_gain = vec![0.0; free.len() + 1];
        for j in (0..free.len()).rev() {
            let best_move = costs[j]
                .iter()
                .enumerate()
                .filter_map(|(i, cost)| match cost {
                    Some(c) if quotas[i] > 0 => Some(c - penalties[i]),
                    _ => None,
                })
                .fold(0.0_f64, f64::min);
            suffix_gain[j] = suffix_gain[j + 1] + best_move;
        }

        Self {
            slots: free.iter().map(|s| &s.id).collect(),
            clients,
            costs,
            penalties,
            quotas,
            seeds,
            baseline_total,
            suffix_gain,
        }
    }

    fn eligible(&self, slot: usize, client: usize, counts: &[u32]) -> bool {
        self.costs[slot][client].is_some() && counts[client] < self.quotas[client]
    }

    /// Change in the working-score total caused by giving `slot` to `client`
    fn delta(&self, slot: usize, client: usize) -> f64 {
        self.costs[slot][client].unwrap_or(self.penalties[client]) - self.penalties[client]
    }

    fn solve(&self, options: &SearchOptions) -> PlannerResult<SearchOutcome> {
        let slot_count = self.slots.len();
        let client_count = self.clients.len();
        // Option index `client_count` stands for "leave the slot empty".
        let leave_empty = client_count;
        let pruning = options.strategy == SearchStrategy::BranchAndBound;

        let mut choice: Vec<Option<usize>> = Vec::with_capacity(slot_count);
        let mut cursor: Vec<usize> = Vec::with_capacity(slot_count + 1);
        let mut counts = vec![0u32; client_count];
        let mut partial_total = self.baseline_total;
        let mut scratch: Vec<f64> = Vec::with_capacity(client_count);

        let mut best_value = f64::INFINITY;
        let mut best_choice: Option<Vec<Option<usize>>> = None;
        let mut nodes = 0u64;
        let mut leaves = 0u64;

        cursor.push(0);
        while let Some(&start) = cursor.last() {
            let depth = cursor.len() - 1;

            if depth == slot_count {
                leaves += 1;
                let value = self.leaf_objective(&choice, &counts, &mut scratch);
                if value < best_value {
                    best_value = value;
                    best_choice = Some(choice.clone());
                }
                cursor.pop();
                self.undo(&mut choice, &mut counts, &mut partial_total);
                continue;
            }

            let mut option = start;
            let picked = loop {
                if option > leave_empty {
                    break None;
                }
                let candidate = option;
                option += 1;
                if candidate == leave_empty {
                    break Some(None);
                }
                if self.eligible(depth, candidate, &counts) {
                    break Some(Some(candidate));
                }
            };
            cursor[depth] = option;

            let Some(pick) = picked else {
                cursor.pop();
                self.undo(&mut choice, &mut counts, &mut partial_total);
                continue;
            };

            nodes += 1;
            if let Some(limit) = options.node_limit {
                if nodes > limit {
                    warn!(nodes, limit, "assignment search exceeded its node budget");
                    return Err(PlannerError::SearchBudgetExceeded { nodes });
                }
            }
            if nodes % CANCEL_POLL_INTERVAL == 0 {
                if let Some(flag) = &options.cancel {
                    if flag.load(Ordering::Relaxed) {
                        debug!(nodes, "assignment search cancelled");
                        return Err(PlannerError::SearchCancelled { nodes });
                    }
                }
            }

            if let Some(client) = pick {
                counts[client] += 1;
                partial_total += self.delta(depth, client);
            }
            choice.push(pick);

            if pruning && best_choice.is_some() {
                let bound = (partial_total + self.suffix_gain[depth + 1]) / client_count.max(1) as f64;
                if bound > best_value + PRUNE_TOLERANCE * (1.0 + best_value.abs()) {
                    self.undo(&mut choice, &mut counts, &mut partial_total);
                    continue;
                }
            }

            cursor.push(0);
        }

        let best_choice = best_choice.unwrap_or_else(|| vec![None; slot_count]);
        let assignments = best_choice
            .iter()
            .enumerate()
            .filter_map(|(j, pick)| {
                pick.map(|i| Assignment {
                    slot_id: self.slots[j].clone(),
                    client_id: self.clients[i].id.clone(),
                })
            })
            .collect();

        Ok(SearchOutcome {
            assignments,
            objective: if best_value.is_finite() { best_value } else { self.baseline_mean() },
            nodes_visited: nodes,
            candidates_evaluated: leaves,
        })
    }

    /// Reverts the most recent choice, if any.
    fn undo(&self, choice: &mut Vec<Option<usize>>, counts: &mut [u32], partial_total: &mut f64) {
        if let Some(Some(client)) = choice.pop() {
            let slot = choice.len();
            counts[client] -= 1;
            *partial_total -= self.delta(slot, client);
        }
    }

    /// Scores a complete candidate exactly as [`super::objective::evaluate`] does.
    fn leaf_objective(&self, choice: &[Option<usize>], counts: &[u32], scratch: &mut Vec<f64>) -> f64 {
        scratch.clear();
        scratch.extend_from_slice(&self.seeds);
        for (j, pick) in choice.iter().enumerate() {
            if let Some(i) = *pick {
                scratch[i] += self.costs[j][i].unwrap_or(self.penalties[i]);
            }
        }
        for (i, client) in self.clients.iter().enumerate() {
            scratch[i] += missing_term(client, counts[i]);
        }
        mean(scratch)
    }

    fn baseline_mean(&self) -> f64 {
        if self.clients.is_empty() {
            0.0
        } else {
            self.baseline_total / self.clients.len() as f64
        }
    }
}

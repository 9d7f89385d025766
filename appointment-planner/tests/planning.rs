use std::collections::{HashMap, HashSet};

use appointment_planner::schedule::objective::{baseline, evaluate};
use appointment_planner::schedule::{recompute_score, search, search_with};
use appointment_planner::{
    Assignment, Client, ClientId, DecayPolicy, PlannerError, PlanningSnapshot, Scheduler, SearchOptions,
    SearchStrategy, Slot,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn slots(n: usize) -> Vec<Slot> {
    (0..n)
        .map(|i| Slot::new(format!("s{}", i + 1).as_str(), monday() + Duration::hours(i as i64), 1.0))
        .collect()
}

fn random_snapshot(rng: &mut StdRng) -> PlanningSnapshot {
    let slot_count = rng.gen_range(0..=5);
    let client_count = rng.gen_range(1..=4);
    let catalog = slots(slot_count);

    let clients = (0..client_count)
        .map(|i| {
            let mut client = Client::new(format!("c{}", i).as_str())
                .with_score(rng.gen_range(0..=60) as f64)
                .with_quota(rng.gen_range(0..=3));
            if rng.gen_bool(0.3) {
                client = client.with_missing_penalty(rng.gen_range(20..=250) as f64);
            }
            for slot in &catalog {
                if rng.gen_bool(0.6) {
                    client = client.with_cost(slot.id.clone(), rng.gen_range(0..=100) as f64);
                }
            }
            client
        })
        .collect();

    PlanningSnapshot::new(catalog, Vec::new(), clients)
}

#[test]
fn lower_cost_client_takes_the_only_slot() {
    let clients = vec![
        Client::new("A").with_quota(1).with_cost("S1", 10.0),
        Client::new("B").with_quota(1).with_cost("S1", 5.0),
    ];
    let catalog = vec![Slot::new("S1", monday(), 1.0)];

    let outcome = search_with(&catalog, &[], &clients, &SearchOptions::default()).unwrap();

    assert_eq!(outcome.assignments, vec![Assignment::new("S1", "B")]);
    assert_eq!(outcome.objective, 77.5);
}

#[test]
fn client_without_quota_adds_nothing_to_the_objective() {
    let clients = vec![
        Client::new("A").with_quota(0).with_cost("S1", 10.0),
        Client::new("B").with_quota(1).with_cost("S1", 5.0),
    ];
    let catalog = vec![Slot::new("S1", monday(), 1.0)];

    let outcome = search_with(&catalog, &[], &clients, &SearchOptions::default()).unwrap();

    assert_eq!(outcome.assignments, vec![Assignment::new("S1", "B")]);
    assert_eq!(outcome.objective, 2.5);
}

#[test]
fn fully_fixed_round_proposes_nothing() {
    let clients = vec![
        Client::new("A").with_quota(1).with_cost("S1", 10.0),
        Client::new("B").with_quota(3).with_cost("S1", 0.0),
    ];
    let catalog = vec![Slot::new("S1", monday(), 1.0)];

    let proposed = search(&catalog, &[Assignment::new("S1", "A")], &clients).unwrap();

    assert!(proposed.is_empty());
}

#[test]
fn committed_cost_is_added_to_the_score() {
    let catalog = vec![Slot::new("S1", monday(), 1.0)];
    let clients = vec![Client::new("C").with_score(40.0).with_quota(1).with_cost("S1", 12.0)];
    let fixed = vec![Assignment::new("S1", "C")];

    let score = recompute_score(&catalog, &fixed, &clients, &ClientId::from("C")).unwrap();

    assert_eq!(score, Some(52.0));
}

#[test]
fn overdue_score_is_divided_by_the_factor() {
    let now = monday();
    let clients = vec![Client::new("D").with_score(100.0).with_last_decay(now - Duration::days(8))];
    let scheduler = Scheduler::new(SearchOptions::default(), DecayPolicy::default());

    let decayed = scheduler.apply_decay(&clients, now);

    assert_eq!(decayed[0].score, 40.0);
    assert_eq!(decayed[0].last_decay, Some(now));
}

#[test]
fn decay_twice_in_one_window_changes_nothing() {
    let now = monday();
    let scheduler = Scheduler::default();
    let clients = vec![
        Client::new("a").with_score(90.0).with_last_decay(now - Duration::days(30)),
        Client::new("b").with_score(12.0).with_last_decay(now - Duration::days(2)),
        Client::new("c").with_score(7.0),
    ];

    let once = scheduler.apply_decay(&clients, now);
    let twice = scheduler.apply_decay(&once, now);

    assert_eq!(once, twice);
    assert_eq!(once[0].score, 36.0);
    assert_eq!(once[1].score, 12.0);
    assert_eq!(once[2].score, 7.0);
}

#[test]
fn proposals_respect_booking_quota_and_availability() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let snapshot = random_snapshot(&mut rng);
        let proposed = search(&snapshot.slots, &snapshot.fixed, &snapshot.clients).unwrap();

        let mut seen = HashSet::new();
        let mut per_client: HashMap<&ClientId, u32> = HashMap::new();
        for assignment in &proposed {
            assert!(seen.insert(&assignment.slot_id), "slot booked twice: {}", assignment.slot_id);
            let client = snapshot.client(&assignment.client_id).unwrap();
            assert!(client.cost_for(&assignment.slot_id).is_some());
            *per_client.entry(&assignment.client_id).or_default() += 1;
        }
        for (id, count) in per_client {
            assert!(count <= snapshot.client(id).unwrap().requested_quota);
        }

        assert!(evaluate(&snapshot.clients, &proposed) <= baseline(&snapshot.clients));
    }
}

#[test]
fn fixed_slots_are_never_proposed() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..100 {
        let mut snapshot = random_snapshot(&mut rng);
        let ids: Vec<_> = snapshot.slots.iter().map(|s| s.id.clone()).collect();
        for slot_id in ids.iter().step_by(2) {
            let owner = snapshot.clients[rng.gen_range(0..snapshot.clients.len())].id.clone();
            snapshot.fixed.push(Assignment {
                slot_id: slot_id.clone(),
                client_id: owner,
            });
        }

        let proposed = search(&snapshot.slots, &snapshot.fixed, &snapshot.clients).unwrap();

        for assignment in &proposed {
            assert!(snapshot.fixed_client(&assignment.slot_id).is_none());
        }
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let mut rng = StdRng::seed_from_u64(3);
    let snapshot = random_snapshot(&mut rng);
    let scheduler = Scheduler::default();

    let first = scheduler.plan(&snapshot).unwrap();
    let second = scheduler.plan(&snapshot).unwrap();

    assert_eq!(first, second);
}

#[test]
fn pruned_search_matches_exhaustive_search() {
    let mut rng = StdRng::seed_from_u64(2026);
    let exhaustive = SearchOptions {
        strategy: SearchStrategy::Exhaustive,
        ..SearchOptions::default()
    };
    let pruned = SearchOptions {
        strategy: SearchStrategy::BranchAndBound,
        ..SearchOptions::default()
    };

    for _ in 0..300 {
        let snapshot = random_snapshot(&mut rng);

        let full = search_with(&snapshot.slots, &snapshot.fixed, &snapshot.clients, &exhaustive).unwrap();
        let fast = search_with(&snapshot.slots, &snapshot.fixed, &snapshot.clients, &pruned).unwrap();

        assert_eq!(full.assignments, fast.assignments);
        assert_eq!(full.objective, fast.objective);
        assert!(fast.nodes_visited <= full.nodes_visited);
    }
}

#[test]
fn commit_then_plan_then_release_round_trip() {
    let scheduler = Scheduler::default();
    let mut snapshot = PlanningSnapshot::new(
        slots(2),
        Vec::new(),
        vec![
            Client::new("a").with_quota(1).with_cost("s1", 20.0).with_cost("s2", 30.0),
            Client::new("b").with_quota(1).with_cost("s1", 10.0),
        ],
    );

    let first = scheduler.plan(&snapshot).unwrap().assignments;
    assert_eq!(first, vec![Assignment::new("s1", "b"), Assignment::new("s2", "a")]);

    for assignment in &first {
        scheduler
            .commit(&mut snapshot, &assignment.slot_id, &assignment.client_id)
            .unwrap();
    }
    assert!(scheduler.plan(&snapshot).unwrap().assignments.is_empty());
    assert_eq!(snapshot.client(&ClientId::from("a")).unwrap().score, 30.0);
    assert_eq!(snapshot.client(&ClientId::from("b")).unwrap().score, 10.0);

    scheduler.release(&mut snapshot, &first[1].slot_id).unwrap();
    assert_eq!(snapshot.client(&ClientId::from("a")).unwrap().requested_quota, 1);
    assert_eq!(scheduler.plan(&snapshot).unwrap().assignments, vec![Assignment::new("s2", "a")]);
}

#[test]
fn several_commits_for_one_client_keep_score_and_quota_in_step() {
    let scheduler = Scheduler::default();
    let mut snapshot = PlanningSnapshot::new(
        slots(4),
        Vec::new(),
        vec![Client::new("c")
            .with_quota(3)
            .with_missing_penalty(100.0)
            .with_cost("s1", 10.0)
            .with_cost("s2", 20.0)
            .with_cost("s3", 30.0)
            .with_cost("s4", 5.0)],
    );
    let c = ClientId::from("c");
    let held = |snapshot: &PlanningSnapshot| snapshot.fixed.iter().filter(|a| a.client_id == c).count() as u32;

    for (slot, score, remaining) in [("s1", 210.0, 2), ("s2", 330.0, 1), ("s3", 360.0, 0)] {
        let commitment = scheduler.commit(&mut snapshot, &slot.into(), &c).unwrap();
        assert_eq!(commitment.score, score, "score after committing {slot}");
        assert_eq!(commitment.remaining_quota, remaining, "quota after committing {slot}");
        assert_eq!(commitment.remaining_quota + held(&snapshot), 3);
    }

    let before = snapshot.clone();
    let err = scheduler.commit(&mut snapshot, &"s4".into(), &c).unwrap_err();
    assert!(matches!(err, PlannerError::QuotaExhausted(_)));
    assert_eq!(snapshot, before);

    scheduler.release(&mut snapshot, &"s2".into()).unwrap();
    let client = snapshot.client(&c).unwrap();
    assert_eq!((client.score, client.requested_quota), (360.0, 1));
    assert_eq!(client.requested_quota + held(&snapshot), 3);

    let commitment = scheduler.commit(&mut snapshot, &"s4".into(), &c).unwrap();
    assert_eq!((commitment.score, commitment.remaining_quota), (365.0, 0));
    assert_eq!(held(&snapshot), 3);
}

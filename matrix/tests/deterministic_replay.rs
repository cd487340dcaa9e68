use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use bubble_burst_core::{BubbleId, BubbleKind, GridCoord, MatrixEvent, TaskKind};
use bubble_burst_matrix::{query, BubbleMatrix};

#[test]
fn equal_seeds_replay_to_identical_outcomes() {
    let first = replay(0x4d59_5df4_d0f3_3173);
    let second = replay(0x4d59_5df4_d0f3_3173);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn different_seeds_produce_different_boards() {
    assert_ne!(
        board_kinds(1),
        board_kinds(2),
        "distinct seeds should not reproduce the same board"
    );
}

#[test]
fn population_draws_more_than_one_kind() {
    let kinds = board_kinds(0x5eed);
    let first = kinds[0];
    assert!(
        kinds.iter().any(|&kind| kind != first),
        "a 6x6 board should mix bubble kinds"
    );
}

fn board_kinds(seed: u64) -> Vec<BubbleKind> {
    let mut matrix = BubbleMatrix::with_seed(seed);
    matrix.set_dimensions(6, 6).expect("dimensions");
    matrix.start_new_game();
    query::bubble_view(&matrix)
        .iter()
        .map(|snapshot| snapshot.kind)
        .collect()
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut matrix = BubbleMatrix::with_seed(seed);
    matrix.set_dimensions(6, 6).expect("dimensions");
    matrix.start_new_game();

    let mut log = Vec::new();
    for coord in [
        GridCoord::new(5, 5),
        GridCoord::new(5, 0),
        GridCoord::new(0, 5),
    ] {
        let origin = query::bubble_at(&matrix, coord);
        let mut events = Vec::new();
        matrix
            .burst_bubble_group(origin, &mut events)
            .expect("burst while idle");
        drain(&mut matrix, events, &mut log);
    }

    let bubbles = query::bubble_view(&matrix)
        .into_vec()
        .into_iter()
        .map(BubbleState::from)
        .collect();
    ReplayOutcome { bubbles, log }
}

fn drain(matrix: &mut BubbleMatrix, events: Vec<MatrixEvent>, log: &mut Vec<TaskRecord>) {
    let mut pending = events;
    while !pending.is_empty() {
        for event in std::mem::take(&mut pending) {
            if event != MatrixEvent::TasksAvailable {
                continue;
            }
            while let Some(mut task) = matrix.next_pending_task() {
                let bubbles = matrix.activate_task(&mut task);
                log.push(TaskRecord {
                    kind: task.kind(),
                    bubbles,
                });
                matrix.complete_task(task, &mut pending);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    bubbles: Vec<BubbleState>,
    log: Vec<TaskRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TaskRecord {
    kind: TaskKind,
    bubbles: Vec<BubbleId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BubbleState {
    id: BubbleId,
    kind: BubbleKind,
    row: u32,
    column: u32,
}

impl From<bubble_burst_matrix::query::BubbleSnapshot> for BubbleState {
    fn from(snapshot: bubble_burst_matrix::query::BubbleSnapshot) -> Self {
        Self {
            id: snapshot.id,
            kind: snapshot.kind,
            row: snapshot.location.row(),
            column: snapshot.location.column(),
        }
    }
}

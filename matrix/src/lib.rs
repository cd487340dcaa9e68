#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative bubble-matrix state and orchestration for Bubble Burst.
//!
//! The [`BubbleMatrix`] owns every bubble and is the only writer of grid
//! state. Consumers trigger bursts and undos, then drive the published task
//! batches through the pull protocol: dequeue with
//! [`BubbleMatrix::next_pending_task`], read the payload with
//! [`BubbleMatrix::activate_task`] (which performs the task's deferred
//! mutation), run the matching visual transition, and finish with
//! [`BubbleMatrix::complete_task`]. The matrix is busy from the moment the
//! Burst task activates until the closing task of the batch completes; every
//! mutating entry point demands an idle matrix.

use bubble_burst_core::{
    BubbleId, BubbleKind, GridCoord, GridDims, MatrixError, MatrixEvent, TaskKind,
};

mod gravity;
mod grouping;
mod history;
mod population;
mod tasks;

pub use tasks::Task;

use history::LocationHistory;
use population::BubbleFactory;
use tasks::{TaskAction, TaskManager};

const DEFAULT_DIMS: GridDims = GridDims::new(10, 10);
const DEFAULT_RNG_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// A typed token occupying exactly one grid cell.
#[derive(Clone, Debug)]
pub(crate) struct Bubble {
    id: BubbleId,
    kind: BubbleKind,
    history: LocationHistory,
}

impl Bubble {
    pub(crate) fn new(id: BubbleId, kind: BubbleKind, coord: GridCoord) -> Self {
        let mut history = LocationHistory::new();
        history.move_to(coord);
        Self { id, kind, history }
    }

    pub(crate) fn id(&self) -> BubbleId {
        self.id
    }

    pub(crate) fn kind(&self) -> BubbleKind {
        self.kind
    }

    pub(crate) fn location(&self) -> Option<GridCoord> {
        self.history.current()
    }

    pub(crate) fn previous_location(&self) -> Option<GridCoord> {
        self.history.previous()
    }

    pub(crate) fn history_depth(&self) -> usize {
        self.history.depth()
    }
}

/// Dense bubble storage with a cell-occupancy index.
///
/// Holds at most one bubble per cell. All position changes flow through
/// [`Grid::relocate`] and [`Grid::return_to_previous`] so the occupancy index
/// and each bubble's location history never disagree.
#[derive(Debug)]
pub(crate) struct Grid {
    dims: GridDims,
    bubbles: Vec<Bubble>,
    occupancy: Vec<Option<BubbleId>>,
}

impl Grid {
    pub(crate) fn new(dims: GridDims) -> Self {
        let capacity = usize::try_from(dims.cell_count()).unwrap_or(0);
        Self {
            dims,
            bubbles: Vec::new(),
            occupancy: vec![None; capacity],
        }
    }

    pub(crate) fn dims(&self) -> GridDims {
        self.dims
    }

    pub(crate) fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.bubbles.clear();
        self.occupancy.fill(None);
    }

    pub(crate) fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|bubble| bubble.id == id)
    }

    pub(crate) fn location_of(&self, id: BubbleId) -> Option<GridCoord> {
        self.bubble(id).and_then(Bubble::location)
    }

    pub(crate) fn bubble_at(&self, coord: GridCoord) -> Option<BubbleId> {
        self.index(coord)
            .and_then(|index| self.occupancy.get(index).copied().flatten())
    }

    /// Inserts a bubble at its current location.
    pub(crate) fn insert(&mut self, bubble: Bubble) {
        if let Some(coord) = bubble.location() {
            debug_assert!(
                self.bubble_at(coord).is_none(),
                "cell {coord:?} is already occupied"
            );
            self.occupy(bubble.id, coord);
        }
        self.bubbles.push(bubble);
    }

    /// Removes the bubble from the grid, handing back ownership.
    ///
    /// The bubble keeps its location history, so a later re-insert restores
    /// it exactly where it was removed.
    pub(crate) fn remove(&mut self, id: BubbleId) -> Option<Bubble> {
        let position = self.bubbles.iter().position(|bubble| bubble.id == id)?;
        let bubble = self.bubbles.remove(position);
        if let Some(coord) = bubble.location() {
            self.vacate(coord);
        }
        Some(bubble)
    }

    /// Moves the bubble to `coord`, recording the vacated cell in its
    /// history.
    pub(crate) fn relocate(&mut self, id: BubbleId, coord: GridCoord) {
        debug_assert!(
            self.bubble_at(coord).is_none(),
            "cell {coord:?} is already occupied"
        );
        let Some(position) = self.bubbles.iter().position(|bubble| bubble.id == id) else {
            return;
        };
        if let Some(vacated) = self.bubbles[position].location() {
            self.vacate(vacated);
        }
        self.bubbles[position].history.move_to(coord);
        self.occupy(id, coord);
    }

    /// Returns the bubble to its most recent prior location.
    pub(crate) fn return_to_previous(&mut self, id: BubbleId) {
        let Some(position) = self.bubbles.iter().position(|bubble| bubble.id == id) else {
            return;
        };
        if let Some(vacated) = self.bubbles[position].location() {
            self.vacate(vacated);
        }
        self.bubbles[position].history.move_to_previous();
        if let Some(coord) = self.bubbles[position].location() {
            self.occupy(id, coord);
        }
    }

    /// Row indices occupied in the column, ascending.
    pub(crate) fn occupied_rows(&self, column: u32) -> Vec<u32> {
        (0..self.dims.rows())
            .filter(|&row| self.bubble_at(GridCoord::new(row, column)).is_some())
            .collect()
    }

    /// Column indices occupied in the row, ascending.
    pub(crate) fn occupied_columns(&self, row: u32) -> Vec<u32> {
        (0..self.dims.columns())
            .filter(|&column| self.bubble_at(GridCoord::new(row, column)).is_some())
            .collect()
    }

    fn occupy(&mut self, id: BubbleId, coord: GridCoord) {
        if let Some(index) = self.index(coord) {
            if let Some(slot) = self.occupancy.get_mut(index) {
                *slot = Some(id);
            }
        }
    }

    fn vacate(&mut self, coord: GridCoord) {
        if let Some(index) = self.index(coord) {
            if let Some(slot) = self.occupancy.get_mut(index) {
                *slot = None;
            }
        }
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if !self.dims.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.row()).ok()?;
        let column = usize::try_from(coord.column()).ok()?;
        let width = usize::try_from(self.dims.columns()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// The matrix of bubbles and the logic that drives a game to completion.
#[derive(Debug)]
pub struct BubbleMatrix {
    grid: Grid,
    tasks: TaskManager,
    factory: BubbleFactory,
    idle: bool,
    most_popped: u32,
}

impl BubbleMatrix {
    /// Creates a matrix with default dimensions and population seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_RNG_SEED)
    }

    /// Creates a matrix whose population RNG starts from the provided seed.
    ///
    /// Two matrices built from the same seed produce identical boards, which
    /// is what deterministic tests and replays rely on.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            grid: Grid::new(DEFAULT_DIMS),
            tasks: TaskManager::new(),
            factory: BubbleFactory::new(seed),
            idle: true,
            most_popped: 0,
        }
    }

    /// Updates the number of rows and columns the matrix contains.
    ///
    /// Changing dimensions discards any bubbles on the grid. Legal only while
    /// idle; both counts must be at least one.
    pub fn set_dimensions(&mut self, rows: u32, columns: u32) -> Result<(), MatrixError> {
        if !self.idle {
            return Err(MatrixError::NotIdle);
        }
        if rows < 1 || columns < 1 {
            return Err(MatrixError::InvalidDimensions { rows, columns });
        }
        self.grid = Grid::new(GridDims::new(rows, columns));
        Ok(())
    }

    /// Removes all bubbles from the matrix. Legal only while idle.
    pub fn clear_bubbles(&mut self) -> Result<(), MatrixError> {
        if !self.idle {
            return Err(MatrixError::NotIdle);
        }
        self.grid.clear();
        Ok(())
    }

    /// Places a single bubble of the given kind at the coordinate.
    ///
    /// Supports scripted boards next to the random population of
    /// [`BubbleMatrix::start_new_game`]. Legal only while idle.
    pub fn place_bubble(
        &mut self,
        kind: BubbleKind,
        coord: GridCoord,
    ) -> Result<BubbleId, MatrixError> {
        if !self.idle {
            return Err(MatrixError::NotIdle);
        }
        if !self.grid.dims().contains(coord) {
            return Err(MatrixError::OutOfBounds {
                row: coord.row(),
                column: coord.column(),
            });
        }
        if self.grid.bubble_at(coord).is_some() {
            return Err(MatrixError::CellOccupied {
                row: coord.row(),
                column: coord.column(),
            });
        }
        let bubble = self.factory.create(kind, coord);
        let id = bubble.id();
        self.grid.insert(bubble);
        Ok(id)
    }

    /// Begins a new game with a fresh set of bubbles.
    ///
    /// Resets the statistics and the undo history, then repopulates the grid.
    /// The matrix is busy while populating and idle afterwards. Callable in
    /// any state; this is also the recovery path out of a stalled batch.
    pub fn start_new_game(&mut self) {
        self.tasks.reset();
        self.most_popped = 0;
        self.grid.clear();
        self.idle = false;
        self.factory.populate(&mut self.grid);
        self.idle = true;
    }

    /// Bursts the group of same-kind bubbles connected to `origin`.
    ///
    /// An absent origin yields an empty group and is a legal no-op. A
    /// non-empty group publishes the forward task batch and archives it for
    /// undo. Legal only while idle.
    pub fn burst_bubble_group(
        &mut self,
        origin: Option<BubbleId>,
        out: &mut Vec<MatrixEvent>,
    ) -> Result<(), MatrixError> {
        if !self.idle {
            return Err(MatrixError::NotIdle);
        }
        let group = grouping::find_group(&self.grid, origin);
        if group.is_empty() {
            return Ok(());
        }
        self.most_popped = self.most_popped.max(group.len() as u32);
        self.tasks.publish_burst(group, out);
        Ok(())
    }

    /// Reverts the matrix to its state before the most recent burst.
    ///
    /// A no-op when nothing is archived. Legal only while idle.
    pub fn undo(&mut self, out: &mut Vec<MatrixEvent>) -> Result<(), MatrixError> {
        if !self.idle {
            return Err(MatrixError::NotIdle);
        }
        if self.tasks.can_undo() {
            self.tasks.publish_undo(out);
        }
        Ok(())
    }

    /// Dequeues the next pending task, or `None` once the batch is drained.
    pub fn next_pending_task(&mut self) -> Option<Task> {
        self.tasks.next_pending()
    }

    /// Performs the task's deferred mutation and yields the bubbles to
    /// animate, in presentation order.
    ///
    /// The first call mutates the matrix; subsequent calls return the
    /// memoized payload unchanged.
    pub fn activate_task(&mut self, task: &mut Task) -> Vec<BubbleId> {
        if let Some(bubbles) = &task.activated {
            return bubbles.clone();
        }
        let kind = task.kind();
        let bubbles = match &mut task.action {
            TaskAction::Burst { group } => {
                self.idle = false;
                group.clone()
            }
            TaskAction::Settle => {
                let columns = self.burst_columns();
                let moved = gravity::settle_columns(&mut self.grid, &columns);
                if let Some(record) = self.tasks.current_record_mut() {
                    record.moved_down = moved.clone();
                }
                order_by_previous(&self.grid, moved, TaskKind::MoveDown)
            }
            TaskAction::Pack => {
                let moved = gravity::pack_rows_right(&mut self.grid);
                if let Some(record) = self.tasks.current_record_mut() {
                    record.moved_right = moved.clone();
                }
                order_by_previous(&self.grid, moved, TaskKind::MoveRight)
            }
            TaskAction::Return { bubbles } => {
                if kind == TaskKind::MoveRight {
                    self.idle = false;
                }
                let mut keyed: Vec<(BubbleId, GridCoord)> = bubbles
                    .iter()
                    .filter_map(|&id| self.grid.location_of(id).map(|coord| (id, coord)))
                    .collect();
                for &(id, _) in &keyed {
                    self.grid.return_to_previous(id);
                }
                sort_moves(&mut keyed, kind);
                keyed.reverse();
                keyed.into_iter().map(|(id, _)| id).collect()
            }
            TaskAction::Restore { bubbles } => {
                let parked = std::mem::take(bubbles);
                let mut ids: Vec<BubbleId> = parked.iter().map(Bubble::id).collect();
                for bubble in parked {
                    self.grid.insert(bubble);
                }
                ids.reverse();
                ids
            }
        };
        task.activated = Some(bubbles.clone());
        bubbles
    }

    /// Runs the task's trailing mutation. Consuming the task makes a second
    /// completion unrepresentable.
    pub fn complete_task(&mut self, mut task: Task, out: &mut Vec<MatrixEvent>) {
        // Completion implies activation; an unread payload still gets its
        // deferred effect before the trailing mutation runs.
        if task.activated.is_none() {
            let _ = self.activate_task(&mut task);
        }
        match (task.kind(), task.is_undo()) {
            (TaskKind::Burst, false) => {
                if let TaskAction::Burst { group } = task.action {
                    for id in group {
                        if let Some(bubble) = self.grid.remove(id) {
                            if let Some(record) = self.tasks.current_record_mut() {
                                record.removed.push(bubble);
                            }
                        }
                    }
                }
            }
            (TaskKind::MoveDown, _) | (TaskKind::MoveRight, true) => {}
            (TaskKind::MoveRight, false) => {
                self.idle = true;
                self.check_game_ended(out);
            }
            (TaskKind::Burst, true) => {
                self.idle = true;
            }
        }
    }

    /// Distinct columns the archived burst vacated.
    fn burst_columns(&self) -> Vec<u32> {
        let Some(record) = self.tasks.current_record() else {
            return Vec::new();
        };
        let mut columns: Vec<u32> = record
            .removed
            .iter()
            .filter_map(Bubble::location)
            .map(|coord| coord.column())
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    fn check_game_ended(&self, out: &mut Vec<MatrixEvent>) {
        let ended = self
            .grid
            .iter()
            .all(|bubble| grouping::find_group(&self.grid, Some(bubble.id())).len() <= 1);
        if ended {
            out.push(MatrixEvent::GameEnded);
        }
    }
}

impl Default for BubbleMatrix {
    fn default() -> Self {
        Self::new()
    }
}

fn order_by_previous(grid: &Grid, moved: Vec<BubbleId>, kind: TaskKind) -> Vec<BubbleId> {
    let mut keyed: Vec<(BubbleId, GridCoord)> = moved
        .into_iter()
        .map(|id| {
            let coord = grid
                .bubble(id)
                .and_then(Bubble::previous_location)
                .unwrap_or(GridCoord::new(0, 0));
            (id, coord)
        })
        .collect();
    sort_moves(&mut keyed, kind);
    keyed.into_iter().map(|(id, _)| id).collect()
}

/// Applies the presentation ordering contract for move tasks: vertical moves
/// animate bottom row first with columns left to right, horizontal moves
/// animate the rightmost column first with rows bottom to top.
fn sort_moves(keyed: &mut [(BubbleId, GridCoord)], kind: TaskKind) {
    match kind {
        TaskKind::MoveDown => keyed.sort_by(|(_, a), (_, b)| {
            b.row().cmp(&a.row()).then(a.column().cmp(&b.column()))
        }),
        TaskKind::MoveRight => keyed.sort_by(|(_, a), (_, b)| {
            b.column().cmp(&a.column()).then(b.row().cmp(&a.row()))
        }),
        TaskKind::Burst => {}
    }
}

/// Read-only queries over the matrix state.
pub mod query {
    use bubble_burst_core::{BubbleId, BubbleKind, GridCoord};

    use super::{grouping, BubbleMatrix};

    /// Number of bubble rows the matrix contains.
    #[must_use]
    pub fn row_count(matrix: &BubbleMatrix) -> u32 {
        matrix.grid.dims().rows()
    }

    /// Number of bubble columns the matrix contains.
    #[must_use]
    pub fn column_count(matrix: &BubbleMatrix) -> u32 {
        matrix.grid.dims().columns()
    }

    /// Reports whether the matrix will currently accept mutating operations.
    #[must_use]
    pub fn is_idle(matrix: &BubbleMatrix) -> bool {
        matrix.idle
    }

    /// True when an archived burst is available to revert.
    #[must_use]
    pub fn can_undo(matrix: &BubbleMatrix) -> bool {
        matrix.tasks.can_undo()
    }

    /// Number of bubbles still on the grid.
    #[must_use]
    pub fn remaining_bubbles(matrix: &BubbleMatrix) -> usize {
        matrix.grid.len()
    }

    /// Largest group burst at once since the game started.
    #[must_use]
    pub fn most_bubbles_popped_at_once(matrix: &BubbleMatrix) -> u32 {
        matrix.most_popped
    }

    /// The bubble occupying the coordinate, if any.
    #[must_use]
    pub fn bubble_at(matrix: &BubbleMatrix, coord: GridCoord) -> Option<BubbleId> {
        matrix.grid.bubble_at(coord)
    }

    /// The same-kind group connected to `origin`; supports highlighting in
    /// consumers.
    #[must_use]
    pub fn group_at(matrix: &BubbleMatrix, origin: BubbleId) -> Vec<BubbleId> {
        grouping::find_group(&matrix.grid, Some(origin))
    }

    /// Captures a read-only view of every bubble on the grid.
    #[must_use]
    pub fn bubble_view(matrix: &BubbleMatrix) -> BubbleView {
        let mut snapshots: Vec<BubbleSnapshot> = matrix
            .grid
            .iter()
            .filter_map(|bubble| {
                bubble.location().map(|location| BubbleSnapshot {
                    id: bubble.id(),
                    kind: bubble.kind(),
                    location,
                    history_depth: bubble.history_depth(),
                })
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        BubbleView { snapshots }
    }

    /// Read-only snapshot describing all bubbles in the matrix.
    #[derive(Clone, Debug, Default)]
    pub struct BubbleView {
        snapshots: Vec<BubbleSnapshot>,
    }

    impl BubbleView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &BubbleSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<BubbleSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single bubble's state.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct BubbleSnapshot {
        /// Unique identifier assigned to the bubble.
        pub id: BubbleId,
        /// Kind the bubble was created with.
        pub kind: BubbleKind,
        /// Cell the bubble currently occupies.
        pub location: GridCoord,
        /// Number of prior locations recorded in the bubble's history.
        pub history_depth: usize,
    }
}

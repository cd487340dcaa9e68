//! Task construction, the pending queue, and the undo archive.

use std::collections::VecDeque;

use bubble_burst_core::{BubbleId, MatrixEvent, TaskKind};

use crate::Bubble;

/// One discrete, independently animatable state transition.
///
/// A task's effect on the matrix is deferred: nothing happens until the
/// consumer activates it through [`BubbleMatrix::activate_task`], which
/// mutates engine state exactly once and yields the ordered bubble list to
/// animate. Activation is memoized, so reading the payload twice is safe.
/// The trailing mutation runs when the consumer hands the task back to
/// [`BubbleMatrix::complete_task`]; completion consumes the task, so it
/// cannot run twice.
///
/// [`BubbleMatrix::activate_task`]: crate::BubbleMatrix::activate_task
/// [`BubbleMatrix::complete_task`]: crate::BubbleMatrix::complete_task
#[derive(Debug)]
pub struct Task {
    kind: TaskKind,
    is_undo: bool,
    pub(crate) action: TaskAction,
    pub(crate) activated: Option<Vec<BubbleId>>,
}

impl Task {
    pub(crate) fn new(kind: TaskKind, is_undo: bool, action: TaskAction) -> Self {
        Self {
            kind,
            is_undo,
            action,
            activated: None,
        }
    }

    /// The state transition this task performs.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Reports whether this task belongs to an undo batch.
    #[must_use]
    pub fn is_undo(&self) -> bool {
        self.is_undo
    }

    /// The memoized payload, available once the task has been activated.
    #[must_use]
    pub fn bubbles(&self) -> Option<&[BubbleId]> {
        self.activated.as_deref()
    }
}

/// What activating a task does to the matrix.
#[derive(Debug)]
pub(crate) enum TaskAction {
    /// Forward burst: flips the matrix to busy and yields the group; the
    /// group leaves the grid at completion.
    Burst { group: Vec<BubbleId> },
    /// Forward vertical collapse over the columns the burst vacated.
    Settle,
    /// Forward right compaction of partially filled rows.
    Pack,
    /// Undo of a move task: every listed bubble returns to its previous
    /// location.
    Return { bubbles: Vec<BubbleId> },
    /// Undo of a burst: the parked bubbles rejoin the grid with their
    /// identity and history intact.
    Restore { bubbles: Vec<Bubble> },
}

/// Archive entry for one forward burst, accumulated as its tasks execute.
///
/// The group is known at publish time; the removed bubbles are parked here at
/// Burst completion, and the gravity phases record which bubbles they moved
/// at activation. By the time an undo pops the record, it holds everything
/// the inverse batch needs.
#[derive(Debug, Default)]
pub(crate) struct BatchRecord {
    pub(crate) removed: Vec<Bubble>,
    pub(crate) moved_down: Vec<BubbleId>,
    pub(crate) moved_right: Vec<BubbleId>,
}

/// Builds the forward three-task batch for a burst group.
fn forward_tasks(group: Vec<BubbleId>) -> [Task; 3] {
    [
        Task::new(TaskKind::Burst, false, TaskAction::Burst { group }),
        Task::new(TaskKind::MoveDown, false, TaskAction::Settle),
        Task::new(TaskKind::MoveRight, false, TaskAction::Pack),
    ]
}

/// Builds the inverse batch for a popped archive record, in reverse task
/// order.
fn undo_tasks(record: BatchRecord) -> [Task; 3] {
    [
        Task::new(
            TaskKind::MoveRight,
            true,
            TaskAction::Return {
                bubbles: record.moved_right,
            },
        ),
        Task::new(
            TaskKind::MoveDown,
            true,
            TaskAction::Return {
                bubbles: record.moved_down,
            },
        ),
        Task::new(
            TaskKind::Burst,
            true,
            TaskAction::Restore {
                bubbles: record.removed,
            },
        ),
    ]
}

/// Owns the pending-task queue and the undo archive.
///
/// Publishing is the only way tasks enter the queue, and every publish emits
/// exactly one [`MatrixEvent::TasksAvailable`] notification. Consumers drain
/// with [`TaskManager::next_pending`] until it returns `None`; the manager
/// never computes new tasks on its own.
#[derive(Debug, Default)]
pub(crate) struct TaskManager {
    pending: VecDeque<Task>,
    undo_stack: Vec<BatchRecord>,
}

impl TaskManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// True when at least one burst batch is archived.
    #[must_use]
    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Dequeues the next pending task, if any.
    pub(crate) fn next_pending(&mut self) -> Option<Task> {
        self.pending.pop_front()
    }

    /// The archive record of the batch currently in flight.
    pub(crate) fn current_record(&self) -> Option<&BatchRecord> {
        self.undo_stack.last()
    }

    /// Mutable access to the archive record of the batch currently in
    /// flight.
    pub(crate) fn current_record_mut(&mut self) -> Option<&mut BatchRecord> {
        self.undo_stack.last_mut()
    }

    /// Archives a new record for the group and enqueues its forward batch.
    pub(crate) fn publish_burst(&mut self, group: Vec<BubbleId>, out: &mut Vec<MatrixEvent>) {
        self.undo_stack.push(BatchRecord::default());
        self.enqueue(forward_tasks(group), out);
    }

    /// Pops the most recent record and enqueues its inverse batch.
    ///
    /// The inverse batch is not re-archived: undoing an undo is not a thing.
    pub(crate) fn publish_undo(&mut self, out: &mut Vec<MatrixEvent>) {
        if let Some(record) = self.undo_stack.pop() {
            self.enqueue(undo_tasks(record), out);
        }
    }

    /// Discards all pending tasks and the entire undo history.
    pub(crate) fn reset(&mut self) {
        self.pending.clear();
        self.undo_stack.clear();
    }

    fn enqueue(&mut self, tasks: [Task; 3], out: &mut Vec<MatrixEvent>) {
        for task in tasks {
            self.pending.push_back(task);
        }
        out.push(MatrixEvent::TasksAvailable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_enqueues_in_task_order_and_notifies_once() {
        let mut manager = TaskManager::new();
        let mut events = Vec::new();

        manager.publish_burst(vec![BubbleId::new(1)], &mut events);

        assert_eq!(events, vec![MatrixEvent::TasksAvailable]);
        let kinds: Vec<_> = std::iter::from_fn(|| manager.next_pending())
            .map(|task| (task.kind(), task.is_undo()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TaskKind::Burst, false),
                (TaskKind::MoveDown, false),
                (TaskKind::MoveRight, false),
            ]
        );
    }

    #[test]
    fn undo_batches_reverse_the_task_order_and_drop_the_record() {
        let mut manager = TaskManager::new();
        let mut events = Vec::new();

        manager.publish_burst(vec![BubbleId::new(1)], &mut events);
        while manager.next_pending().is_some() {}
        assert!(manager.can_undo());

        manager.publish_undo(&mut events);
        assert!(!manager.can_undo(), "undo batches are never re-archived");

        let kinds: Vec<_> = std::iter::from_fn(|| manager.next_pending())
            .map(|task| (task.kind(), task.is_undo()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TaskKind::MoveRight, true),
                (TaskKind::MoveDown, true),
                (TaskKind::Burst, true),
            ]
        );
    }

    #[test]
    fn reset_clears_queue_and_history() {
        let mut manager = TaskManager::new();
        let mut events = Vec::new();

        manager.publish_burst(vec![BubbleId::new(1)], &mut events);
        manager.reset();

        assert!(manager.next_pending().is_none());
        assert!(!manager.can_undo());
    }
}

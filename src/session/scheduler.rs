//! Deferred task queue for the session engine.
//!
//! The engine never sleeps. Delayed work (the pre-check pause, mismatch
//! flip-back, the results signal) is queued here with an absolute deadline
//! and the session generation it belongs to. The owner pops due tasks when
//! the clock says so and drops any task whose generation is no longer
//! current.

use chrono::{DateTime, Utc};

use crate::cards::CardId;

/// Unique identifier for a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Deferred operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Resolve the two face-up cards.
    CheckMatch,
    /// Flip a mismatched pair back and pass the turn.
    ResolveMismatch { first: CardId, second: CardId },
    /// Tell the UI to show results.
    RevealResults,
}

/// A queued task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub due: DateTime<Utc>,
    /// Session generation captured at scheduling time.
    pub generation: u64,
    pub kind: TaskKind,
}

/// Deadline-ordered task queue.
///
/// Tasks with equal deadlines pop in scheduling order.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    next_id: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: DateTime<Utc>, generation: u64, kind: TaskKind) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due,
            generation,
            kind,
        });
        id
    }

    /// Cancel one task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every task matching `pred`, returning how many were removed.
    pub fn cancel_where(&mut self, pred: impl Fn(&ScheduledTask) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !pred(t));
        before - self.tasks.len()
    }

    /// Cancel everything.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<ScheduledTask> {
        let pos = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        Some(self.tasks.remove(pos))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

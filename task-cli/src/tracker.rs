use crate::store::{StoreError, TaskStore};
use crate::task::{Status, TaskList};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, warn};

const SEPARATOR_WIDTH: usize = 30;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot write output")]
    Output(#[from] std::io::Error),
    #[error("no task id left to assign: the highest id is already {}", u32::MAX)]
    IdsExhausted,
}

/// What an operation did. Its `Display` is the line shown to the user.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Outcome {
    Added(u32),
    Listed(usize),
    Updated(u32),
    Deleted(u32),
    MarkedInProgress(u32),
    MarkedDone(u32),
    NotFound(u32),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Added(id) => write!(f, "Task added successfully (ID: {})", id),
            Outcome::Listed(0) => write!(f, "No tasks found"),
            Outcome::Listed(count) => write!(f, "Listed {} tasks", count),
            Outcome::Updated(id) => write!(f, "Updated task Id: {}", id),
            Outcome::Deleted(id) => write!(f, "Deleted task Id: {}", id),
            Outcome::MarkedInProgress(id) => {
                write!(f, "Task ID {} marked as '{}'.", id, Status::InProgress)
            }
            Outcome::MarkedDone(id) => write!(f, "Task ID {} marked as {}", id, Status::Done),
            Outcome::NotFound(id) => write!(f, "Task with ID {} not found", id),
        }
    }
}

type Clock = Box<dyn FnMut() -> DateTime<Utc>>;

/// Runs task operations against a store, one load/save round trip per call,
/// and writes the result for the user to `out`.
pub struct TaskTracker<S, W> {
    store: S,
    out: W,
    clock: Clock,
}

impl<S: TaskStore, W: Write> TaskTracker<S, W> {
    pub fn new(store: S, out: W) -> Self {
        Self::with_clock(store, out, Utc::now)
    }

    pub fn with_clock(
        store: S,
        out: W,
        clock: impl FnMut() -> DateTime<Utc> + 'static,
    ) -> Self {
        Self {
            store,
            out,
            clock: Box::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn add(&mut self, description: String) -> Result<Outcome, TrackerError> {
        let mut tasks = self.load_tasks()?;
        let id = tasks
            .add(description, (self.clock)())
            .ok_or(TrackerError::IdsExhausted)?;
        self.store.save(&tasks)?;
        self.report(Outcome::Added(id))
    }

    pub fn list(&mut self) -> Result<Outcome, TrackerError> {
        let tasks = self.load_tasks()?;
        if tasks.is_empty() {
            return self.report(Outcome::Listed(0));
        }
        for task in tasks.iter() {
            writeln!(self.out, "{}", task)?;
            writeln!(self.out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        }
        let outcome = Outcome::Listed(tasks.len());
        debug!("{}", outcome);
        Ok(outcome)
    }

    pub fn update(&mut self, id: u32, description: String) -> Result<Outcome, TrackerError> {
        self.modify(id, Outcome::Updated(id), |tasks, now| {
            tasks.update_description(id, description, now)
        })
    }

    pub fn delete(&mut self, id: u32) -> Result<Outcome, TrackerError> {
        self.modify(id, Outcome::Deleted(id), |tasks, _| tasks.remove(id).is_some())
    }

    pub fn mark_in_progress(&mut self, id: u32) -> Result<Outcome, TrackerError> {
        self.modify(id, Outcome::MarkedInProgress(id), |tasks, now| {
            tasks.set_status(id, Status::InProgress, now)
        })
    }

    pub fn mark_done(&mut self, id: u32) -> Result<Outcome, TrackerError> {
        self.modify(id, Outcome::MarkedDone(id), |tasks, now| {
            tasks.set_status(id, Status::Done, now)
        })
    }

    /// Applies `change` and saves only when it reports that task `id` was found.
    fn modify<F>(
        &mut self,
        id: u32,
        success: Outcome,
        change: F,
    ) -> Result<Outcome, TrackerError>
    where
        F: FnOnce(&mut TaskList, DateTime<Utc>) -> bool,
    {
        let mut tasks = self.load_tasks()?;
        let now = (self.clock)();
        if change(&mut tasks, now) {
            self.store.save(&tasks)?;
            self.report(success)
        } else {
            self.report(Outcome::NotFound(id))
        }
    }

    // A malformed document is reported and then treated as empty.
    fn load_tasks(&mut self) -> Result<TaskList, TrackerError> {
        match self.store.load() {
            Ok(tasks) => Ok(tasks),
            Err(StoreError::Malformed { source, .. }) => {
                let location = self.store.location().display().to_string();
                warn!("{} is not a task list, starting empty: {}", location, source);
                writeln!(self.out, "Error: '{}' contains invalid JSON", location)?;
                Ok(TaskList::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn report(&mut self, outcome: Outcome) -> Result<Outcome, TrackerError> {
        writeln!(self.out, "{}", outcome)?;
        debug!("{:?}", outcome);
        Ok(outcome)
    }
}

//! A local task tracker that keeps its tasks in a single JSON document.
//!
//! Every operation loads the whole collection, changes it, and writes the whole
//! collection back. Two invocations running at the same time can overwrite each
//! other's changes; the last one to save wins.

pub mod cli;
pub mod settings;
pub mod store;
pub mod task;
pub mod tracker;

pub use settings::Settings;
pub use store::{InMemoryStore, JsonFileStore, StoreError, TaskStore};
pub use task::{Status, Task, TaskList};
pub use tracker::{Outcome, TaskTracker, TrackerError};

use crate::store::TaskStore;
use crate::tracker::{Outcome, TaskTracker, TrackerError};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::io::Write;

pub const USAGE: &str = "Usage: task-cli <command> [options]";
pub const UNKNOWN_COMMAND: &str = "Unknown command";

#[derive(Parser, Debug)]
#[command(name = "task-cli", about = "Task Tracker CLI", version)]
pub struct Cli {
    /// Task file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Add a new task
    Add {
        /// Description of the task
        #[arg(
            short = 'd',
            long,
            value_name = "TEXT",
            default_value = "",
            allow_hyphen_values = true
        )]
        description: String,
    },
    /// List all tasks
    List,
    /// Change the description of a task
    Update {
        #[arg(short = 'n', value_name = "ID", value_parser = task_id())]
        id: u32,
        /// New description
        #[arg(short = 's', value_name = "TEXT", default_value = "", allow_hyphen_values = true)]
        description: String,
    },
    /// Remove a task
    Delete {
        #[arg(short = 'n', value_name = "ID", value_parser = task_id())]
        id: u32,
    },
    /// Mark a task as in progress
    MarkInProgress {
        #[arg(short = 'n', value_name = "ID", value_parser = task_id())]
        id: u32,
    },
    /// Mark a task as done
    MarkDone {
        #[arg(short = 'n', value_name = "ID", value_parser = task_id())]
        id: u32,
    },
}

fn task_id() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..)
}

impl Commands {
    /// Runs the matching task operation.
    pub fn dispatch<S, W>(self, tracker: &mut TaskTracker<S, W>) -> Result<Outcome, TrackerError>
    where
        S: TaskStore,
        W: Write,
    {
        match self {
            Commands::Add { description } => tracker.add(description),
            Commands::List => tracker.list(),
            Commands::Update { id, description } => tracker.update(id, description),
            Commands::Delete { id } => tracker.delete(id),
            Commands::MarkInProgress { id } => tracker.mark_in_progress(id),
            Commands::MarkDone { id } => tracker.mark_done(id),
        }
    }
}

// Options whose next argument is their value.
const VALUE_FLAGS: [&str; 6] = ["-n", "-s", "-d", "--description", "-description", "--file"];

/// Accepts the single-dash `-description` spelling by rewriting it to `--description`.
///
/// Arguments that are the value of another option are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut value_expected = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let is_value = std::mem::replace(&mut value_expected, false);
            match arg.to_str() {
                Some(s) if !is_value => {
                    value_expected = VALUE_FLAGS.contains(&s);
                    if s == "-description" || s.starts_with("-description=") {
                        OsString::from(format!("-{}", s))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

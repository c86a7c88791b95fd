use crate::task::TaskList;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot read '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' contains invalid JSON", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot serialize tasks")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write '{}'", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and saves the whole task collection as a single document.
pub trait TaskStore {
    /// Reads the collection. A missing or blank document is an empty collection.
    fn load(&self) -> Result<TaskList, StoreError>;

    /// Replaces the stored document with `tasks`.
    fn save(&mut self, tasks: &TaskList) -> Result<(), StoreError>;

    /// Where the document lives, for messages.
    fn location(&self) -> &Path;
}

fn parse(contents: &str, path: &Path) -> Result<TaskList, StoreError> {
    if contents.trim().is_empty() {
        return Ok(TaskList::new());
    }
    serde_json::from_str(contents).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn render(tasks: &TaskList) -> Result<String, StoreError> {
    let mut contents = serde_json::to_string_pretty(tasks)?;
    contents.push('\n');
    Ok(contents)
}

/// JSON document on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl TaskStore for JsonFileStore {
    fn load(&self) -> Result<TaskList, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                return Ok(TaskList::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let tasks = parse(&contents, &self.path)?;
        debug!("Loaded {} tasks from {}", tasks.len(), self.path.display());
        Ok(tasks)
    }

    fn save(&mut self, tasks: &TaskList) -> Result<(), StoreError> {
        let contents = render(tasks)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Written next to the target and renamed over it, so readers never see a partial file.
        let mut staged = NamedTempFile::new_in(dir).map_err(|err| self.write_error(err))?;
        staged
            .write_all(contents.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|err| self.write_error(err))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;

        debug!("Saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Keeps the serialized document in memory. Goes through the same JSON
/// encoding as [`JsonFileStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    document: Option<String>,
    saves: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
            saves: 0,
        }
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Number of times [`TaskStore::save`] ran.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl TaskStore for InMemoryStore {
    fn load(&self) -> Result<TaskList, StoreError> {
        match &self.document {
            Some(document) => parse(document, self.location()),
            None => Ok(TaskList::new()),
        }
    }

    fn save(&mut self, tasks: &TaskList) -> Result<(), StoreError> {
        self.document = Some(render(tasks)?);
        self.saves += 1;
        Ok(())
    }

    fn location(&self) -> &Path {
        Path::new("<memory>")
    }
}

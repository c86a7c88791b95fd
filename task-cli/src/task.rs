use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: u32,
    description: String,
    status: Status,
    #[serde(deserialize_with = "any_iso_8601")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "any_iso_8601")]
    updated_at: DateTime<Utc>,
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Reads an ISO-8601 timestamp. Timestamps without an offset are local time.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    // skipped local times (DST gaps) fall back to UTC
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc)),
    )
}

fn any_iso_8601<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", value)))
}

#[derive(Debug, Default, Eq, PartialEq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        };
        write!(f, "{}", label)
    }
}

impl Task {
    fn new(id: u32, description: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            description,
            status: Status::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // updated_at never goes below created_at, even if the clock went backwards
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(
            f,
            "Created At: {}",
            self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )?;
        write!(
            f,
            "Updated At: {}",
            self.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )
    }
}

/// The whole task collection, in insertion order.
///
/// Serializes as a bare JSON array of tasks.
#[derive(Debug, Default, Eq, PartialEq, Serialize, Deserialize, Clone)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Id the next added task will get: one past the highest id still present, or 1.
    ///
    /// `None` once the highest id is `u32::MAX`.
    pub fn next_id(&self) -> Option<u32> {
        match self.tasks.iter().map(|task| task.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// Appends a new task and returns its id, or `None` when no id is left.
    pub fn add(&mut self, description: String, now: DateTime<Utc>) -> Option<u32> {
        let id = self.next_id()?;
        self.tasks.push(Task::new(id, description, now));
        Some(id)
    }

    pub fn find(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn find_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Replaces the description of task `id`. Returns `false` when no such task exists.
    pub fn update_description(
        &mut self,
        id: u32,
        description: String,
        now: DateTime<Utc>,
    ) -> bool {
        match self.find_mut(id) {
            Some(task) => {
                task.description = description;
                task.touch(now);
                true
            }
            None => false,
        }
    }

    /// Moves task `id` to `status`. Returns `false` when no such task exists.
    pub fn set_status(&mut self, id: u32, status: Status, now: DateTime<Utc>) -> bool {
        match self.find_mut(id) {
            Some(task) => {
                task.status = status;
                task.touch(now);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: u32) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_add_task() {
        // Arrange
        let mut list = TaskList::new();

        // Act
        let id = list.add("Test task".to_string(), at(0)).unwrap();

        // Assert
        assert_eq!(id, 1);
        assert_eq!(list.len(), 1);
        let task = list.find(1).unwrap();
        assert_eq!(task.description(), "Test task");
        assert_eq!(task.status(), Status::Todo);
        assert_eq!(task.created_at(), at(0));
        assert_eq!(task.updated_at(), at(0));
    }

    #[test]
    fn test_add_accepts_empty_description() {
        let mut list = TaskList::new();

        let id = list.add(String::new(), at(0)).unwrap();

        assert_eq!(list.find(id).unwrap().description(), "");
    }

    #[test]
    fn test_update_description_keeps_created_at() {
        // Arrange
        let mut list = TaskList::new();
        let id = list.add("Old".to_string(), at(0)).unwrap();

        // Act
        let updated = list.update_description(id, "New".to_string(), at(10));

        // Assert
        assert!(updated);
        let task = list.find(id).unwrap();
        assert_eq!(task.description(), "New");
        assert_eq!(task.created_at(), at(0));
        assert_eq!(task.updated_at(), at(10));
    }

    #[test]
    fn test_update_missing_task_changes_nothing() {
        let mut list = TaskList::new();
        list.add("Only".to_string(), at(0));
        let before = list.clone();

        let updated = list.update_description(7, "Nope".to_string(), at(10));

        assert!(!updated);
        assert_eq!(list, before);
    }

    #[test]
    fn test_set_status_transitions() {
        // Arrange
        let mut list = TaskList::new();
        let id = list.add("Task".to_string(), at(0)).unwrap();

        // Act
        assert!(list.set_status(id, Status::InProgress, at(5)));
        let in_progress = list.find(id).unwrap().clone();
        assert!(list.set_status(id, Status::Done, at(9)));

        // Assert
        assert_eq!(in_progress.status(), Status::InProgress);
        assert_eq!(in_progress.updated_at(), at(5));
        let done = list.find(id).unwrap();
        assert_eq!(done.status(), Status::Done);
        assert_eq!(done.created_at(), at(0));
        assert_eq!(done.updated_at(), at(9));
    }

    #[test]
    fn test_set_status_on_missing_task() {
        let mut list = TaskList::new();

        assert!(!list.set_status(1, Status::Done, at(0)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_updated_at_never_precedes_created_at() {
        let mut list = TaskList::new();
        let id = list.add("Task".to_string(), at(100)).unwrap();

        list.set_status(id, Status::Done, at(100) - Duration::seconds(30));

        let task = list.find(id).unwrap();
        assert_eq!(task.updated_at(), task.created_at());
    }

    #[test]
    fn test_remove_task() {
        let mut list = TaskList::new();
        list.add("Task 1".to_string(), at(0));
        list.add("Task 2".to_string(), at(1));

        let removed = list.remove(1).unwrap();

        assert_eq!(removed.id(), 1);
        assert_eq!(list.len(), 1);
        assert!(list.find(1).is_none());
        assert!(list.remove(1).is_none());
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut list = TaskList::new();
        list.add("a".to_string(), at(0));
        list.add("b".to_string(), at(1));
        list.add("c".to_string(), at(2));
        list.remove(2);

        let descriptions: Vec<&str> = list.iter().map(Task::description).collect();

        assert_eq!(descriptions, vec!["a", "c"]);
    }

    #[test]
    fn test_status_serializes_as_kebab_case() {
        assert_eq!(serde_json::to_string(&Status::Todo).unwrap(), r#""todo""#);
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            r#""in-progress""#
        );
        assert_eq!(serde_json::to_string(&Status::Done).unwrap(), r#""done""#);
    }

    #[test]
    fn test_task_list_deserializes_from_json_array() {
        // Arrange
        let json = r#"
        [
            {
                "id": 4,
                "description": "Task 4",
                "status": "in-progress",
                "createdAt": "2023-01-01T00:00:00Z",
                "updatedAt": "2023-01-02T00:00:00Z"
            }
        ]
        "#;

        // Act
        let list: TaskList = serde_json::from_str(json).unwrap();

        // Assert
        let task = list.find(4).unwrap();
        assert_eq!(task.status(), Status::InProgress);
        assert_eq!(task.description(), "Task 4");
        assert_eq!(
            task.created_at(),
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(list.next_id(), Some(5));
    }

    #[test]
    fn test_naive_timestamps_load_as_local_time() {
        // Arrange
        let json = r#"
        [
            {
                "id": 1,
                "description": "keep",
                "status": "todo",
                "createdAt": "2024-05-01T10:20:30.123456",
                "updatedAt": "2024-05-01T10:25:00"
            }
        ]
        "#;
        let local = |s: &str| {
            let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").unwrap();
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map_or_else(|| naive.and_utc(), |t| t.with_timezone(&Utc))
        };

        // Act
        let list: TaskList = serde_json::from_str(json).unwrap();

        // Assert
        let task = list.find(1).unwrap();
        assert_eq!(task.description(), "keep");
        assert_eq!(task.created_at(), local("2024-05-01T10:20:30.123456"));
        assert_eq!(task.updated_at(), local("2024-05-01T10:25:00"));
    }

    #[test]
    fn test_naive_timestamps_are_saved_as_rfc3339() {
        let json = r#"[{"id": 1, "description": "x", "status": "done",
            "createdAt": "2024-05-01 10:20:30", "updatedAt": "2024-05-01 10:20:30"}]"#;
        let list: TaskList = serde_json::from_str(json).unwrap();

        let saved = serde_json::to_value(&list).unwrap();
        let reloaded: TaskList = serde_json::from_value(saved.clone()).unwrap();

        let created = saved[0]["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
        assert_eq!(reloaded, list);
    }

    #[test]
    fn test_offset_timestamps_are_converted_to_utc() {
        assert_eq!(
            parse_timestamp("2024-05-01T12:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let json = r#"[{"id": 1, "description": "x", "status": "todo",
            "createdAt": "yesterday", "updatedAt": "yesterday"}]"#;

        let result = serde_json::from_str::<TaskList>(json);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_task_display() {
        let mut list = TaskList::new();
        list.add("Buy milk".to_string(), at(0));

        let rendered = list.find(1).unwrap().to_string();

        assert_eq!(
            rendered,
            "ID: 1\n\
             Description: Buy milk\n\
             Status: todo\n\
             Created At: 2023-11-14T22:13:20Z\n\
             Updated At: 2023-11-14T22:13:20Z"
        );
    }
}

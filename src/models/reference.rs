use serde::{Deserialize, Serialize};

/// The three lookup tables a task points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTable {
    Priority,
    Difficulty,
    Status,
}

impl ReferenceTable {
    pub const ALL: [ReferenceTable; 3] = [
        ReferenceTable::Priority,
        ReferenceTable::Difficulty,
        ReferenceTable::Status,
    ];

    /// Storage name of the table
    pub fn key(&self) -> &'static str {
        match self {
            ReferenceTable::Priority => "priorities",
            ReferenceTable::Difficulty => "difficulties",
            ReferenceTable::Status => "statuses",
        }
    }

    /// Name of the task field that references this table
    pub fn field(&self) -> &'static str {
        match self {
            ReferenceTable::Priority => "priority_id",
            ReferenceTable::Difficulty => "difficulty_id",
            ReferenceTable::Status => "status_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferenceTable::Priority => "Priority",
            ReferenceTable::Difficulty => "Difficulty",
            ReferenceTable::Status => "Status",
        }
    }
}

/// Stored shape shared by all reference tables. Only priorities carry a filepath.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReferenceRow {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Priority {
    pub id: i64,
    pub name: String,
    pub filepath: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Difficulty {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Status {
    pub id: i64,
    pub name: String,
}

impl From<ReferenceRow> for Priority {
    fn from(row: ReferenceRow) -> Self {
        Self { id: row.id, name: row.name, filepath: row.filepath }
    }
}

impl From<ReferenceRow> for Difficulty {
    fn from(row: ReferenceRow) -> Self {
        Self { id: row.id, name: row.name }
    }
}

impl From<ReferenceRow> for Status {
    fn from(row: ReferenceRow) -> Self {
        Self { id: row.id, name: row.name }
    }
}

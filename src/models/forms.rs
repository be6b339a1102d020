use serde::{Deserialize, Deserializer};
use crate::errors::{AppError, AppResult};
use super::task::TaskFilter;

// Fields are optional so a missing field is reported by name instead of as a
// generic body rejection.
#[derive(Debug, Deserialize, Default)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CreateTaskForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority_id: Option<i64>,
    pub difficulty_id: Option<i64>,
    pub status_id: Option<i64>,
    pub deadline: Option<String>,
}

/// Partial update. The outer `Option` says whether the key was sent at all,
/// the inner one whether it was `null`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdateTaskForm {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub priority_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub difficulty_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub status_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Raw `/tasks` query string. Values that are not integers are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct TaskQuery {
    pub priority_id: Option<String>,
    pub difficulty_id: Option<String>,
    pub val: Option<String>,
    pub user_id: Option<String>,
}

impl TaskQuery {
    pub fn into_filter(self) -> TaskFilter {
        // Zero means "any"
        fn id(raw: Option<String>) -> Option<i64> {
            raw.and_then(|value| value.trim().parse::<i64>().ok())
                .filter(|id| *id != 0)
        }

        TaskFilter {
            priority_id: id(self.priority_id),
            difficulty_id: id(self.difficulty_id),
            text: self.val,
            user_id: id(self.user_id),
        }
    }
}

/// Takes a required text field, treating absent and empty alike.
pub(crate) fn require_text(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::missing_field(field)),
    }
}

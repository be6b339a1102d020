use serde::{Deserialize, Serialize, Serializer};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crate::errors::{AppError, AppResult};
use super::reference::{Difficulty, Priority, Status};
use super::user::UserSummary;

// Responses always carry the deadline as a calendar date
const DATE_FORMAT: &str = "%Y-%m-%d";

// Accepted request formats beyond a bare date, tried in order
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub deadline: NaiveDateTime,
    pub priority_id: i64,
    pub difficulty_id: i64,
    pub status_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub deadline: NaiveDateTime,
    pub priority_id: i64,
    pub difficulty_id: i64,
    pub status_id: i64,
    pub user_id: i64,
}

impl NewTask {
    pub fn with_id(self, id: i64) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            deadline: self.deadline,
            priority_id: self.priority_id,
            difficulty_id: self.difficulty_id,
            status_id: self.status_id,
            user_id: self.user_id,
        }
    }
}

/// A task with its related rows embedded, as returned to clients.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExpandedTask {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "serialize_date")]
    pub deadline: NaiveDateTime,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub status: Status,
    pub user: UserSummary,
}

fn serialize_date<S: Serializer>(deadline: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&deadline.format(DATE_FORMAT))
}

/// Conjunction of optional task filters. `None` leaves the field unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub priority_id: Option<i64>,
    pub difficulty_id: Option<i64>,
    pub text: Option<String>,
    pub user_id: Option<i64>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        fn same(filter: Option<i64>, value: i64) -> bool {
            filter.map_or(true, |id| id == value)
        }

        same(self.priority_id, task.priority_id)
            && same(self.difficulty_id, task.difficulty_id)
            && same(self.user_id, task.user_id)
            && self.text.as_deref().map_or(true, |needle| {
                let needle = needle.to_ascii_lowercase();
                contains_folded(&task.title, &needle) || contains_folded(&task.description, &needle)
            })
    }
}

// ASCII letters compare case-insensitively; `%` and `_` are plain characters.
fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(folded_needle)
}

/// Parses an ISO-8601 style deadline. A bare date means midnight; an explicit
/// offset is dropped and its local wall-clock time kept.
pub fn parse_deadline(input: &str) -> AppResult<NaiveDateTime> {
    let value = input.trim();
    let invalid = || AppError::Validation(format!("Invalid deadline format: '{}'", input));

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0).ok_or_else(invalid);
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.naive_local())
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};

    fn task(id: i64, title: &str, description: &str, priority_id: i64, difficulty_id: i64) -> Task {
        Task {
            id,
            title: title.into(),
            description: description.into(),
            deadline: parse_deadline("2024-01-15").unwrap(),
            priority_id,
            difficulty_id,
            status_id: 1,
            user_id: 1,
        }
    }

    #[test]
    fn bare_date_is_midnight() {
        let deadline = parse_deadline("2024-01-15").unwrap();
        assert_eq!(deadline.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(deadline.time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn accepts_time_of_day_variants() {
        assert_eq!(parse_deadline("2024-01-15T10:30").unwrap().hour(), 10);
        assert_eq!(parse_deadline("2024-01-15T10:30:45").unwrap().second(), 45);
        assert_eq!(parse_deadline("2024-01-15 10:30:45.250").unwrap().minute(), 30);
        // Offset is dropped, wall clock kept
        assert_eq!(parse_deadline("2024-01-15T23:00:00+05:00").unwrap().hour(), 23);
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "tomorrow", "2024-13-01", "15/01/2024", "2024-01-15Tnoon"] {
            let err = parse_deadline(input).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{input:?} should be rejected");
        }
    }

    #[test]
    fn deadline_serializes_as_date() {
        let expanded = ExpandedTask {
            id: 1,
            title: "t".into(),
            description: String::new(),
            deadline: parse_deadline("2024-01-15T18:45:00").unwrap(),
            priority: Priority { id: 1, name: "Low".into(), filepath: None },
            difficulty: Difficulty { id: 1, name: "Easy".into() },
            status: Status { id: 1, name: "To Do".into() },
            user: UserSummary { id: 1, username: "ada".into() },
        };
        let json = serde_json::to_value(&expanded).unwrap();
        assert_eq!(json["deadline"], "2024-01-15");
        assert_eq!(json["user"], serde_json::json!({ "id": 1, "username": "ada" }));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TaskFilter::default();
        assert!(filter.matches(&task(1, "a", "", 1, 1)));
        assert!(filter.matches(&task(2, "b", "c", 3, 2)));
    }

    #[test]
    fn id_filters_are_anded() {
        let filter = TaskFilter { priority_id: Some(2), difficulty_id: Some(3), ..Default::default() };
        assert!(filter.matches(&task(1, "a", "", 2, 3)));
        assert!(!filter.matches(&task(2, "a", "", 2, 1)));
        assert!(!filter.matches(&task(3, "a", "", 1, 3)));
    }

    #[test]
    fn text_matches_title_or_description() {
        let filter = TaskFilter { text: Some("abc".into()), ..Default::default() };
        assert!(filter.matches(&task(1, "xabcx", "", 1, 1)));
        assert!(filter.matches(&task(2, "nothing", "has abc inside", 1, 1)));
        assert!(!filter.matches(&task(3, "ab", "c", 1, 1)));
    }

    #[test]
    fn text_ignores_ascii_case() {
        let filter = TaskFilter { text: Some("milk".into()), ..Default::default() };
        assert!(filter.matches(&task(1, "Buy Milk", "", 1, 1)));
        assert!(filter.matches(&task(2, "groceries", "MILK and eggs", 1, 1)));

        let shouting = TaskFilter { text: Some("MiLk".into()), ..Default::default() };
        assert!(shouting.matches(&task(3, "buy milk", "", 1, 1)));
    }

    #[test]
    fn wildcard_characters_are_literal() {
        let percent = TaskFilter { text: Some("50%".into()), ..Default::default() };
        assert!(percent.matches(&task(1, "save 50% more", "", 1, 1)));
        assert!(!percent.matches(&task(2, "save 500 more", "", 1, 1)));

        let underscore = TaskFilter { text: Some("a_c".into()), ..Default::default() };
        assert!(!underscore.matches(&task(3, "abc", "", 1, 1)));
        assert!(underscore.matches(&task(4, "a_c", "", 1, 1)));
    }

    #[test]
    fn empty_text_matches_everything() {
        let filter = TaskFilter { text: Some(String::new()), ..Default::default() };
        assert!(filter.matches(&task(1, "a", "", 1, 1)));
    }
}

use async_trait::async_trait;
use crate::errors::{AppError, AppResult};
use crate::models::{NewTask, NewUser, ReferenceRow, ReferenceTable, Task, User};

/// Persistence seam shared by the services.
///
/// Every write is atomic: it either applies completely or returns an error
/// and leaves the store unchanged. Writes enforce the same rules a relational
/// schema would: `insert_user` fails with `AppError::Conflict` on a taken
/// email or username, and task writes fail with `AppError::Reference` when a
/// referenced row does not exist.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Users for the given ids. Unknown ids are skipped.
    async fn get_users(&self, ids: &[i64]) -> AppResult<Vec<User>>;

    /// All rows of a reference table, ordered by id.
    async fn reference_rows(&self, table: ReferenceTable) -> AppResult<Vec<ReferenceRow>>;

    /// Inserts the rows whose id is not present yet and returns how many were added.
    async fn seed_reference_rows(&self, table: ReferenceTable, rows: &[ReferenceRow]) -> AppResult<usize>;

    async fn insert_task(&self, task: NewTask) -> AppResult<Task>;

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>>;

    /// All tasks, ordered by id.
    async fn list_tasks(&self) -> AppResult<Vec<Task>>;

    /// Replaces a stored task. Fails with `AppError::NotFound` if it was deleted meanwhile.
    async fn update_task(&self, task: &Task) -> AppResult<()>;

    /// Returns false when there was nothing to delete.
    async fn delete_task(&self, id: i64) -> AppResult<bool>;
}

pub(crate) fn missing_reference(table: ReferenceTable, id: i64) -> AppError {
    AppError::Reference(format!("Invalid {}: {} {} does not exist", table.field(), table.label(), id))
}

pub(crate) fn missing_owner(user_id: i64) -> AppError {
    AppError::Reference(format!("Invalid user_id: User {} does not exist", user_id))
}

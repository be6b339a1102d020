use std::collections::HashMap;
use std::sync::Arc;
use crate::errors::{AppError, AppResult};
use crate::models::{
    parse_deadline, require_text, CreateTaskForm, ExpandedTask, Identity, NewTask, ReferenceRow,
    ReferenceTable, Task, TaskFilter, UpdateTaskForm, User, UserSummary,
};
use super::store::Store;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

fn not_null<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("Field {} cannot be null", field)))
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> AppResult<Vec<ExpandedTask>> {
        let tasks: Vec<Task> = self
            .store
            .list_tasks()
            .await?
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect();

        tracing::debug!("{} tasks match {:?}", tasks.len(), filter);
        self.expand(tasks).await
    }

    pub async fn create_task(&self, identity: &Identity, form: CreateTaskForm) -> AppResult<ExpandedTask> {
        let user_id = identity.require_user()?;

        let title = require_text(form.title, "title")?;
        let priority_id = form.priority_id.ok_or_else(|| AppError::missing_field("priority_id"))?;
        let difficulty_id = form.difficulty_id.ok_or_else(|| AppError::missing_field("difficulty_id"))?;
        let status_id = form.status_id.ok_or_else(|| AppError::missing_field("status_id"))?;
        let deadline = form.deadline.ok_or_else(|| AppError::missing_field("deadline"))?;
        let deadline = parse_deadline(&deadline)?;

        let task = self
            .store
            .insert_task(NewTask {
                title,
                description: form.description.unwrap_or_default(),
                deadline,
                priority_id,
                difficulty_id,
                status_id,
                user_id,
            })
            .await?;

        tracing::info!("User {} created task {}", user_id, task.id);
        self.expand_one(task).await
    }

    /// Loads a task the caller may modify: 401 without a user, 404 when the
    /// task is gone, 403 when someone else owns it.
    pub async fn owned_task(&self, identity: &Identity, task_id: i64) -> AppResult<Task> {
        let user_id = identity.require_user()?;

        let task = self.store.get_task(task_id).await?.ok_or_else(task_not_found)?;
        if task.user_id != user_id {
            tracing::warn!("User {} tried to update task {} owned by {}", user_id, task_id, task.user_id);
            return Err(AppError::Forbidden("Unauthorized".into()));
        }
        Ok(task)
    }

    /// Applies a partial update to a task returned by `owned_task`.
    pub async fn apply_update(&self, mut task: Task, form: UpdateTaskForm) -> AppResult<ExpandedTask> {
        // Only keys present in the request change anything
        if let Some(title) = form.title {
            task.title = require_text(title, "title")?;
        }
        if let Some(description) = form.description {
            task.description = description.unwrap_or_default();
        }
        if let Some(priority_id) = form.priority_id {
            task.priority_id = not_null(priority_id, "priority_id")?;
        }
        if let Some(difficulty_id) = form.difficulty_id {
            task.difficulty_id = not_null(difficulty_id, "difficulty_id")?;
        }
        if let Some(status_id) = form.status_id {
            task.status_id = not_null(status_id, "status_id")?;
        }
        if let Some(deadline) = form.deadline {
            task.deadline = parse_deadline(&not_null(deadline, "deadline")?)?;
        }

        self.store.update_task(&task).await?;

        tracing::info!("User {} updated task {}", task.user_id, task.id);
        self.expand_one(task).await
    }

    /// Deletes by id. Performs no ownership check.
    pub async fn delete_task(&self, task_id: i64) -> AppResult<()> {
        if !self.store.delete_task(task_id).await? {
            return Err(task_not_found());
        }
        tracing::info!("Deleted task {}", task_id);
        Ok(())
    }

    async fn expand_one(&self, task: Task) -> AppResult<ExpandedTask> {
        self.expand(vec![task])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Task expansion returned nothing".into()))
    }

    // Loads every related row in one pass per table instead of per task.
    async fn expand(&self, tasks: Vec<Task>) -> AppResult<Vec<ExpandedTask>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let priorities = self.reference_map(ReferenceTable::Priority).await?;
        let difficulties = self.reference_map(ReferenceTable::Difficulty).await?;
        let statuses = self.reference_map(ReferenceTable::Status).await?;

        let mut owner_ids: Vec<i64> = tasks.iter().map(|task| task.user_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();
        let owners: HashMap<i64, User> = self
            .store
            .get_users(&owner_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        tasks
            .into_iter()
            .map(|task| {
                let priority = related(&priorities, ReferenceTable::Priority, task.priority_id, task.id)?;
                let difficulty = related(&difficulties, ReferenceTable::Difficulty, task.difficulty_id, task.id)?;
                let status = related(&statuses, ReferenceTable::Status, task.status_id, task.id)?;
                let owner = owners.get(&task.user_id).ok_or_else(|| {
                    AppError::Internal(format!("User {} referenced by task {} is missing", task.user_id, task.id))
                })?;

                Ok(ExpandedTask {
                    id: task.id,
                    title: task.title,
                    description: task.description,
                    deadline: task.deadline,
                    priority: priority.into(),
                    difficulty: difficulty.into(),
                    status: status.into(),
                    user: UserSummary::from(owner),
                })
            })
            .collect()
    }

    async fn reference_map(&self, table: ReferenceTable) -> AppResult<HashMap<i64, ReferenceRow>> {
        Ok(self
            .store
            .reference_rows(table)
            .await?
            .into_iter()
            .map(|row| (row.id, row))
            .collect())
    }
}

// A dangling reference is a broken store, not a client error.
fn related(
    rows: &HashMap<i64, ReferenceRow>,
    table: ReferenceTable,
    id: i64,
    task_id: i64,
) -> AppResult<ReferenceRow> {
    rows.get(&id).cloned().ok_or_else(|| {
        AppError::Internal(format!("{} {} referenced by task {} is missing", table.label(), id, task_id))
    })
}

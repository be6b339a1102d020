use async_trait::async_trait;
use redis::{aio::Connection, AsyncCommands, Client};
use std::sync::Arc;
use crate::errors::{AppError, AppResult};
use crate::models::{NewTask, NewUser, ReferenceRow, ReferenceTable, Task, User};
use super::store::{missing_owner, missing_reference, Store};

// Give up on a write after this many WATCH conflicts in a row
const MAX_TRANSACTION_ATTEMPTS: usize = 16;

/// Redis-backed store.
///
/// Layout, under the configured prefix:
/// - `user:{id}` / `task:{id}`: JSON documents
/// - `users:by_email`, `users:by_username`: hashes from unique field to user id
/// - `users:next_id`, `tasks:next_id`: id counters
/// - `tasks`: set of task ids
/// - `priorities`, `difficulties`, `statuses`: hashes from id to JSON row
///
/// Writes validate under `WATCH` and commit in one `MULTI`/`EXEC`. Every call
/// opens its own connection, so a watch never outlives the operation.
pub struct RedisService {
    client: Arc<Client>,
    prefix: String,
}

impl RedisService {
    pub fn new(client: Arc<Client>, prefix: impl Into<String>) -> Self {
        Self { client, prefix: prefix.into() }
    }

    async fn connection(&self) -> AppResult<Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.prefix, name)
    }

    fn user_key(&self, id: i64) -> String {
        self.key(&format!("user:{}", id))
    }

    fn task_key(&self, id: i64) -> String {
        self.key(&format!("task:{}", id))
    }

    async fn user_id_by(&self, conn: &mut Connection, index: &str, value: &str) -> AppResult<Option<i64>> {
        Ok(conn.hget(self.key(index), value).await?)
    }

    async fn load_user(&self, conn: &mut Connection, id: i64) -> AppResult<Option<User>> {
        let data: Option<String> = conn.get(self.user_key(id)).await?;
        data.map(|data| serde_json::from_str(&data).map_err(AppError::from))
            .transpose()
    }

    // Reference rows are never rewritten once seeded, so they need no WATCH.
    async fn check_task_references(&self, conn: &mut Connection, task: &Task) -> AppResult<()> {
        let references = [
            (ReferenceTable::Priority, task.priority_id),
            (ReferenceTable::Difficulty, task.difficulty_id),
            (ReferenceTable::Status, task.status_id),
        ];
        for (table, id) in references {
            let exists: bool = conn.hexists(self.key(table.key()), id).await?;
            if !exists {
                return Err(missing_reference(table, id));
            }
        }

        let owner_exists: bool = conn.exists(self.user_key(task.user_id)).await?;
        if !owner_exists {
            return Err(missing_owner(task.user_id));
        }
        Ok(())
    }

    async fn watch(&self, conn: &mut Connection, keys: &[&str]) -> AppResult<()> {
        redis::cmd("WATCH").arg(keys).query_async::<_, ()>(conn).await?;
        Ok(())
    }

    async fn unwatch(&self, conn: &mut Connection) -> AppResult<()> {
        redis::cmd("UNWATCH").query_async::<_, ()>(conn).await?;
        Ok(())
    }
}

fn too_much_contention(what: &str) -> AppError {
    AppError::Internal(format!("Gave up on {} after repeated concurrent modification", what))
}

#[async_trait]
impl Store for RedisService {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut conn = self.connection().await?;
        let email_index = self.key("users:by_email");
        let username_index = self.key("users:by_username");

        for _ in 0..MAX_TRANSACTION_ATTEMPTS {
            self.watch(&mut conn, &[email_index.as_str(), username_index.as_str()]).await?;

            let email_taken: bool = conn.hexists(&email_index, &user.email).await?;
            if email_taken {
                self.unwatch(&mut conn).await?;
                return Err(AppError::Conflict("Email already registered".into()));
            }
            let username_taken: bool = conn.hexists(&username_index, &user.username).await?;
            if username_taken {
                self.unwatch(&mut conn).await?;
                return Err(AppError::Conflict("Username already taken".into()));
            }

            // Ids burned by an aborted attempt are simply skipped
            let id: i64 = conn.incr(self.key("users:next_id"), 1).await?;
            let stored = User {
                id,
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
            };

            let committed: Option<()> = redis::pipe()
                .atomic()
                .set(self.user_key(id), serde_json::to_string(&stored)?).ignore()
                .hset(&email_index, &stored.email, id).ignore()
                .hset(&username_index, &stored.username, id).ignore()
                .query_async(&mut conn)
                .await?;

            if committed.is_some() {
                return Ok(stored);
            }
            tracing::debug!("User insert for {} raced with another write, retrying", stored.username);
        }

        Err(too_much_contention("user registration"))
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let mut conn = self.connection().await?;
        self.load_user(&mut conn, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = self.connection().await?;
        match self.user_id_by(&mut conn, "users:by_email", email).await? {
            Some(id) => self.load_user(&mut conn, id).await,
            None => Ok(None),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let mut conn = self.connection().await?;
        match self.user_id_by(&mut conn, "users:by_username", username).await? {
            Some(id) => self.load_user(&mut conn, id).await,
            None => Ok(None),
        }
    }

    async fn get_users(&self, ids: &[i64]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection().await?;
        let keys: Vec<String> = ids.iter().map(|id| self.user_key(*id)).collect();
        let documents: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        documents
            .into_iter()
            .flatten()
            .map(|data| serde_json::from_str(&data).map_err(AppError::from))
            .collect()
    }

    async fn reference_rows(&self, table: ReferenceTable) -> AppResult<Vec<ReferenceRow>> {
        let mut conn = self.connection().await?;
        let documents: Vec<String> = conn.hvals(self.key(table.key())).await?;

        let mut rows = documents
            .iter()
            .map(|data| serde_json::from_str::<ReferenceRow>(data))
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn seed_reference_rows(&self, table: ReferenceTable, rows: &[ReferenceRow]) -> AppResult<usize> {
        let mut conn = self.connection().await?;
        let key = self.key(table.key());

        let mut added = 0;
        for row in rows {
            let inserted: bool = conn.hset_nx(&key, row.id, serde_json::to_string(row)?).await?;
            if inserted {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn insert_task(&self, task: NewTask) -> AppResult<Task> {
        let mut conn = self.connection().await?;

        // Validate before taking an id so rejected writes leave the counter alone
        let probe = task.clone().with_id(0);
        self.check_task_references(&mut conn, &probe).await?;

        let id: i64 = conn.incr(self.key("tasks:next_id"), 1).await?;
        let task = task.with_id(id);

        let _: () = redis::pipe()
            .atomic()
            .set(self.task_key(id), serde_json::to_string(&task)?).ignore()
            .sadd(self.key("tasks"), id).ignore()
            .query_async(&mut conn)
            .await?;

        Ok(task)
    }

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>> {
        let mut conn = self.connection().await?;
        let data: Option<String> = conn.get(self.task_key(id)).await?;
        data.map(|data| serde_json::from_str(&data).map_err(AppError::from))
            .transpose()
    }

    async fn list_tasks(&self) -> AppResult<Vec<Task>> {
        let mut conn = self.connection().await?;
        let ids: Vec<i64> = conn.smembers(self.key("tasks")).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.task_key(*id)).collect();
        let documents: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        // A task deleted between SMEMBERS and MGET comes back as nil
        let mut tasks = documents
            .into_iter()
            .flatten()
            .map(|data| serde_json::from_str::<Task>(&data))
            .collect::<Result<Vec<_>, _>>()?;
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let key = self.task_key(task.id);

        for _ in 0..MAX_TRANSACTION_ATTEMPTS {
            self.watch(&mut conn, &[key.as_str()]).await?;

            let exists: bool = conn.exists(&key).await?;
            if !exists {
                self.unwatch(&mut conn).await?;
                return Err(AppError::NotFound("Task not found".into()));
            }
            if let Err(e) = self.check_task_references(&mut conn, task).await {
                self.unwatch(&mut conn).await?;
                return Err(e);
            }

            let committed: Option<()> = redis::pipe()
                .atomic()
                .set(&key, serde_json::to_string(task)?).ignore()
                .query_async(&mut conn)
                .await?;

            if committed.is_some() {
                return Ok(());
            }
            tracing::debug!("Update of task {} raced with another write, retrying", task.id);
        }

        Err(too_much_contention("task update"))
    }

    async fn delete_task(&self, id: i64) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let removed: (i64, i64) = redis::pipe()
            .atomic()
            .del(self.task_key(id))
            .srem(self.key("tasks"), id)
            .query_async(&mut conn)
            .await?;
        Ok(removed.0 > 0)
    }
}

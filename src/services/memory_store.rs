use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use crate::errors::{AppError, AppResult};
use crate::models::{NewTask, NewUser, ReferenceRow, ReferenceTable, Task, User};
use super::store::{missing_owner, missing_reference, Store};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    references: HashMap<ReferenceTable, BTreeMap<i64, ReferenceRow>>,
    last_user_id: i64,
    last_task_id: i64,
}

impl MemoryState {
    // All checks run before anything is mutated, so a failed write leaves no trace.
    fn check_task_references(&self, task: &Task) -> AppResult<()> {
        let references = [
            (ReferenceTable::Priority, task.priority_id),
            (ReferenceTable::Difficulty, task.difficulty_id),
            (ReferenceTable::Status, task.status_id),
        ];
        for (table, id) in references {
            let exists = self
                .references
                .get(&table)
                .map_or(false, |rows| rows.contains_key(&id));
            if !exists {
                return Err(missing_reference(table, id));
            }
        }
        if !self.users.contains_key(&task.user_id) {
            return Err(missing_owner(task.user_id));
        }
        Ok(())
    }
}

/// In-process store. One lock guards all tables, so each operation is a transaction.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if state.users.values().any(|existing| existing.username == user.username) {
            return Err(AppError::Conflict("Username already taken".into()));
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.username == username).cloned())
    }

    async fn get_users(&self, ids: &[i64]) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn reference_rows(&self, table: ReferenceTable) -> AppResult<Vec<ReferenceRow>> {
        let state = self.state.read().await;
        Ok(state
            .references
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn seed_reference_rows(&self, table: ReferenceTable, rows: &[ReferenceRow]) -> AppResult<usize> {
        let mut state = self.state.write().await;
        let existing = state.references.entry(table).or_default();
        let mut added = 0;
        for row in rows {
            if !existing.contains_key(&row.id) {
                existing.insert(row.id, row.clone());
                added += 1;
            }
        }
        Ok(added)
    }

    async fn insert_task(&self, task: NewTask) -> AppResult<Task> {
        let mut state = self.state.write().await;
        let task = task.with_id(state.last_task_id + 1);
        state.check_task_references(&task)?;

        state.last_task_id = task.id;
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> AppResult<Vec<Task>> {
        Ok(self.state.read().await.tasks.values().cloned().collect())
    }

    async fn update_task(&self, task: &Task) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.tasks.contains_key(&task.id) {
            return Err(AppError::NotFound("Task not found".into()));
        }
        state.check_task_references(task)?;
        state.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete_task(&self, id: i64) -> AppResult<bool> {
        Ok(self.state.write().await.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_deadline;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    fn row(id: i64, name: &str) -> ReferenceRow {
        ReferenceRow { id, name: name.into(), filepath: None }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for table in ReferenceTable::ALL {
            store.seed_reference_rows(table, &[row(1, "one"), row(2, "two")]).await.unwrap();
        }
        store.insert_user(new_user("ada", "ada@example.com")).await.unwrap();
        store
    }

    fn new_task(priority_id: i64) -> NewTask {
        NewTask {
            title: "write report".into(),
            description: String::new(),
            deadline: parse_deadline("2024-01-15").unwrap(),
            priority_id,
            difficulty_id: 1,
            status_id: 1,
            user_id: 1,
        }
    }

    #[tokio::test]
    async fn user_ids_are_sequential_and_unique_fields_enforced() {
        let store = MemoryStore::new();
        let first = store.insert_user(new_user("ada", "ada@example.com")).await.unwrap();
        let second = store.insert_user(new_user("bob", "bob@example.com")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let err = store.insert_user(new_user("carol", "ada@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");
        let err = store.insert_user(new_user("ada", "other@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "Username already taken");
        assert!(store.get_user(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeding_skips_existing_ids() {
        let store = MemoryStore::new();
        let added = store
            .seed_reference_rows(ReferenceTable::Status, &[row(1, "To Do"), row(2, "Done")])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let added = store
            .seed_reference_rows(ReferenceTable::Status, &[row(1, "Renamed"), row(3, "Archived")])
            .await
            .unwrap();
        assert_eq!(added, 1);

        let rows = store.reference_rows(ReferenceTable::Status).await.unwrap();
        let names: Vec<_> = rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["To Do", "Done", "Archived"]);
        assert!(store.reference_rows(ReferenceTable::Priority).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dangling_reference_writes_nothing() {
        let store = seeded().await;
        let err = store.insert_task(new_task(9)).await.unwrap_err();
        assert!(matches!(err, AppError::Reference(_)));
        assert!(store.list_tasks().await.unwrap().is_empty());

        // The failed insert did not consume an id
        let task = store.insert_task(new_task(2)).await.unwrap();
        assert_eq!(task.id, 1);
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_task() {
        let store = seeded().await;
        let mut task = store.insert_task(new_task(1)).await.unwrap();

        task.status_id = 2;
        store.update_task(&task).await.unwrap();
        assert_eq!(store.get_task(task.id).await.unwrap().unwrap().status_id, 2);

        task.status_id = 5;
        assert!(matches!(store.update_task(&task).await, Err(AppError::Reference(_))));
        assert_eq!(store.get_task(task.id).await.unwrap().unwrap().status_id, 2);

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(!store.delete_task(task.id).await.unwrap());
        assert!(matches!(store.update_task(&task).await, Err(AppError::NotFound(_))));
    }
}

use std::sync::Arc;
use crate::errors::AppResult;
use crate::models::{Difficulty, Priority, ReferenceTable, Status};
use super::store::Store;

/// Read-only access to the lookup tables.
#[derive(Clone)]
pub struct ReferenceService {
    store: Arc<dyn Store>,
}

impl ReferenceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn priorities(&self) -> AppResult<Vec<Priority>> {
        self.rows(ReferenceTable::Priority).await
    }

    pub async fn difficulties(&self) -> AppResult<Vec<Difficulty>> {
        self.rows(ReferenceTable::Difficulty).await
    }

    pub async fn statuses(&self) -> AppResult<Vec<Status>> {
        self.rows(ReferenceTable::Status).await
    }

    async fn rows<T: From<crate::models::ReferenceRow>>(&self, table: ReferenceTable) -> AppResult<Vec<T>> {
        let rows = self.store.reference_rows(table).await?;
        Ok(rows.into_iter().map(T::from).collect())
    }
}

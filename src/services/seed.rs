use crate::config::SeedConfig;
use crate::errors::AppResult;
use crate::models::ReferenceTable;
use super::{auth_service::AuthService, store::Store};

/// Inserts configured reference rows that are missing. Existing rows are left as they are.
pub async fn seed_reference_data(store: &dyn Store, seed: &SeedConfig) -> AppResult<()> {
    for table in ReferenceTable::ALL {
        let rows = match table {
            ReferenceTable::Priority => &seed.priorities,
            ReferenceTable::Difficulty => &seed.difficulties,
            ReferenceTable::Status => &seed.statuses,
        };
        let added = store.seed_reference_rows(table, rows).await?;
        tracing::info!("Seeded {} of {} {} rows", added, rows.len(), table.key());
    }
    Ok(())
}

/// Creates the fallback user on first start.
pub async fn ensure_default_user(auth: &AuthService, seed: &SeedConfig) -> AppResult<()> {
    let user = &seed.default_user;
    if auth.ensure_user(&user.username, &user.email, &user.password).await? {
        tracing::info!("Created default user {}", user.username);
    } else {
        tracing::debug!("Default user {} already exists", user.username);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::config::Config;
    use crate::services::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_adds_nothing_new() {
        let config = Config::for_tests();
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), config.auth.bcrypt_cost);

        for _ in 0..2 {
            seed_reference_data(store.as_ref(), &config.seed).await.unwrap();
            ensure_default_user(&auth, &config.seed).await.unwrap();
        }

        assert_eq!(store.reference_rows(ReferenceTable::Priority).await.unwrap().len(), 3);
        assert_eq!(store.reference_rows(ReferenceTable::Difficulty).await.unwrap().len(), 3);
        assert_eq!(store.reference_rows(ReferenceTable::Status).await.unwrap().len(), 3);

        let default_user = store.find_user_by_username("default_user").await.unwrap().unwrap();
        assert_eq!(default_user.id, 1);
        assert!(store.get_user(2).await.unwrap().is_none());
        assert!(bcrypt::verify("default_password", &default_user.password_hash).unwrap());
    }
}

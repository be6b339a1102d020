use bcrypt::{hash, verify};
use std::sync::Arc;
use crate::errors::{AppError, AppResult};
use crate::models::{Identity, LoginForm, NewUser, PublicUser, RegisterForm, User};
use crate::models::require_text;
use super::store::Store;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration, login and identity lookup. Binding the result to a session
/// is left to the caller.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn register(&self, form: RegisterForm) -> AppResult<PublicUser> {
        let username = require_text(form.username, "username")?;
        let email = require_text(form.email, "email")?;
        let password = require_text(form.password, "password")?;

        tracing::info!("Registration attempt for user: {}", username);

        // Cheap checks before paying for the hash; insert_user enforces them again atomically
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if self.store.find_user_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".into()));
        }

        let user = self.create_user(username, email, &password).await?;
        tracing::info!("Registered user {} with id {}", user.username, user.id);
        Ok(PublicUser::from(&user))
    }

    pub async fn login(&self, form: LoginForm) -> AppResult<PublicUser> {
        let email = require_text(form.email, "email")?;
        let password = require_text(form.password, "password")?;

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::info!("Login failed: no user with email {}", email);
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        };

        if !verify(&password, &user.password_hash)? {
            tracing::info!("Login failed: wrong password for user {}", user.id);
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        }

        tracing::info!("User {} logged in", user.id);
        Ok(PublicUser::from(&user))
    }

    pub async fn current_user(&self, identity: &Identity) -> AppResult<PublicUser> {
        let user_id = identity.require_user()?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(PublicUser::from(&user))
    }

    /// Creates the user unless one with the same username exists. Returns true if created.
    pub async fn ensure_user(&self, username: &str, email: &str, password: &str) -> AppResult<bool> {
        if self.store.find_user_by_username(username).await?.is_some() {
            return Ok(false);
        }
        self.create_user(username.to_string(), email.to_string(), password).await?;
        Ok(true)
    }

    async fn create_user(&self, username: String, email: String, password: &str) -> AppResult<User> {
        let password_hash = hash(password.as_bytes(), self.bcrypt_cost)?;
        self.store
            .insert_user(NewUser { username, email, password_hash })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), 4)
    }

    fn register_form(username: &str, email: &str, password: &str) -> RegisterForm {
        RegisterForm {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm { email: Some(email.into()), password: Some(password.into()) }
    }

    #[tokio::test]
    async fn register_returns_public_fields() {
        let auth = service();
        let user = auth.register(register_form("ada", "ada@example.com", "pw")).await.unwrap();
        assert_eq!(user, PublicUser { id: 1, username: "ada".into(), email: "ada@example.com".into() });
    }

    #[tokio::test]
    async fn register_stores_a_hash() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), 4);
        auth.register(register_form("ada", "ada@example.com", "secret")).await.unwrap();

        let stored = store.get_user(1).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret");
        assert!(verify("secret", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_reports_first_missing_field() {
        let auth = service();
        let err = auth
            .register(RegisterForm { username: Some("ada".into()), email: Some(String::new()), password: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Missing required field: email");
    }

    #[tokio::test]
    async fn duplicate_email_or_username_conflicts() {
        let auth = service();
        auth.register(register_form("ada", "ada@example.com", "pw")).await.unwrap();

        let err = auth.register(register_form("bob", "ada@example.com", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Email already registered");

        let err = auth.register(register_form("ada", "bob@example.com", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Username already taken");
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let auth = service();
        auth.register(register_form("ada", "ada@example.com", "right")).await.unwrap();

        let wrong_password = auth.login(login_form("ada@example.com", "wrong")).await.unwrap_err();
        let unknown_email = auth.login(login_form("nobody@example.com", "right")).await.unwrap_err();
        assert!(matches!(wrong_password, AppError::Auth(_)));
        assert!(matches!(unknown_email, AppError::Auth(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), "Invalid email or password");

        let user = auth.login(login_form("ada@example.com", "right")).await.unwrap();
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let auth = service();
        let err = auth.login(LoginForm { email: Some("a@b.c".into()), password: None }).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: password");
    }

    #[tokio::test]
    async fn current_user_needs_a_live_identity() {
        let auth = service();
        let err = auth.current_user(&Identity::anonymous()).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        let err = auth.current_user(&Identity::user(42)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let user = auth.register(register_form("ada", "ada@example.com", "pw")).await.unwrap();
        assert_eq!(auth.current_user(&Identity::user(user.id)).await.unwrap(), user);
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let auth = service();
        assert!(auth.ensure_user("default_user", "default@example.com", "pw").await.unwrap());
        assert!(!auth.ensure_user("default_user", "default@example.com", "pw").await.unwrap());
    }
}

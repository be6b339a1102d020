use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use std::{sync::Arc, time::Duration as StdDuration};
use time::Duration;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore as SessionStore, SessionManagerLayer};
use crate::{
    config::Config,
    handlers,
    middleware,
    services::{AuthService, ReferenceService, Store, TaskService},
};

/// Shared state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TaskService,
    pub references: ReferenceService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            auth: AuthService::new(store.clone(), config.auth.bcrypt_cost),
            tasks: TaskService::new(store.clone()),
            references: ReferenceService::new(store),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(StdDuration::from_secs(config.cors.max_age_secs))
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Session store setup
    let session_layer = SessionManagerLayer::new(SessionStore::default())
        .with_secure(config.session.secure)
        .with_same_site(SameSite::Lax)
        .with_name(config.session.cookie_name.clone())
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            config.session.inactivity_timeout_secs,
        )));

    Router::new()
        // Auth routes
        .route("/register", post(handlers::handle_register))
        .route("/login", post(handlers::handle_login))
        .route("/currentuser", get(handlers::current_user))
        .route("/logout", get(handlers::handle_logout))

        // Task routes
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/:task_id", put(handlers::update_task).delete(handlers::delete_task))

        // Reference tables
        .route("/priorities", get(handlers::list_priorities))
        .route("/difficulties", get(handlers::list_difficulties))
        .route("/statuses", get(handlers::list_statuses))

        // Static files
        .nest_service(
            "/Resources",
            ServeDir::new(&config.resources.dir)
                .not_found_service(handlers::resource_not_found.into_service()),
        )

        // Add middleware
        .layer(from_fn(middleware::attach_identity))
        .layer(session_layer)

        // Request body limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.upload.max_body_size))

        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())

        // Add state
        .with_state(state)
}

/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskit_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskit_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskit_shared::{auth::middleware::authenticate, mail::Mailer};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Account email sender
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state; the mailer is built from `config.mail`
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer = Mailer::new((&config.mail).into());

        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET    /health                 # public
/// ├── POST   /users                  # public, signup
/// ├── POST   /users/login            # public
/// ├── GET    /users/:id/avatar       # public
/// ├── POST   /users/logout           # authenticated from here on
/// ├── POST   /users/logoutAll
/// ├── GET    /users/me
/// ├── PATCH  /users/me
/// ├── DELETE /users/me
/// ├── GET    /users/me/avatar
/// ├── POST   /users/me/avatar
/// ├── DELETE /users/me/avatar
/// ├── POST   /tasks
/// ├── GET    /tasks
/// ├── GET    /tasks/:id
/// ├── PATCH  /tasks/:id
/// └── DELETE /tasks/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (authenticated routes only)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::signup))
        .route("/users/login", post(routes::users::login))
        .route("/users/:id/avatar", get(routes::avatar::get_avatar));

    let user_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::get_profile)
                .patch(routes::users::update_profile)
                .delete(routes::users::delete_account),
        )
        .route(
            "/users/me/avatar",
            get(routes::avatar::get_own_avatar)
                .post(routes::avatar::upload_avatar)
                .delete(routes::avatar::delete_avatar),
        );

    let task_routes = Router::new()
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let authenticated_routes = Router::new()
        .merge(user_routes)
        .merge(task_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer authentication middleware
///
/// Validates the token, checks it against the stored sessions and injects
/// the resulting `AuthContext` into the request extensions.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let auth = authenticate(&state.db, state.jwt_secret(), header).await?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

//! Common test utilities for integration tests
//!
//! Each `TestContext` seeds its own pair of users with three tasks, mirroring
//! the fixture accounts used across the suites:
//!
//! - user one "Steve" owns "First task" (open) and "Second task" (done)
//! - user two "Grant" owns "Third task" (done)
//!
//! Emails get a random suffix so contexts never collide, which lets the test
//! binaries run in parallel against one database. Tests skip themselves when
//! `DATABASE_URL` is not set.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use taskit_api::app::{build_router, AppState};
use taskit_api::config::Config;
use taskit_shared::auth::jwt::{create_token, Claims};
use taskit_shared::auth::password::hash_password;
use taskit_shared::db::migrations::run_migrations;
use taskit_shared::db::pool::{create_pool, DatabaseConfig};
use taskit_shared::models::task::{CreateTask, Task};
use taskit_shared::models::user::{CreateUser, User};
use taskit_shared::models::user_token::UserToken;
use tower::Service as _;
use uuid::Uuid;

/// A seeded account with one active session
pub struct TestUser {
    pub user: User,
    pub password: String,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user_one: TestUser,
    pub user_two: TestUser,
    pub task_one: Task,
    pub task_two: Task,
    pub task_three: Task,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    /// Creates a seeded context, or `None` when no database is configured
    pub async fn try_new() -> Option<Self> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL not set, skipping");
                return None;
            }
        };

        Some(Self::new(url).await.expect("Failed to set up test context"))
    }

    async fn new(url: String) -> anyhow::Result<Self> {
        let config = Config::for_tests(url.clone());

        let db = create_pool(DatabaseConfig {
            max_connections: config.database.max_connections,
            ..DatabaseConfig::new(url)
        })
        .await?;

        run_migrations(&db).await?;

        let user_one = seed_user(&db, &config, "Steve", "MyPass777!").await?;
        let user_two = seed_user(&db, &config, "Grant", "Grant123!").await?;

        let task_one = seed_task(&db, user_one.user.id, "First task", false).await?;
        let task_two = seed_task(&db, user_one.user.id, "Second task", true).await?;
        let task_three = seed_task(&db, user_two.user.id, "Third task", true).await?;

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Ok(Self {
            db,
            app,
            config,
            user_one,
            user_two,
            task_one,
            task_two,
            task_three,
        })
    }

    /// Sends a request through the router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&TestUser>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = token {
            builder = builder.header(header::AUTHORIZATION, user.auth_header());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Sends a prepared request and decodes the JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Removes the seeded users; tasks and tokens go with them
    pub async fn cleanup(self) {
        for id in [self.user_one.user.id, self.user_two.user.id] {
            let _ = User::delete(&self.db, id).await;
        }
    }
}

/// A unique address for `name`
pub fn unique_email(name: &str) -> String {
    format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple())
}

async fn seed_user(
    db: &PgPool,
    config: &Config,
    name: &str,
    password: &str,
) -> anyhow::Result<TestUser> {
    let user = User::create(
        db,
        CreateUser {
            name: name.to_string(),
            email: unique_email(name),
            password_hash: hash_password(password)?,
            age: 0,
        },
    )
    .await?;

    let claims = Claims::new(user.id, config.token_lifetime());
    let token = create_token(&claims, &config.jwt.secret)?;
    UserToken::create(db, user.id, &token).await?;

    Ok(TestUser {
        user,
        password: password.to_string(),
        token,
    })
}

async fn seed_task(
    db: &PgPool,
    owner: Uuid,
    description: &str,
    completed: bool,
) -> anyhow::Result<Task> {
    Ok(Task::create(
        db,
        CreateTask {
            owner,
            description: description.to_string(),
            completed,
        },
    )
    .await?)
}

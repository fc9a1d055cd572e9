/// Database models for Taskit
///
/// # Models
///
/// - `user`: User accounts, credentials and avatars
/// - `user_token`: Active session tokens per user
/// - `task`: Tasks owned by users
///
/// # Example
///
/// ```no_run
/// use taskit_shared::models::user::{User, CreateUser};
/// use taskit_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Steve".to_string(),
///     email: "steve@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     age: 0,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;
pub mod user_token;

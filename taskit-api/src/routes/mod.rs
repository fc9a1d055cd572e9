/// API route handlers
///
/// - `health`: Health check endpoint
/// - `users`: Signup, login, sessions and profile
/// - `avatar`: Avatar upload and serving
/// - `tasks`: Task CRUD
/// - `payload`: Body parsing helpers shared by the handlers

pub mod avatar;
pub mod health;
pub mod payload;
pub mod tasks;
pub mod users;

// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 hash, never the plain password.
    #[serde(skip_serializing)]
    pub password: String,
    /// 'user' or 'admin'.
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for register and login.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username length must be between 3 and 20 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 64,
        message = "Password length must be between 4 and 64 characters."
    ))]
    pub password: String,
}

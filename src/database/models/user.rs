use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::NamedRef;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    /// Stored in canonical E.164 form.
    pub phone: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub tariff_id: i32,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff: Option<NamedRef>,
    pub inn: Option<String>,
    pub snils: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Signup payload. The password is plaintext until the identity service hashes it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub inn: Option<String>,
    #[serde(default)]
    pub snils: Option<String>,
}

/// Validated row handed to the persistence gateway.
#[derive(Debug, Clone)]
pub struct UserInsert {
    pub name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub tariff_id: i32,
    pub inn: Option<String>,
    pub snils: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
    pub phone: String,
    pub password: String,
}

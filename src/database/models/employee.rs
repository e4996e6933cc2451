use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{NamedRef, Service};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role_id: i32,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<NamedRef>,
    /// Specialties granted through `employee_specs`.
    #[sqlx(skip)]
    pub services: Vec<Service>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub email: String,
    pub password: String,
    pub role_id: i32,
}

#[derive(Debug, Clone)]
pub struct EmployeeInsert {
    pub name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeCredentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /prot/employee/:id/service`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialtyGrant {
    pub service_id: i32,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Employee, NamedRef, User};

/// Status assigned when a request is filed without one.
pub const STATUS_NEW: i16 = 1;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Request {
    pub id: i64,
    pub name: Option<String>,
    pub service_id: i32,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<NamedRef>,
    pub owner_id: i64,
    /// Owner enrichment; `None` when the owner could not be looked up.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub employee_id: Option<i64>,
    /// Assignee enrichment; `None` when unassigned or not found.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
    pub priority: i16,
    #[sqlx(rename = "desc")]
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub desired_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub service_id: i32,
    /// Falls back to the calling user when omitted.
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub priority: i16,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<i16>,
    #[serde(default)]
    pub desired_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct RequestInsert {
    pub name: Option<String>,
    pub service_id: i32,
    pub owner_id: i64,
    pub employee_id: Option<i64>,
    pub priority: i16,
    pub description: Option<String>,
    pub status: i16,
    pub desired_at: Option<DateTime<Utc>>,
}

/// Conjunctive search predicate; unset or zero fields do not constrain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub service_id: Option<i32>,
    /// Matches requests whose `desired_at` is at or before this instant.
    #[serde(default)]
    pub desired_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<i16>,
    #[serde(default)]
    pub employee_id: Option<i64>,
}

impl RequestFilter {
    /// Drops zero values so `owner_id=0` behaves like an absent field.
    pub fn normalized(self) -> Self {
        Self {
            owner_id: self.owner_id.filter(|v| *v != 0),
            service_id: self.service_id.filter(|v| *v != 0),
            desired_at: self.desired_at,
            status: self.status.filter(|v| *v != 0),
            employee_id: self.employee_id.filter(|v| *v != 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none()
            && self.service_id.is_none()
            && self.desired_at.is_none()
            && self.status.is_none()
            && self.employee_id.is_none()
    }

    /// Evaluates the predicate against a stored row.
    pub fn matches(&self, request: &Request) -> bool {
        self.owner_id.map_or(true, |v| request.owner_id == v)
            && self.service_id.map_or(true, |v| request.service_id == v)
            && self
                .desired_at
                .map_or(true, |v| request.desired_at.is_some_and(|at| at <= v))
            && self.status.map_or(true, |v| request.status == v)
            && self.employee_id.map_or(true, |v| request.employee_id == Some(v))
    }
}

/// Body of `PATCH /prot/request/:id/employee`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeAssignment {
    pub employee_id: i64,
}

/// Body of `PATCH /prot/request/:id/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: i16,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

pub mod catalog;
pub mod employee;
pub mod request;
pub mod setting;
pub mod user;

pub use catalog::{Role, Service, Tariff};
pub use employee::{Employee, EmployeeCredentials, EmployeeInsert, NewEmployee, SpecialtyGrant};
pub use request::{EmployeeAssignment, NewRequest, Request, RequestFilter, RequestInsert, StatusChange, STATUS_NEW};
pub use setting::{Designation, Setting};
pub use user::{NewUser, User, UserCredentials, UserInsert};

/// `{id, name}` decoration of a related row, filled from a left join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

impl NamedRef {
    /// Reads a left-joined decoration; a missing related row yields `None`.
    pub fn from_joined(row: &PgRow, id_column: &str, name_column: &str) -> Result<Option<Self>, sqlx::Error> {
        let id: Option<i32> = row.try_get(id_column)?;
        let name: Option<String> = row.try_get(name_column)?;
        Ok(match (id, name) {
            (Some(id), Some(name)) => Some(Self { id, name }),
            _ => None,
        })
    }
}

/// Payload for creating or renaming a role, tariff or service.
#[derive(Debug, Clone, Deserialize)]
pub struct NameInput {
    pub name: String,
}

/// Rows of the role / tariff / service tables share one shape and one gateway.
pub trait NamedEntity:
    for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + 'static
{
    /// Table name, also the prefix of its id sequence.
    const TABLE: &'static str;
    /// Human-readable entity name used in error messages.
    const ENTITY: &'static str;

    fn new_record(id: i32, name: String, created_at: DateTime<Utc>) -> Self;
    fn id(&self) -> i32;
    fn name(&self) -> &str;
    fn rename(&mut self, name: String, updated_at: DateTime<Utc>);

    fn to_named_ref(&self) -> NamedRef {
        NamedRef {
            id: self.id(),
            name: self.name().to_string(),
        }
    }
}

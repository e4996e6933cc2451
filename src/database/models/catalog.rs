use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::NamedEntity;

/// Named permission bucket assigned to employees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Named pricing tier assigned to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tariff {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Offering category a request is filed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

macro_rules! named_entity {
    ($ty:ty, $table:literal, $entity:literal) => {
        impl NamedEntity for $ty {
            const TABLE: &'static str = $table;
            const ENTITY: &'static str = $entity;

            fn new_record(id: i32, name: String, created_at: DateTime<Utc>) -> Self {
                Self {
                    id,
                    name,
                    created_at,
                    updated_at: None,
                }
            }

            fn id(&self) -> i32 {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn rename(&mut self, name: String, updated_at: DateTime<Utc>) {
                self.name = name;
                self.updated_at = Some(updated_at);
            }
        }
    };
}

named_entity!(Role, "role", "role");
named_entity!(Tariff, "tariff", "tariff");
named_entity!(Service, "service", "service");

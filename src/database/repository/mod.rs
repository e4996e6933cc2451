//! Persistence gateway: per-entity CRUD plus the entity-specific queries the
//! services need. Postgres implementations live in the submodules; an
//! in-memory implementation lives in [`crate::testing`].

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::{
    Designation, Employee, EmployeeInsert, NamedEntity, Request, RequestFilter, RequestInsert, Role,
    Service, Setting, Tariff, User, UserInsert,
};

mod employee;
mod named;
mod request;
mod setting;
mod tx;
mod user;

pub use employee::PgEmployeeRepository;
pub use named::PgNamedRepository;
pub use request::PgRequestRepository;
pub use setting::PgSettingRepository;
pub use user::PgUserRepository;

/// Errors surfaced by the persistence gateway
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Rewinding the id sequence after a failed insert did not succeed.
    #[error("failed to reset {table} id sequence: {message}")]
    SequenceResetFailure { table: &'static str, message: String },

    #[error("database error: {0}")]
    Io(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        // SQLSTATE class 23: integrity constraint violations
        if let sqlx::Error::Database(db) = &err {
            if db.code().is_some_and(|code| code.starts_with("23")) {
                return RepoError::ConstraintViolation(db.message().to_string());
            }
        }
        RepoError::Io(err.to_string())
    }
}

/// Gateway for the role / tariff / service tables.
#[async_trait]
pub trait NamedRepository<T: NamedEntity>: Send + Sync {
    async fn create(&self, name: &str) -> Result<T, RepoError>;
    async fn list(&self) -> Result<Vec<T>, RepoError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<T>, RepoError>;
    /// Name-only update; `NotFound` when the row is absent.
    async fn rename(&self, id: i32, name: &str) -> Result<T, RepoError>;
    /// `NotFound` when zero rows were deleted.
    async fn delete(&self, id: i32) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &UserInsert) -> Result<User, RepoError>;
    /// All users decorated with their tariff.
    async fn list(&self) -> Result<Vec<User>, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    /// Looks up by canonical phone.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepoError>;
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn create(&self, employee: &EmployeeInsert) -> Result<Employee, RepoError>;
    /// All employees decorated with role and specialties.
    async fn list(&self) -> Result<Vec<Employee>, RepoError>;
    /// Single employee with specialties.
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepoError>;
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
    /// Returns `false` when the grant already existed.
    async fn grant_specialty(&self, employee_id: i64, service_id: i32) -> Result<bool, RepoError>;
    /// Returns `false` when there was no such grant.
    async fn revoke_specialty(&self, employee_id: i64, service_id: i32) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn create(&self, request: &RequestInsert) -> Result<Request, RepoError>;
    /// Base row decorated with its service.
    async fn find_by_id(&self, id: i64) -> Result<Option<Request>, RepoError>;
    async fn filter(&self, filter: &RequestFilter) -> Result<Vec<Request>, RepoError>;
    async fn update_employee(&self, id: i64, employee_id: i64) -> Result<(), RepoError>;
    async fn update_status(&self, id: i64, status: i16) -> Result<(), RepoError>;
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SettingRepository: Send + Sync {
    /// The singleton row, if it was ever written.
    async fn get(&self) -> Result<Option<Setting>, RepoError>;
    /// Designated id, only if it still resolves to an existing record.
    async fn designated(&self, slot: Designation) -> Result<Option<i32>, RepoError>;
    /// Atomically designates `id` unless a live designation already exists.
    /// Returns whether `id` became the designated record.
    async fn designate_if_unset(&self, slot: Designation, id: i32) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}

/// Every gateway the services depend on, behind trait objects.
#[derive(Clone)]
pub struct Store {
    pub roles: Arc<dyn NamedRepository<Role>>,
    pub tariffs: Arc<dyn NamedRepository<Tariff>>,
    pub services: Arc<dyn NamedRepository<Service>>,
    pub users: Arc<dyn UserRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub requests: Arc<dyn RequestRepository>,
    pub settings: Arc<dyn SettingRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            roles: Arc::new(PgNamedRepository::<Role>::new(pool.clone())),
            tariffs: Arc::new(PgNamedRepository::<Tariff>::new(pool.clone())),
            services: Arc::new(PgNamedRepository::<Service>::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            employees: Arc::new(PgEmployeeRepository::new(pool.clone())),
            requests: Arc::new(PgRequestRepository::new(pool.clone())),
            settings: Arc::new(PgSettingRepository::new(pool.clone())),
            health: Arc::new(PgHealth { pool }),
        }
    }
}

struct PgHealth {
    pool: PgPool,
}

#[async_trait]
impl StoreHealth for PgHealth {
    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Deletes by primary key, mapping zero affected rows to `NotFound`.
pub(crate) async fn delete_by_id<I>(
    pool: &PgPool,
    table: &'static str,
    entity: &'static str,
    id: I,
) -> Result<(), RepoError>
where
    I: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
{
    let sql = format!("DELETE FROM \"{}\" WHERE id = $1", table);
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(entity));
    }
    Ok(())
}

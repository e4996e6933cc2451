//! Domain services: catalog administration, singleton designation, identity
//! and the request lifecycle. Every public operation runs under the
//! configured time bound and talks to storage only through [`Store`].

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::auth::validate::ValidationError;
use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::database::models::{Role, Service, Tariff};
use crate::database::repository::{RepoError, Store};

pub mod auth_service;
pub mod catalog_service;
pub mod designation;
pub mod employee_service;
pub mod request_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use designation::Designations;
pub use employee_service::EmployeeService;
pub use request_service::RequestService;
pub use user_service::UserService;

pub type RoleService = CatalogService<Role>;
pub type TariffService = CatalogService<Tariff>;
pub type OfferingService = CatalogService<Service>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    WeakCredential(String),

    #[error("invalid password")]
    InvalidCredential,

    #[error("{0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    InvariantViolation(String),

    #[error("{0}")]
    SequenceResetFailure(String),

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        ServiceError::NotFound(entity.into())
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(entity) => ServiceError::NotFound(entity.to_string()),
            RepoError::ConstraintViolation(msg) => ServiceError::ConstraintViolation(msg),
            err @ RepoError::SequenceResetFailure { .. } => ServiceError::SequenceResetFailure(err.to_string()),
            RepoError::Io(msg) => ServiceError::Internal(msg),
        }
    }
}

/// Password rules fail as weak credentials, everything else as bad input.
impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        if err.is_credential() {
            ServiceError::WeakCredential(err.to_string())
        } else {
            ServiceError::InvalidArgument(err.to_string())
        }
    }
}

/// Wraps gateway errors with the name of the operation that hit them.
pub trait RepoContext<T> {
    fn context(self, operation: &'static str) -> Result<T, ServiceError>;
}

impl<T> RepoContext<T> for Result<T, RepoError> {
    fn context(self, operation: &'static str) -> Result<T, ServiceError> {
        self.map_err(|err| match err {
            RepoError::NotFound(entity) => ServiceError::NotFound(entity.to_string()),
            RepoError::ConstraintViolation(msg) => {
                ServiceError::ConstraintViolation(format!("{}: {}", operation, msg))
            }
            err @ RepoError::SequenceResetFailure { .. } => {
                ServiceError::SequenceResetFailure(format!("{}: {}", operation, err))
            }
            RepoError::Io(msg) => ServiceError::Internal(format!("{}: {}", operation, msg)),
        })
    }
}

/// Runs `work` under `limit`, cancelling it when the bound is exceeded.
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, work: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} exceeded {:?}", operation, limit);
            Err(ServiceError::Timeout(operation))
        }
    }
}

/// Rejects ids below 1 before any lookup.
pub(crate) fn require_id<I>(id: I, what: &str) -> Result<I, ServiceError>
where
    I: Copy + PartialOrd + From<u8>,
{
    if id < I::from(1) {
        return Err(ServiceError::invalid(format!("invalid {}", what)));
    }
    Ok(id)
}

/// Knobs shared by every service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub timeout: Duration,
    /// Region used to read phone numbers without a country code.
    pub phone_region: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            phone_region: "RU".to_string(),
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            phone_region: config.identity.phone_default_region.clone(),
        }
    }
}

/// Every service, wired to one store.
#[derive(Clone)]
pub struct Services {
    pub roles: RoleService,
    pub tariffs: TariffService,
    pub offerings: OfferingService,
    pub designations: Designations,
    pub users: UserService,
    pub employees: EmployeeService,
    pub requests: RequestService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(store: &Store, tokens: TokenIssuer, options: ServiceOptions) -> Self {
        let designations = Designations::new(store.settings.clone(), options.timeout);
        Self {
            roles: CatalogService::new(store.roles.clone(), designations.clone(), options.timeout),
            tariffs: CatalogService::new(store.tariffs.clone(), designations.clone(), options.timeout),
            offerings: CatalogService::new(store.services.clone(), designations.clone(), options.timeout),
            users: UserService::new(store, designations.clone(), &options),
            employees: EmployeeService::new(store, options.timeout),
            requests: RequestService::new(store, options.timeout),
            auth: AuthService::new(store, tokens, &options),
            designations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_constraint_violations() {
        let err = Err::<(), _>(RepoError::ConstraintViolation("duplicate key".to_string()))
            .context("register user")
            .unwrap_err();
        assert_eq!(err.to_string(), "register user: duplicate key");
    }

    #[test]
    fn sequence_reset_failure_stays_distinct() {
        let err: ServiceError = RepoError::SequenceResetFailure {
            table: "tariff",
            message: "permission denied".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::SequenceResetFailure(_)));
    }

    #[test]
    fn ids_below_one_are_invalid() {
        assert!(require_id(0i64, "request id").is_err());
        assert!(require_id(-3i32, "role id").is_err());
        assert_eq!(require_id(7i64, "request id").unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_work_times_out() {
        let result: Result<(), _> = bounded(Duration::from_secs(10), "slow lookup", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Timeout("slow lookup"))));
    }
}

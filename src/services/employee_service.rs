use std::sync::Arc;
use std::time::Duration;

use super::user_service::hash_off_thread;
use super::{bounded, require_id, RepoContext, ServiceError};
use crate::auth::validate::{validate_email, validate_password};
use crate::database::models::{Employee, EmployeeInsert, NewEmployee, Role, Service};
use crate::database::repository::{EmployeeRepository, NamedRepository, Store};

#[derive(Clone)]
pub struct EmployeeService {
    employees: Arc<dyn EmployeeRepository>,
    roles: Arc<dyn NamedRepository<Role>>,
    services: Arc<dyn NamedRepository<Service>>,
    timeout: Duration,
}

impl EmployeeService {
    pub fn new(store: &Store, timeout: Duration) -> Self {
        Self {
            employees: store.employees.clone(),
            roles: store.roles.clone(),
            services: store.services.clone(),
            timeout,
        }
    }

    /// Validates, checks the role exists, hashes and stores a new employee.
    pub async fn register(&self, input: NewEmployee) -> Result<Employee, ServiceError> {
        validate_email(&input.email)?;
        validate_password(&input.password)?;
        let role_id = require_id(input.role_id, "role id")?;

        bounded(self.timeout, "register employee", async {
            self.roles
                .find_by_id(role_id)
                .await
                .context("register employee")?
                .ok_or_else(|| ServiceError::not_found("role"))?;

            let insert = EmployeeInsert {
                name: input.name,
                last_name: input.last_name,
                middle_name: input.middle_name,
                email: input.email,
                password_hash: hash_off_thread(input.password).await?,
                role_id,
            };
            self.employees.create(&insert).await.context("register employee")
        })
        .await
    }

    /// All employees with role decoration and specialties.
    pub async fn get(&self) -> Result<Vec<Employee>, ServiceError> {
        bounded(self.timeout, "list employees", async {
            self.employees.list().await.context("list employees")
        })
        .await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Employee, ServiceError> {
        let id = require_id(id, "employee id")?;
        bounded(self.timeout, "get employee", async {
            self.employees
                .find_by_id(id)
                .await
                .context("get employee")?
                .ok_or_else(|| ServiceError::not_found("employee"))
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        bounded(self.timeout, "delete employee", async {
            self.employees.delete(id).await.context("delete employee")
        })
        .await
    }

    /// Grants a specialty; granting one twice is not an error.
    pub async fn grant_specialty(&self, employee_id: i64, service_id: i32) -> Result<(), ServiceError> {
        let employee_id = require_id(employee_id, "employee id")?;
        let service_id = require_id(service_id, "service id")?;

        bounded(self.timeout, "grant specialty", async {
            if self.employees.find_by_id(employee_id).await.context("grant specialty")?.is_none() {
                return Err(ServiceError::not_found("employee"));
            }
            if self.services.find_by_id(service_id).await.context("grant specialty")?.is_none() {
                return Err(ServiceError::not_found("service"));
            }
            self.employees
                .grant_specialty(employee_id, service_id)
                .await
                .context("grant specialty")?;
            Ok(())
        })
        .await
    }

    /// Revokes a specialty; revoking a missing grant is a no-op.
    pub async fn revoke_specialty(&self, employee_id: i64, service_id: i32) -> Result<(), ServiceError> {
        bounded(self.timeout, "revoke specialty", async {
            self.employees
                .revoke_specialty(employee_id, service_id)
                .await
                .context("revoke specialty")?;
            Ok(())
        })
        .await
    }
}

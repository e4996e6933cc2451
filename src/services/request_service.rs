use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{bounded, require_id, RepoContext, ServiceError};
use crate::auth::AuthUser;
use crate::database::models::{
    Employee, NewRequest, Request, RequestFilter, RequestInsert, User, STATUS_NEW,
};
use crate::database::repository::{EmployeeRepository, RequestRepository, Store, UserRepository};

/// Request lifecycle: filing, lookup with enrichment, and the two sanctioned
/// mutations (assignment and status).
#[derive(Clone)]
pub struct RequestService {
    requests: Arc<dyn RequestRepository>,
    users: Arc<dyn UserRepository>,
    employees: Arc<dyn EmployeeRepository>,
    timeout: Duration,
}

impl RequestService {
    pub fn new(store: &Store, timeout: Duration) -> Self {
        Self {
            requests: store.requests.clone(),
            users: store.users.clone(),
            employees: store.employees.clone(),
            timeout,
        }
    }

    /// Files a request. The owner must exist when the request is filed; after
    /// that the request outlives its owner, so ownership is checked here rather
    /// than by the store. Service and employee integrity is left to the store.
    pub async fn create(&self, caller: &AuthUser, input: NewRequest) -> Result<Request, ServiceError> {
        let owner_id = match input.owner_id.filter(|id| *id != 0) {
            Some(id) => id,
            None if !caller.is_employee() => caller.id,
            None => return Err(ServiceError::invalid("owner_id is required")),
        };

        let insert = RequestInsert {
            name: input.name,
            service_id: input.service_id,
            owner_id,
            employee_id: input.employee_id.filter(|id| *id != 0),
            priority: input.priority,
            description: input.description,
            status: input.status.filter(|s| *s != 0).unwrap_or(STATUS_NEW),
            desired_at: input.desired_at,
        };

        bounded(self.timeout, "create request", async {
            if self.users.find_by_id(insert.owner_id).await.context("create request")?.is_none() {
                return Err(ServiceError::not_found("user"));
            }
            self.requests.create(&insert).await.context("create request")
        })
        .await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Request, ServiceError> {
        let id = require_id(id, "request id")?;
        bounded(self.timeout, "get request", async {
            let request = self
                .requests
                .find_by_id(id)
                .await
                .context("get request")?
                .ok_or_else(|| ServiceError::not_found("request"))?;
            Ok(self.enrich(request).await)
        })
        .await
    }

    /// Conjunctive search; an empty filter returns every request.
    pub async fn get_with_filter(&self, filter: RequestFilter) -> Result<Vec<Request>, ServiceError> {
        let filter = filter.normalized();
        bounded(self.timeout, "filter requests", async {
            let rows = self.requests.filter(&filter).await.context("filter requests")?;
            Ok(join_all(rows.into_iter().map(|row| self.enrich(row))).await)
        })
        .await
    }

    pub async fn update_employee(&self, id: i64, employee_id: i64) -> Result<(), ServiceError> {
        let id = require_id(id, "request id")?;
        let employee_id = require_id(employee_id, "employee_id")?;
        bounded(self.timeout, "assign employee", async {
            self.requests
                .update_employee(id, employee_id)
                .await
                .context("assign employee")
        })
        .await
    }

    pub async fn update_status(&self, id: i64, status: i16) -> Result<(), ServiceError> {
        let id = require_id(id, "request id")?;
        let status = require_id(status, "status")?;
        bounded(self.timeout, "update status", async {
            self.requests.update_status(id, status).await.context("update status")
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        bounded(self.timeout, "delete request", async {
            self.requests.delete(id).await.context("delete request")
        })
        .await
    }

    /// Attaches owner and assignee. Either may come back `None`: a request
    /// stays viewable when its related records are gone or unreachable.
    async fn enrich(&self, mut request: Request) -> Request {
        let employee_id = request.employee_id;
        let employee = async {
            match employee_id {
                Some(id) => self.lookup_employee(id).await,
                None => None,
            }
        };
        let (user, employee) = tokio::join!(self.lookup_owner(request.owner_id), employee);
        request.user = user;
        request.employee = employee;
        request
    }

    async fn lookup_owner(&self, id: i64) -> Option<User> {
        match self.users.find_by_id(id).await {
            Ok(user) => user,
            Err(err) => {
                warn!("Owner {} lookup failed during enrichment: {}", id, err);
                None
            }
        }
    }

    async fn lookup_employee(&self, id: i64) -> Option<Employee> {
        match self.employees.find_by_id(id).await {
            Ok(employee) => employee,
            Err(err) => {
                warn!("Employee {} lookup failed during enrichment: {}", id, err);
                None
            }
        }
    }
}

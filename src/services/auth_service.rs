use std::sync::Arc;
use std::time::Duration;

use super::{bounded, RepoContext, ServiceError, ServiceOptions};
use crate::auth::password::verify_password;
use crate::auth::validate::normalize_phone;
use crate::auth::{AuthUser, TokenIssuer, TokenPair};
use crate::database::models::{EmployeeCredentials, UserCredentials};
use crate::database::repository::{EmployeeRepository, Store, UserRepository};

/// Login and token refresh.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    employees: Arc<dyn EmployeeRepository>,
    tokens: TokenIssuer,
    timeout: Duration,
    phone_region: String,
}

impl AuthService {
    pub fn new(store: &Store, tokens: TokenIssuer, options: &ServiceOptions) -> Self {
        Self {
            users: store.users.clone(),
            employees: store.employees.clone(),
            tokens,
            timeout: options.timeout,
            phone_region: options.phone_region.clone(),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Phone + password login for end users. Tokens carry no role.
    pub async fn login_user(&self, credentials: UserCredentials) -> Result<TokenPair, ServiceError> {
        let phone = normalize_phone(&credentials.phone, &self.phone_region)
            .map_err(|e| ServiceError::invalid(e.to_string()))?;

        bounded(self.timeout, "login user", async {
            let user = self
                .users
                .find_by_phone(&phone)
                .await
                .context("login user")?
                .ok_or_else(|| ServiceError::not_found("user"))?;

            check_password(credentials.password, user.password).await?;
            self.issue(user.id, None)
        })
        .await
    }

    /// Email + password login for employees. Tokens carry the role id.
    pub async fn login_employee(&self, credentials: EmployeeCredentials) -> Result<TokenPair, ServiceError> {
        bounded(self.timeout, "login employee", async {
            let employee = self
                .employees
                .find_by_email(credentials.email.trim())
                .await
                .context("login employee")?
                .ok_or_else(|| ServiceError::not_found("employee"))?;

            check_password(credentials.password, employee.password).await?;
            self.issue(employee.id, Some(employee.role_id))
        })
        .await
    }

    /// Re-issues both tokens from a valid refresh token.
    ///
    /// When the call is made on behalf of an authenticated caller, the refresh
    /// token must belong to that caller. Users and employees have separate id
    /// sequences, so the role claim is part of the identity.
    pub fn refresh(&self, caller: Option<&AuthUser>, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self
            .tokens
            .verify(refresh_token)
            .map_err(|_| ServiceError::InvalidOrExpiredToken)?;

        if caller.is_some_and(|c| (c.id, c.role_id) != (claims.sub, claims.role)) {
            return Err(ServiceError::InvalidOrExpiredToken);
        }
        self.issue(claims.sub, claims.role)
    }

    fn issue(&self, sub: i64, role: Option<i32>) -> Result<TokenPair, ServiceError> {
        self.tokens
            .issue_pair(sub, role)
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

/// Argon2 verification is CPU bound, so it runs off the async workers.
async fn check_password(plain: String, hash: String) -> Result<(), ServiceError> {
    let matches = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("password check failed: {}", e)))?;
    if !matches {
        return Err(ServiceError::InvalidCredential);
    }
    Ok(())
}

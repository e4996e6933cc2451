use std::sync::Arc;
use std::time::Duration;

use super::{bounded, require_id, Designations, RepoContext, ServiceError, ServiceOptions};
use crate::auth::password::hash_password;
use crate::auth::validate::{normalize_phone, validate_email, validate_password};
use crate::database::models::{Designation, NewUser, User, UserInsert};
use crate::database::repository::{Store, UserRepository};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    designations: Designations,
    timeout: Duration,
    phone_region: String,
}

/// Hashes off the async workers; argon2 is deliberately slow.
pub(crate) async fn hash_off_thread(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

impl UserService {
    pub fn new(store: &Store, designations: Designations, options: &ServiceOptions) -> Self {
        Self {
            users: store.users.clone(),
            designations,
            timeout: options.timeout,
            phone_region: options.phone_region.clone(),
        }
    }

    /// Validates, assigns the default tariff, hashes and stores a new user.
    pub async fn register(&self, input: NewUser) -> Result<User, ServiceError> {
        validate_email(&input.email)?;
        let phone = normalize_phone(&input.phone, &self.phone_region)?;
        validate_password(&input.password)?;

        bounded(self.timeout, "register user", async {
            let tariff_id = self
                .designations
                .designated(Designation::DefaultTariff)
                .await?
                .ok_or_else(|| ServiceError::not_found("default tariff"))?;

            let insert = UserInsert {
                name: input.name,
                last_name: input.last_name,
                middle_name: input.middle_name,
                email: input.email,
                phone,
                password_hash: hash_off_thread(input.password).await?,
                tariff_id,
                inn: input.inn,
                snils: input.snils,
            };
            self.users.create(&insert).await.context("register user")
        })
        .await
    }

    /// All users, decorated with their tariff.
    pub async fn get(&self) -> Result<Vec<User>, ServiceError> {
        bounded(self.timeout, "list users", async { self.users.list().await.context("list users") }).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, ServiceError> {
        let id = require_id(id, "user id")?;
        bounded(self.timeout, "get user", async {
            self.users
                .find_by_id(id)
                .await
                .context("get user")?
                .ok_or_else(|| ServiceError::not_found("user"))
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        bounded(self.timeout, "delete user", async { self.users.delete(id).await.context("delete user") }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::auth::TokenIssuer;
    use crate::services::Services;
    use crate::testing::MemoryStore;

    fn services(mem: &MemoryStore) -> Services {
        let tokens = TokenIssuer::new("test", chrono::Duration::hours(1), chrono::Duration::days(7)).unwrap();
        Services::new(&mem.store(), tokens, ServiceOptions::default())
    }

    fn new_user(email: &str, phone: &str, password: &str) -> NewUser {
        NewUser {
            name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            middle_name: Some("Sergeevna".to_string()),
            email: email.to_string(),
            phone: phone.to_string(),
            password: password.to_string(),
            inn: None,
            snils: None,
        }
    }

    #[tokio::test]
    async fn stored_password_is_a_hash_of_the_input() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        let tariff = services.tariffs.create("Basic").await.unwrap();

        let user = services
            .users
            .register(new_user("anna@example.com", "89991234567", "secret1"))
            .await
            .unwrap();
        assert_ne!(user.password, "secret1");
        assert!(verify_password("secret1", &user.password));
        assert_eq!(user.tariff_id, tariff.id);
    }

    #[tokio::test]
    async fn weak_passwords_are_rejected_before_storage() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        services.tariffs.create("Basic").await.unwrap();

        for password in ["abc12", "abcdefg", "1234567"] {
            let err = services
                .users
                .register(new_user("anna@example.com", "9991234567", password))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::WeakCredential(_)), "{}", password);
        }
        assert!(services.users.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_email_or_phone_is_invalid_argument() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        services.tariffs.create("Basic").await.unwrap();

        let bad_email = services.users.register(new_user("anna", "9991234567", "secret1")).await;
        assert!(matches!(bad_email, Err(ServiceError::InvalidArgument(_))));

        let bad_phone = services.users.register(new_user("anna@example.com", "12", "secret1")).await;
        assert!(matches!(bad_phone, Err(ServiceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn registration_needs_a_default_tariff() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        let err = services
            .users
            .register(new_user("anna@example.com", "9991234567", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_phone_is_a_constraint_violation() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        services.tariffs.create("Basic").await.unwrap();
        services
            .users
            .register(new_user("anna@example.com", "9991234567", "secret1"))
            .await
            .unwrap();

        let err = services
            .users
            .register(new_user("other@example.com", "+79991234567", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn list_is_decorated_with_the_tariff() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        let tariff = services.tariffs.create("Basic").await.unwrap();
        services
            .users
            .register(new_user("anna@example.com", "9991234567", "secret1"))
            .await
            .unwrap();

        let users = services.users.get().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].tariff.as_ref().map(|t| t.name.as_str()), Some(tariff.name.as_str()));
    }

    #[tokio::test]
    async fn deleting_a_missing_user_is_not_found() {
        let mem = MemoryStore::new();
        let services = services(&mem);
        assert!(matches!(services.users.delete(404).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(services.users.get_by_id(0).await, Err(ServiceError::InvalidArgument(_))));
    }
}

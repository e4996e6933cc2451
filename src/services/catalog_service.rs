use std::sync::Arc;
use std::time::Duration;

use super::{bounded, require_id, Designations, RepoContext, ServiceError};
use crate::database::models::{Designation, NamedEntity, Role, Service, Tariff};
use crate::database::repository::NamedRepository;

/// Which setting slot, if any, a catalog entity can occupy.
pub trait Designated {
    const SLOT: Option<Designation>;
}

impl Designated for Role {
    const SLOT: Option<Designation> = Some(Designation::SuperuserRole);
}

impl Designated for Tariff {
    const SLOT: Option<Designation> = Some(Designation::DefaultTariff);
}

impl Designated for Service {
    const SLOT: Option<Designation> = None;
}

/// Administrative CRUD for roles, tariffs and services.
pub struct CatalogService<T: NamedEntity> {
    repo: Arc<dyn NamedRepository<T>>,
    designations: Designations,
    timeout: Duration,
}

impl<T: NamedEntity> Clone for CatalogService<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            designations: self.designations.clone(),
            timeout: self.timeout,
        }
    }
}

fn clean_name(name: &str) -> Result<&str, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("name is required"));
    }
    Ok(name)
}

impl<T: NamedEntity + Designated> CatalogService<T> {
    pub fn new(repo: Arc<dyn NamedRepository<T>>, designations: Designations, timeout: Duration) -> Self {
        Self {
            repo,
            designations,
            timeout,
        }
    }

    /// Creates the record; the first live role/tariff becomes the designated one.
    pub async fn create(&self, name: &str) -> Result<T, ServiceError> {
        let name = clean_name(name)?;
        bounded(self.timeout, "create", async {
            let record = self.repo.create(name).await.context("create")?;
            if let Some(slot) = T::SLOT {
                self.designations.designate_if_unset(slot, record.id()).await?;
            }
            Ok(record)
        })
        .await
    }

    pub async fn get(&self) -> Result<Vec<T>, ServiceError> {
        bounded(self.timeout, "list", async { self.repo.list().await.context("list") }).await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<T, ServiceError> {
        let id = require_id(id, &format!("{} id", T::ENTITY))?;
        bounded(self.timeout, "get by id", async {
            self.repo
                .find_by_id(id)
                .await
                .context("get by id")?
                .ok_or_else(|| ServiceError::not_found(T::ENTITY))
        })
        .await
    }

    /// Name-only update.
    pub async fn rename(&self, id: i32, name: &str) -> Result<T, ServiceError> {
        let id = require_id(id, &format!("{} id", T::ENTITY))?;
        let name = clean_name(name)?;
        bounded(self.timeout, "rename", async { self.repo.rename(id, name).await.context("rename") }).await
    }

    /// Refuses to delete the designated default tariff or superuser role.
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        bounded(self.timeout, "delete", async {
            if let Some(slot) = T::SLOT {
                self.designations.ensure_not_designated(slot, id).await?;
            }
            self.repo.delete(id).await.context("delete")
        })
        .await
    }
}

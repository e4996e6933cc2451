//! HTTP handlers in two tiers:
//!
//! - `public`: signup, signin and catalog creation, no token required (`/pub/*`)
//! - `protected`: everything else, behind the JWT gate (`/prot/*`)
//!
//! Request bodies, paths and queries are taken as `Result<_, Rejection>` so a
//! malformed input becomes an [`ApiError`](crate::error::ApiError) with the
//! shared `{error, timestamp, path}` body instead of axum's plain-text reply.

use serde::Serialize;

use crate::database::models::{NamedEntity, Role, Service, Tariff};
use crate::services::catalog_service::Designated;
use crate::services::{CatalogService, Services};

pub mod health;
pub mod protected;
pub mod public;

/// Returned by every delete endpoint.
#[derive(Debug, Serialize)]
pub struct Deleted<I: Serialize> {
    pub id: I,
}

/// Picks the catalog service for an entity so one set of handlers serves
/// roles, tariffs and services alike.
pub trait Catalog: NamedEntity + Designated {
    fn service(services: &Services) -> &CatalogService<Self>;
}

impl Catalog for Role {
    fn service(services: &Services) -> &CatalogService<Self> {
        &services.roles
    }
}

impl Catalog for Tariff {
    fn service(services: &Services) -> &CatalogService<Self> {
        &services.tariffs
    }
}

impl Catalog for Service {
    fn service(services: &Services) -> &CatalogService<Self> {
        &services.offerings
    }
}

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{bounded, RepoContext, ServiceError};
use crate::database::models::{Designation, Setting};
use crate::database::repository::SettingRepository;

/// Default tariff / superuser role bookkeeping.
///
/// There is no in-process counter: every check reads the persisted `setting`
/// row, and designation is a check-then-set the gateway performs atomically.
#[derive(Clone)]
pub struct Designations {
    settings: Arc<dyn SettingRepository>,
    timeout: Duration,
}

impl Designations {
    pub fn new(settings: Arc<dyn SettingRepository>, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    /// The designation row; an empty record when none was ever written.
    pub async fn current(&self) -> Result<Setting, ServiceError> {
        bounded(self.timeout, "get settings", async {
            Ok(self.settings.get().await.context("get settings")?.unwrap_or_default())
        })
        .await
    }

    /// Live designated id for `slot`, if any.
    pub async fn designated(&self, slot: Designation) -> Result<Option<i32>, ServiceError> {
        self.settings.designated(slot).await.context("read designation")
    }

    /// Designates `id` unless a live designation exists.
    pub async fn designate_if_unset(&self, slot: Designation, id: i32) -> Result<bool, ServiceError> {
        let designated = self
            .settings
            .designate_if_unset(slot, id)
            .await
            .context("designate record")?;
        if designated {
            info!("Designated {} {} as {}", slot.table(), id, slot.describe());
        }
        Ok(designated)
    }

    /// Fails with `InvariantViolation` while `id` holds the designation.
    pub async fn ensure_not_designated(&self, slot: Designation, id: i32) -> Result<(), ServiceError> {
        if self.designated(slot).await? == Some(id) {
            return Err(ServiceError::InvariantViolation(format!(
                "cannot delete the {} while it is designated",
                slot.describe()
            )));
        }
        Ok(())
    }
}

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepoError, SettingRepository};
use crate::database::models::{Designation, Setting};

pub struct PgSettingRepository {
    pool: PgPool,
}

impl PgSettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn designated_sql(slot: Designation) -> String {
    format!(
        "SELECT t.id FROM \"setting\" s INNER JOIN \"{table}\" t ON t.id = s.{column} LIMIT 1",
        table = slot.table(),
        column = slot.column()
    )
}

#[async_trait]
impl SettingRepository for PgSettingRepository {
    async fn get(&self) -> Result<Option<Setting>, RepoError> {
        let setting = sqlx::query_as::<_, Setting>(r#"SELECT default_tariff_id, superuser_role_id FROM "setting" LIMIT 1"#)
            .fetch_optional(&self.pool)
            .await?;
        Ok(setting)
    }

    async fn designated(&self, slot: Designation) -> Result<Option<i32>, RepoError> {
        let id = sqlx::query_scalar::<_, i32>(&designated_sql(slot))
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn designate_if_unset(&self, slot: Designation, id: i32) -> Result<bool, RepoError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent designations; plain reads stay unblocked
        sqlx::query(r#"LOCK TABLE "setting" IN SHARE ROW EXCLUSIVE MODE"#)
            .execute(&mut *tx)
            .await?;

        let live = sqlx::query_scalar::<_, i32>(&designated_sql(slot))
            .fetch_optional(&mut *tx)
            .await?;
        if live.is_some() {
            tx.rollback().await?;
            return Ok(false);
        }

        let has_row = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "setting""#)
            .fetch_one(&mut *tx)
            .await?
            > 0;

        let sql = if has_row {
            format!("UPDATE \"setting\" SET {} = $1", slot.column())
        } else {
            format!("INSERT INTO \"setting\" ({}) VALUES ($1)", slot.column())
        };
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(true)
    }
}

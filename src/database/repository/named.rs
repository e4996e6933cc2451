use async_trait::async_trait;
use sqlx::PgPool;

use super::tx::finish_insert;
use super::{delete_by_id, NamedRepository, RepoError};
use crate::database::models::NamedEntity;

/// Postgres gateway for any `{id, name, created_at, updated_at}` table.
pub struct PgNamedRepository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: NamedEntity> PgNamedRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T: NamedEntity> NamedRepository<T> for PgNamedRepository<T> {
    async fn create(&self, name: &str) -> Result<T, RepoError> {
        let sql = format!("INSERT INTO \"{}\" (name) VALUES ($1) RETURNING *", T::TABLE);

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query_as::<_, T>(&sql)
            .bind(name)
            .fetch_one(&mut *tx)
            .await;

        finish_insert(tx, &self.pool, T::TABLE, inserted).await
    }

    async fn list(&self) -> Result<Vec<T>, RepoError> {
        let sql = format!("SELECT * FROM \"{}\" ORDER BY id", T::TABLE);
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<T>, RepoError> {
        let sql = format!("SELECT * FROM \"{}\" WHERE id = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn rename(&self, id: i32, name: &str) -> Result<T, RepoError> {
        let sql = format!(
            "UPDATE \"{}\" SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
            T::TABLE
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound(T::ENTITY))
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        delete_by_id(&self.pool, T::TABLE, T::ENTITY, id).await
    }
}

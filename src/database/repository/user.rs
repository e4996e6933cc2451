use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::tx::finish_insert;
use super::{delete_by_id, RepoError, UserRepository};
use crate::database::models::{NamedRef, User, UserInsert};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &UserInsert) -> Result<User, RepoError> {
        let query = r#"
            INSERT INTO "user" (name, last_name, middle_name, email, phone, password, tariff_id, inn, snils)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
        "#;

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query_as::<_, User>(query)
            .bind(&user.name)
            .bind(&user.last_name)
            .bind(&user.middle_name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.tariff_id)
            .bind(&user.inn)
            .bind(&user.snils)
            .fetch_one(&mut *tx)
            .await;

        finish_insert(tx, &self.pool, "user", inserted).await
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let query = r#"
            SELECT u.*, t.id AS tariff_ref_id, t.name AS tariff_ref_name
            FROM "user" u
            LEFT JOIN "tariff" t ON u.tariff_id = t.id
            ORDER BY u.id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let mut user = User::from_row(row)?;
                user.tariff = NamedRef::from_joined(row, "tariff_ref_id", "tariff_ref_name")?;
                Ok(user)
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(RepoError::from)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE phone = $1"#)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        delete_by_id(&self.pool, "user", "user", id).await
    }
}

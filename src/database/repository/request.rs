use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};

use super::tx::finish_insert;
use super::{delete_by_id, RepoError, RequestRepository};
use crate::database::models::{NamedRef, Request, RequestFilter, RequestInsert};

const DECORATED_SELECT: &str = r#"
    SELECT r.*, s.id AS service_ref_id, s.name AS service_ref_name
    FROM "request" r
    LEFT JOIN "service" s ON r.service_id = s.id
"#;

pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decorated(row: &PgRow) -> Result<Request, sqlx::Error> {
    let mut request = Request::from_row(row)?;
    request.service = NamedRef::from_joined(row, "service_ref_id", "service_ref_name")?;
    Ok(request)
}

/// Appends one `AND` predicate per set field of the filter.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RequestFilter) {
    builder.push(" WHERE 1=1");
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND r.owner_id = ").push_bind(owner_id);
    }
    if let Some(service_id) = filter.service_id {
        builder.push(" AND r.service_id = ").push_bind(service_id);
    }
    if let Some(desired_at) = filter.desired_at {
        builder.push(" AND r.desired_at <= ").push_bind(desired_at);
    }
    if let Some(status) = filter.status {
        builder.push(" AND r.status = ").push_bind(status);
    }
    if let Some(employee_id) = filter.employee_id {
        builder.push(" AND r.employee_id = ").push_bind(employee_id);
    }
    builder.push(" ORDER BY r.id");
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn create(&self, request: &RequestInsert) -> Result<Request, RepoError> {
        let query = r#"
            INSERT INTO "request" (name, service_id, owner_id, employee_id, priority, "desc", status, desired_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
        "#;

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query_as::<_, Request>(query)
            .bind(&request.name)
            .bind(request.service_id)
            .bind(request.owner_id)
            .bind(request.employee_id)
            .bind(request.priority)
            .bind(&request.description)
            .bind(request.status)
            .bind(request.desired_at)
            .fetch_one(&mut *tx)
            .await;

        finish_insert(tx, &self.pool, "request", inserted).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Request>, RepoError> {
        let query = format!("{} WHERE r.id = $1", DECORATED_SELECT);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref()
            .map(decorated)
            .transpose()
            .map_err(RepoError::from)
    }

    async fn filter(&self, filter: &RequestFilter) -> Result<Vec<Request>, RepoError> {
        let mut builder = QueryBuilder::<Postgres>::new(DECORATED_SELECT);
        push_filter(&mut builder, filter);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(decorated)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepoError::from)
    }

    async fn update_employee(&self, id: i64, employee_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE "request" SET employee_id = $1, updated_at = NOW() WHERE id = $2"#)
            .bind(employee_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("request"));
        }
        Ok(())
    }

    async fn update_status(&self, id: i64, status: i16) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE "request" SET status = $1, updated_at = NOW() WHERE id = $2"#)
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("request"));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        delete_by_id(&self.pool, "request", "request", id).await
    }
}

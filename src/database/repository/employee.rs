use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Row};
use std::collections::HashMap;

use super::tx::finish_insert;
use super::{delete_by_id, EmployeeRepository, RepoError};
use crate::database::models::{Employee, EmployeeInsert, NamedRef, Service};

pub struct PgEmployeeRepository {
    pool: PgPool,
}

impl PgEmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn specialties_of(&self, employee_id: i64) -> Result<Vec<Service>, RepoError> {
        let query = r#"
            SELECT s.* FROM "service" s
            INNER JOIN "employee_specs" es ON es.service_id = s.id
            WHERE es.employee_id = $1
            ORDER BY s.id
        "#;
        let services = sqlx::query_as::<_, Service>(query)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    async fn create(&self, employee: &EmployeeInsert) -> Result<Employee, RepoError> {
        let query = r#"
            INSERT INTO "employee" (name, last_name, middle_name, email, password, role_id, active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
        "#;

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query_as::<_, Employee>(query)
            .bind(&employee.name)
            .bind(&employee.last_name)
            .bind(&employee.middle_name)
            .bind(&employee.email)
            .bind(&employee.password_hash)
            .bind(employee.role_id)
            .fetch_one(&mut *tx)
            .await;

        finish_insert(tx, &self.pool, "employee", inserted).await
    }

    async fn list(&self) -> Result<Vec<Employee>, RepoError> {
        let query = r#"
            SELECT e.*, r.id AS role_ref_id, r.name AS role_ref_name
            FROM "employee" e
            LEFT JOIN "role" r ON e.role_id = r.id
            ORDER BY e.id
        "#;
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        // One pass over the join table instead of a query per employee
        let specs_query = r#"
            SELECT es.employee_id AS spec_employee_id, s.*
            FROM "employee_specs" es
            INNER JOIN "service" s ON es.service_id = s.id
            ORDER BY s.id
        "#;
        let spec_rows = sqlx::query(specs_query).fetch_all(&self.pool).await?;
        let mut specialties: HashMap<i64, Vec<Service>> = HashMap::new();
        for row in &spec_rows {
            let employee_id: i64 = row.try_get("spec_employee_id")?;
            specialties
                .entry(employee_id)
                .or_default()
                .push(Service::from_row(row)?);
        }

        let mut employees = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut employee = Employee::from_row(row)?;
            employee.role = NamedRef::from_joined(row, "role_ref_id", "role_ref_name")?;
            employee.services = specialties.remove(&employee.id).unwrap_or_default();
            employees.push(employee);
        }
        Ok(employees)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepoError> {
        let employee = sqlx::query_as::<_, Employee>(r#"SELECT * FROM "employee" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match employee {
            Some(mut employee) => {
                employee.services = self.specialties_of(employee.id).await?;
                Ok(Some(employee))
            }
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepoError> {
        let employee = sqlx::query_as::<_, Employee>(r#"SELECT * FROM "employee" WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        delete_by_id(&self.pool, "employee", "employee", id).await
    }

    async fn grant_specialty(&self, employee_id: i64, service_id: i32) -> Result<bool, RepoError> {
        let query = r#"
            INSERT INTO "employee_specs" (employee_id, service_id)
            VALUES ($1, $2)
            ON CONFLICT (employee_id, service_id) DO NOTHING
        "#;
        let result = sqlx::query(query)
            .bind(employee_id)
            .bind(service_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_specialty(&self, employee_id: i64, service_id: i32) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM "employee_specs" WHERE employee_id = $1 AND service_id = $2"#)
            .bind(employee_id)
            .bind(service_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

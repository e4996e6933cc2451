//! Postgres gateway tests. They run against `DATABASE_URL` (read from the
//! environment or `.env`) and are skipped when it is not set. Each test works in
//! its own schema, which is dropped at the end.

use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use service_desk::database::models::{
    Designation, EmployeeInsert, RequestFilter, RequestInsert, Role, Service, Tariff, UserInsert,
};
use service_desk::database::{RepoError, Store};

const SCHEMA_SQL: &str = include_str!("../schemas/v1/schema.sql");

static NEXT_SCHEMA: AtomicU32 = AtomicU32::new(0);

struct PgFixture {
    pool: PgPool,
    store: Store,
    schema: String,
}

impl PgFixture {
    async fn drop_schema(self) -> Result<()> {
        let sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema);
        self.pool.execute(sql.as_str()).await?;
        self.pool.close().await;
        Ok(())
    }
}

async fn pg_fixture() -> Result<Option<PgFixture>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping Postgres gateway test");
        return Ok(None);
    };

    let schema = format!(
        "desk_test_{}_{}",
        std::process::id(),
        NEXT_SCHEMA.fetch_add(1, Ordering::SeqCst)
    );
    let search_path = schema.clone();
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .after_connect(move |conn, _meta| {
            let sql = format!("CREATE SCHEMA IF NOT EXISTS {0}; SET search_path TO {0}", search_path);
            Box::pin(async move {
                conn.execute(sql.as_str()).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await?;
    pool.execute(SCHEMA_SQL).await?;

    Ok(Some(PgFixture {
        store: Store::postgres(pool.clone()),
        pool,
        schema,
    }))
}

fn user(email: &str, phone: &str, tariff_id: i32) -> UserInsert {
    UserInsert {
        name: "Anna".to_string(),
        last_name: "Petrova".to_string(),
        middle_name: None,
        email: email.to_string(),
        phone: phone.to_string(),
        password_hash: "$argon2id$stub".to_string(),
        tariff_id,
        inn: None,
        snils: None,
    }
}

fn request(service_id: i32, owner_id: i64) -> RequestInsert {
    RequestInsert {
        name: Some("Passport renewal".to_string()),
        service_id,
        owner_id,
        employee_id: None,
        priority: 1,
        description: Some("before May".to_string()),
        status: 1,
        desired_at: None,
    }
}

#[tokio::test]
async fn failed_insert_leaves_no_gap_in_ids() -> Result<()> {
    let Some(pg) = pg_fixture().await? else { return Ok(()) };
    let store = &pg.store;

    let tariff: Tariff = store.tariffs.create("Basic").await?;
    let first = store.users.create(&user("a@example.com", "+79991234567", tariff.id)).await?;

    let duplicate = store.users.create(&user("b@example.com", "+79991234567", tariff.id)).await;
    assert!(matches!(duplicate, Err(RepoError::ConstraintViolation(_))));

    let second = store.users.create(&user("c@example.com", "+79990000000", tariff.id)).await?;
    assert_eq!(second.id, first.id + 1);

    let by_phone = store.users.find_by_phone("+79991234567").await?;
    assert_eq!(by_phone.map(|u| u.id), Some(first.id));

    pg.drop_schema().await
}

#[tokio::test]
async fn lists_carry_left_join_decorations() -> Result<()> {
    let Some(pg) = pg_fixture().await? else { return Ok(()) };
    let store = &pg.store;

    let tariff: Tariff = store.tariffs.create("Basic").await?;
    let role: Role = store.roles.create("operator").await?;
    let offering: Service = store.services.create("Consulting").await?;
    store.users.create(&user("a@example.com", "+79991234567", tariff.id)).await?;
    let employee = store
        .employees
        .create(&EmployeeInsert {
            name: "Ivan".to_string(),
            last_name: "Sidorov".to_string(),
            middle_name: None,
            email: "ivan@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role_id: role.id,
        })
        .await?;
    assert!(employee.active);

    assert!(store.employees.grant_specialty(employee.id, offering.id).await?);
    assert!(!store.employees.grant_specialty(employee.id, offering.id).await?);

    let users = store.users.list().await?;
    assert_eq!(users[0].tariff.as_ref().map(|t| t.name.as_str()), Some("Basic"));

    let employees = store.employees.list().await?;
    assert_eq!(employees[0].role.as_ref().map(|r| r.id), Some(role.id));
    assert_eq!(employees[0].services, vec![offering.clone()]);

    assert!(store.employees.revoke_specialty(employee.id, offering.id).await?);
    assert!(!store.employees.revoke_specialty(employee.id, offering.id).await?);

    pg.drop_schema().await
}

#[tokio::test]
async fn request_filter_is_conjunctive() -> Result<()> {
    let Some(pg) = pg_fixture().await? else { return Ok(()) };
    let store = &pg.store;

    let tariff: Tariff = store.tariffs.create("Basic").await?;
    let consulting: Service = store.services.create("Consulting").await?;
    let notary: Service = store.services.create("Notary").await?;
    let anna = store.users.create(&user("a@example.com", "+79991234567", tariff.id)).await?;
    let boris = store.users.create(&user("b@example.com", "+79990000000", tariff.id)).await?;

    let wanted = store.requests.create(&request(consulting.id, anna.id)).await?;
    store.requests.create(&request(notary.id, anna.id)).await?;
    store.requests.create(&request(consulting.id, boris.id)).await?;

    let found = store
        .requests
        .filter(&RequestFilter {
            owner_id: Some(anna.id),
            service_id: Some(consulting.id),
            ..Default::default()
        })
        .await?;
    assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![wanted.id]);
    assert_eq!(found[0].service.as_ref().map(|s| s.name.as_str()), Some("Consulting"));
    assert_eq!(found[0].description.as_deref(), Some("before May"));

    store.requests.update_status(wanted.id, 3).await?;
    let by_status = store
        .requests
        .filter(&RequestFilter {
            status: Some(3),
            ..Default::default()
        })
        .await?;
    assert_eq!(by_status.len(), 1);
    assert!(matches!(store.requests.update_status(9999, 2).await, Err(RepoError::NotFound(_))));

    // The request stays after its owner is deleted
    store.users.delete(anna.id).await?;
    let kept = store.requests.find_by_id(wanted.id).await?;
    assert_eq!(kept.map(|r| r.owner_id), Some(anna.id));

    pg.drop_schema().await
}

#[tokio::test]
async fn designation_is_set_once_while_live() -> Result<()> {
    let Some(pg) = pg_fixture().await? else { return Ok(()) };
    let store = &pg.store;

    let basic: Tariff = store.tariffs.create("Basic").await?;
    let premium: Tariff = store.tariffs.create("Premium").await?;

    assert_eq!(store.settings.designated(Designation::DefaultTariff).await?, None);
    assert!(store.settings.designate_if_unset(Designation::DefaultTariff, basic.id).await?);
    assert!(!store.settings.designate_if_unset(Designation::DefaultTariff, premium.id).await?);
    assert_eq!(store.settings.designated(Designation::DefaultTariff).await?, Some(basic.id));

    // Deleting the designated row clears the slot; the next candidate wins
    store.tariffs.delete(basic.id).await?;
    assert_eq!(store.settings.designated(Designation::DefaultTariff).await?, None);
    assert!(store.settings.designate_if_unset(Designation::DefaultTariff, premium.id).await?);

    let setting = store.settings.get().await?.unwrap_or_default();
    assert_eq!(setting.default_tariff_id, Some(premium.id));
    assert_eq!(setting.superuser_role_id, None);

    store.health.ping().await?;
    pg.drop_schema().await
}

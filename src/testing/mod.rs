//! In-memory persistence gateway for unit and router tests.
//!
//! `MemoryStore` mirrors the Postgres schema's rules: unique email/phone,
//! foreign keys (restrict, cascade and set-null as declared in
//! `schemas/v1/schema.sql`), and the zero-or-one `setting` row. Faults can
//! be injected per entity to exercise error paths.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::database::models::{
    Designation, Employee, EmployeeInsert, NamedEntity, Request, RequestFilter, RequestInsert, Role,
    Service, Setting, Tariff, User, UserInsert,
};
use crate::database::repository::{
    EmployeeRepository, NamedRepository, RepoError, RequestRepository, SettingRepository, Store, StoreHealth,
    UserRepository,
};

struct NamedTable<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Default for NamedTable<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

#[derive(Default)]
struct Tables {
    roles: NamedTable<Role>,
    tariffs: NamedTable<Tariff>,
    services: NamedTable<Service>,
    users: BTreeMap<i64, User>,
    employees: BTreeMap<i64, Employee>,
    specs: BTreeSet<(i64, i32)>,
    requests: BTreeMap<i64, Request>,
    setting: Option<Setting>,
    last_user_id: i64,
    last_employee_id: i64,
    last_request_id: i64,
}

impl Tables {
    fn designated(&self, slot: Designation) -> Option<i32> {
        let id = self.setting.as_ref().and_then(|s| slot.slot(s))?;
        let exists = match slot {
            Designation::DefaultTariff => self.tariffs.rows.contains_key(&id),
            Designation::SuperuserRole => self.roles.rows.contains_key(&id),
        };
        exists.then_some(id)
    }

    fn clear_designation(&mut self, slot: Designation, id: i32) {
        if let Some(setting) = self.setting.as_mut() {
            let current = slot.slot_mut(setting);
            if *current == Some(id) {
                *current = None;
            }
        }
    }

    fn specialties_of(&self, employee_id: i64) -> Vec<Service> {
        self.specs
            .iter()
            .filter(|(e, _)| *e == employee_id)
            .filter_map(|(_, s)| self.services.rows.get(s).cloned())
            .collect()
    }

    fn decorate_request(&self, request: &Request) -> Request {
        let mut request = request.clone();
        request.service = self.services.rows.get(&request.service_id).map(|s| s.to_named_ref());
        request
    }
}

/// Per-table access plus the delete rules the schema attaches to each table.
trait MemoryTable: NamedEntity {
    fn table(tables: &Tables) -> &NamedTable<Self>;
    fn table_mut(tables: &mut Tables) -> &mut NamedTable<Self>;
    /// Applies restrict / cascade / set-null rules before the row goes away.
    fn on_delete(tables: &mut Tables, id: i32) -> Result<(), RepoError>;
}

impl MemoryTable for Role {
    fn table(tables: &Tables) -> &NamedTable<Self> {
        &tables.roles
    }
    fn table_mut(tables: &mut Tables) -> &mut NamedTable<Self> {
        &mut tables.roles
    }
    fn on_delete(tables: &mut Tables, id: i32) -> Result<(), RepoError> {
        if tables.employees.values().any(|e| e.role_id == id) {
            return Err(RepoError::ConstraintViolation(
                "role is still referenced from table \"employee\"".to_string(),
            ));
        }
        tables.clear_designation(Designation::SuperuserRole, id);
        Ok(())
    }
}

impl MemoryTable for Tariff {
    fn table(tables: &Tables) -> &NamedTable<Self> {
        &tables.tariffs
    }
    fn table_mut(tables: &mut Tables) -> &mut NamedTable<Self> {
        &mut tables.tariffs
    }
    fn on_delete(tables: &mut Tables, id: i32) -> Result<(), RepoError> {
        if tables.users.values().any(|u| u.tariff_id == id) {
            return Err(RepoError::ConstraintViolation(
                "tariff is still referenced from table \"user\"".to_string(),
            ));
        }
        tables.clear_designation(Designation::DefaultTariff, id);
        Ok(())
    }
}

impl MemoryTable for Service {
    fn table(tables: &Tables) -> &NamedTable<Self> {
        &tables.services
    }
    fn table_mut(tables: &mut Tables) -> &mut NamedTable<Self> {
        &mut tables.services
    }
    fn on_delete(tables: &mut Tables, id: i32) -> Result<(), RepoError> {
        if tables.requests.values().any(|r| r.service_id == id) {
            return Err(RepoError::ConstraintViolation(
                "service is still referenced from table \"request\"".to_string(),
            ));
        }
        tables.specs.retain(|(_, s)| *s != id);
        Ok(())
    }
}

#[derive(Default)]
struct Faults {
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
}

/// Shared in-memory database; clones see the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<RwLock<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every gateway in one `Store`, all backed by this instance.
    pub fn store(&self) -> Store {
        Store {
            roles: Arc::new(self.clone()),
            tariffs: Arc::new(self.clone()),
            services: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
            employees: Arc::new(self.clone()),
            requests: Arc::new(self.clone()),
            settings: Arc::new(self.clone()),
            health: Arc::new(self.clone()),
        }
    }

    /// Makes every operation on `entity` ("user", "employee", ...) fail with `Io`.
    pub async fn fail(&self, entity: &'static str) {
        self.faults.write().await.failing.insert(entity);
    }

    pub async fn heal(&self, entity: &'static str) {
        self.faults.write().await.failing.remove(entity);
    }

    /// Delays every operation, for exercising service time bounds.
    pub async fn delay_all(&self, delay: Duration) {
        self.faults.write().await.delay = Some(delay);
    }

    async fn check(&self, entity: &'static str) -> Result<(), RepoError> {
        let (failing, delay) = {
            let faults = self.faults.read().await;
            (faults.failing.contains(entity), faults.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(RepoError::Io(format!("{} table unavailable", entity)));
        }
        Ok(())
    }
}

fn unique_violation(table: &str, column: &str) -> RepoError {
    RepoError::ConstraintViolation(format!(
        "duplicate key value violates unique constraint \"{}_{}_key\"",
        table, column
    ))
}

fn missing_reference(table: &str, column: &str) -> RepoError {
    RepoError::ConstraintViolation(format!(
        "insert or update on table \"{}\" violates foreign key constraint on {}",
        table, column
    ))
}

impl MemoryStore {
    async fn named_create<T: MemoryTable>(&self, name: &str) -> Result<T, RepoError> {
        self.check(T::ENTITY).await?;
        let mut tables = self.tables.write().await;
        let table = T::table_mut(&mut tables);
        table.last_id += 1;
        let row = T::new_record(table.last_id, name.to_string(), Utc::now());
        table.rows.insert(row.id(), row.clone());
        Ok(row)
    }

    async fn named_list<T: MemoryTable>(&self) -> Result<Vec<T>, RepoError> {
        self.check(T::ENTITY).await?;
        let tables = self.tables.read().await;
        Ok(T::table(&tables).rows.values().cloned().collect())
    }

    async fn named_find<T: MemoryTable>(&self, id: i32) -> Result<Option<T>, RepoError> {
        self.check(T::ENTITY).await?;
        let tables = self.tables.read().await;
        Ok(T::table(&tables).rows.get(&id).cloned())
    }

    async fn named_rename<T: MemoryTable>(&self, id: i32, name: &str) -> Result<T, RepoError> {
        self.check(T::ENTITY).await?;
        let mut tables = self.tables.write().await;
        let row = T::table_mut(&mut tables)
            .rows
            .get_mut(&id)
            .ok_or(RepoError::NotFound(T::ENTITY))?;
        row.rename(name.to_string(), Utc::now());
        Ok(row.clone())
    }

    async fn named_delete<T: MemoryTable>(&self, id: i32) -> Result<(), RepoError> {
        self.check(T::ENTITY).await?;
        let mut tables = self.tables.write().await;
        if !T::table(&tables).rows.contains_key(&id) {
            return Err(RepoError::NotFound(T::ENTITY));
        }
        T::on_delete(&mut tables, id)?;
        T::table_mut(&mut tables).rows.remove(&id);
        Ok(())
    }
}

macro_rules! memory_named_repository {
    ($ty:ty) => {
        #[async_trait]
        impl NamedRepository<$ty> for MemoryStore {
            async fn create(&self, name: &str) -> Result<$ty, RepoError> {
                self.named_create(name).await
            }
            async fn list(&self) -> Result<Vec<$ty>, RepoError> {
                self.named_list().await
            }
            async fn find_by_id(&self, id: i32) -> Result<Option<$ty>, RepoError> {
                self.named_find(id).await
            }
            async fn rename(&self, id: i32, name: &str) -> Result<$ty, RepoError> {
                self.named_rename(id, name).await
            }
            async fn delete(&self, id: i32) -> Result<(), RepoError> {
                self.named_delete::<$ty>(id).await
            }
        }
    };
}

memory_named_repository!(Role);
memory_named_repository!(Tariff);
memory_named_repository!(Service);

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &UserInsert) -> Result<User, RepoError> {
        self.check("user").await?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(unique_violation("user", "email"));
        }
        if tables.users.values().any(|u| u.phone == user.phone) {
            return Err(unique_violation("user", "phone"));
        }
        if !tables.tariffs.rows.contains_key(&user.tariff_id) {
            return Err(missing_reference("user", "tariff_id"));
        }

        tables.last_user_id += 1;
        let row = User {
            id: tables.last_user_id,
            name: user.name.clone(),
            last_name: user.last_name.clone(),
            middle_name: user.middle_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            password: user.password_hash.clone(),
            tariff_id: user.tariff_id,
            tariff: None,
            inn: user.inn.clone(),
            snils: user.snils.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        self.check("user").await?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .map(|u| {
                let mut user = u.clone();
                user.tariff = tables.tariffs.rows.get(&u.tariff_id).map(|t| t.to_named_ref());
                user
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        self.check("user").await?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepoError> {
        self.check("user").await?;
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.phone == phone).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.check("user").await?;
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound("user"));
        }
        // Requests keep their owner_id; owner_id carries no foreign key.
        Ok(())
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn create(&self, employee: &EmployeeInsert) -> Result<Employee, RepoError> {
        self.check("employee").await?;
        let mut tables = self.tables.write().await;
        if tables.employees.values().any(|e| e.email == employee.email) {
            return Err(unique_violation("employee", "email"));
        }
        if !tables.roles.rows.contains_key(&employee.role_id) {
            return Err(missing_reference("employee", "role_id"));
        }

        tables.last_employee_id += 1;
        let row = Employee {
            id: tables.last_employee_id,
            name: employee.name.clone(),
            last_name: employee.last_name.clone(),
            middle_name: employee.middle_name.clone(),
            email: employee.email.clone(),
            password: employee.password_hash.clone(),
            role_id: employee.role_id,
            role: None,
            services: Vec::new(),
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.employees.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Employee>, RepoError> {
        self.check("employee").await?;
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .values()
            .map(|e| {
                let mut employee = e.clone();
                employee.role = tables.roles.rows.get(&e.role_id).map(|r| r.to_named_ref());
                employee.services = tables.specialties_of(e.id);
                employee
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepoError> {
        self.check("employee").await?;
        let tables = self.tables.read().await;
        Ok(tables.employees.get(&id).map(|e| {
            let mut employee = e.clone();
            employee.services = tables.specialties_of(id);
            employee
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepoError> {
        self.check("employee").await?;
        let tables = self.tables.read().await;
        Ok(tables.employees.values().find(|e| e.email == email).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.check("employee").await?;
        let mut tables = self.tables.write().await;
        if tables.employees.remove(&id).is_none() {
            return Err(RepoError::NotFound("employee"));
        }
        tables.specs.retain(|(e, _)| *e != id);
        for request in tables.requests.values_mut() {
            if request.employee_id == Some(id) {
                request.employee_id = None;
            }
        }
        Ok(())
    }

    async fn grant_specialty(&self, employee_id: i64, service_id: i32) -> Result<bool, RepoError> {
        self.check("employee").await?;
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(&employee_id) {
            return Err(missing_reference("employee_specs", "employee_id"));
        }
        if !tables.services.rows.contains_key(&service_id) {
            return Err(missing_reference("employee_specs", "service_id"));
        }
        Ok(tables.specs.insert((employee_id, service_id)))
    }

    async fn revoke_specialty(&self, employee_id: i64, service_id: i32) -> Result<bool, RepoError> {
        self.check("employee").await?;
        Ok(self.tables.write().await.specs.remove(&(employee_id, service_id)))
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn create(&self, request: &RequestInsert) -> Result<Request, RepoError> {
        self.check("request").await?;
        let mut tables = self.tables.write().await;
        if !tables.services.rows.contains_key(&request.service_id) {
            return Err(missing_reference("request", "service_id"));
        }
        if let Some(employee_id) = request.employee_id {
            if !tables.employees.contains_key(&employee_id) {
                return Err(missing_reference("request", "employee_id"));
            }
        }

        tables.last_request_id += 1;
        let row = Request {
            id: tables.last_request_id,
            name: request.name.clone(),
            service_id: request.service_id,
            service: None,
            owner_id: request.owner_id,
            user: None,
            employee_id: request.employee_id,
            employee: None,
            priority: request.priority,
            description: request.description.clone(),
            status: request.status,
            created_at: Utc::now(),
            updated_at: None,
            desired_at: request.desired_at,
            closed_at: None,
        };
        tables.requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Request>, RepoError> {
        self.check("request").await?;
        let tables = self.tables.read().await;
        Ok(tables.requests.get(&id).map(|r| tables.decorate_request(r)))
    }

    async fn filter(&self, filter: &RequestFilter) -> Result<Vec<Request>, RepoError> {
        self.check("request").await?;
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| tables.decorate_request(r))
            .collect())
    }

    async fn update_employee(&self, id: i64, employee_id: i64) -> Result<(), RepoError> {
        self.check("request").await?;
        let mut tables = self.tables.write().await;
        if !tables.requests.contains_key(&id) {
            return Err(RepoError::NotFound("request"));
        }
        if !tables.employees.contains_key(&employee_id) {
            return Err(missing_reference("request", "employee_id"));
        }
        if let Some(request) = tables.requests.get_mut(&id) {
            request.employee_id = Some(employee_id);
            request.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_status(&self, id: i64, status: i16) -> Result<(), RepoError> {
        self.check("request").await?;
        let mut tables = self.tables.write().await;
        let request = tables.requests.get_mut(&id).ok_or(RepoError::NotFound("request"))?;
        request.status = status;
        request.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.check("request").await?;
        match self.tables.write().await.requests.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound("request")),
        }
    }
}

#[async_trait]
impl SettingRepository for MemoryStore {
    async fn get(&self) -> Result<Option<Setting>, RepoError> {
        self.check("setting").await?;
        Ok(self.tables.read().await.setting.clone())
    }

    async fn designated(&self, slot: Designation) -> Result<Option<i32>, RepoError> {
        self.check("setting").await?;
        Ok(self.tables.read().await.designated(slot))
    }

    async fn designate_if_unset(&self, slot: Designation, id: i32) -> Result<bool, RepoError> {
        self.check("setting").await?;
        // The write guard plays the part of the table lock
        let mut tables = self.tables.write().await;
        if tables.designated(slot).is_some() {
            return Ok(false);
        }
        let setting = tables.setting.get_or_insert_with(Setting::default);
        *slot.slot_mut(setting) = Some(id);
        Ok(true)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check("health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_insert(email: &str, phone: &str, tariff_id: i32) -> UserInsert {
        UserInsert {
            name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            middle_name: None,
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "hash".to_string(),
            tariff_id,
            inn: None,
            snils: None,
        }
    }

    #[tokio::test]
    async fn unique_phone_is_enforced() {
        let mem = MemoryStore::new();
        let store = mem.store();
        let tariff = store.tariffs.create("Basic").await.unwrap();

        store
            .users
            .create(&user_insert("a@example.com", "+79001234567", tariff.id))
            .await
            .unwrap();
        let err = store
            .users
            .create(&user_insert("b@example.com", "+79001234567", tariff.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn deleting_a_tariff_clears_its_designation() {
        let mem = MemoryStore::new();
        let store = mem.store();
        let tariff = store.tariffs.create("Basic").await.unwrap();
        assert!(store.settings.designate_if_unset(Designation::DefaultTariff, tariff.id).await.unwrap());

        store.tariffs.delete(tariff.id).await.unwrap();
        assert_eq!(store.settings.designated(Designation::DefaultTariff).await.unwrap(), None);
        assert_eq!(store.settings.get().await.unwrap(), Some(Setting::default()));
    }

    #[tokio::test]
    async fn injected_faults_surface_as_io() {
        let mem = MemoryStore::new();
        mem.fail("user").await;
        let err = mem.store().users.find_by_id(1).await.unwrap_err();
        assert!(matches!(err, RepoError::Io(_)));

        mem.heal("user").await;
        assert!(mem.store().users.find_by_id(1).await.unwrap().is_none());
    }
}

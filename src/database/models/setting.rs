use serde::Serialize;
use sqlx::FromRow;

/// Process-wide singleton row. The table holds zero or one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct Setting {
    pub default_tariff_id: Option<i32>,
    pub superuser_role_id: Option<i32>,
}

/// A slot of the `setting` row that designates one record as special.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Designation {
    DefaultTariff,
    SuperuserRole,
}

impl Designation {
    /// Column in `setting` holding the designated id.
    pub fn column(self) -> &'static str {
        match self {
            Designation::DefaultTariff => "default_tariff_id",
            Designation::SuperuserRole => "superuser_role_id",
        }
    }

    /// Table the designated id points into.
    pub fn table(self) -> &'static str {
        match self {
            Designation::DefaultTariff => "tariff",
            Designation::SuperuserRole => "role",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Designation::DefaultTariff => "default tariff",
            Designation::SuperuserRole => "superuser role",
        }
    }

    pub fn slot(self, setting: &Setting) -> Option<i32> {
        match self {
            Designation::DefaultTariff => setting.default_tariff_id,
            Designation::SuperuserRole => setting.superuser_role_id,
        }
    }

    pub fn slot_mut(self, setting: &mut Setting) -> &mut Option<i32> {
        match self {
            Designation::DefaultTariff => &mut setting.default_tariff_id,
            Designation::SuperuserRole => &mut setting.superuser_role_id,
        }
    }
}

use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::db::personal_data::PersonalData;
use crate::db::schema::roles;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Role {
    pub id: Uuid,
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub concurrency_stamp: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: Some(name.into()),
            normalized_name: None,
            concurrency_stamp: None,
        }
    }
}

// Roles carry no personal data.
impl PersonalData for Role {}

use diesel::{Insertable, Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::db::personal_data::PersonalData;
use crate::db::schema::user_tokens;

#[derive(Queryable, Selectable, Insertable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = user_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserToken {
    pub user_id: Uuid,
    pub login_provider: String,
    pub name: String,
    pub value: Option<String>,
}

impl PersonalData for UserToken {
    const PERSONAL_DATA: Option<&'static [&'static str]> = Some(&["value"]);
}

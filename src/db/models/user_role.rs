use diesel::{Insertable, Queryable, Selectable};
use uuid::Uuid;

use crate::db::schema::user_roles;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = user_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

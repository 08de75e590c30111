use diesel::{Insertable, Queryable, Selectable};
use identity_store_api::UserLoginInfo;
use uuid::Uuid;

use crate::db::schema::user_logins;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = user_logins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserLogin {
    pub login_provider: String,
    pub provider_key: String,
    pub provider_display_name: Option<String>,
    pub user_id: Uuid,
}

impl UserLogin {
    pub fn new(user_id: Uuid, login: &UserLoginInfo) -> Self {
        Self {
            login_provider: login.login_provider.clone(),
            provider_key: login.provider_key.clone(),
            provider_display_name: login.display_name.clone(),
            user_id,
        }
    }
}

impl From<UserLogin> for UserLoginInfo {
    fn from(row: UserLogin) -> Self {
        UserLoginInfo {
            login_provider: row.login_provider,
            provider_key: row.provider_key,
            display_name: row.provider_display_name,
        }
    }
}

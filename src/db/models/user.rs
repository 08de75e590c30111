use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::db::personal_data::PersonalData;
use crate::db::schema::users;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub normalized_username: Option<String>,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    pub concurrency_stamp: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
}

impl User {
    /// Nouvel utilisateur avec un id et un security stamp frais
    pub fn new(email: impl Into<String>, username: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            normalized_username: None,
            email: Some(email.into()),
            normalized_email: None,
            email_confirmed: false,
            password_hash: None,
            security_stamp: Some(Uuid::new_v4().to_string()),
            concurrency_stamp: None,
            phone_number: None,
            phone_number_confirmed: false,
            two_factor_enabled: false,
            lockout_end: None,
            lockout_enabled: true,
            access_failed_count: 0,
        }
    }

    /// Applies `f` to every column holding personal data
    #[must_use]
    pub fn map_personal_fields<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<String>) -> Option<String>,
    {
        self.username = f(self.username.take());
        self.normalized_username = f(self.normalized_username.take());
        self.email = f(self.email.take());
        self.normalized_email = f(self.normalized_email.take());
        self.phone_number = f(self.phone_number.take());
        self
    }
}

impl PersonalData for User {
    const PERSONAL_DATA: Option<&'static [&'static str]> = Some(&[
        "id",
        "username",
        "email",
        "email_confirmed",
        "phone_number",
        "phone_number_confirmed",
        "two_factor_enabled",
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("alex@email.com", Some("alex".to_string()));

        assert_eq!(user.email.as_deref(), Some("alex@email.com"));
        assert_eq!(user.username.as_deref(), Some("alex"));
        assert!(user.security_stamp.is_some());
        assert!(user.concurrency_stamp.is_none());
        assert!(user.lockout_enabled);
        assert!(!user.two_factor_enabled);
        assert_eq!(user.access_failed_count, 0);
    }

    #[test]
    fn test_new_users_get_distinct_ids_and_stamps() {
        let a = User::new("a@email.com", None);
        let b = User::new("b@email.com", None);
        assert_ne!(a.id, b.id);
        assert_ne!(a.security_stamp, b.security_stamp);
    }

    #[test]
    fn test_map_personal_fields_leaves_other_columns_alone() {
        let mut user = User::new("a@email.com", Some("a".to_string()));
        user.phone_number = Some("555".to_string());
        user.password_hash = Some("hash".to_string());

        let mapped = user
            .clone()
            .map_personal_fields(|v| v.map(|s| s.to_uppercase()));

        assert_eq!(mapped.email.as_deref(), Some("A@EMAIL.COM"));
        assert_eq!(mapped.username.as_deref(), Some("A"));
        assert_eq!(mapped.phone_number.as_deref(), Some("555"));
        assert_eq!(mapped.password_hash, user.password_hash);
        assert_eq!(mapped.security_stamp, user.security_stamp);
    }
}

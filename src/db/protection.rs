use std::sync::Arc;

use identity_store_api::PersonalDataProtector;

use crate::db::models::User;

/// Applies the configured protector to personal data columns.
///
/// Without a protector every value passes through unchanged. Empty values
/// are never transformed.
#[derive(Clone, Default)]
pub struct PersonalDataField {
    protector: Option<Arc<dyn PersonalDataProtector>>,
}

impl PersonalDataField {
    pub fn new(protector: Option<Arc<dyn PersonalDataProtector>>) -> Self {
        Self { protector }
    }

    pub fn is_enabled(&self) -> bool {
        self.protector.is_some()
    }

    /// Value as written to the database
    pub fn protect(&self, value: &str) -> String {
        match &self.protector {
            Some(protector) if !value.is_empty() => protector.protect(value),
            _ => value.to_string(),
        }
    }

    /// Value as handed back to the caller
    pub fn unprotect(&self, value: &str) -> String {
        match &self.protector {
            Some(protector) if !value.is_empty() => protector.unprotect(value),
            _ => value.to_string(),
        }
    }

    pub fn protect_user(&self, user: User) -> User {
        if !self.is_enabled() {
            return user;
        }
        user.map_personal_fields(|value| value.map(|v| self.protect(&v)))
    }

    pub fn unprotect_user(&self, user: User) -> User {
        if !self.is_enabled() {
            return user;
        }
        user.map_personal_fields(|value| value.map(|v| self.unprotect(&v)))
    }
}

impl std::fmt::Debug for PersonalDataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalDataField")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

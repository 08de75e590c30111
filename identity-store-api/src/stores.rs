//! Store capabilities consumed by the identity framework.
//!
//! Every capability is a narrow trait. A backend implements the ones it
//! supports on a single store type; entity and error types are associated
//! types so the framework stays independent of the persistence model.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::claims::Claim;
use crate::login::UserLoginInfo;

// -------- ROLES --------

pub trait RoleStore {
    type Role;
    type Error;

    /// Every role, in no particular order
    fn all(&mut self) -> Result<Vec<Self::Role>, Self::Error>;

    /// Inserts the role, then refreshes it from the stored row
    fn create(&mut self, role: &mut Self::Role) -> Result<(), Self::Error>;

    /// Rotates the concurrency stamp, persists the role and refreshes it
    fn update(&mut self, role: &mut Self::Role) -> Result<(), Self::Error>;

    fn delete(&mut self, role: &Self::Role) -> Result<(), Self::Error>;

    fn find_by_id(&mut self, role_id: &str) -> Result<Option<Self::Role>, Self::Error>;

    fn find_by_name(&mut self, normalized_name: &str) -> Result<Option<Self::Role>, Self::Error>;

    fn get_role_id(&self, role: &Self::Role) -> Result<String, Self::Error>;

    fn get_role_name(&self, role: &Self::Role) -> Result<Option<String>, Self::Error>;

    fn set_role_name(&self, role: &mut Self::Role, name: Option<String>)
    -> Result<(), Self::Error>;

    fn get_normalized_role_name(&self, role: &Self::Role) -> Result<Option<String>, Self::Error>;

    fn set_normalized_role_name(
        &self,
        role: &mut Self::Role,
        normalized_name: Option<String>,
    ) -> Result<(), Self::Error>;
}

pub trait RoleClaimStore: RoleStore {
    fn get_claims(&mut self, role: &Self::Role) -> Result<Vec<Claim>, Self::Error>;

    fn add_claim(&mut self, role: &Self::Role, claim: &Claim) -> Result<(), Self::Error>;

    /// Removes the rows matching (role, type, value). No match is not an error.
    fn remove_claim(&mut self, role: &Self::Role, claim: &Claim) -> Result<(), Self::Error>;
}

// -------- USERS --------

pub trait UserStore {
    type User;
    type Error;

    fn all(&mut self) -> Result<Vec<Self::User>, Self::Error>;

    fn create(&mut self, user: &mut Self::User) -> Result<(), Self::Error>;

    /// Rotates the concurrency stamp, persists the user and refreshes it
    fn update(&mut self, user: &mut Self::User) -> Result<(), Self::Error>;

    fn delete(&mut self, user: &Self::User) -> Result<(), Self::Error>;

    fn find_by_id(&mut self, user_id: &str) -> Result<Option<Self::User>, Self::Error>;

    fn find_by_name(&mut self, normalized_username: &str)
    -> Result<Option<Self::User>, Self::Error>;

    fn get_user_id(&self, user: &Self::User) -> Result<String, Self::Error>;

    fn get_username(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    fn set_username(&self, user: &mut Self::User, username: Option<String>)
    -> Result<(), Self::Error>;

    fn get_normalized_username(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    fn set_normalized_username(
        &self,
        user: &mut Self::User,
        normalized_username: Option<String>,
    ) -> Result<(), Self::Error>;
}

pub trait UserEmailStore: UserStore {
    fn find_by_email(&mut self, normalized_email: &str)
    -> Result<Option<Self::User>, Self::Error>;

    fn get_email(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    fn set_email(&self, user: &mut Self::User, email: Option<String>) -> Result<(), Self::Error>;

    fn get_normalized_email(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    fn set_normalized_email(
        &self,
        user: &mut Self::User,
        normalized_email: Option<String>,
    ) -> Result<(), Self::Error>;

    /// False when the user has no email at all
    fn get_email_confirmed(&self, user: &Self::User) -> Result<bool, Self::Error>;

    fn set_email_confirmed(&self, user: &mut Self::User, confirmed: bool)
    -> Result<(), Self::Error>;
}

pub trait UserPasswordStore: UserStore {
    fn get_password_hash(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    fn set_password_hash(
        &self,
        user: &mut Self::User,
        password_hash: Option<String>,
    ) -> Result<(), Self::Error>;

    fn has_password(&self, user: &Self::User) -> Result<bool, Self::Error>;
}

pub trait UserPhoneNumberStore: UserStore {
    fn get_phone_number(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    fn set_phone_number(
        &self,
        user: &mut Self::User,
        phone_number: Option<String>,
    ) -> Result<(), Self::Error>;

    /// False when the user has no phone number at all
    fn get_phone_number_confirmed(&self, user: &Self::User) -> Result<bool, Self::Error>;

    fn set_phone_number_confirmed(
        &self,
        user: &mut Self::User,
        confirmed: bool,
    ) -> Result<(), Self::Error>;
}

pub trait UserLockoutStore: UserStore {
    fn get_access_failed_count(&self, user: &Self::User) -> Result<i32, Self::Error>;

    /// Returns the new count
    fn increment_access_failed_count(&self, user: &mut Self::User) -> Result<i32, Self::Error>;

    fn reset_access_failed_count(&self, user: &mut Self::User) -> Result<(), Self::Error>;

    fn get_lockout_enabled(&self, user: &Self::User) -> Result<bool, Self::Error>;

    fn set_lockout_enabled(&self, user: &mut Self::User, enabled: bool)
    -> Result<(), Self::Error>;

    fn get_lockout_end_date(&self, user: &Self::User)
    -> Result<Option<DateTime<Utc>>, Self::Error>;

    fn set_lockout_end_date(
        &self,
        user: &mut Self::User,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), Self::Error>;
}

pub trait UserSecurityStampStore: UserStore {
    fn get_security_stamp(&self, user: &Self::User) -> Result<Option<String>, Self::Error>;

    /// Rejects an empty stamp
    fn set_security_stamp(&self, user: &mut Self::User, stamp: &str) -> Result<(), Self::Error>;
}

pub trait UserTwoFactorStore: UserStore {
    fn get_two_factor_enabled(&self, user: &Self::User) -> Result<bool, Self::Error>;

    fn set_two_factor_enabled(&self, user: &mut Self::User, enabled: bool)
    -> Result<(), Self::Error>;
}

pub trait UserRoleStore: UserStore {
    /// Fails when no role has this normalized name
    fn add_to_role(&mut self, user: &Self::User, normalized_role_name: &str)
    -> Result<(), Self::Error>;

    fn remove_from_role(
        &mut self,
        user: &Self::User,
        normalized_role_name: &str,
    ) -> Result<(), Self::Error>;

    /// Names of the roles the user belongs to
    fn get_roles(&mut self, user: &Self::User) -> Result<Vec<String>, Self::Error>;

    /// Fails when no role has this normalized name
    fn get_users_in_role(&mut self, normalized_role_name: &str)
    -> Result<Vec<Self::User>, Self::Error>;

    /// False, not an error, when the role does not exist
    fn is_in_role(&mut self, user: &Self::User, normalized_role_name: &str)
    -> Result<bool, Self::Error>;
}

pub trait UserLoginStore: UserStore {
    fn add_login(&mut self, user: &Self::User, login: &UserLoginInfo) -> Result<(), Self::Error>;

    fn remove_login(
        &mut self,
        user: &Self::User,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), Self::Error>;

    fn get_logins(&mut self, user: &Self::User) -> Result<Vec<UserLoginInfo>, Self::Error>;

    fn find_by_login(
        &mut self,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<Option<Self::User>, Self::Error>;
}

pub trait UserAuthenticationTokenStore: UserStore {
    /// Inserts the token, or replaces the value of an existing one
    fn set_token(
        &mut self,
        user: &Self::User,
        login_provider: &str,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), Self::Error>;

    fn remove_token(
        &mut self,
        user: &Self::User,
        login_provider: &str,
        name: &str,
    ) -> Result<(), Self::Error>;

    fn get_token(
        &mut self,
        user: &Self::User,
        login_provider: &str,
        name: &str,
    ) -> Result<Option<String>, Self::Error>;
}

pub trait UserAuthenticatorKeyStore: UserStore {
    fn set_authenticator_key(&mut self, user: &Self::User, key: &str) -> Result<(), Self::Error>;

    fn get_authenticator_key(&mut self, user: &Self::User) -> Result<Option<String>, Self::Error>;
}

pub trait UserTwoFactorRecoveryCodeStore: UserStore {
    /// Replaces every stored recovery code with `recovery_codes`
    fn replace_codes(&mut self, user: &Self::User, recovery_codes: &[&str])
    -> Result<(), Self::Error>;

    /// Consumes one occurrence of `code`. Returns whether it was found.
    fn redeem_code(&mut self, user: &Self::User, code: &str) -> Result<bool, Self::Error>;

    fn count_codes(&mut self, user: &Self::User) -> Result<usize, Self::Error>;
}

pub trait UserClaimStore: UserStore {
    fn get_claims(&mut self, user: &Self::User) -> Result<Vec<Claim>, Self::Error>;

    fn add_claims(&mut self, user: &Self::User, claims: &[Claim]) -> Result<(), Self::Error>;

    /// Rewrites every row matching `claim` with the type and value of `new_claim`
    fn replace_claim(
        &mut self,
        user: &Self::User,
        claim: &Claim,
        new_claim: &Claim,
    ) -> Result<(), Self::Error>;

    /// Removes every row matching each claim, duplicates included
    fn remove_claims(&mut self, user: &Self::User, claims: &[Claim]) -> Result<(), Self::Error>;

    fn get_users_for_claim(&mut self, claim: &Claim) -> Result<Vec<Self::User>, Self::Error>;
}

pub trait UserPersonalDataStore: UserStore {
    /// Field name → value for every field the user type declares as personal data
    fn get_personal_data(&self, user: &Self::User) -> Result<Map<String, Value>, Self::Error>;
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use identity_store_api::{
    Claim, PersonalDataProtector, UserAuthenticationTokenStore, UserAuthenticatorKeyStore,
    UserClaimStore, UserEmailStore, UserLockoutStore, UserLoginInfo, UserLoginStore,
    UserPasswordStore, UserPersonalDataStore, UserPhoneNumberStore, UserRoleStore,
    UserSecurityStampStore, UserStore, UserTwoFactorRecoveryCodeStore, UserTwoFactorStore,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::error::RepositoryError;
use crate::db::models::{NewUserClaim, Role, User, UserClaim, UserLogin, UserRole, UserToken};
use crate::db::personal_data;
use crate::db::protection::PersonalDataField;
use crate::db::recovery_codes;
use crate::db::schema::{roles, user_claims, user_logins, user_roles, user_tokens, users};

/// Login provider under which the store keeps its own tokens
pub const INTERNAL_LOGIN_PROVIDER: &str = "[IdentityStore:UserStore]";
pub const AUTHENTICATOR_KEY_TOKEN_NAME: &str = "[IdentityStore:AuthenticatorKey]";
pub const RECOVERY_CODE_TOKEN_NAME: &str = "[IdentityStore:RecoveryCodes]";

fn require(value: &str, name: &'static str) -> Result<(), RepositoryError> {
    if value.is_empty() {
        return Err(RepositoryError::ArgumentMissing(name));
    }
    Ok(())
}

fn find_token_value(
    conn: &mut PgConnection,
    user_id: Uuid,
    login_provider: &str,
    name: &str,
) -> QueryResult<Option<String>> {
    user_tokens::table
        .filter(user_tokens::user_id.eq(user_id))
        .filter(user_tokens::login_provider.eq(login_provider))
        .filter(user_tokens::name.eq(name))
        .select(user_tokens::value)
        .first::<Option<String>>(conn)
        .optional()
        .map(Option::flatten)
}

/// Same lookup, locking the row until the surrounding transaction ends
fn find_token_value_for_update(
    conn: &mut PgConnection,
    user_id: Uuid,
    login_provider: &str,
    name: &str,
) -> QueryResult<Option<String>> {
    user_tokens::table
        .filter(user_tokens::user_id.eq(user_id))
        .filter(user_tokens::login_provider.eq(login_provider))
        .filter(user_tokens::name.eq(name))
        .select(user_tokens::value)
        .for_update()
        .first::<Option<String>>(conn)
        .optional()
        .map(Option::flatten)
}

fn upsert_token(conn: &mut PgConnection, token: &UserToken) -> QueryResult<usize> {
    diesel::insert_into(user_tokens::table)
        .values(token)
        .on_conflict((
            user_tokens::user_id,
            user_tokens::login_provider,
            user_tokens::name,
        ))
        .do_update()
        .set(user_tokens::value.eq(excluded(user_tokens::value)))
        .execute(conn)
}

/// User store backed by a caller-supplied connection.
///
/// Profile setters only change the in-memory user; `update` persists them.
/// Roles, logins, tokens and claims are written immediately.
pub struct UserRepository<'c> {
    conn: &'c mut PgConnection,
    personal_data: PersonalDataField,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self {
            conn,
            personal_data: PersonalDataField::default(),
        }
    }

    /// Protège les données personnelles avant écriture
    #[must_use]
    pub fn with_protector(mut self, protector: Arc<dyn PersonalDataProtector>) -> Self {
        self.personal_data = PersonalDataField::new(Some(protector));
        self
    }

    fn find_role(&mut self, normalized_role_name: &str) -> Result<Option<Role>, RepositoryError> {
        roles::table
            .filter(roles::normalized_name.eq(normalized_role_name))
            .select(Role::as_select())
            .first(self.conn)
            .optional()
            .map_err(Into::into)
    }

    fn require_role(&mut self, normalized_role_name: &str) -> Result<Role, RepositoryError> {
        self.find_role(normalized_role_name)?.ok_or_else(|| {
            tracing::warn!(role = normalized_role_name, "Role not found");
            RepositoryError::RoleNotFound(normalized_role_name.to_string())
        })
    }

    fn unprotect_all(&self, users: Vec<User>) -> Vec<User> {
        users
            .into_iter()
            .map(|user| self.personal_data.unprotect_user(user))
            .collect()
    }
}

impl UserStore for UserRepository<'_> {
    type User = User;
    type Error = RepositoryError;

    fn all(&mut self) -> Result<Vec<User>, RepositoryError> {
        let users = users::table.select(User::as_select()).load(self.conn)?;
        Ok(self.unprotect_all(users))
    }

    /// Créer un nouvel utilisateur
    fn create(&mut self, user: &mut User) -> Result<(), RepositoryError> {
        let row = self.personal_data.protect_user(user.clone());

        let stored = self.conn.transaction(|conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .returning(User::as_returning())
                .get_result(conn)
        })?;

        tracing::debug!(user_id = %stored.id, "User created");
        *user = self.personal_data.unprotect_user(stored);
        Ok(())
    }

    /// Mettre à jour un utilisateur (nouveau concurrency stamp à chaque appel)
    fn update(&mut self, user: &mut User) -> Result<(), RepositoryError> {
        user.concurrency_stamp = Some(Uuid::new_v4().to_string());
        let row = self.personal_data.protect_user(user.clone());

        let stored = self.conn.transaction(|conn| {
            diesel::update(users::table.find(row.id))
                .set(&row)
                .returning(User::as_returning())
                .get_result(conn)
        })?;

        tracing::debug!(user_id = %stored.id, "User updated");
        *user = self.personal_data.unprotect_user(stored);
        Ok(())
    }

    /// Supprimer un utilisateur (rôles, claims, logins et tokens en cascade)
    fn delete(&mut self, user: &User) -> Result<(), RepositoryError> {
        diesel::delete(users::table.find(user.id)).execute(self.conn)?;

        tracing::debug!(user_id = %user.id, "User deleted");
        Ok(())
    }

    /// Trouver un utilisateur par ID
    fn find_by_id(&mut self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        // Not a UUID: no row can match
        let Ok(id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };

        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(self.conn)
            .optional()?;

        Ok(user.map(|u| self.personal_data.unprotect_user(u)))
    }

    fn find_by_name(&mut self, normalized_username: &str) -> Result<Option<User>, RepositoryError> {
        let stored_name = self.personal_data.protect(normalized_username);

        let user = users::table
            .filter(users::normalized_username.eq(stored_name.as_str()))
            .select(User::as_select())
            .first(self.conn)
            .optional()?;

        Ok(user.map(|u| self.personal_data.unprotect_user(u)))
    }

    fn get_user_id(&self, user: &User) -> Result<String, RepositoryError> {
        Ok(user.id.to_string())
    }

    fn get_username(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.username.clone())
    }

    fn set_username(&self, user: &mut User, username: Option<String>) -> Result<(), RepositoryError> {
        user.username = username;
        Ok(())
    }

    fn get_normalized_username(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.normalized_username.clone())
    }

    fn set_normalized_username(
        &self,
        user: &mut User,
        normalized_username: Option<String>,
    ) -> Result<(), RepositoryError> {
        user.normalized_username = normalized_username;
        Ok(())
    }
}

impl UserEmailStore for UserRepository<'_> {
    fn find_by_email(&mut self, normalized_email: &str) -> Result<Option<User>, RepositoryError> {
        let stored_email = self.personal_data.protect(normalized_email);

        let user = users::table
            .filter(users::normalized_email.eq(stored_email.as_str()))
            .select(User::as_select())
            .first(self.conn)
            .optional()?;

        Ok(user.map(|u| self.personal_data.unprotect_user(u)))
    }

    fn get_email(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.email.clone())
    }

    fn set_email(&self, user: &mut User, email: Option<String>) -> Result<(), RepositoryError> {
        user.email = email;
        Ok(())
    }

    fn get_normalized_email(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.normalized_email.clone())
    }

    fn set_normalized_email(
        &self,
        user: &mut User,
        normalized_email: Option<String>,
    ) -> Result<(), RepositoryError> {
        user.normalized_email = normalized_email;
        Ok(())
    }

    fn get_email_confirmed(&self, user: &User) -> Result<bool, RepositoryError> {
        let has_email = user.email.as_deref().is_some_and(|e| !e.is_empty());
        Ok(has_email && user.email_confirmed)
    }

    fn set_email_confirmed(&self, user: &mut User, confirmed: bool) -> Result<(), RepositoryError> {
        user.email_confirmed = confirmed;
        Ok(())
    }
}

impl UserPasswordStore for UserRepository<'_> {
    fn get_password_hash(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.password_hash.clone())
    }

    fn set_password_hash(
        &self,
        user: &mut User,
        password_hash: Option<String>,
    ) -> Result<(), RepositoryError> {
        user.password_hash = password_hash;
        Ok(())
    }

    fn has_password(&self, user: &User) -> Result<bool, RepositoryError> {
        Ok(user.password_hash.as_deref().is_some_and(|h| !h.is_empty()))
    }
}

impl UserPhoneNumberStore for UserRepository<'_> {
    fn get_phone_number(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.phone_number.clone())
    }

    fn set_phone_number(
        &self,
        user: &mut User,
        phone_number: Option<String>,
    ) -> Result<(), RepositoryError> {
        user.phone_number = phone_number;
        Ok(())
    }

    fn get_phone_number_confirmed(&self, user: &User) -> Result<bool, RepositoryError> {
        let has_phone = user.phone_number.as_deref().is_some_and(|p| !p.is_empty());
        Ok(has_phone && user.phone_number_confirmed)
    }

    fn set_phone_number_confirmed(
        &self,
        user: &mut User,
        confirmed: bool,
    ) -> Result<(), RepositoryError> {
        user.phone_number_confirmed = confirmed;
        Ok(())
    }
}

impl UserLockoutStore for UserRepository<'_> {
    fn get_access_failed_count(&self, user: &User) -> Result<i32, RepositoryError> {
        Ok(user.access_failed_count)
    }

    fn increment_access_failed_count(&self, user: &mut User) -> Result<i32, RepositoryError> {
        user.access_failed_count += 1;
        Ok(user.access_failed_count)
    }

    fn reset_access_failed_count(&self, user: &mut User) -> Result<(), RepositoryError> {
        user.access_failed_count = 0;
        Ok(())
    }

    fn get_lockout_enabled(&self, user: &User) -> Result<bool, RepositoryError> {
        Ok(user.lockout_enabled)
    }

    fn set_lockout_enabled(&self, user: &mut User, enabled: bool) -> Result<(), RepositoryError> {
        user.lockout_enabled = enabled;
        Ok(())
    }

    fn get_lockout_end_date(&self, user: &User) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(user.lockout_end)
    }

    fn set_lockout_end_date(
        &self,
        user: &mut User,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        user.lockout_end = lockout_end;
        Ok(())
    }
}

impl UserSecurityStampStore for UserRepository<'_> {
    fn get_security_stamp(&self, user: &User) -> Result<Option<String>, RepositoryError> {
        Ok(user.security_stamp.clone().filter(|s| !s.is_empty()))
    }

    fn set_security_stamp(&self, user: &mut User, stamp: &str) -> Result<(), RepositoryError> {
        require(stamp, "stamp")?;
        user.security_stamp = Some(stamp.to_string());
        Ok(())
    }
}

impl UserTwoFactorStore for UserRepository<'_> {
    fn get_two_factor_enabled(&self, user: &User) -> Result<bool, RepositoryError> {
        Ok(user.two_factor_enabled)
    }

    fn set_two_factor_enabled(&self, user: &mut User, enabled: bool) -> Result<(), RepositoryError> {
        user.two_factor_enabled = enabled;
        Ok(())
    }
}

impl UserRoleStore for UserRepository<'_> {
    /// Ajouter l'utilisateur à un rôle existant
    fn add_to_role(&mut self, user: &User, normalized_role_name: &str) -> Result<(), RepositoryError> {
        require(normalized_role_name, "normalized_role_name")?;
        let role = self.require_role(normalized_role_name)?;

        diesel::insert_into(user_roles::table)
            .values(UserRole {
                user_id: user.id,
                role_id: role.id,
            })
            .execute(self.conn)?;

        tracing::debug!(user_id = %user.id, role_id = %role.id, "User added to role");
        Ok(())
    }

    fn remove_from_role(
        &mut self,
        user: &User,
        normalized_role_name: &str,
    ) -> Result<(), RepositoryError> {
        require(normalized_role_name, "normalized_role_name")?;

        if let Some(role) = self.find_role(normalized_role_name)? {
            diesel::delete(
                user_roles::table
                    .filter(user_roles::user_id.eq(user.id))
                    .filter(user_roles::role_id.eq(role.id)),
            )
            .execute(self.conn)?;
        }
        Ok(())
    }

    fn get_roles(&mut self, user: &User) -> Result<Vec<String>, RepositoryError> {
        let names = user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(user.id))
            .select(roles::name)
            .load::<Option<String>>(self.conn)?;

        Ok(names.into_iter().flatten().collect())
    }

    fn get_users_in_role(&mut self, normalized_role_name: &str) -> Result<Vec<User>, RepositoryError> {
        require(normalized_role_name, "normalized_role_name")?;
        let role = self.require_role(normalized_role_name)?;

        let users = user_roles::table
            .inner_join(users::table)
            .filter(user_roles::role_id.eq(role.id))
            .select(User::as_select())
            .load(self.conn)?;

        Ok(self.unprotect_all(users))
    }

    fn is_in_role(&mut self, user: &User, normalized_role_name: &str) -> Result<bool, RepositoryError> {
        require(normalized_role_name, "normalized_role_name")?;

        let Some(role) = self.find_role(normalized_role_name)? else {
            return Ok(false);
        };

        diesel::select(diesel::dsl::exists(
            user_roles::table
                .filter(user_roles::user_id.eq(user.id))
                .filter(user_roles::role_id.eq(role.id)),
        ))
        .get_result::<bool>(self.conn)
        .map_err(Into::into)
    }
}

impl UserLoginStore for UserRepository<'_> {
    fn add_login(&mut self, user: &User, login: &UserLoginInfo) -> Result<(), RepositoryError> {
        require(&login.login_provider, "login_provider")?;
        require(&login.provider_key, "provider_key")?;

        diesel::insert_into(user_logins::table)
            .values(UserLogin::new(user.id, login))
            .execute(self.conn)?;

        tracing::debug!(user_id = %user.id, provider = %login.login_provider, "External login added");
        Ok(())
    }

    fn remove_login(
        &mut self,
        user: &User,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), RepositoryError> {
        require(login_provider, "login_provider")?;
        require(provider_key, "provider_key")?;

        diesel::delete(
            user_logins::table
                .filter(user_logins::user_id.eq(user.id))
                .filter(user_logins::login_provider.eq(login_provider))
                .filter(user_logins::provider_key.eq(provider_key)),
        )
        .execute(self.conn)?;
        Ok(())
    }

    fn get_logins(&mut self, user: &User) -> Result<Vec<UserLoginInfo>, RepositoryError> {
        let logins = user_logins::table
            .filter(user_logins::user_id.eq(user.id))
            .select(UserLogin::as_select())
            .load(self.conn)?;

        Ok(logins.into_iter().map(UserLoginInfo::from).collect())
    }

    fn find_by_login(
        &mut self,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<Option<User>, RepositoryError> {
        require(login_provider, "login_provider")?;
        require(provider_key, "provider_key")?;

        let user = user_logins::table
            .inner_join(users::table)
            .filter(user_logins::login_provider.eq(login_provider))
            .filter(user_logins::provider_key.eq(provider_key))
            .select(User::as_select())
            .first(self.conn)
            .optional()?;

        Ok(user.map(|u| self.personal_data.unprotect_user(u)))
    }
}

impl UserAuthenticationTokenStore for UserRepository<'_> {
    fn set_token(
        &mut self,
        user: &User,
        login_provider: &str,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), RepositoryError> {
        require(login_provider, "login_provider")?;
        require(name, "name")?;

        let token = UserToken {
            user_id: user.id,
            login_provider: login_provider.to_string(),
            name: name.to_string(),
            value: value.map(str::to_string),
        };
        upsert_token(self.conn, &token)?;
        Ok(())
    }

    fn remove_token(
        &mut self,
        user: &User,
        login_provider: &str,
        name: &str,
    ) -> Result<(), RepositoryError> {
        require(login_provider, "login_provider")?;
        require(name, "name")?;

        diesel::delete(
            user_tokens::table
                .filter(user_tokens::user_id.eq(user.id))
                .filter(user_tokens::login_provider.eq(login_provider))
                .filter(user_tokens::name.eq(name)),
        )
        .execute(self.conn)?;
        Ok(())
    }

    fn get_token(
        &mut self,
        user: &User,
        login_provider: &str,
        name: &str,
    ) -> Result<Option<String>, RepositoryError> {
        require(login_provider, "login_provider")?;
        require(name, "name")?;

        find_token_value(self.conn, user.id, login_provider, name).map_err(Into::into)
    }
}

impl UserAuthenticatorKeyStore for UserRepository<'_> {
    fn set_authenticator_key(&mut self, user: &User, key: &str) -> Result<(), RepositoryError> {
        self.set_token(
            user,
            INTERNAL_LOGIN_PROVIDER,
            AUTHENTICATOR_KEY_TOKEN_NAME,
            Some(key),
        )
    }

    fn get_authenticator_key(&mut self, user: &User) -> Result<Option<String>, RepositoryError> {
        self.get_token(user, INTERNAL_LOGIN_PROVIDER, AUTHENTICATOR_KEY_TOKEN_NAME)
    }
}

impl UserTwoFactorRecoveryCodeStore for UserRepository<'_> {
    fn replace_codes(&mut self, user: &User, recovery_codes: &[&str]) -> Result<(), RepositoryError> {
        let merged = recovery_codes::encode(recovery_codes)?;
        self.set_token(
            user,
            INTERNAL_LOGIN_PROVIDER,
            RECOVERY_CODE_TOKEN_NAME,
            Some(&merged),
        )
    }

    /// Consommer un code de récupération
    fn redeem_code(&mut self, user: &User, code: &str) -> Result<bool, RepositoryError> {
        require(code, "code")?;
        let user_id = user.id;

        // Row lock: concurrent redemptions of the same code see each other's write
        let redeemed = self.conn.transaction::<_, RepositoryError, _>(|conn| {
            let merged = find_token_value_for_update(
                conn,
                user_id,
                INTERNAL_LOGIN_PROVIDER,
                RECOVERY_CODE_TOKEN_NAME,
            )?
            .unwrap_or_default();

            let Some(remaining) = recovery_codes::redeem(&merged, code)? else {
                return Ok(false);
            };

            upsert_token(
                conn,
                &UserToken {
                    user_id,
                    login_provider: INTERNAL_LOGIN_PROVIDER.to_string(),
                    name: RECOVERY_CODE_TOKEN_NAME.to_string(),
                    value: Some(remaining),
                },
            )?;
            Ok(true)
        })?;

        tracing::debug!(user_id = %user_id, redeemed, "Recovery code redemption");
        Ok(redeemed)
    }

    fn count_codes(&mut self, user: &User) -> Result<usize, RepositoryError> {
        let merged = self
            .get_token(user, INTERNAL_LOGIN_PROVIDER, RECOVERY_CODE_TOKEN_NAME)?
            .unwrap_or_default();
        Ok(recovery_codes::count(&merged))
    }
}

impl UserClaimStore for UserRepository<'_> {
    fn get_claims(&mut self, user: &User) -> Result<Vec<Claim>, RepositoryError> {
        let rows = user_claims::table
            .filter(user_claims::user_id.eq(user.id))
            .order_by(user_claims::id)
            .select(UserClaim::as_select())
            .load(self.conn)?;

        Ok(rows.into_iter().map(Claim::from).collect())
    }

    fn add_claims(&mut self, user: &User, claims: &[Claim]) -> Result<(), RepositoryError> {
        if claims.is_empty() {
            return Err(RepositoryError::ArgumentMissing("claims"));
        }

        let rows: Vec<NewUserClaim<'_>> = claims
            .iter()
            .map(|claim| NewUserClaim::new(user.id, claim))
            .collect();

        diesel::insert_into(user_claims::table)
            .values(&rows)
            .execute(self.conn)?;
        Ok(())
    }

    fn replace_claim(
        &mut self,
        user: &User,
        claim: &Claim,
        new_claim: &Claim,
    ) -> Result<(), RepositoryError> {
        diesel::update(
            user_claims::table
                .filter(user_claims::user_id.eq(user.id))
                .filter(user_claims::claim_type.eq(claim.claim_type.as_str()))
                .filter(user_claims::claim_value.eq(claim.value.as_str())),
        )
        .set((
            user_claims::claim_type.eq(new_claim.claim_type.as_str()),
            user_claims::claim_value.eq(new_claim.value.as_str()),
        ))
        .execute(self.conn)?;
        Ok(())
    }

    fn remove_claims(&mut self, user: &User, claims: &[Claim]) -> Result<(), RepositoryError> {
        if claims.is_empty() {
            return Err(RepositoryError::ArgumentMissing("claims"));
        }

        self.conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for claim in claims {
                diesel::delete(
                    user_claims::table
                        .filter(user_claims::user_id.eq(user.id))
                        .filter(user_claims::claim_type.eq(claim.claim_type.as_str()))
                        .filter(user_claims::claim_value.eq(claim.value.as_str())),
                )
                .execute(conn)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn get_users_for_claim(&mut self, claim: &Claim) -> Result<Vec<User>, RepositoryError> {
        let users = user_claims::table
            .inner_join(users::table)
            .filter(user_claims::claim_type.eq(claim.claim_type.as_str()))
            .filter(user_claims::claim_value.eq(claim.value.as_str()))
            .select(User::as_select())
            .distinct()
            .load(self.conn)?;

        Ok(self.unprotect_all(users))
    }
}

impl UserPersonalDataStore for UserRepository<'_> {
    fn get_personal_data(&self, user: &User) -> Result<Map<String, Value>, RepositoryError> {
        personal_data::collect(user)
    }
}

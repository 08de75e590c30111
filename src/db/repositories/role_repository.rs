use diesel::prelude::*;
use identity_store_api::{Claim, RoleClaimStore, RoleStore};
use uuid::Uuid;

use crate::db::error::RepositoryError;
use crate::db::models::{NewRoleClaim, Role, RoleClaim};
use crate::db::schema::{role_claims, roles};

/// Role store backed by a caller-supplied connection.
///
/// Every call runs on that connection, inside the caller's transaction if
/// one is open.
pub struct RoleRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RoleRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl RoleStore for RoleRepository<'_> {
    type Role = Role;
    type Error = RepositoryError;

    fn all(&mut self) -> Result<Vec<Role>, RepositoryError> {
        roles::table
            .select(Role::as_select())
            .load(self.conn)
            .map_err(Into::into)
    }

    /// Créer un rôle
    fn create(&mut self, role: &mut Role) -> Result<(), RepositoryError> {
        let stored = self.conn.transaction(|conn| {
            diesel::insert_into(roles::table)
                .values(&*role)
                .returning(Role::as_returning())
                .get_result(conn)
        })?;

        tracing::debug!(role_id = %stored.id, "Role created");
        *role = stored;
        Ok(())
    }

    /// Mettre à jour un rôle (nouveau concurrency stamp à chaque appel)
    fn update(&mut self, role: &mut Role) -> Result<(), RepositoryError> {
        role.concurrency_stamp = Some(Uuid::new_v4().to_string());

        let stored = self.conn.transaction(|conn| {
            diesel::update(roles::table.find(role.id))
                .set(&*role)
                .returning(Role::as_returning())
                .get_result(conn)
        })?;

        tracing::debug!(role_id = %stored.id, "Role updated");
        *role = stored;
        Ok(())
    }

    /// Supprimer un rôle (claims et liens utilisateurs partent en cascade)
    fn delete(&mut self, role: &Role) -> Result<(), RepositoryError> {
        diesel::delete(roles::table.find(role.id)).execute(self.conn)?;

        tracing::debug!(role_id = %role.id, "Role deleted");
        Ok(())
    }

    fn find_by_id(&mut self, role_id: &str) -> Result<Option<Role>, RepositoryError> {
        // Not a UUID: no row can match
        let Ok(id) = Uuid::parse_str(role_id) else {
            return Ok(None);
        };

        roles::table
            .find(id)
            .select(Role::as_select())
            .first(self.conn)
            .optional()
            .map_err(Into::into)
    }

    fn find_by_name(&mut self, normalized_name: &str) -> Result<Option<Role>, RepositoryError> {
        roles::table
            .filter(roles::normalized_name.eq(normalized_name))
            .select(Role::as_select())
            .first(self.conn)
            .optional()
            .map_err(Into::into)
    }

    fn get_role_id(&self, role: &Role) -> Result<String, RepositoryError> {
        Ok(role.id.to_string())
    }

    fn get_role_name(&self, role: &Role) -> Result<Option<String>, RepositoryError> {
        Ok(role.name.clone())
    }

    fn set_role_name(&self, role: &mut Role, name: Option<String>) -> Result<(), RepositoryError> {
        role.name = name;
        Ok(())
    }

    fn get_normalized_role_name(&self, role: &Role) -> Result<Option<String>, RepositoryError> {
        Ok(role.normalized_name.clone())
    }

    fn set_normalized_role_name(
        &self,
        role: &mut Role,
        normalized_name: Option<String>,
    ) -> Result<(), RepositoryError> {
        role.normalized_name = normalized_name;
        Ok(())
    }
}

impl RoleClaimStore for RoleRepository<'_> {
    fn get_claims(&mut self, role: &Role) -> Result<Vec<Claim>, RepositoryError> {
        let rows = role_claims::table
            .filter(role_claims::role_id.eq(role.id))
            .order_by(role_claims::id)
            .select(RoleClaim::as_select())
            .load(self.conn)?;

        Ok(rows.into_iter().map(Claim::from).collect())
    }

    fn add_claim(&mut self, role: &Role, claim: &Claim) -> Result<(), RepositoryError> {
        diesel::insert_into(role_claims::table)
            .values(NewRoleClaim::new(role.id, claim))
            .execute(self.conn)?;
        Ok(())
    }

    fn remove_claim(&mut self, role: &Role, claim: &Claim) -> Result<(), RepositoryError> {
        let removed = diesel::delete(
            role_claims::table
                .filter(role_claims::role_id.eq(role.id))
                .filter(role_claims::claim_type.eq(claim.claim_type.as_str()))
                .filter(role_claims::claim_value.eq(claim.value.as_str())),
        )
        .execute(self.conn)?;

        tracing::debug!(role_id = %role.id, removed, "Role claims removed");
        Ok(())
    }
}

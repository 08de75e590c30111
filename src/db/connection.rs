use diesel::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;

use super::bootstrap;
use super::error::RepositoryError;
use super::{DbConnection, DbPool};
use crate::config::Config;

/// Owns the connection pool and hands out transactional sessions
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    pub fn new(database_url: &str, max_size: u32) -> Result<Self, RepositoryError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);

        let pool = diesel::r2d2::Pool::builder()
            .max_size(max_size)
            .build(manager)?;

        Ok(Self { pool })
    }

    pub fn from_config(config: &Config) -> Result<Self, RepositoryError> {
        Self::new(&config.database_url, config.pool_max_size)
    }

    /// Récupère une connexion du pool
    pub fn get_connection(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(Into::into)
    }

    pub fn max_size(&self) -> u32 {
        self.pool.max_size()
    }

    /// Crée toutes les tables si elles n'existent pas
    pub fn ensure_created(&self) -> Result<(), RepositoryError> {
        let mut conn = self.get_connection()?;
        bootstrap::create_all(&mut conn)?;
        tracing::info!("Identity schema created");
        Ok(())
    }

    /// Supprime toutes les tables
    pub fn ensure_deleted(&self) -> Result<(), RepositoryError> {
        let mut conn = self.get_connection()?;
        bootstrap::drop_all(&mut conn)?;
        tracing::info!("Identity schema dropped");
        Ok(())
    }

    /// Runs `work` inside one transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back on
    /// `Err` or if `work` panics.
    pub fn scoped_session<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, RepositoryError>,
    {
        let mut pooled = self.get_connection()?;
        let conn: &mut PgConnection = &mut pooled;
        conn.transaction(work)
    }
}

impl std::fmt::Debug for DbContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbContext")
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use crate::db::schema::roles;
    use crate::db::test_support::ensure_schema;

    fn test_context() -> Option<DbContext> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            println!("⚠️ DATABASE_URL not set, skipping");
            return None;
        };
        match DbContext::new(&url, 2) {
            Ok(context) => Some(context),
            Err(e) => {
                println!("⚠️ Connection error (expected if DB not running): {e}");
                None
            }
        }
    }

    #[test]
    fn test_pool_max_size() {
        let Some(context) = test_context() else {
            return;
        };
        assert_eq!(context.max_size(), 2);
    }

    #[test]
    fn test_scoped_session_rolls_back_on_error() {
        let Some(context) = test_context() else {
            return;
        };
        ensure_schema(&mut context.get_connection().expect("connection"));

        let role = Role {
            normalized_name: Some(format!("ROLLBACK_{}", uuid::Uuid::new_v4())),
            ..Role::new("rollback")
        };

        let result: Result<(), RepositoryError> = context.scoped_session(|conn| {
            diesel::insert_into(roles::table)
                .values(&role)
                .execute(conn)?;
            Err(RepositoryError::DatabaseError("abort".to_string()))
        });
        assert!(result.is_err());

        let found = context
            .scoped_session(|conn| {
                roles::table
                    .find(role.id)
                    .select(Role::as_select())
                    .first(conn)
                    .optional()
                    .map_err(Into::into)
            })
            .expect("query");
        assert!(found.is_none(), "Insert should have been rolled back");
    }

    #[test]
    fn test_scoped_session_commits_on_success() {
        let Some(context) = test_context() else {
            return;
        };
        ensure_schema(&mut context.get_connection().expect("connection"));
        // Idempotent once the tables exist
        context.ensure_created().expect("schema");

        let role = Role {
            normalized_name: Some(format!("COMMIT_{}", uuid::Uuid::new_v4())),
            ..Role::new("commit")
        };

        context
            .scoped_session(|conn| {
                diesel::insert_into(roles::table)
                    .values(&role)
                    .execute(conn)?;
                Ok(())
            })
            .expect("insert");

        let deleted = context
            .scoped_session(|conn| {
                diesel::delete(roles::table.find(role.id))
                    .execute(conn)
                    .map_err(Into::into)
            })
            .expect("cleanup");
        assert_eq!(deleted, 1);
    }
}

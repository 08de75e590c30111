//! Schema creation and teardown.
//!
//! Every statement is idempotent so both directions can be run repeatedly.

use diesel::PgConnection;
use diesel::connection::SimpleConnection;

use crate::db::error::RepositoryError;

const CREATE_ALL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username VARCHAR,
    normalized_username VARCHAR,
    email VARCHAR,
    normalized_email VARCHAR,
    email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
    password_hash TEXT,
    security_stamp TEXT,
    concurrency_stamp TEXT,
    phone_number VARCHAR,
    phone_number_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
    two_factor_enabled BOOLEAN NOT NULL DEFAULT FALSE,
    lockout_end TIMESTAMPTZ,
    lockout_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    access_failed_count INTEGER NOT NULL DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_normalized_username ON users (normalized_username);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_normalized_email ON users (normalized_email);

CREATE TABLE IF NOT EXISTS roles (
    id UUID PRIMARY KEY,
    name VARCHAR(256),
    normalized_name VARCHAR(256),
    concurrency_stamp TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_roles_normalized_name ON roles (normalized_name);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    role_id UUID NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, role_id)
);

CREATE TABLE IF NOT EXISTS user_claims (
    id SERIAL PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    claim_type TEXT NOT NULL,
    claim_value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_claims_user_id ON user_claims (user_id);

CREATE TABLE IF NOT EXISTS role_claims (
    id SERIAL PRIMARY KEY,
    role_id UUID NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
    claim_type TEXT NOT NULL,
    claim_value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_role_claims_role_id ON role_claims (role_id);

CREATE TABLE IF NOT EXISTS user_logins (
    login_provider VARCHAR(128) NOT NULL,
    provider_key VARCHAR(128) NOT NULL,
    provider_display_name TEXT,
    user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    PRIMARY KEY (login_provider, provider_key)
);

CREATE TABLE IF NOT EXISTS user_tokens (
    user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    login_provider VARCHAR(128) NOT NULL,
    name VARCHAR(128) NOT NULL,
    value TEXT,
    PRIMARY KEY (user_id, login_provider, name)
);
";

// Children first, so the statement order also works without CASCADE.
const DROP_ALL: &str = r"
DROP TABLE IF EXISTS user_tokens CASCADE;
DROP TABLE IF EXISTS user_logins CASCADE;
DROP TABLE IF EXISTS role_claims CASCADE;
DROP TABLE IF EXISTS user_claims CASCADE;
DROP TABLE IF EXISTS user_roles CASCADE;
DROP TABLE IF EXISTS roles CASCADE;
DROP TABLE IF EXISTS users CASCADE;
";

/// Creates every table and index that does not exist yet
pub fn create_all(conn: &mut PgConnection) -> Result<(), RepositoryError> {
    conn.batch_execute(CREATE_ALL)?;
    Ok(())
}

/// Drops every table, with its rows
pub fn drop_all(conn: &mut PgConnection) -> Result<(), RepositoryError> {
    conn.batch_execute(DROP_ALL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::users;
    use crate::db::test_support::run_in_transaction;
    use diesel::prelude::*;

    #[test]
    fn test_drop_and_create_are_idempotent() {
        run_in_transaction(|conn| {
            // Private schema, rolled back with the transaction, so the shared tables stay untouched
            let schema = format!("bootstrap_{}", uuid::Uuid::new_v4().simple());
            conn.batch_execute(&format!(
                "CREATE SCHEMA {schema}; SET LOCAL search_path TO {schema};"
            ))?;

            create_all(conn)?;
            create_all(conn)?;
            drop_all(conn)?;
            drop_all(conn)?;
            create_all(conn)?;

            let count: i64 = users::table.count().get_result(conn)?;
            assert_eq!(count, 0);
            Ok(())
        });
    }
}

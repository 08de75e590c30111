use std::sync::Once;

use diesel::prelude::*;

use super::bootstrap;
use super::error::RepositoryError;

static SCHEMA: Once = Once::new();

pub fn establish() -> Option<PgConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        println!("⚠️ DATABASE_URL not set, skipping");
        return None;
    };
    match PgConnection::establish(&url) {
        Ok(conn) => Some(conn),
        Err(e) => {
            println!("⚠️ Connection error (expected if DB not running): {e}");
            None
        }
    }
}

/// Creates the tables once per test process
pub fn ensure_schema(conn: &mut PgConnection) {
    SCHEMA.call_once(|| {
        bootstrap::create_all(conn).expect("Failed to create identity schema");
    });
}

/// Runs `test` inside a transaction that is always rolled back.
///
/// Returns without running anything when no database is reachable.
pub fn run_in_transaction<F>(test: F)
where
    F: FnOnce(&mut PgConnection) -> Result<(), RepositoryError>,
{
    let Some(mut conn) = establish() else {
        return;
    };

    ensure_schema(&mut conn);
    conn.test_transaction::<_, RepositoryError, _>(test);
}

pub mod bootstrap;
pub mod connection;
pub mod error;
pub mod models;
pub mod personal_data;
pub mod protection;
pub mod recovery_codes;
pub mod repositories;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

use diesel::PgConnection;
use diesel::r2d2::{self, ConnectionManager};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

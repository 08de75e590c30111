//! Stockage PostgreSQL (diesel) des utilisateurs, rôles, claims, logins et tokens.
//!
//! Les repositories implémentent les traits de `identity-store-api` et travaillent
//! sur une connexion fournie par l'appelant :
//!
//! ```no_run
//! use identity_store::{DbContext, RoleRepository, RepositoryError};
//! use identity_store::db::models::Role;
//! use identity_store::api::RoleStore;
//!
//! fn seed(db: &DbContext) -> Result<(), RepositoryError> {
//!     db.scoped_session(|conn| {
//!         let mut role = Role::new("admin");
//!         RoleRepository::new(conn).create(&mut role)
//!     })
//! }
//! ```

pub mod config;
pub mod db;

pub use config::{Config, Environment};
pub use db::connection::DbContext;
pub use db::error::RepositoryError;
pub use db::protection::PersonalDataField;
pub use db::repositories::{RoleRepository, UserRepository};
pub use identity_store_api as api;

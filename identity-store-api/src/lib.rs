//! # identity-store-api
//!
//! Types shared between the identity framework and the persistence
//! adapters that back it.
//!
//! ## Contents
//!
//! - Value types exchanged with the stores (`Claim`, `UserLoginInfo`)
//! - The personal data protection capability (`PersonalDataProtector`)
//! - The store capability traits (`RoleStore`, `UserStore`, `UserClaimStore`, ...)
//!
//! ## Example
//!
//! ```rust
//! use identity_store_api::{Claim, UserLoginInfo};
//!
//! let claim = Claim::new("locality", "London");
//! let login = UserLoginInfo::new("Google", "110169484474386276334").with_display_name("Google");
//! assert_eq!(claim.value, "London");
//! assert_eq!(login.display_name.as_deref(), Some("Google"));
//! ```

pub mod claims;
pub mod login;
pub mod protector;
pub mod stores;

// Re-exports for convenient access
pub use claims::Claim;
pub use login::UserLoginInfo;
pub use protector::PersonalDataProtector;
pub use stores::*;

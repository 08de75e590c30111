pub mod role;
pub mod role_claim;
pub mod user;
pub mod user_claim;
pub mod user_login;
pub mod user_role;
pub mod user_token;

pub use role::Role;
pub use role_claim::{NewRoleClaim, RoleClaim};
pub use user::User;
pub use user_claim::{NewUserClaim, UserClaim};
pub use user_login::UserLogin;
pub use user_role::UserRole;
pub use user_token::UserToken;

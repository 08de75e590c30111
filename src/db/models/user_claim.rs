use diesel::{Insertable, Queryable, Selectable};
use identity_store_api::Claim;
use uuid::Uuid;

use crate::db::schema::user_claims;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = user_claims)]
pub struct NewUserClaim<'a> {
    pub user_id: Uuid,
    pub claim_type: &'a str,
    pub claim_value: &'a str,
}

impl<'a> NewUserClaim<'a> {
    pub fn new(user_id: Uuid, claim: &'a Claim) -> Self {
        Self {
            user_id,
            claim_type: &claim.claim_type,
            claim_value: &claim.value,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = user_claims)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserClaim {
    pub id: i32,
    pub user_id: Uuid,
    pub claim_type: String,
    pub claim_value: String,
}

impl From<UserClaim> for Claim {
    fn from(row: UserClaim) -> Self {
        Claim::new(row.claim_type, row.claim_value)
    }
}

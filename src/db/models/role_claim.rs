use diesel::{Insertable, Queryable, Selectable};
use identity_store_api::Claim;
use uuid::Uuid;

use crate::db::schema::role_claims;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = role_claims)]
pub struct NewRoleClaim<'a> {
    pub role_id: Uuid,
    pub claim_type: &'a str,
    pub claim_value: &'a str,
}

impl<'a> NewRoleClaim<'a> {
    pub fn new(role_id: Uuid, claim: &'a Claim) -> Self {
        Self {
            role_id,
            claim_type: &claim.claim_type,
            claim_value: &claim.value,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = role_claims)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleClaim {
    pub id: i32,
    pub role_id: Uuid,
    pub claim_type: String,
    pub claim_value: String,
}

impl From<RoleClaim> for Claim {
    fn from(row: RoleClaim) -> Self {
        Claim::new(row.claim_type, row.claim_value)
    }
}

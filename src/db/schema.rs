// Maintained by hand, kept in sync with the DDL in `bootstrap.rs`.

diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Nullable<Varchar>,
        normalized_username -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        normalized_email -> Nullable<Varchar>,
        email_confirmed -> Bool,
        password_hash -> Nullable<Text>,
        security_stamp -> Nullable<Text>,
        concurrency_stamp -> Nullable<Text>,
        phone_number -> Nullable<Varchar>,
        phone_number_confirmed -> Bool,
        two_factor_enabled -> Bool,
        lockout_end -> Nullable<Timestamptz>,
        lockout_enabled -> Bool,
        access_failed_count -> Int4,
    }
}

diesel::table! {
    roles (id) {
        id -> Uuid,
        #[max_length = 256]
        name -> Nullable<Varchar>,
        #[max_length = 256]
        normalized_name -> Nullable<Varchar>,
        concurrency_stamp -> Nullable<Text>,
    }
}

diesel::table! {
    user_roles (user_id, role_id) {
        user_id -> Uuid,
        role_id -> Uuid,
    }
}

diesel::table! {
    user_claims (id) {
        id -> Int4,
        user_id -> Uuid,
        claim_type -> Text,
        claim_value -> Text,
    }
}

diesel::table! {
    role_claims (id) {
        id -> Int4,
        role_id -> Uuid,
        claim_type -> Text,
        claim_value -> Text,
    }
}

diesel::table! {
    user_logins (login_provider, provider_key) {
        #[max_length = 128]
        login_provider -> Varchar,
        #[max_length = 128]
        provider_key -> Varchar,
        provider_display_name -> Nullable<Text>,
        user_id -> Uuid,
    }
}

diesel::table! {
    user_tokens (user_id, login_provider, name) {
        user_id -> Uuid,
        #[max_length = 128]
        login_provider -> Varchar,
        #[max_length = 128]
        name -> Varchar,
        value -> Nullable<Text>,
    }
}

diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));
diesel::joinable!(user_claims -> users (user_id));
diesel::joinable!(role_claims -> roles (role_id));
diesel::joinable!(user_logins -> users (user_id));
diesel::joinable!(user_tokens -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    roles,
    user_roles,
    user_claims,
    role_claims,
    user_logins,
    user_tokens,
);

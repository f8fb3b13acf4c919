//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered users and the cached date of their newest purchase.
    users (id) {
        id -> Int8,
        /// Lower-cased login e-mail; unique.
        email -> Varchar,
        name -> Varchar,
        /// Salted credential digest; never selected outside login.
        password_digest -> Text,
        /// `max(purchases.purchased_at)` for this user, refreshed inside every
        /// ledger mutation transaction.
        last_buy_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Purchase ledger. Rows cascade away with their owner.
    purchases (id) {
        id -> Int8,
        user_id -> Int8,
        purchased_at -> Timestamptz,
        kg -> Float8,
        price -> Float8,
        proof_ref -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(purchases -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(purchases, users);

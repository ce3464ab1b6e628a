pub mod account;
pub mod revoked_token;

pub use account::PostgresAccountStore;
pub use revoked_token::PostgresRevocationStore;

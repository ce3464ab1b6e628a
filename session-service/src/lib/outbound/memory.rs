pub mod account;
pub mod revoked_token;

pub use account::MemoryAccountStore;
pub use revoked_token::MemoryRevocationStore;

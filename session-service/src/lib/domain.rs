pub mod account;
pub mod errors;
pub mod provider;
pub mod revocation;

//! Pluggable session authentication.
//!
//! Providers authenticate credentials and issue, validate, refresh and
//! revoke signed session tokens. Accounts and revocations live behind store
//! contracts with an in-memory and a PostgreSQL backend each;
//! [`bootstrap::build_registry`] wires them into a [`ProviderRegistry`].

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::account;
pub use domain::errors::AuthError;
pub use domain::provider;
pub use domain::provider::models::Credentials;
pub use domain::provider::ports::Provider;
pub use domain::provider::registry::ProviderRegistry;
pub use domain::revocation;
pub use outbound::memory;
pub use outbound::repositories;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::provider::ports::Provider;

/// Name to provider lookup.
///
/// Populated once at startup and then shared read-only, so it carries no
/// locking of its own.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own name.
    ///
    /// # Returns
    /// The provider previously registered under that name, if any
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        let name = provider.name().to_string();
        let previous = self.providers.insert(name.clone(), provider);
        if previous.is_some() {
            tracing::warn!(provider = %name, "Provider replaced");
        } else {
            tracing::debug!(provider = %name, "Provider registered");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Every registered provider, in no particular order.
    pub fn list_all(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.values().cloned().collect()
    }

    /// Sorted provider names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::provider::local::LocalProvider;
    use crate::outbound::memory::MemoryAccountStore;

    fn local(name: &str) -> Arc<dyn Provider> {
        let authenticator =
            auth::Authenticator::new(b"test_secret_key_at_least_32_bytes!", Duration::hours(1))
                .unwrap();
        Arc::new(
            LocalProvider::new(Arc::new(MemoryAccountStore::new()), Arc::new(authenticator))
                .with_name(name),
        )
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register(local("local")).is_none());
        assert!(registry.register(local("ldap")).is_none());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("local").unwrap().name(), "local");
        assert!(registry.get("oauth").is_none());
        assert_eq!(registry.names(), vec!["ldap".to_string(), "local".to_string()]);
        assert_eq!(registry.list_all().len(), 2);
    }

    #[test]
    fn test_register_overwrites_same_name() {
        let mut registry = ProviderRegistry::new();
        let first = local("local");
        let second = local("local");

        registry.register(Arc::clone(&first));
        let previous = registry.register(Arc::clone(&second)).unwrap();

        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&registry.get("local").unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }
}

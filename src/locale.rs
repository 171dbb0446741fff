use std::collections::BTreeMap;

/// The external message-resolution (localization) service, seen from the
/// engine as a plain key lookup. A miss makes the engine use the rule's
/// literal fallback text.
pub trait MessageResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Resolver that never finds anything; every message uses its fallback text.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResolver;

impl MessageResolver for NullResolver {
    fn resolve(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Static key → text table.
#[derive(Clone, Debug, Default)]
pub struct MapResolver {
    table: BTreeMap<String, String>,
}

impl MapResolver {
    pub fn new(table: BTreeMap<String, String>) -> Self {
        Self { table }
    }

    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.table.insert(key.into(), text.into());
        self
    }
}

impl MessageResolver for MapResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        self.table.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_resolver_always_misses() {
        assert_eq!(NullResolver.resolve("any.key"), None);
    }

    #[test]
    fn map_resolver_hits_and_misses() {
        let r = MapResolver::default().with("balance.minimum", "saldo insuficiente");
        assert_eq!(
            r.resolve("balance.minimum").as_deref(),
            Some("saldo insuficiente")
        );
        assert_eq!(r.resolve("other"), None);
    }
}

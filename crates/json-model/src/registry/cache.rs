//! Memoized discriminator → concrete record lookups.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::schema::RecordSchema;

/// (canonical JSON text of the discriminator, base record name)
type CacheKey = (String, String);

/// Append-only cache of resolved subtypes.
///
/// Safe to share between threads: lookups take a read lock, and a racing
/// pair of first-time resolutions for the same key agree on the entry
/// stored first.
#[derive(Debug, Default)]
pub struct SubtypeCache {
    entries: RwLock<HashMap<CacheKey, Arc<RecordSchema>>>,
}

fn key(discriminator: &JsonValue, base: &str) -> CacheKey {
    (discriminator.to_string(), base.to_string())
}

impl SubtypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, discriminator: &JsonValue, base: &str) -> Option<Arc<RecordSchema>> {
        self.entries.read().get(&key(discriminator, base)).cloned()
    }

    /// Insert `schema` unless the key is already cached; either way return
    /// the cached entry.
    pub fn insert_or_get(
        &self,
        discriminator: &JsonValue,
        base: &str,
        schema: Arc<RecordSchema>,
    ) -> Arc<RecordSchema> {
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key(discriminator, base)).or_insert(schema))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::schema::RecordDecl;
    use serde_json::json;

    #[test]
    fn first_insert_wins() {
        let mut reg = Registry::new();
        let a = reg.register(RecordDecl::new("A")).unwrap();
        let b = reg.register(RecordDecl::new("B")).unwrap();
        let cache = SubtypeCache::new();
        assert!(cache.is_empty());
        let stored = cache.insert_or_get(&json!("x"), "Base", a);
        let again = cache.insert_or_get(&json!("x"), "Base", b);
        assert_eq!(stored.name(), "A");
        assert_eq!(again.name(), "A");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&json!("x"), "Other").is_none());
        assert!(cache.get(&json!(1), "Base").is_none());
    }
}

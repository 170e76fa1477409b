use std::{collections::HashMap, fmt, hash::Hash, sync::Arc};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::{Error, IdSource, Result};

struct Entry<K> {
    kind: K,
    key: String,
    source: Arc<dyn IdSource>,
}

/// A lookup table of identifier sources, populated once at startup.
///
/// Each source is registered under a string key, unique across the whole
/// registry, and a `kind` describing what it identifies (usually an
/// application enum such as `Kind::Order`). Lookups go by key alone, by kind,
/// or by both.
///
/// The registry is built with `&mut self` and read with `&self`; wrap it in
/// an [`Arc`] to share the finished table across threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tickflake::{Generator, SequenceRegistry};
///
/// #[derive(Clone, PartialEq, Eq, Hash)]
/// enum Kind {
///     Order,
///     Invoice,
/// }
///
/// let mut registry = SequenceRegistry::new();
/// registry
///     .register(Kind::Order, "orders", Arc::new(Generator::twitter(1).unwrap()))
///     .unwrap();
/// registry
///     .register(Kind::Invoice, "invoices", Arc::new(Generator::twitter(2).unwrap()))
///     .unwrap();
///
/// let orders = registry.get(&Kind::Order, "orders").unwrap();
/// assert_ne!(orders.next_id(), orders.next_id());
/// assert!(registry.get(&Kind::Invoice, "orders").is_none());
/// ```
pub struct SequenceRegistry<K> {
    entries: Vec<Entry<K>>,
    by_key: HashMap<String, usize>,
    by_kind: HashMap<K, Vec<usize>>,
}

impl<K> SequenceRegistry<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Registers `source` under `key` for identifiers of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if `key` is already taken, regardless
    /// of kind. The registry is left unchanged.
    pub fn register(
        &mut self,
        kind: K,
        key: impl Into<String>,
        source: Arc<dyn IdSource>,
    ) -> Result<()> {
        let key = key.into();
        if self.by_key.contains_key(&key) {
            return Err(Error::DuplicateKey { key });
        }

        #[cfg(feature = "tracing")]
        debug!(key = %key, index = self.entries.len(), "registered id source");

        let index = self.entries.len();
        self.by_key.insert(key.clone(), index);
        self.by_kind.entry(kind.clone()).or_default().push(index);
        self.entries.push(Entry { kind, key, source });
        Ok(())
    }

    /// Every source registered for `kind`, in registration order.
    pub fn by_kind(&self, kind: &K) -> Vec<Arc<dyn IdSource>> {
        self.by_kind
            .get(kind)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| Arc::clone(&self.entries[i].source))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The source registered under `key`, provided it was registered for
    /// `kind`.
    pub fn get(&self, kind: &K, key: &str) -> Option<Arc<dyn IdSource>> {
        let entry = &self.entries[*self.by_key.get(key)?];
        (entry.kind == *kind).then(|| Arc::clone(&entry.source))
    }

    /// The source registered under `key`, whatever its kind.
    pub fn get_by_key(&self, key: &str) -> Option<Arc<dyn IdSource>> {
        self.by_key
            .get(key)
            .map(|&i| Arc::clone(&self.entries[i].source))
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> Default for SequenceRegistry<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for SequenceRegistry<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (&e.key, &e.kind)))
            .finish()
    }
}

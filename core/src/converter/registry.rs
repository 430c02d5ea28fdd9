//! The converter registry.
//!
//! Registered converters live in an ordered list behind a mutex; successful
//! matches are memoized in a read-mostly cache. Every register/unregister
//! bumps the cache generation and clears it, and a match only inserts into
//! the cache if the generation is unchanged since it started, so a lookup
//! racing a registration can never leave a stale entry behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{debug, trace};

use super::{Converter, builtin_converters};
use crate::codec::{DocumentCodec, SerdeJsonCodec};
use crate::value::ValueType;

/// Memoization key: the `(model type, row type)` pair a match was made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversionCacheKey {
    pub model: ValueType,
    pub row: ValueType,
}

impl ConversionCacheKey {
    pub fn new(model: &ValueType, row: &ValueType) -> Self {
        Self {
            model: model.clone(),
            row: row.clone(),
        }
    }
}

#[derive(Debug)]
struct Registration {
    converter: Arc<dyn Converter>,
    key: Option<String>,
    builtin: bool,
}

#[derive(Debug, Default)]
struct MatchCache {
    generation: u64,
    entries: HashMap<ConversionCacheKey, Arc<dyn Converter>>,
}

/// Selects the best converter for a `(model type, row type)` pair.
///
/// The highest non-negative priority wins. On a tie a converter added with
/// [`register`](Self::register) beats a built-in one; otherwise the converter
/// registered first wins. The registry is safe to share between threads.
///
/// # Examples
///
/// ```
/// use rowbind_core::{ConverterRegistry, ValueType};
///
/// let registry = ConverterRegistry::new();
/// let c = registry.match_converter(&ValueType::I32, &ValueType::I64).unwrap();
/// assert_eq!(c.name(), "primitive");
///
/// assert!(registry.match_converter(&ValueType::Date, &ValueType::Bytes).is_none());
/// ```
#[derive(Debug)]
pub struct ConverterRegistry {
    converters: Mutex<Vec<Registration>>,
    cache: RwLock<MatchCache>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// A registry holding the built-in converters, using serde_json for JSON
    /// columns.
    pub fn new() -> Self {
        Self::with_codec(Arc::new(SerdeJsonCodec))
    }

    /// A registry holding the built-in converters, using `codec` for JSON
    /// columns.
    pub fn with_codec(codec: Arc<dyn DocumentCodec>) -> Self {
        let registry = Self::empty();
        registry.converters().extend(
            builtin_converters(codec)
                .into_iter()
                .map(|converter| Registration {
                    converter,
                    key: None,
                    builtin: true,
                }),
        );
        registry
    }

    /// A registry with no converters at all.
    pub fn empty() -> Self {
        Self {
            converters: Mutex::new(Vec::new()),
            cache: RwLock::new(MatchCache::default()),
        }
    }

    fn converters(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.converters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds `converter` under `key`. Registering a converter that is already
    /// present (the same `Arc`) only replaces its key and keeps its place in
    /// the tie-break order. Invalidates the match cache.
    pub fn register(&self, converter: Arc<dyn Converter>, key: Option<&str>) {
        {
            let mut converters = self.converters();
            let key = key.map(str::to_string);
            match converters
                .iter_mut()
                .find(|r| Arc::ptr_eq(&r.converter, &converter))
            {
                Some(existing) => existing.key = key,
                None => {
                    debug!(converter = converter.name(), key = ?key, "Registering converter");
                    converters.push(Registration {
                        converter,
                        key,
                        builtin: false,
                    });
                }
            }
        }
        self.invalidate();
    }

    /// Removes every converter registered under `key` and returns how many
    /// were removed. Invalidates the match cache.
    pub fn unregister(&self, key: &str) -> usize {
        let removed = {
            let mut converters = self.converters();
            let before = converters.len();
            converters.retain(|r| r.key.as_deref() != Some(key));
            before - converters.len()
        };
        debug!(key, removed, "Unregistered converters");
        self.invalidate();
        removed
    }

    /// Returns the best converter for `(model, row)`, or `None` if no
    /// converter accepts the pair.
    pub fn match_converter(
        &self,
        model: &ValueType,
        row: &ValueType,
    ) -> Option<Arc<dyn Converter>> {
        let key = ConversionCacheKey::new(model, row);
        let generation = {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.entries.get(&key) {
                return Some(Arc::clone(hit));
            }
            cache.generation
        };

        let best = self.scan(model, row)?;
        trace!(
            model = %model,
            row = %row,
            converter = best.name(),
            "Matched converter"
        );

        if best.cacheable() {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            if cache.generation == generation {
                cache.entries.insert(key, Arc::clone(&best));
            }
        }
        Some(best)
    }

    fn scan(&self, model: &ValueType, row: &ValueType) -> Option<Arc<dyn Converter>> {
        let converters = self.converters();
        let mut best: Option<(i32, &Registration)> = None;
        for registration in converters.iter() {
            let priority = registration.converter.match_priority(model, row);
            if priority < 0 {
                continue;
            }
            let wins = best.is_none_or(|(top, current)| {
                priority > top || (priority == top && current.builtin && !registration.builtin)
            });
            if wins {
                best = Some((priority, registration));
            }
        }
        best.map(|(_, registration)| Arc::clone(&registration.converter))
    }

    /// Drops all memoized matches.
    pub fn clear_cache(&self) {
        self.invalidate();
    }

    fn invalidate(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.generation += 1;
        cache.entries.clear();
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.converters().len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters().is_empty()
    }

    /// Number of memoized matches.
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::converter::{BUILTIN_PRIORITY, MISMATCH};
    use crate::error::Result;
    use crate::value::Value;

    /// Accepts text→text at a fixed priority and tags converted values.
    #[derive(Debug)]
    struct Tagging {
        tag: &'static str,
        priority: i32,
        cacheable: bool,
        calls: AtomicUsize,
    }

    impl Tagging {
        fn new(tag: &'static str, priority: i32) -> Arc<Self> {
            Arc::new(Self {
                tag,
                priority,
                cacheable: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Converter for Tagging {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn match_priority(&self, model: &ValueType, row: &ValueType) -> i32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *model == ValueType::Text && *row == ValueType::Text {
                self.priority
            } else {
                MISMATCH
            }
        }

        fn to_model(&self, _value: Value, _model: &ValueType) -> Result<Value> {
            Ok(Value::Text(self.tag.to_string()))
        }

        fn to_row(&self, value: Value, _row: &ValueType) -> Result<Value> {
            Ok(value)
        }

        fn cacheable(&self) -> bool {
            self.cacheable
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.len(), 11);
        assert!(ConverterRegistry::empty().is_empty());
    }

    #[test]
    fn test_highest_priority_wins() {
        let registry = ConverterRegistry::new();
        let json = registry
            .match_converter(&ValueType::list_of(ValueType::I64), &ValueType::Json)
            .unwrap();
        assert_eq!(json.name(), "json-list");
        let date = registry
            .match_converter(&ValueType::Date, &ValueType::Text)
            .unwrap();
        assert_eq!(date.name(), "date-text");
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let registry = ConverterRegistry::empty();
        registry.register(Tagging::new("first", 5), None);
        registry.register(Tagging::new("second", 5), None);
        let c = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert_eq!(c.name(), "first");
    }

    #[test]
    fn test_custom_converter_wins_tie_with_builtin() {
        let registry = ConverterRegistry::new();
        registry.register(Tagging::new("custom", 0), None);
        let c = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert_eq!(c.name(), "custom");
    }

    #[test]
    fn test_override_and_restore() {
        let registry = ConverterRegistry::new();
        let before = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert_eq!(before.name(), "direct");

        registry.register(Tagging::new("custom", BUILTIN_PRIORITY + 1), Some("k"));
        let overridden = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert_eq!(overridden.name(), "custom");

        assert_eq!(registry.unregister("k"), 1);
        let restored = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert!(Arc::ptr_eq(&before, &restored));
    }

    #[test]
    fn test_match_is_cached() {
        let registry = ConverterRegistry::empty();
        let tagging = Tagging::new("t", 3);
        registry.register(tagging.clone(), None);

        let a = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        let b = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(tagging.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.cached_len(), 1);
    }

    #[test]
    fn test_misses_are_not_cached() {
        let registry = ConverterRegistry::empty();
        registry.register(Tagging::new("t", 3), None);
        assert!(registry
            .match_converter(&ValueType::I64, &ValueType::Date)
            .is_none());
        assert_eq!(registry.cached_len(), 0);
    }

    #[test]
    fn test_non_cacheable_converter_is_rescanned() {
        let registry = ConverterRegistry::empty();
        let tagging = Arc::new(Tagging {
            tag: "volatile",
            priority: 3,
            cacheable: false,
            calls: AtomicUsize::new(0),
        });
        registry.register(tagging.clone(), None);

        registry.match_converter(&ValueType::Text, &ValueType::Text);
        registry.match_converter(&ValueType::Text, &ValueType::Text);
        assert_eq!(tagging.calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_len(), 0);
    }

    #[test]
    fn test_register_invalidates_cache() {
        let registry = ConverterRegistry::new();
        registry.match_converter(&ValueType::Text, &ValueType::Text);
        assert_eq!(registry.cached_len(), 1);

        registry.register(Tagging::new("x", 1), None);
        assert_eq!(registry.cached_len(), 0);
    }

    #[test]
    fn test_reregister_updates_key_in_place() {
        let registry = ConverterRegistry::empty();
        let first = Tagging::new("first", 5);
        registry.register(first.clone(), Some("a"));
        registry.register(Tagging::new("second", 5), None);
        registry.register(first.clone(), Some("b"));
        assert_eq!(registry.len(), 2);

        let c = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert_eq!(c.name(), "first");
        assert_eq!(registry.unregister("a"), 0);
        assert_eq!(registry.unregister("b"), 1);
    }

    #[test]
    fn test_negative_priorities_ignored() {
        let registry = ConverterRegistry::empty();
        registry.register(Tagging::new("neg", -5), None);
        assert!(registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .is_none());
    }

    #[test]
    fn test_clear_cache_keeps_converters() {
        let registry = ConverterRegistry::new();
        registry.match_converter(&ValueType::I32, &ValueType::I64);
        registry.clear_cache();
        assert_eq!(registry.cached_len(), 0);
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn test_concurrent_matching_and_registration() {
        let registry = Arc::new(ConverterRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        if i % 4 == 0 {
                            registry.register(Tagging::new("churn", 50), Some("churn"));
                            registry.unregister("churn");
                        } else {
                            registry.match_converter(&ValueType::I32, &ValueType::I64);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        registry.unregister("churn");
        let c = registry
            .match_converter(&ValueType::Text, &ValueType::Text)
            .unwrap();
        assert_eq!(c.name(), "direct");
    }
}

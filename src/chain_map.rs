use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::chain_table::ChainTable;

/// A key/value map backed by the chaining `ChainTable`, with a fixed default
/// value for absent keys.
///
/// `ChainMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash keys. Every
/// map is constructed with a `default_value`; [`get`] returns a reference to
/// it instead of an `Option` when a key is absent, so lookups never signal a
/// missing key. The default is fixed at construction and immutable
/// thereafter.
///
/// Updates follow the underlying table's tail rule: [`set`] examines only
/// the last entry of the target bucket's chain, so a matching entry earlier
/// in a chain is shadowed rather than updated. See [`ChainTable::upsert_tail`]
/// for the full semantics.
///
/// # Performance Characteristics
///
/// - **Memory**: one heap node per entry, holding the `(K, V)` pair, its
///   64-bit hash, and a link to the next chain node.
///
/// [`get`]: ChainMap::get
/// [`set`]: ChainMap::set
#[derive(Clone)]
pub struct ChainMap<K, V, S = crate::DefaultHashBuilder> {
    table: ChainTable<(K, V)>,
    hash_builder: S,
    default_value: V,
}

impl<K, V, S> Debug for ChainMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new map with the given default value and hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: ChainMap<i32, String, _> = ChainMap::with_hasher(String::new(), SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(default_value: V, hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(
            default_value,
            crate::chain_table::INITIAL_CAPACITY,
            hash_builder,
        )
    }

    /// Creates a new map with the given default value, bucket capacity, and
    /// hasher builder.
    ///
    /// A requested capacity of zero is clamped to one bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: ChainMap<i32, String, _> =
    ///     ChainMap::with_capacity_and_hasher(String::new(), 100, SimpleHasher);
    /// assert_eq!(map.capacity(), 100);
    /// ```
    pub fn with_capacity_and_hasher(default_value: V, capacity: usize, hash_builder: S) -> Self {
        Self {
            table: ChainTable::with_capacity(capacity),
            hash_builder,
            default_value,
        }
    }

    /// Returns the number of entries in the map, summing chain lengths.
    ///
    /// Shadowed duplicates count individually; this is not necessarily the
    /// number of distinct keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainMap;
    ///
    /// let mut map: ChainMap<u64, &str> = ChainMap::new("");
    /// assert_eq!(map.len(), 0);
    /// map.set(1, "a");
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets heading a non-empty chain.
    ///
    /// This is the metric consulted by the growth policy: the bucket array
    /// doubles when more than 75% of buckets are occupied after an insert.
    /// It is not the number of keys; see [`len`].
    ///
    /// [`len`]: ChainMap::len
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainMap;
    ///
    /// let mut map: ChainMap<u64, u32> = ChainMap::new(0);
    /// map.set(1, 10);
    /// map.set(2, 20);
    /// assert!(map.occupied_bucket_count() <= 2);
    /// # }
    /// ```
    pub fn occupied_bucket_count(&self) -> usize {
        self.table.occupied_buckets()
    }

    /// Returns the ratio of occupied buckets to total buckets.
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Returns a reference to the default value supplied at construction.
    pub fn default_value(&self) -> &V {
        &self.default_value
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Inserts a key-value pair, updating the target chain's tail in place
    /// when its key matches.
    ///
    /// Returns the replaced value when the tail matched, `None` otherwise.
    /// A matching entry that is not at the tail is left in place and the new
    /// pair is appended after the tail; the earlier entry then shadows it
    /// during lookups. May double the bucket array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainMap;
    ///
    /// let mut map: ChainMap<&str, u32> = ChainMap::new(0);
    /// assert_eq!(map.set("a", 1), None);
    /// assert_eq!(map.set("a", 2), Some(1));
    /// assert_eq!(map.get(&"a"), &2);
    /// # }
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        self.table
            .upsert_tail(hash, (key, value), |existing, candidate| {
                existing.0 == candidate.0
            })
            .map(|(_, v)| v)
    }

    /// Returns a reference to the value for `key`, or to the default value
    /// when the key is absent.
    ///
    /// The target chain is scanned from its head and the first match wins.
    /// Absent keys are not an error; the reference semantics make every
    /// lookup total.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainMap;
    ///
    /// let mut map: ChainMap<&str, u32> = ChainMap::new(99);
    /// map.set("present", 1);
    ///
    /// assert_eq!(map.get(&"present"), &1);
    /// assert_eq!(map.get(&"absent"), &99);
    /// # }
    /// ```
    pub fn get(&self, key: &K) -> &V {
        let hash = self.hash_builder.hash_one(key);
        match self.table.find(hash, |(k, _)| k == key) {
            Some((_, v)) => v,
            None => &self.default_value,
        }
    }

    /// Returns a mutable reference to the value for `key`, or `None` when
    /// the key is absent.
    ///
    /// The default value is not reachable through this method; it stays
    /// immutable for the life of the map.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_mut(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the map holds an entry for `key`.
    ///
    /// This distinguishes a stored value from the default returned by
    /// [`get`] on a miss.
    ///
    /// [`get`]: ChainMap::get
    pub fn contains_key(&self, key: &K) -> bool {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).is_some()
    }

    /// Returns an iterator over the map's key-value pairs.
    ///
    /// Pairs are yielded in bucket order, each chain head to tail, shadowed
    /// duplicates included.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the map's keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the map's values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new map with the given default value, using the default
    /// hasher builder and the default bucket capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainMap;
    ///
    /// let map: ChainMap<String, u32> = ChainMap::new(0);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 10);
    /// # }
    /// ```
    pub fn new(default_value: V) -> Self {
        Self::with_hasher(default_value, S::default())
    }

    /// Creates a new map with the given default value and bucket capacity,
    /// using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainMap;
    ///
    /// let map: ChainMap<String, u32> = ChainMap::with_capacity(0, 64);
    /// assert_eq!(map.capacity(), 64);
    /// # }
    /// ```
    pub fn with_capacity(default_value: V, capacity: usize) -> Self {
        Self::with_capacity_and_hasher(default_value, capacity, S::default())
    }
}

impl<K, V, S> Default for ChainMap<K, V, S>
where
    K: Hash + Eq,
    V: Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new(V::default())
    }
}

/// An iterator over the key-value pairs of a `ChainMap`.
pub struct Iter<'a, K, V> {
    inner: crate::chain_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

/// An iterator over the keys of a `ChainMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `ChainMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Hashes a `u64` key to itself, pinning its bucket to `key % capacity`.
    #[derive(Clone, Default)]
    struct IdentityBuilder;

    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | b as u64;
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    impl BuildHasher for IdentityBuilder {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }

    #[test]
    fn test_untouched_map_returns_default() {
        let map: ChainMap<u64, String, SipHashBuilder> =
            ChainMap::new("fallback".to_string());
        for k in 0..100u64 {
            assert_eq!(map.get(&k), "fallback");
        }
        assert!(map.is_empty());
        assert_eq!(map.occupied_bucket_count(), 0);
    }

    #[test]
    fn test_set_and_get() {
        let mut map: ChainMap<u64, String, SipHashBuilder> = ChainMap::new(String::new());

        assert_eq!(map.set(1, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), "hello");
        assert_eq!(map.get(&2), "");
    }

    #[test]
    fn test_overwrite_without_collision() {
        let mut map: ChainMap<String, String, SipHashBuilder> = ChainMap::new(String::new());
        map.set("A".to_string(), "1".to_string());
        assert_eq!(
            map.set("A".to_string(), "2".to_string()),
            Some("1".to_string())
        );
        assert_eq!(map.get(&"A".to_string()), "2");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_repeated_set_is_idempotent() {
        let mut map: ChainMap<u64, u32, SipHashBuilder> = ChainMap::new(0);
        for _ in 0..10 {
            map.set(7, 42);
        }
        assert_eq!(map.get(&7), &42);
        assert_eq!(map.len(), 1);
        assert_eq!(map.occupied_bucket_count(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut map: ChainMap<u64, String, SipHashBuilder> = ChainMap::new(String::new());
        map.set(1, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), "hello world");
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map: ChainMap<u64, u32, SipHashBuilder> = ChainMap::new(0);
        assert!(!map.contains_key(&1));

        map.set(1, 0);
        // A stored value equal to the default is still "present".
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_occupied_bucket_count() {
        let mut map: ChainMap<u64, u32, IdentityBuilder> =
            ChainMap::with_hasher(0, IdentityBuilder);
        assert_eq!(map.capacity(), 10);

        // Keys 0 and 10 share bucket 0 under ten buckets.
        map.set(0, 1);
        map.set(10, 2);
        assert_eq!(map.occupied_bucket_count(), 1);
        assert_eq!(map.len(), 2);

        map.set(3, 3);
        assert_eq!(map.occupied_bucket_count(), 2);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_resize_scenario() {
        let mut map: ChainMap<u64, u64, IdentityBuilder> =
            ChainMap::with_hasher(0, IdentityBuilder);

        for k in 0..7u64 {
            map.set(k, k * 100);
        }
        assert_eq!(map.capacity(), 10);

        // The eighth distinct bucket pushes occupancy past 0.75.
        map.set(7, 700);
        assert_eq!(map.capacity(), 20);
        assert_eq!(map.occupied_bucket_count(), 8);

        for k in 0..8u64 {
            assert_eq!(map.get(&k), &(k * 100));
        }
    }

    #[test]
    fn test_shadowed_duplicate_after_collision() {
        let mut map: ChainMap<u64, &str, IdentityBuilder> =
            ChainMap::with_hasher("", IdentityBuilder);

        map.set(0, "first");
        map.set(10, "second");
        // Key 0 is not at its chain's tail, so this appends a duplicate.
        assert_eq!(map.set(0, "again"), None);

        assert_eq!(map.len(), 3);
        // The head-first scan reaches the original entry before the duplicate.
        assert_eq!(map.get(&0), &"first");
        assert_eq!(map.get(&10), &"second");
    }

    #[test]
    fn test_default_value_accessor() {
        let map: ChainMap<u64, u32, SipHashBuilder> = ChainMap::new(55);
        assert_eq!(map.default_value(), &55);
    }

    #[test]
    fn test_with_capacity_zero_clamps() {
        let map: ChainMap<u64, u32, SipHashBuilder> = ChainMap::with_capacity(0, 0);
        assert_eq!(map.capacity(), 1);
    }

    #[test]
    fn test_load_factor() {
        let mut map: ChainMap<u64, u32, IdentityBuilder> =
            ChainMap::with_hasher(0, IdentityBuilder);
        for k in 0..5u64 {
            map.set(k, 0);
        }
        assert!((map.load_factor() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_many_inserts_survive_growth() {
        let mut map: ChainMap<u64, u64, SipHashBuilder> = ChainMap::new(u64::MAX);

        for k in 0..1000u64 {
            map.set(k, k * 2);
        }

        assert_eq!(map.len(), 1000);
        assert!(map.capacity() > 10);

        for k in 0..1000u64 {
            assert_eq!(map.get(&k), &(k * 2));
        }
        assert_eq!(map.get(&5000), &u64::MAX);
    }

    #[test]
    fn test_string_keys() {
        let mut map: ChainMap<String, i32, SipHashBuilder> = ChainMap::new(-1);

        map.set("hello".to_string(), 1);
        map.set("world".to_string(), 2);
        map.set("rust".to_string(), 3);

        assert_eq!(map.get(&"hello".to_string()), &1);
        assert_eq!(map.get(&"world".to_string()), &2);
        assert_eq!(map.get(&"rust".to_string()), &3);
        assert_eq!(map.get(&"missing".to_string()), &-1);
    }

    #[test]
    fn test_default_trait() {
        let map: ChainMap<u64, u32, SipHashBuilder> = ChainMap::default();
        assert!(map.is_empty());
        assert_eq!(map.default_value(), &0);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut map: ChainMap<u64, String, SipHashBuilder> = ChainMap::new(String::new());
        map.set(1, "one".to_string());
        map.set(2, "two".to_string());

        let copy = map.clone();
        if let Some(v) = map.get_mut(&1) {
            *v = "changed".to_string();
        }

        assert_eq!(copy.get(&1), "one");
        assert_eq!(map.get(&1), "changed");
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_iterators() {
        let mut map: ChainMap<u64, String, SipHashBuilder> = ChainMap::new(String::new());
        map.set(1, "one".to_string());
        map.set(2, "two".to_string());
        map.set(3, "three".to_string());

        let pairs: std::collections::HashMap<u64, String> =
            map.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get(&1), Some(&"one".to_string()));
        assert_eq!(pairs.get(&2), Some(&"two".to_string()));
        assert_eq!(pairs.get(&3), Some(&"three".to_string()));

        let keys: std::collections::HashSet<u64> = map.keys().copied().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&1));
        assert!(keys.contains(&2));
        assert!(keys.contains(&3));

        let values: std::collections::HashSet<String> = map.values().cloned().collect();
        assert!(values.contains("one"));
        assert!(values.contains("two"));
        assert!(values.contains("three"));
    }
}

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

/// Bucket count of a table created with [`ChainTable::new`].
pub const INITIAL_CAPACITY: usize = 10;

/// Occupancy threshold check, as integer arithmetic.
///
/// True exactly when `occupied / capacity` is strictly greater than 0.75.
#[inline(always)]
fn growth_due(occupied: usize, capacity: usize) -> bool {
    (occupied as u128) * 4 > (capacity as u128) * 3
}

type Link<V> = Option<Box<Node<V>>>;

struct Node<V> {
    hash: u64,
    value: V,
    next: Link<V>,
}

/// Step to the last node of a chain.
#[inline]
fn chain_tail<V>(mut node: &mut Node<V>) -> &mut Node<V> {
    while node.next.is_some() {
        // The loop condition guarantees a successor to step into.
        node = node.next.as_deref_mut().unwrap();
    }
    node
}

/// Occupancy statistics for chain analysis.
///
/// Returned by [`ChainTable::stats`] when the `stats` feature is enabled.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct ChainStats {
    /// Total number of buckets allocated
    pub capacity: usize,
    /// Number of buckets heading a non-empty chain
    pub occupied_buckets: usize,
    /// Number of entries across all chains
    pub entries: usize,
    /// Load factor (occupied_buckets / capacity)
    pub load_factor: f64,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Bucket counts indexed by chain length; index 0 is the empty buckets
    pub chain_length_counts: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ChainStats {
    /// Pretty-print the occupancy statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Chain Table Statistics ===");
        println!(
            "Buckets: {}/{} occupied ({:.2}% load factor)",
            self.occupied_buckets,
            self.capacity,
            self.load_factor * 100.0
        );
        println!("Entries: {}", self.entries);
        println!("Longest chain: {}", self.longest_chain);
        for (length, count) in self.chain_length_counts.iter().enumerate().skip(1) {
            if *count != 0 {
                println!("Chains of length {}: {}", length, count);
            }
        }
    }
}

/// A hash table using separate chaining with exclusively-owned chain nodes.
///
/// `ChainTable<V>` stores values of type `V` and provides insertion, update,
/// and lookup operations. Unlike standard hash maps, this implementation
/// requires you to provide the hash value and an equality predicate for each
/// operation; the table itself knows nothing about keys.
///
/// Each bucket is either empty or heads a singly linked chain where every
/// node owns its successor. A value lives in the bucket selected by its hash
/// modulo the current capacity. After every insert the table checks its
/// occupied-bucket ratio and doubles the bucket array once the ratio exceeds
/// 0.75, relinking every chain node under the new capacity. Capacity never
/// shrinks, and there is no removal operation.
///
/// The caller-supplied hash is stored alongside each value, so migration
/// never re-derives key content.
///
/// ## Example
///
/// ```rust
/// use chain_hash::ChainTable;
///
/// let mut table: ChainTable<(u64, &str)> = ChainTable::new();
///
/// table.upsert_tail(42, (42, "answer"), |a, b| a.0 == b.0);
/// assert_eq!(table.find(42, |&(k, _)| k == 42), Some(&(42, "answer")));
/// assert_eq!(table.find(7, |&(k, _)| k == 7), None);
/// ```
pub struct ChainTable<V> {
    buckets: Vec<Link<V>>,
    occupied: usize,
    entries: usize,
}

impl<V> Debug for ChainTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut chain_lengths = Vec::with_capacity(self.buckets.len());
        for slot in &self.buckets {
            let mut length = 0usize;
            let mut cursor = slot.as_deref();
            while let Some(node) = cursor {
                length += 1;
                cursor = node.next.as_deref();
            }
            chain_lengths.push(length);
        }

        f.debug_struct("ChainTable")
            .field("capacity", &self.buckets.len())
            .field("occupied_buckets", &self.occupied)
            .field("entries", &self.entries)
            .field("chain_lengths", &chain_lengths)
            .finish()
    }
}

impl<V> Clone for ChainTable<V>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        let mut buckets = Vec::with_capacity(self.buckets.len());
        for slot in &self.buckets {
            let mut copied: Vec<(u64, V)> = Vec::new();
            let mut cursor = slot.as_deref();
            while let Some(node) = cursor {
                copied.push((node.hash, node.value.clone()));
                cursor = node.next.as_deref();
            }

            // Rebuild front-to-back by pushing in reverse.
            let mut chain: Link<V> = None;
            for (hash, value) in copied.into_iter().rev() {
                chain = Some(Box::new(Node {
                    hash,
                    value,
                    next: chain,
                }));
            }
            buckets.push(chain);
        }

        ChainTable {
            buckets,
            occupied: self.occupied,
            entries: self.entries,
        }
    }
}

impl<V> Drop for ChainTable<V> {
    fn drop(&mut self) {
        // Unlink each node before it drops; chain teardown must not recurse.
        for slot in &mut self.buckets {
            let mut cursor = slot.take();
            while let Some(mut node) = cursor {
                cursor = node.next.take();
            }
        }
    }
}

impl<V> Default for ChainTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ChainTable<V> {
    /// Creates a new table with [`INITIAL_CAPACITY`] empty buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::ChainTable;
    /// use chain_hash::chain_table::INITIAL_CAPACITY;
    ///
    /// let table: ChainTable<u64> = ChainTable::new();
    /// assert_eq!(table.capacity(), INITIAL_CAPACITY);
    /// assert!(table.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a new table with the specified number of buckets.
    ///
    /// A requested capacity of zero is clamped to one bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::ChainTable;
    ///
    /// let table: ChainTable<u64> = ChainTable::with_capacity(32);
    /// assert_eq!(table.capacity(), 32);
    ///
    /// let clamped: ChainTable<u64> = ChainTable::with_capacity(0);
    /// assert_eq!(clamped.capacity(), 1);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, || None);
        Self {
            buckets,
            occupied: 0,
            entries: 0,
        }
    }

    /// Returns the current number of buckets.
    ///
    /// Capacity only ever grows; it doubles whenever more than 75% of the
    /// buckets are occupied after an insert.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of buckets heading a non-empty chain.
    ///
    /// This is the metric consulted by the growth policy and is distinct
    /// from [`len`], which counts entries.
    ///
    /// [`len`]: ChainTable::len
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::ChainTable;
    ///
    /// let mut table: ChainTable<(u64, i32)> = ChainTable::with_capacity(10);
    /// // Hashes 3 and 13 select the same bucket out of 10.
    /// table.upsert_tail(3, (1, 10), |a, b| a.0 == b.0);
    /// table.upsert_tail(13, (2, 20), |a, b| a.0 == b.0);
    ///
    /// assert_eq!(table.occupied_buckets(), 1);
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn occupied_buckets(&self) -> usize {
        self.occupied
    }

    /// Returns the number of entries in the table, summing chain lengths.
    ///
    /// Shadowed duplicates count individually.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Returns the ratio of occupied buckets to total buckets.
    pub fn load_factor(&self) -> f64 {
        self.occupied as f64 / self.buckets.len() as f64
    }

    /// Returns the index of the bucket `hash` selects under the current
    /// capacity.
    ///
    /// The index is recomputed against the doubled capacity whenever the
    /// table grows, so it is only stable between inserts.
    pub fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Inserts `value` into the chain for `hash`, updating the chain tail in
    /// place when it matches.
    ///
    /// If the bucket is empty the value starts a new chain. Otherwise the
    /// chain is walked to its last entry: when `same(tail, &value)` holds the
    /// tail's value is replaced and the previous value returned, and when it
    /// does not the value is appended after the tail. Only the tail is
    /// examined: a matching entry earlier in the chain is left in place and
    /// shadows the appended duplicate, because lookups scan from the head.
    ///
    /// Every call re-evaluates the occupancy ratio afterwards and may double
    /// the capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::ChainTable;
    ///
    /// let mut table: ChainTable<(u64, &str)> = ChainTable::new();
    ///
    /// // Empty bucket: a new single-entry chain.
    /// assert_eq!(table.upsert_tail(1, (1, "one"), |a, b| a.0 == b.0), None);
    /// // The chain tail matches, so its value is replaced.
    /// assert_eq!(
    ///     table.upsert_tail(1, (1, "uno"), |a, b| a.0 == b.0),
    ///     Some((1, "one"))
    /// );
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn upsert_tail(
        &mut self,
        hash: u64,
        value: V,
        same: impl Fn(&V, &V) -> bool,
    ) -> Option<V> {
        let index = self.bucket_of(hash);
        let replaced = match self.buckets[index] {
            None => {
                self.buckets[index] = Some(Box::new(Node {
                    hash,
                    value,
                    next: None,
                }));
                self.occupied += 1;
                self.entries += 1;
                None
            }
            Some(ref mut head) => {
                let tail = chain_tail(head);
                if tail.hash == hash && same(&tail.value, &value) {
                    Some(core::mem::replace(&mut tail.value, value))
                } else {
                    tail.next = Some(Box::new(Node {
                        hash,
                        value,
                        next: None,
                    }));
                    self.entries += 1;
                    None
                }
            }
        };

        self.maybe_grow();
        replaced
    }

    /// Returns a reference to the first chain entry matching `hash` and `eq`.
    ///
    /// The chain is scanned from its head, so when duplicates exist the
    /// earliest entry wins. Returns `None` when the bucket is empty or the
    /// chain holds no match.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::ChainTable;
    ///
    /// let mut table: ChainTable<(u64, i32)> = ChainTable::with_capacity(10);
    /// table.upsert_tail(2, (1, 10), |a, b| a.0 == b.0);
    /// // Hash 12 collides with hash 2 at capacity 10.
    /// table.upsert_tail(12, (2, 20), |a, b| a.0 == b.0);
    /// // Key 1 is not at the tail, so this appends a shadowed duplicate.
    /// table.upsert_tail(2, (1, 30), |a, b| a.0 == b.0);
    ///
    /// assert_eq!(table.find(2, |&(k, _)| k == 1), Some(&(1, 10)));
    /// assert_eq!(table.len(), 3);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let mut cursor = self.buckets[self.bucket_of(hash)].as_deref();
        while let Some(node) = cursor {
            if node.hash == hash && eq(&node.value) {
                return Some(&node.value);
            }
            cursor = node.next.as_deref();
        }
        None
    }

    /// Returns a mutable reference to the first chain entry matching `hash`
    /// and `eq`.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.bucket_of(hash);
        let mut cursor = self.buckets[index].as_deref_mut();
        while let Some(node) = cursor {
            if node.hash == hash && eq(&node.value) {
                return Some(&mut node.value);
            }
            cursor = node.next.as_deref_mut();
        }
        None
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Values are yielded in bucket order, each chain head to tail. Shadowed
    /// duplicates are yielded individually.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::ChainTable;
    ///
    /// let mut table: ChainTable<(u64, i32)> = ChainTable::new();
    /// table.upsert_tail(1, (1, 10), |a, b| a.0 == b.0);
    /// table.upsert_tail(2, (2, 20), |a, b| a.0 == b.0);
    ///
    /// let mut keys: Vec<u64> = table.iter().map(|&(k, _)| k).collect();
    /// keys.sort_unstable();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            cursor: None,
        }
    }

    /// Returns an occupancy snapshot of the table.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> ChainStats {
        let mut chain_length_counts = Vec::new();
        let mut longest_chain = 0usize;
        for slot in &self.buckets {
            let mut length = 0usize;
            let mut cursor = slot.as_deref();
            while let Some(node) = cursor {
                length += 1;
                cursor = node.next.as_deref();
            }
            if length >= chain_length_counts.len() {
                chain_length_counts.resize(length + 1, 0);
            }
            chain_length_counts[length] += 1;
            longest_chain = longest_chain.max(length);
        }

        ChainStats {
            capacity: self.buckets.len(),
            occupied_buckets: self.occupied,
            entries: self.entries,
            load_factor: self.load_factor(),
            longest_chain,
            chain_length_counts,
        }
    }

    fn maybe_grow(&mut self) {
        if growth_due(self.occupied, self.buckets.len()) {
            self.grow();
        }
    }

    /// Double the bucket array and relink every node under the new capacity.
    ///
    /// Nodes are appended at the tail of their new chain in old-array
    /// traversal order, so relative chain order survives migration. No
    /// occupancy check runs while relinking; the ratio is next consulted on
    /// the following insert.
    fn grow(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        let mut next_buckets = Vec::with_capacity(new_capacity);
        next_buckets.resize_with(new_capacity, || None);

        let old_buckets = core::mem::replace(&mut self.buckets, next_buckets);
        self.occupied = 0;

        for head in old_buckets {
            let mut cursor = head;
            while let Some(mut node) = cursor {
                cursor = node.next.take();
                self.relink(node);
            }
        }
    }

    /// Append a detached node at the tail of the chain its hash now selects.
    fn relink(&mut self, node: Box<Node<V>>) {
        debug_assert!(node.next.is_none());
        let index = self.bucket_of(node.hash);
        match self.buckets[index] {
            None => {
                self.buckets[index] = Some(node);
                self.occupied += 1;
            }
            Some(ref mut head) => {
                chain_tail(head).next = Some(node);
            }
        }
    }
}

/// An iterator over the values of a `ChainTable`.
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Link<V>>,
    cursor: Option<&'a Node<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.cursor {
                self.cursor = node.next.as_deref();
                return Some(&node.value);
            }
            match self.buckets.next() {
                Some(head) => self.cursor = head.as_deref(),
                None => return None,
            }
        }
    }
}

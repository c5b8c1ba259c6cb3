// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A bounded, insertion-ordered map evicting its oldest entries by count or byte size.
//!
//! [`CircularMap`] pairs an `AHashMap` key index with an [`OrderedSlab`] holding
//! the entries oldest first. Every entry records its *accounted cost* (key bytes
//! plus value bytes) when it is inserted, and every removal path subtracts that
//! recorded cost, never a re-measured one. The running total is kept in
//! `current_size`.
//!
//! Inserting an existing key removes the old entry first, so an update moves
//! the key to the newest position. Reads never change the order.

use std::{
    borrow::Borrow,
    fmt::Debug,
    hash::Hash,
};

use ahash::AHashMap;
use circular_dict_core::{
    correctness::{FAILED, check_equal_usize, check_in_range_inclusive_usize, check_predicate_true},
    size::{ByteSizer, GetSizeSizer, NoSizer},
};
use get_size2::GetSize;

use super::{
    config::CircularDictConfig,
    error::{CircularDictError, ConfigError},
    order::OrderedSlab,
};

/// A callback invoked with each automatically evicted entry.
pub type EvictionListener<K, V> = Box<dyn FnMut(&K, &V) + Send>;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    cost: usize,
}

/// A bounded map which evicts its oldest entries once `max_len` or
/// `max_size_bytes` would be exceeded.
///
/// This type is single-owner (`&mut self` mutators). Use
/// [`CircularDict`](super::shared::CircularDict) to share one map across threads.
///
/// # Examples
///
/// ```
/// use circular_dict::cache::{CircularDictConfig, CircularMap};
///
/// let config = CircularDictConfig::with_max_len(3).unwrap();
/// let mut map = CircularMap::count_bounded(config).unwrap();
/// map.insert(1, "one").unwrap();
/// map.insert(2, "two").unwrap();
/// map.insert(3, "three").unwrap();
/// assert!(map.is_full());
///
/// // Adding beyond capacity evicts the oldest
/// map.insert(4, "four").unwrap();
/// assert!(!map.contains_key(&1));
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
/// ```
pub struct CircularMap<K, V, S = GetSizeSizer> {
    config: CircularDictConfig,
    sizer: S,
    order: OrderedSlab<Entry<K, V>>,
    index: AHashMap<K, usize>,
    current_size: usize,
    evictions: u64,
    on_evict: Option<EvictionListener<K, V>>,
}

impl<K, V> CircularMap<K, V, GetSizeSizer>
where
    K: Clone + Eq + Hash + GetSize,
    V: GetSize,
{
    /// Creates a new empty [`CircularMap`] measuring entries with `get_size2`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: CircularDictConfig) -> Result<Self, CircularDictError> {
        Self::with_sizer(config, GetSizeSizer)
    }
}

impl<K, V> CircularMap<K, V, NoSizer>
where
    K: Clone + Eq + Hash,
{
    /// Creates a new empty [`CircularMap`] without byte-size measurement.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or sets `max_size_bytes`.
    pub fn count_bounded(config: CircularDictConfig) -> Result<Self, CircularDictError> {
        Self::with_sizer(config, NoSizer)
    }
}

impl<K, V, S> CircularMap<K, V, S>
where
    K: Clone + Eq + Hash,
    S: ByteSizer<K, V>,
{
    /// Creates a new empty [`CircularMap`] measuring entries with `sizer`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid, or if it sets `max_size_bytes`
    /// while `sizer` cannot measure byte sizes.
    pub fn with_sizer(config: CircularDictConfig, sizer: S) -> Result<Self, CircularDictError> {
        config.validate()?;
        if config.max_size_bytes.is_some() && !sizer.is_available() {
            return Err(ConfigError::SizeMeasurementUnavailable.into());
        }

        Ok(Self {
            config,
            sizer,
            order: OrderedSlab::new(),
            index: AHashMap::new(),
            current_size: 0,
            evictions: 0,
            on_evict: None,
        })
    }

    /// Registers `listener` to be called with every automatically evicted entry.
    ///
    /// Explicit removals and [`CircularMap::clear`] do not notify the listener.
    /// The listener runs in the middle of [`CircularMap::insert`]; when the map is
    /// shared through a [`CircularDict`](super::shared::CircularDict) the lock is
    /// held, and calling back into the same dictionary deadlocks.
    #[must_use]
    pub fn with_eviction_listener(
        mut self,
        listener: impl FnMut(&K, &V) + Send + 'static,
    ) -> Self {
        self.on_evict = Some(Box::new(listener));
        self
    }

    /// Replaces the eviction listener.
    ///
    /// See [`CircularMap::with_eviction_listener`] for when it runs.
    pub fn set_eviction_listener(&mut self, listener: Option<EvictionListener<K, V>>) {
        self.on_evict = listener;
    }

    /// Returns the capacity configuration.
    #[must_use]
    pub const fn config(&self) -> CircularDictConfig {
        self.config
    }

    /// Returns the maximum number of entries, if bounded by count.
    #[must_use]
    pub const fn max_len(&self) -> Option<usize> {
        self.config.max_len
    }

    /// Returns the maximum accounted size in bytes, if bounded by size.
    #[must_use]
    pub const fn max_size_bytes(&self) -> Option<usize> {
        self.config.max_size_bytes
    }

    /// Returns the sum of the accounted costs of all resident entries.
    #[must_use]
    pub const fn current_size(&self) -> usize {
        self.current_size
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns the number of entries evicted automatically so far.
    #[must_use]
    pub const fn eviction_count(&self) -> u64 {
        self.evictions
    }

    /// Returns whether the map has no entries.
    ///
    /// # Panics
    ///
    /// Panics if the map is empty but `current_size` is not zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let empty = self.order.is_empty();
        if empty {
            check_equal_usize(self.current_size, 0, "current_size", "empty size").expect(FAILED);
        }
        empty
    }

    /// Returns whether a limit is exactly reached.
    ///
    /// A full map evicts its oldest entry on the next insertion of a new key.
    ///
    /// # Panics
    ///
    /// Panics if `current_size` exceeds `max_size_bytes` or the entry count exceeds `max_len`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        if let Some(max_size_bytes) = self.config.max_size_bytes {
            check_in_range_inclusive_usize(self.current_size, 0, max_size_bytes, "current_size")
                .expect(FAILED);
        }
        if let Some(max_len) = self.config.max_len {
            check_in_range_inclusive_usize(self.len(), 0, max_len, "len").expect(FAILED);
        }

        self.config.max_len.is_some_and(|n| self.len() == n)
            || self
                .config
                .max_size_bytes
                .is_some_and(|n| self.current_size == n)
    }

    /// Returns whether the map contains `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(key)
    }

    /// Returns a reference to the value for `key`. The order is not changed.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entry(key).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// The accounted cost of the entry is not re-measured after mutation; it
    /// changes only when the key is inserted again.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = *self.index.get(key)?;
        self.order.get_mut(handle).map(|entry| &mut entry.value)
    }

    /// Returns the cost recorded for `key` when it was last inserted.
    #[must_use]
    pub fn accounted_size<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entry(key).map(|entry| entry.cost)
    }

    /// Returns the oldest entry without removing it.
    #[must_use]
    pub fn peek_oldest(&self) -> Option<(&K, &V)> {
        self.order.front().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns the newest entry without removing it.
    #[must_use]
    pub fn peek_newest(&self) -> Option<(&K, &V)> {
        self.order.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns an iterator over the entries from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator {
        self.order.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns an iterator over the keys from oldest to newest.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.order.iter().map(|entry| &entry.key)
    }

    /// Returns an iterator over the values from oldest to newest.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.order.iter().map(|entry| &entry.value)
    }

    /// Inserts a key-value pair at the newest position.
    ///
    /// If `key` is already present its entry is replaced and moved to the newest
    /// position, and the previous value is returned. Oldest entries are evicted
    /// until the new entry fits within `max_size_bytes` and `max_len`.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::CapacityExceeded`] if the cost of the entry
    /// alone exceeds `max_size_bytes`, or [`CircularDictError::SizeOverflow`] if
    /// the accounted size cannot hold it even after eviction. The map is left
    /// unchanged on error.
    ///
    /// # Panics
    ///
    /// Panics if the internal accounting is inconsistent.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, CircularDictError> {
        let item_size = self.sizer.entry_bytes(&key, &value);

        if let Some(max_size_bytes) = self.config.max_size_bytes
            && item_size > max_size_bytes
        {
            return Err(CircularDictError::CapacityExceeded {
                item_size,
                max_size_bytes,
            });
        }

        // A byte limit keeps the total representable; count-only maps must check
        if self.config.max_size_bytes.is_none()
            && self.current_size.checked_add(item_size).is_none()
            && self.projected_size(&key).checked_add(item_size).is_none()
        {
            return Err(CircularDictError::SizeOverflow {
                item_size,
                current_size: self.current_size,
            });
        }

        let previous = self.remove(&key);

        if let Some(max_size_bytes) = self.config.max_size_bytes {
            while self.current_size.saturating_add(item_size) > max_size_bytes {
                self.evict_oldest();
            }
        }

        if let Some(max_len) = self.config.max_len {
            while self.len() >= max_len {
                self.evict_oldest();
            }
        }

        let handle = self.order.push_back(Entry {
            key: key.clone(),
            value,
            cost: item_size,
        });
        self.index.insert(key, handle);
        self.current_size += item_size;

        log::trace!(
            "Inserted entry of {item_size} bytes, len={}, current_size={}",
            self.len(),
            self.current_size
        );

        Ok(previous)
    }

    /// Inserts every pair from `iter` in order.
    ///
    /// # Errors
    ///
    /// Returns the first insertion error; pairs before it remain inserted.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<(), CircularDictError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Removes `key`, returning its value if present.
    ///
    /// Removing an absent key is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the internal accounting is inconsistent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.index.remove(key)?;
        let entry = self
            .order
            .remove(handle)
            .expect("index references a vacant order slot");
        self.release(entry.cost);

        log::trace!("Removed entry of {} bytes, len={}", entry.cost, self.len());

        Some(entry.value)
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::KeyNotFound`] if `key` is absent.
    pub fn pop<Q>(&mut self, key: &Q) -> Result<V, CircularDictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(key).ok_or(CircularDictError::KeyNotFound)
    }

    /// Removes `key` and returns its value, or `default` if `key` is absent.
    pub fn pop_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(key).unwrap_or(default)
    }

    /// Removes and returns the oldest entry.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::EmptyContainer`] if the map is empty.
    pub fn pop_oldest(&mut self) -> Result<(K, V), CircularDictError> {
        self.take_oldest()
            .map(|entry| (entry.key, entry.value))
            .ok_or(CircularDictError::EmptyContainer)
    }

    /// Removes and returns the newest entry.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::EmptyContainer`] if the map is empty.
    pub fn pop_newest(&mut self) -> Result<(K, V), CircularDictError> {
        let entry = self
            .order
            .pop_back()
            .ok_or(CircularDictError::EmptyContainer)?;
        self.unindex(&entry);
        Ok((entry.key, entry.value))
    }

    /// Removes every entry and resets `current_size` to zero.
    pub fn clear(&mut self) {
        let len = self.len();
        self.order.clear();
        self.index.clear();
        self.current_size = 0;

        log::debug!("Cleared {len} entries");
    }

    /// Audits the whole map and panics on the first inconsistency found.
    ///
    /// Runs in O(n); intended for tests and debugging.
    ///
    /// # Panics
    ///
    /// Panics if the index and the order disagree, if `current_size` differs
    /// from the sum of accounted costs, or if a limit is exceeded.
    pub fn check_integrity(&self) {
        check_equal_usize(self.index.len(), self.order.len(), "index len", "order len")
            .expect(FAILED);

        for (key, handle) in &self.index {
            let linked = self.order.get(*handle).is_some_and(|entry| entry.key == *key);
            check_predicate_true(linked, "index entry does not match its order slot")
                .expect(FAILED);
        }

        let accounted: usize = self.order.iter().map(|entry| entry.cost).sum();
        check_equal_usize(self.current_size, accounted, "current_size", "accounted costs")
            .expect(FAILED);

        let _ = self.is_full();
        let _ = self.is_empty();
    }

    fn entry<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = *self.index.get(key)?;
        self.order.get(handle)
    }

    /// Returns `current_size` as it would be once `key` is replaced and the
    /// count limit has made room for one new entry.
    fn projected_size(&self, key: &K) -> usize {
        let stale = self.accounted_size(key);
        let mut size = self.current_size - stale.unwrap_or(0);
        let remaining = self.len() - usize::from(stale.is_some());

        if let Some(max_len) = self.config.max_len {
            let excess = (remaining + 1).saturating_sub(max_len);
            size -= self
                .order
                .iter()
                .filter(|entry| entry.key != *key)
                .take(excess)
                .map(|entry| entry.cost)
                .sum::<usize>();
        }

        size
    }

    fn take_oldest(&mut self) -> Option<Entry<K, V>> {
        let entry = self.order.pop_front()?;
        self.unindex(&entry);
        Some(entry)
    }

    fn evict_oldest(&mut self) {
        let entry = self.take_oldest();
        check_predicate_true(entry.is_some(), "eviction required from an empty map").expect(FAILED);

        if let Some(entry) = entry {
            self.evictions += 1;
            log::debug!(
                "Evicted oldest entry of {} bytes, len={}, current_size={}",
                entry.cost,
                self.len(),
                self.current_size
            );

            if let Some(listener) = self.on_evict.as_mut() {
                listener(&entry.key, &entry.value);
            }
        }
    }

    fn unindex(&mut self, entry: &Entry<K, V>) {
        let indexed = self.index.remove(&entry.key).is_some();
        check_predicate_true(indexed, "order entry missing from index").expect(FAILED);
        self.release(entry.cost);
    }

    fn release(&mut self, cost: usize) {
        check_in_range_inclusive_usize(cost, 0, self.current_size, "accounted cost").expect(FAILED);
        self.current_size -= cost;
    }
}

impl<K, V, S> Debug for CircularMap<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(CircularMap))
            .field("config", &self.config)
            .field("len", &self.index.len())
            .field("current_size", &self.current_size)
            .field("evictions", &self.evictions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use circular_dict_core::size::FnSizer;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    use super::*;

    /// Each key costs 1 byte and each `usize` value costs its own value in bytes.
    fn sized_map(
        max_len: Option<usize>,
        max_size_bytes: Option<usize>,
    ) -> CircularMap<u8, usize, impl ByteSizer<u8, usize>> {
        let config = CircularDictConfig::new(max_len, max_size_bytes).unwrap();
        CircularMap::with_sizer(config, FnSizer::new(|_: &u8| 1usize, |v: &usize| *v)).unwrap()
    }

    #[fixture]
    fn map_len_5() -> CircularMap<u32, u32, NoSizer> {
        CircularMap::count_bounded(CircularDictConfig::with_max_len(5).unwrap()).unwrap()
    }

    fn keys_of<V, S: ByteSizer<u32, V>>(map: &CircularMap<u32, V, S>) -> Vec<u32> {
        map.keys().copied().collect()
    }

    #[rstest]
    fn test_count_bounded_scenario(#[from(map_len_5)] mut map: CircularMap<u32, u32, NoSizer>) {
        assert!(map.is_empty());
        assert!(!map.is_full());

        for i in 0..5 {
            map.insert(i, i).unwrap();
            assert!(!map.is_empty());
        }
        assert!(map.is_full());
        assert_eq!(keys_of(&map), vec![0, 1, 2, 3, 4]);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

        for i in 5..8 {
            map.insert(i, i).unwrap();
            assert!(map.is_full());
        }
        assert_eq!(keys_of(&map), vec![3, 4, 5, 6, 7]);
        assert!((0..3).all(|i| !map.contains_key(&i)));
        assert_eq!(map.eviction_count(), 3);
        map.check_integrity();
    }

    #[rstest]
    fn test_byte_bounded_scenario() {
        // u64 key plus u64 value: 16 bytes per entry
        let cost = 16;
        let config = CircularDictConfig::with_max_size_bytes(8 * cost).unwrap();
        let mut map: CircularMap<u64, u64> = CircularMap::new(config).unwrap();

        for i in 0..8 {
            map.insert(i, i * 10).unwrap();
        }
        assert!(map.is_full());
        assert_eq!(map.current_size(), 8 * cost);
        assert_eq!(map.len(), 8);

        map.insert(8, 80).unwrap();
        assert!(map.is_full());
        assert_eq!(map.current_size(), 8 * cost);
        assert_eq!(map.len(), 8);
        assert!(!map.contains_key(&0));
        assert_eq!(map.peek_oldest(), Some((&1, &10)));
        assert_eq!(map.peek_newest(), Some((&8, &80)));
        map.check_integrity();
    }

    #[rstest]
    fn test_oversized_item_rejected_without_mutation() {
        let mut map = sized_map(None, Some(10));
        map.insert(1, 4).unwrap();
        map.insert(2, 4).unwrap();

        let result = map.insert(3, 10);

        assert_eq!(
            result,
            Err(CircularDictError::CapacityExceeded {
                item_size: 11,
                max_size_bytes: 10,
            })
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.current_size(), 10);
        assert_eq!(map.eviction_count(), 0);
    }

    #[rstest]
    fn test_oversized_update_keeps_previous_entry() {
        let mut map = sized_map(None, Some(10));
        map.insert(1, 4).unwrap();

        assert!(map.insert(1, 50).is_err());
        assert_eq!(map.get(&1), Some(&4));
        assert_eq!(map.current_size(), 5);
    }

    #[rstest]
    fn test_size_overflow_rejected_without_mutation() {
        let half = usize::MAX / 2;
        let mut map = sized_map(Some(4), None);
        map.insert(1, half).unwrap();

        let result = map.insert(2, half);

        assert_eq!(
            result,
            Err(CircularDictError::SizeOverflow {
                item_size: half + 1,
                current_size: half + 1,
            })
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.current_size(), half + 1);
        map.check_integrity();
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_size_overflow_not_reported_when_room_is_made(#[case] max_len: usize) {
        let half = usize::MAX / 2;
        let mut map = sized_map(Some(max_len), None);
        map.insert(1, half).unwrap();

        // Replacing the same key releases its cost first
        assert_eq!(map.insert(1, half).unwrap(), Some(half));

        if max_len == 1 {
            map.insert(2, half).unwrap();
            assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2]);
        }
        assert_eq!(map.current_size(), half + 1);
        map.check_integrity();
    }

    #[rstest]
    fn test_item_exactly_at_limit_fits() {
        let mut map = sized_map(None, Some(10));
        map.insert(1, 2).unwrap();
        map.insert(2, 9).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.current_size(), 10);
        assert!(map.is_full());
    }

    #[rstest]
    fn test_byte_limit_evicts_several_entries() {
        let mut map = sized_map(None, Some(20));
        for key in 0..5 {
            map.insert(key, 3).unwrap();
        }
        assert_eq!(map.current_size(), 20);

        // Needs 13 bytes: four oldest entries must go
        map.insert(9, 12).unwrap();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![4, 9]);
        assert_eq!(map.current_size(), 17);
        assert_eq!(map.eviction_count(), 4);
    }

    #[rstest]
    fn test_both_limits_enforced_independently() {
        let mut map = sized_map(Some(3), Some(30));

        for key in 0..4 {
            map.insert(key, 1).unwrap();
        }
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(map.is_full());

        // Needs 26 bytes: evicting key 1 leaves exactly enough room
        map.insert(4, 25).unwrap();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(map.current_size(), 30);
        assert!(map.is_full());
        map.check_integrity();
    }

    #[rstest]
    fn test_update_moves_key_to_newest(#[from(map_len_5)] mut map: CircularMap<u32, u32, NoSizer>) {
        for i in 0..5 {
            map.insert(i, i).unwrap();
        }

        let previous = map.insert(0, 100).unwrap();

        assert_eq!(previous, Some(0));
        assert_eq!(map.len(), 5);
        assert_eq!(keys_of(&map), vec![1, 2, 3, 4, 0]);

        // 1 is now the oldest
        map.insert(5, 5).unwrap();
        assert!(!map.contains_key(&1));
        assert_eq!(map.get(&0), Some(&100));
    }

    #[rstest]
    fn test_update_adjusts_size_by_cost_delta() {
        let mut map = sized_map(None, Some(100));
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        assert_eq!(map.current_size(), 32);

        map.insert(1, 15).unwrap();
        assert_eq!(map.current_size(), 37);
        assert_eq!(map.len(), 2);
        assert_eq!(map.accounted_size(&1), Some(16));
    }

    #[rstest]
    fn test_delete_then_reinsert_restores_size() {
        let mut map = sized_map(None, Some(100));
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        let size_before = map.current_size();

        assert_eq!(map.remove(&1), Some(10));
        assert_eq!(map.current_size(), 21);

        map.insert(1, 10).unwrap();
        assert_eq!(map.current_size(), size_before);
        assert_eq!(map.peek_newest(), Some((&1, &10)));
    }

    #[rstest]
    fn test_remove_missing_key_is_noop(mut map_len_5: CircularMap<u32, u32, NoSizer>) {
        map_len_5.insert(1, 1).unwrap();
        assert_eq!(map_len_5.remove(&99), None);
        assert_eq!(map_len_5.len(), 1);
    }

    #[rstest]
    fn test_pop(mut map_len_5: CircularMap<u32, u32, NoSizer>) {
        map_len_5.insert(1, 10).unwrap();

        assert_eq!(map_len_5.pop(&2), Err(CircularDictError::KeyNotFound));
        assert_eq!(map_len_5.pop_or(&2, 7), 7);
        assert_eq!(map_len_5.pop(&1), Ok(10));
        assert!(map_len_5.is_empty());
        assert_eq!(map_len_5.pop_or(&1, 0), 0);
    }

    #[rstest]
    fn test_pop_oldest_and_newest() {
        let mut map = sized_map(Some(10), None);
        for key in 0..4 {
            map.insert(key, usize::from(key)).unwrap();
        }
        assert_eq!(map.current_size(), 10);

        assert_eq!(map.pop_oldest(), Ok((0, 0)));
        assert_eq!(map.pop_newest(), Ok((3, 3)));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(map.current_size(), 5);

        map.pop_newest().unwrap();
        map.pop_oldest().unwrap();
        assert!(map.is_empty());
        assert_eq!(map.pop_oldest(), Err(CircularDictError::EmptyContainer));
        assert_eq!(map.pop_newest(), Err(CircularDictError::EmptyContainer));
    }

    #[rstest]
    fn test_clear_resets_size() {
        let mut map = sized_map(Some(4), Some(100));
        map.try_extend([(1, 5), (2, 6), (3, 7)]).unwrap();

        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.current_size(), 0);
        assert_eq!(map.iter().count(), 0);

        map.insert(1, 5).unwrap();
        assert_eq!(map.current_size(), 6);
        map.check_integrity();
    }

    #[rstest]
    fn test_removal_uses_insert_time_cost() {
        let config = CircularDictConfig::with_max_size_bytes(100).unwrap();
        let sizer = FnSizer::new(|_: &u8| 1usize, |v: &String| v.len());
        let mut map: CircularMap<u8, String, _> = CircularMap::with_sizer(config, sizer).unwrap();
        map.insert(1, "ab".to_string()).unwrap();
        assert_eq!(map.current_size(), 3);

        if let Some(value) = map.get_mut(&1) {
            value.push_str("cdefgh");
        }
        assert_eq!(map.get(&1).map(String::as_str), Some("abcdefgh"));
        assert_eq!(map.accounted_size(&1), Some(3));

        assert_eq!(map.remove(&1), Some("abcdefgh".to_string()));
        assert_eq!(map.current_size(), 0);
        assert!(map.is_empty());
    }

    #[rstest]
    fn test_borrowed_key_lookup() {
        let config = CircularDictConfig::with_max_len(2).unwrap();
        let mut map: CircularMap<String, u32, NoSizer> = CircularMap::count_bounded(config).unwrap();
        map.insert("hello".to_string(), 1).unwrap();

        assert!(map.contains_key("hello"));
        assert_eq!(map.get("hello"), Some(&1));
        assert_eq!(map.remove("hello"), Some(1));
    }

    #[rstest]
    fn test_string_entries_measured_with_get_size() {
        let config = CircularDictConfig::with_max_size_bytes(1024).unwrap();
        let mut map: CircularMap<String, String> = CircularMap::new(config).unwrap();
        let key = "key".to_string();
        let value = "value".to_string();
        let expected = key.get_size() + value.get_size();

        map.insert(key, value).unwrap();

        assert_eq!(map.current_size(), expected);
        assert_eq!(map.accounted_size("key"), Some(expected));
    }

    #[rstest]
    fn test_byte_limit_without_sizer_rejected() {
        let config = CircularDictConfig::new(Some(5), Some(1024)).unwrap();
        let result = CircularMap::<u32, u32, NoSizer>::count_bounded(config);
        assert_eq!(
            result.unwrap_err(),
            CircularDictError::Config(ConfigError::SizeMeasurementUnavailable)
        );
    }

    #[rstest]
    fn test_invalid_config_rejected() {
        let config = CircularDictConfig::default();
        let result = CircularMap::<u64, u64>::new(config);
        assert_eq!(
            result.unwrap_err(),
            CircularDictError::Config(ConfigError::NoCapacity)
        );
    }

    #[rstest]
    fn test_eviction_listener_receives_evicted_entries() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let config = CircularDictConfig::with_max_len(2).unwrap();
        let mut map = CircularMap::<u32, &str, NoSizer>::count_bounded(config)
            .unwrap()
            .with_eviction_listener(move |k, v| sink.lock().unwrap().push((*k, *v)));

        map.insert(1, "one").unwrap();
        map.insert(2, "two").unwrap();
        map.insert(3, "three").unwrap();
        map.remove(&2);
        map.insert(4, "four").unwrap();
        map.insert(5, "five").unwrap();

        assert_eq!(*evicted.lock().unwrap(), vec![(1, "one"), (3, "three")]);
        assert_eq!(map.eviction_count(), 2);
    }

    #[rstest]
    fn test_iter_double_ended(mut map_len_5: CircularMap<u32, u32, NoSizer>) {
        map_len_5.try_extend((0..5).map(|i| (i, i * 2))).unwrap();

        let newest_first: Vec<_> = map_len_5.iter().rev().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(newest_first, vec![(4, 8), (3, 6), (2, 4), (1, 2), (0, 0)]);
        assert_eq!(map_len_5.iter().len(), 5);
    }

    #[rstest]
    fn test_try_extend_stops_at_first_error() {
        let mut map = sized_map(None, Some(10));
        let result = map.try_extend([(1, 2), (2, 50), (3, 2)]);

        assert!(matches!(result, Err(CircularDictError::CapacityExceeded { .. })));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[rstest]
    fn test_debug_output() {
        let map = sized_map(Some(2), None);
        let debug = format!("{map:?}");
        assert!(debug.starts_with("CircularMap"));
        assert!(debug.contains("current_size: 0"));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(u8, usize),
        Remove(u8),
        PopOldest,
        PopNewest,
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0..20u8, 0..25usize).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => (0..20u8).prop_map(Op::Remove),
            1 => Just(Op::PopOldest),
            1 => Just(Op::PopNewest),
            1 => Just(Op::Clear),
        ]
    }

    /// Reference model: a plain vector of `(key, cost)` pairs, oldest first.
    fn model_insert(
        model: &mut Vec<(u8, usize)>,
        key: u8,
        cost: usize,
        max_len: usize,
        max_size_bytes: usize,
    ) -> bool {
        if cost > max_size_bytes {
            return false;
        }
        model.retain(|(k, _)| *k != key);
        while model.iter().map(|(_, c)| c).sum::<usize>() + cost > max_size_bytes {
            model.remove(0);
        }
        while model.len() >= max_len {
            model.remove(0);
        }
        model.push((key, cost));
        true
    }

    proptest! {
        /// Invariant: limits are never exceeded and accounting matches the entries
        #[rstest]
        fn prop_limits_and_accounting_hold(ops in proptest::collection::vec(op_strategy(), 0..200)) {
            let mut map = sized_map(Some(8), Some(40));
            for op in ops {
                match op {
                    Op::Insert(k, v) => { let _ = map.insert(k, v); }
                    Op::Remove(k) => { map.remove(&k); }
                    Op::PopOldest => { let _ = map.pop_oldest(); }
                    Op::PopNewest => { let _ = map.pop_newest(); }
                    Op::Clear => map.clear(),
                }
                prop_assert!(map.len() <= 8);
                prop_assert!(map.current_size() <= 40);
                prop_assert_eq!(map.is_empty(), map.len() == 0);
                map.check_integrity();
            }
        }

        /// Invariant: eviction order matches a naive reference model
        #[rstest]
        fn prop_matches_reference_model(
            inserts in proptest::collection::vec((0..20u8, 0..30usize), 0..150)
        ) {
            let mut map = sized_map(Some(6), Some(30));
            let mut model = Vec::new();

            for (k, v) in inserts {
                let accepted = map.insert(k, v).is_ok();
                prop_assert_eq!(accepted, model_insert(&mut model, k, v + 1, 6, 30));

                let actual: Vec<(u8, usize)> = map
                    .keys()
                    .map(|key| (*key, map.accounted_size(key).unwrap()))
                    .collect();
                prop_assert_eq!(&actual, &model);
            }
        }

        /// Invariant: with distinct keys the newest `max_len` keys remain in order
        #[rstest]
        fn prop_count_bound_keeps_newest(extra in 0..50u32) {
            let config = CircularDictConfig::with_max_len(5).unwrap();
            let mut map = CircularMap::<u32, u32, NoSizer>::count_bounded(config).unwrap();
            let total = 5 + extra;
            for i in 0..total {
                map.insert(i, i).unwrap();
                if i >= 4 {
                    prop_assert!(map.is_full());
                }
            }
            let expected: Vec<u32> = (total - 5..total).collect();
            prop_assert_eq!(keys_of(&map), expected);
        }
    }
}

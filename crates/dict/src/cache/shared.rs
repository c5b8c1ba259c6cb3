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

//! A thread-safe circular dictionary.
//!
//! [`CircularDict`] guards a [`CircularMap`] with a single mutex. Every operation
//! holds the lock for its full duration, eviction loops included, so the index,
//! the order and `current_size` are always observed and mutated together.
//! Compound operations call straight into the locked map and never re-acquire
//! the lock.

use std::{borrow::Borrow, fmt::Debug, hash::Hash};

use circular_dict_core::size::{ByteSizer, GetSizeSizer, NoSizer};
use get_size2::GetSize;
use parking_lot::Mutex;

use super::{
    circular::{CircularMap, EvictionListener},
    config::CircularDictConfig,
    error::CircularDictError,
};

/// A bounded, insertion-ordered map that can be shared between threads.
///
/// Lookups return clones and iteration returns snapshots, since no reference
/// into the map may outlive the lock. Use [`CircularDict::with_map`] or
/// [`CircularDict::with_map_mut`] to run several steps atomically.
///
/// # Examples
///
/// ```
/// use std::{sync::Arc, thread};
///
/// use circular_dict::cache::{CircularDict, CircularDictConfig};
///
/// let config = CircularDictConfig::with_max_len(100).unwrap();
/// let dict = Arc::new(CircularDict::<u64, u64>::new(config).unwrap());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let dict = Arc::clone(&dict);
///         thread::spawn(move || {
///             for i in 0..1_000 {
///                 dict.insert(t * 1_000 + i, i).unwrap();
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(dict.len(), 100);
/// ```
pub struct CircularDict<K, V, S = GetSizeSizer> {
    inner: Mutex<CircularMap<K, V, S>>,
}

impl<K, V> CircularDict<K, V, GetSizeSizer>
where
    K: Clone + Eq + Hash + GetSize,
    V: GetSize,
{
    /// Creates a new empty [`CircularDict`] measuring entries with `get_size2`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: CircularDictConfig) -> Result<Self, CircularDictError> {
        CircularMap::new(config).map(Self::from)
    }
}

impl<K, V> CircularDict<K, V, NoSizer>
where
    K: Clone + Eq + Hash,
{
    /// Creates a new empty [`CircularDict`] without byte-size measurement.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or sets `max_size_bytes`.
    pub fn count_bounded(config: CircularDictConfig) -> Result<Self, CircularDictError> {
        CircularMap::count_bounded(config).map(Self::from)
    }
}

impl<K, V, S> CircularDict<K, V, S>
where
    K: Clone + Eq + Hash,
    S: ByteSizer<K, V>,
{
    /// Creates a new empty [`CircularDict`] measuring entries with `sizer`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid, or if it sets `max_size_bytes`
    /// while `sizer` cannot measure byte sizes.
    pub fn with_sizer(config: CircularDictConfig, sizer: S) -> Result<Self, CircularDictError> {
        CircularMap::with_sizer(config, sizer).map(Self::from)
    }

    /// Consumes the dictionary, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> CircularMap<K, V, S> {
        self.inner.into_inner()
    }

    /// Replaces the eviction listener.
    ///
    /// The listener runs while this dictionary's lock is held. It may use other
    /// shared state, including another [`CircularDict`], but must not call back
    /// into this one: the lock is not reentrant and the call deadlocks.
    pub fn set_eviction_listener(&self, listener: Option<EvictionListener<K, V>>) {
        self.inner.lock().set_eviction_listener(listener);
    }

    /// Runs `f` with shared access to the locked map.
    pub fn with_map<R>(&self, f: impl FnOnce(&CircularMap<K, V, S>) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs `f` with exclusive access to the locked map.
    pub fn with_map_mut<R>(&self, f: impl FnOnce(&mut CircularMap<K, V, S>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Returns the capacity configuration.
    #[must_use]
    pub fn config(&self) -> CircularDictConfig {
        self.inner.lock().config()
    }

    /// Returns the maximum number of entries, if bounded by count.
    #[must_use]
    pub fn max_len(&self) -> Option<usize> {
        self.inner.lock().max_len()
    }

    /// Returns the maximum accounted size in bytes, if bounded by size.
    #[must_use]
    pub fn max_size_bytes(&self) -> Option<usize> {
        self.inner.lock().max_size_bytes()
    }

    /// Returns the sum of the accounted costs of all resident entries.
    #[must_use]
    pub fn current_size(&self) -> usize {
        self.inner.lock().current_size()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns the number of entries evicted automatically so far.
    #[must_use]
    pub fn eviction_count(&self) -> u64 {
        self.inner.lock().eviction_count()
    }

    /// Returns whether the dictionary has no entries.
    ///
    /// # Panics
    ///
    /// Panics if the dictionary is empty but `current_size` is not zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns whether a limit is exactly reached.
    ///
    /// # Panics
    ///
    /// Panics if a limit is exceeded.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inner.lock().is_full()
    }

    /// Returns whether the dictionary contains `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains_key(key)
    }

    /// Returns a clone of the value for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Returns the cost recorded for `key` when it was last inserted.
    #[must_use]
    pub fn accounted_size<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().accounted_size(key)
    }

    /// Returns a snapshot of the keys from oldest to newest.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Returns a snapshot of the values from oldest to newest.
    #[must_use]
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.lock().values().cloned().collect()
    }

    /// Returns a snapshot of the entries from oldest to newest.
    #[must_use]
    pub fn items(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.inner
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Inserts a key-value pair at the newest position, evicting as needed.
    ///
    /// See [`CircularMap::insert`].
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::CapacityExceeded`] if the cost of the entry
    /// alone exceeds `max_size_bytes`, or [`CircularDictError::SizeOverflow`]
    /// if the accounted size cannot hold it.
    pub fn insert(&self, key: K, value: V) -> Result<Option<V>, CircularDictError> {
        self.inner.lock().insert(key, value)
    }

    /// Inserts every pair from `iter` in order while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns the first insertion error; pairs before it remain inserted.
    pub fn try_extend<I>(&self, iter: I) -> Result<(), CircularDictError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.lock().try_extend(iter)
    }

    /// Removes `key`, returning its value if present. Absent keys are a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(key)
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::KeyNotFound`] if `key` is absent.
    pub fn pop<Q>(&self, key: &Q) -> Result<V, CircularDictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().pop(key)
    }

    /// Removes `key` and returns its value, or `default` if `key` is absent.
    pub fn pop_or<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().pop_or(key, default)
    }

    /// Removes and returns the oldest entry.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::EmptyContainer`] if the dictionary is empty.
    pub fn pop_oldest(&self) -> Result<(K, V), CircularDictError> {
        self.inner.lock().pop_oldest()
    }

    /// Removes and returns the newest entry.
    ///
    /// # Errors
    ///
    /// Returns [`CircularDictError::EmptyContainer`] if the dictionary is empty.
    pub fn pop_newest(&self) -> Result<(K, V), CircularDictError> {
        self.inner.lock().pop_newest()
    }

    /// Removes every entry and resets `current_size` to zero.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Audits the whole dictionary under the lock.
    ///
    /// # Panics
    ///
    /// Panics on the first inconsistency found.
    pub fn check_integrity(&self) {
        self.inner.lock().check_integrity();
    }
}

impl<K, V, S> From<CircularMap<K, V, S>> for CircularDict<K, V, S> {
    fn from(map: CircularMap<K, V, S>) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }
}

impl<K, V, S> Debug for CircularDict<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(CircularDict))
            .field("inner", &self.inner)
            .finish()
    }
}

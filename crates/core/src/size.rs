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

//! Byte-size measurement strategies for keys and values.
//!
//! A [`ByteSizer`] measures the memory footprint of a key and of a value
//! independently. The cost of an entry is the saturating sum of both.
//!
//! | Sizer            | Availability | Cost                                          |
//! |------------------|--------------|-----------------------------------------------|
//! | [`GetSizeSizer`] | Available    | `get_size2::GetSize::get_size` (stack + heap) |
//! | [`FnSizer`]      | Available    | Caller-supplied closures                      |
//! | [`NoSizer`]      | Unavailable  | Always zero                                   |
//!
//! Containers must refuse a byte capacity when the sizer reports
//! [`ByteSizer::is_available`] as `false`, since every entry would cost zero.

use std::fmt::Debug;

use get_size2::GetSize;

/// Measures the byte cost of keys of type `K` and values of type `V`.
pub trait ByteSizer<K: ?Sized, V: ?Sized> {
    /// Returns whether this sizer actually measures anything.
    fn is_available(&self) -> bool {
        true
    }

    /// Returns the byte cost of `key`.
    fn key_bytes(&self, key: &K) -> usize;

    /// Returns the byte cost of `value`.
    fn value_bytes(&self, value: &V) -> usize;

    /// Returns the combined byte cost of a key and its value.
    fn entry_bytes(&self, key: &K, value: &V) -> usize {
        self.key_bytes(key).saturating_add(self.value_bytes(value))
    }
}

/// Measures with [`GetSize::get_size`], i.e. the inline size plus owned heap allocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetSizeSizer;

impl<K, V> ByteSizer<K, V> for GetSizeSizer
where
    K: GetSize,
    V: GetSize,
{
    fn key_bytes(&self, key: &K) -> usize {
        key.get_size()
    }

    fn value_bytes(&self, value: &V) -> usize {
        value.get_size()
    }
}

/// Measurement is unavailable; every entry costs zero bytes.
///
/// Suitable only for count-bounded containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoSizer;

impl<K: ?Sized, V: ?Sized> ByteSizer<K, V> for NoSizer {
    fn is_available(&self) -> bool {
        false
    }

    fn key_bytes(&self, _key: &K) -> usize {
        0
    }

    fn value_bytes(&self, _value: &V) -> usize {
        0
    }
}

/// Measures with caller-supplied closures, one for keys and one for values.
///
/// # Examples
///
/// ```
/// use circular_dict_core::size::{ByteSizer, FnSizer};
///
/// let sizer = FnSizer::new(|k: &u32| *k as usize, |v: &String| v.len());
/// assert_eq!(sizer.entry_bytes(&3u32, &"abcd".to_string()), 7);
/// ```
#[derive(Clone, Copy)]
pub struct FnSizer<FK, FV> {
    key_fn: FK,
    value_fn: FV,
}

impl<FK, FV> FnSizer<FK, FV> {
    /// Creates a new [`FnSizer`] instance.
    #[must_use]
    pub const fn new(key_fn: FK, value_fn: FV) -> Self {
        Self { key_fn, value_fn }
    }
}

impl<FK, FV> Debug for FnSizer<FK, FV> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(FnSizer)).finish_non_exhaustive()
    }
}

impl<K, V, FK, FV> ByteSizer<K, V> for FnSizer<FK, FV>
where
    K: ?Sized,
    V: ?Sized,
    FK: Fn(&K) -> usize,
    FV: Fn(&V) -> usize,
{
    fn key_bytes(&self, key: &K) -> usize {
        (self.key_fn)(key)
    }

    fn value_bytes(&self, value: &V) -> usize {
        (self.value_fn)(value)
    }
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_get_size_sizer_primitives() {
        let sizer = GetSizeSizer;
        assert!(ByteSizer::<u64, u32>::is_available(&sizer));
        assert_eq!(ByteSizer::<u64, u32>::key_bytes(&sizer, &1), 8);
        assert_eq!(ByteSizer::<u64, u32>::value_bytes(&sizer, &1), 4);
        assert_eq!(ByteSizer::<u64, u32>::entry_bytes(&sizer, &1, &1), 12);
    }

    #[rstest]
    fn test_get_size_sizer_counts_heap_bytes() {
        let sizer = GetSizeSizer;
        let value = vec![0u8; 100];
        let bytes = ByteSizer::<u64, Vec<u8>>::value_bytes(&sizer, &value);
        assert_eq!(bytes, size_of::<Vec<u8>>() + value.capacity());
    }

    #[rstest]
    fn test_no_sizer_is_unavailable_and_zero() {
        let sizer = NoSizer;
        assert!(!ByteSizer::<String, String>::is_available(&sizer));
        let key = "key".to_string();
        let value = "value".repeat(100);
        assert_eq!(sizer.entry_bytes(&key, &value), 0);
    }

    #[rstest]
    fn test_fn_sizer_uses_closures() {
        let sizer = FnSizer::new(|_: &u8| 10usize, |v: &Vec<u8>| v.len());
        assert!(ByteSizer::<u8, Vec<u8>>::is_available(&sizer));
        assert_eq!(ByteSizer::<u8, Vec<u8>>::key_bytes(&sizer, &0), 10);
        assert_eq!(ByteSizer::<u8, Vec<u8>>::value_bytes(&sizer, &vec![1, 2, 3]), 3);
        assert_eq!(sizer.entry_bytes(&0u8, &vec![1u8, 2, 3]), 13);
    }

    #[rstest]
    fn test_entry_bytes_saturates() {
        let sizer = FnSizer::new(|_: &u8| usize::MAX, |_: &u8| 1usize);
        assert_eq!(sizer.entry_bytes(&0u8, &0u8), usize::MAX);
    }
}

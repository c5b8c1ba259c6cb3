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

//! An arena-backed doubly linked sequence with stable handles.
//!
//! Slots live in a `Vec` and link to each other by index, so appending,
//! removing by handle, and popping from either end are all O(1) without
//! unsafe code. Freed slots are recycled through an intrusive free list.

use std::iter::FusedIterator;

const NIL: usize = usize::MAX;

#[derive(Debug)]
enum Slot<T> {
    Occupied { item: T, prev: usize, next: usize },
    Vacant { next_free: usize },
}

/// An insertion-ordered sequence supporting O(1) removal of arbitrary items.
///
/// Items are addressed by the handle returned from [`OrderedSlab::push_back`].
/// A handle stays valid until its item is removed; afterwards the slot may be
/// reused by a later push.
#[derive(Debug)]
pub struct OrderedSlab<T> {
    slots: Vec<Slot<T>>,
    head: usize,
    tail: usize,
    free: usize,
    len: usize,
}

impl<T> OrderedSlab<T> {
    /// Creates a new empty [`OrderedSlab`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
            len: 0,
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the sequence is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `item` at the back (newest position) and returns its handle.
    pub fn push_back(&mut self, item: T) -> usize {
        let occupied = Slot::Occupied {
            item,
            prev: self.tail,
            next: NIL,
        };

        let handle = if self.free == NIL {
            self.slots.push(occupied);
            self.slots.len() - 1
        } else {
            let handle = self.free;
            if let Slot::Vacant { next_free } = &self.slots[handle] {
                self.free = *next_free;
            }
            self.slots[handle] = occupied;
            handle
        };

        if self.tail == NIL {
            self.head = handle;
        } else {
            self.set_next(self.tail, handle);
        }
        self.tail = handle;
        self.len += 1;

        handle
    }

    /// Removes and returns the item at `handle`.
    ///
    /// Returns `None` if the handle does not refer to a live item.
    pub fn remove(&mut self, handle: usize) -> Option<T> {
        let (prev, next) = match self.slots.get(handle)? {
            Slot::Occupied { prev, next, .. } => (*prev, *next),
            Slot::Vacant { .. } => return None,
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.set_next(prev, next);
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.set_prev(next, prev);
        }

        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        self.free = handle;
        self.len -= 1;

        match std::mem::replace(&mut self.slots[handle], vacant) {
            Slot::Occupied { item, .. } => Some(item),
            Slot::Vacant { .. } => None,
        }
    }

    /// Removes and returns the front (oldest) item.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.head == NIL {
            return None;
        }
        self.remove(self.head)
    }

    /// Removes and returns the back (newest) item.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.tail == NIL {
            return None;
        }
        self.remove(self.tail)
    }

    /// Returns a reference to the front (oldest) item.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(self.head)
    }

    /// Returns a reference to the back (newest) item.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.get(self.tail)
    }

    /// Returns a reference to the item at `handle`.
    #[must_use]
    pub fn get(&self, handle: usize) -> Option<&T> {
        match self.slots.get(handle)? {
            Slot::Occupied { item, .. } => Some(item),
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns a mutable reference to the item at `handle`.
    pub fn get_mut(&mut self, handle: usize) -> Option<&mut T> {
        match self.slots.get_mut(handle)? {
            Slot::Occupied { item, .. } => Some(item),
            Slot::Vacant { .. } => None,
        }
    }

    /// Removes every item and releases the handles.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
        self.len = 0;
    }

    /// Returns an iterator over the items from front (oldest) to back (newest).
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slab: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    fn links(&self, handle: usize) -> (usize, usize) {
        match &self.slots[handle] {
            Slot::Occupied { prev, next, .. } => (*prev, *next),
            Slot::Vacant { .. } => (NIL, NIL),
        }
    }

    fn set_next(&mut self, handle: usize, to: usize) {
        if let Slot::Occupied { next, .. } = &mut self.slots[handle] {
            *next = to;
        }
    }

    fn set_prev(&mut self, handle: usize, to: usize) {
        if let Slot::Occupied { prev, .. } = &mut self.slots[handle] {
            *prev = to;
        }
    }
}

impl<T> Default for OrderedSlab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a OrderedSlab<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A front-to-back iterator over an [`OrderedSlab`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    slab: &'a OrderedSlab<T>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.front;
        self.front = self.slab.links(handle).1;
        self.remaining -= 1;
        self.slab.get(handle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.back;
        self.back = self.slab.links(handle).0;
        self.remaining -= 1;
        self.slab.get(handle)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

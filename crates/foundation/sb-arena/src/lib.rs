//! Generation-checked arena for entities and symbol tables
//!
//! Slots are allocated in a `la-arena` arena (the same allocator rust-analyzer
//! uses). Each slot carries a generation counter; removing a value bumps the
//! counter, so handles taken before the removal no longer resolve. Freed
//! slots are recycled through a free list.

use la_arena::{Arena, Idx};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Handle to a value stored in a [`GenArena`]
pub struct Handle<T> {
    index: Idx<()>,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: Idx<()>, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Raw slot index, stable for the lifetime of the value
    pub fn index(self) -> u32 {
        u32::from(self.index.into_raw())
    }

    /// Generation the handle was issued for
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index(), self.generation).cmp(&(other.index(), other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index(), self.generation)
    }
}

/// Arena whose handles are invalidated when their value is removed
pub struct GenArena<T> {
    slots: Arena<Slot<T>>,
    free: Vec<Idx<Slot<T>>>,
    live: usize,
}

impl<T> GenArena<T> {
    /// Create an empty arena
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arena::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store a value, reusing a freed slot when one is available
    pub fn alloc(&mut self, value: T) -> Handle<T> {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx];
            slot.value = Some(value);
            return Handle::new(erase(idx), slot.generation);
        }
        let idx = self.slots.alloc(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle::new(erase(idx), 0)
    }

    /// Look up a value; `None` if the handle is stale
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slot(handle)?;
        if slot.generation == handle.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Look up a value mutably; `None` if the handle is stale
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let idx = restore::<T>(handle.index);
        if handle.index() as usize >= self.slots.len() {
            return None;
        }
        let slot = &mut self.slots[idx];
        if slot.generation == handle.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Whether the handle still refers to a live value
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Remove a value, invalidating every handle to it
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let idx = restore::<T>(handle.index);
        let slot = &mut self.slots[idx];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(idx);
        self.live -= 1;
        slot.value.take()
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no value is live
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate live values in allocation-slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().filter_map(|(idx, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::new(erase(idx), slot.generation), value))
        })
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        if handle.index() as usize >= self.slots.len() {
            return None;
        }
        Some(&self.slots[restore::<T>(handle.index)])
    }
}

impl<T> Default for GenArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for GenArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

fn erase<T>(idx: Idx<Slot<T>>) -> Idx<()> {
    Idx::from_raw(idx.into_raw())
}

fn restore<T>(idx: Idx<()>) -> Idx<Slot<T>> {
    Idx::from_raw(idx.into_raw())
}

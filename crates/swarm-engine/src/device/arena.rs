use std::fmt;

use crate::error::{Error, Result};
use crate::vertex::AttributeLayout;

/// Small-integer handle into an [`Arena`].
///
/// The generation distinguishes a live slot from a recycled one, so a handle
/// kept past its release fails lookups instead of aliasing a newer buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

/// Handle to a GPU buffer owned by the context's [`BufferArena`].
pub type BufferHandle = Handle;

impl Handle {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational resource table.
///
/// Whoever inserted a value is responsible for releasing it exactly once.
/// Other holders only keep copies of the handle.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: Handle) -> Result<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
            .ok_or(Error::StaleBuffer(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_ok()
    }

    /// Removes the value and invalidates every copy of `handle`.
    pub fn remove(&mut self, handle: Handle) -> Result<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(Error::StaleBuffer(handle))?;
        let value = slot.value.take().ok_or(Error::StaleBuffer(handle))?;

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Ok(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata recorded next to every arena buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferInfo {
    /// Logical size in bytes (before copy-alignment padding).
    pub size: u64,

    /// Attribute layout the contents were uploaded with, if any.
    pub layout: Option<AttributeLayout>,

    /// Whether the buffer may be bound as a capture destination.
    pub capturable: bool,
}

impl BufferInfo {
    /// Number of whole attribute elements the buffer holds.
    pub fn element_count(&self) -> Option<u32> {
        self.layout
            .map(|layout| (self.size / layout.stride()) as u32)
    }
}

pub(crate) struct BufferEntry {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) info: BufferInfo,
}

/// Owning table for every buffer the engine allocates.
#[derive(Default)]
pub struct BufferArena {
    inner: Arena<BufferEntry>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, buffer: wgpu::Buffer, info: BufferInfo) -> BufferHandle {
        let handle = self.inner.insert(BufferEntry { buffer, info });
        log::trace!("buffer {handle} allocated ({} bytes)", info.size);
        handle
    }

    pub fn buffer(&self, handle: BufferHandle) -> Result<&wgpu::Buffer> {
        self.inner.get(handle).map(|entry| &entry.buffer)
    }

    pub fn info(&self, handle: BufferHandle) -> Result<BufferInfo> {
        self.inner.get(handle).map(|entry| entry.info)
    }

    pub fn contains(&self, handle: BufferHandle) -> bool {
        self.inner.contains(handle)
    }

    /// Frees the buffer. Later lookups through any copy of `handle` fail.
    pub fn release(&mut self, handle: BufferHandle) -> Result<()> {
        let entry = self.inner.remove(handle)?;
        log::trace!("buffer {handle} released ({} bytes)", entry.info.size);
        drop(entry.buffer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_dense_until_released() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.len(), 2);
        assert_eq!(*arena.get(b).unwrap(), "b");
    }

    #[test]
    fn released_handle_is_stale() {
        let mut arena = Arena::new();
        let a = arena.insert(1u32);
        assert_eq!(arena.remove(a).unwrap(), 1);
        assert_eq!(arena.get(a), Err(Error::StaleBuffer(a)));
        assert!(arena.is_empty());
    }

    #[test]
    fn double_release_fails() {
        let mut arena = Arena::new();
        let a = arena.insert(1u32);
        arena.remove(a).unwrap();
        assert_eq!(arena.remove(a), Err(Error::StaleBuffer(a)));
    }

    #[test]
    fn recycled_slot_does_not_alias_old_handle() {
        let mut arena = Arena::new();
        let old = arena.insert("old");
        arena.remove(old).unwrap();

        let new = arena.insert("new");
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(arena.get(old).is_err());
        assert_eq!(*arena.get(new).unwrap(), "new");
    }
}

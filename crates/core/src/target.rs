//! Flat, SIMD-padded buffer of per-key colors.
//!
//! A [`RenderTarget`] owns `capacity` entries of which the first `len` are
//! keys. The remaining padding entries exist so compositing kernels can work
//! in whole vector registers. They are transparent at construction, and only
//! the compositing kernels write them: compositing a source whose padding is
//! transparent keeps them transparent, but a same-capacity source with more
//! keys spills its extra keys into them. [`RenderTarget::clear`] resets every
//! entry, padding included, before a target is reused.
//! Key-block layout is the caller's business: the target is one flat index
//! space.

use std::ops::{Index, IndexMut};

use crate::color::Rgba;
use crate::error::KeylightError;

/// Capacity granularity in entries: one 256-bit register of 4-byte entries.
pub const ALIGN_ENTRIES: usize = 8;

/// Rendering buffer holding one RGBA entry per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTarget {
    len: usize,
    storage: Box<[Rgba]>,
}

impl RenderTarget {
    /// Creates a target with `len` keys, all transparent.
    ///
    /// Capacity is `len` rounded up to a multiple of [`ALIGN_ENTRIES`]; the
    /// padding is transparent too. `new(0)` returns the empty target without
    /// allocating.
    ///
    /// Returns `KeylightError::AllocationFailed` if the rounded size overflows
    /// or the allocator refuses the request.
    pub fn new(len: usize) -> Result<Self, KeylightError> {
        let failed = || KeylightError::AllocationFailed { requested: len };
        let capacity = len
            .checked_next_multiple_of(ALIGN_ENTRIES)
            .ok_or_else(failed)?;
        let mut storage = Vec::new();
        storage.try_reserve_exact(capacity).map_err(|_| failed())?;
        storage.resize(capacity, Rgba::TRANSPARENT);
        tracing::trace!(len, capacity, "allocated render target");
        Ok(Self {
            len,
            storage: storage.into_boxed_slice(),
        })
    }

    /// The empty target: no keys, no storage.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Moves the contents out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the target holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated entries, padding included.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Key entry at `index`, or `None` past the last key.
    pub fn get(&self, index: usize) -> Option<&Rgba> {
        self.as_slice().get(index)
    }

    /// Mutable key entry at `index`, or `None` past the last key.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Rgba> {
        self.as_mut_slice().get_mut(index)
    }

    /// Checked access to the key entry at `index`.
    ///
    /// Returns `KeylightError::OutOfBounds` if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&Rgba, KeylightError> {
        let len = self.len;
        self.get(index)
            .ok_or(KeylightError::OutOfBounds { index, len })
    }

    /// Checked mutable access to the key entry at `index`.
    ///
    /// Returns `KeylightError::OutOfBounds` if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut Rgba, KeylightError> {
        let len = self.len;
        self.get_mut(index)
            .ok_or(KeylightError::OutOfBounds { index, len })
    }

    /// First key entry.
    pub fn first(&self) -> Option<&Rgba> {
        self.as_slice().first()
    }

    /// Last key entry.
    pub fn last(&self) -> Option<&Rgba> {
        self.as_slice().last()
    }

    /// Iterates over key entries in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rgba> {
        self.as_slice().iter()
    }

    /// Iterates mutably over key entries in storage order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Rgba> {
        self.as_mut_slice().iter_mut()
    }

    /// Key entries, padding excluded.
    pub fn as_slice(&self) -> &[Rgba] {
        &self.storage[..self.len]
    }

    /// Mutable key entries, padding excluded.
    pub fn as_mut_slice(&mut self) -> &mut [Rgba] {
        &mut self.storage[..self.len]
    }

    /// All entries, padding included.
    pub fn data(&self) -> &[Rgba] {
        &self.storage
    }

    /// All entries, padding included. Only compositing writes padding.
    pub(crate) fn data_mut(&mut self) -> &mut [Rgba] {
        &mut self.storage
    }

    /// Padding entries after the last key.
    pub fn padding(&self) -> &[Rgba] {
        &self.storage[self.len..]
    }

    /// Raw bytes of all entries, padding included, 4 bytes per entry in
    /// R, G, B, A order. This is the layout device transports consume.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.storage)
    }

    /// Sets every key entry to `color`.
    pub fn fill(&mut self, color: Rgba) {
        self.as_mut_slice().fill(color);
    }

    /// Sets every entry, padding included, to transparent.
    pub fn clear(&mut self) {
        self.storage.fill(Rgba::TRANSPARENT);
    }
}

impl Index<usize> for RenderTarget {
    type Output = Rgba;

    fn index(&self, index: usize) -> &Rgba {
        &self.as_slice()[index]
    }
}

impl IndexMut<usize> for RenderTarget {
    fn index_mut(&mut self, index: usize) -> &mut Rgba {
        &mut self.as_mut_slice()[index]
    }
}

impl<'a> IntoIterator for &'a RenderTarget {
    type Item = &'a Rgba;
    type IntoIter = std::slice::Iter<'a, Rgba>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut RenderTarget {
    type Item = &'a mut Rgba;
    type IntoIter = std::slice::IterMut<'a, Rgba>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

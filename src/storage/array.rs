use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use memmap2::Mmap;

use crate::primitives::npy::Element;

enum Backing<T> {
    Owned(Vec<T>),
    Mapped {
        map: Arc<Mmap>,
        offset: usize,
        len: usize,
    },
}

/// One backing array of a CSR pair: either an owned vector or a read-only
/// view into a memory-mapped array file.
pub struct CsrArray<T: Element> {
    backing: Backing<T>,
}

impl<T: Element> CsrArray<T> {
    /// Wraps an owned vector.
    pub fn owned(values: Vec<T>) -> Self {
        Self {
            backing: Backing::Owned(values),
        }
    }

    /// Views `len` elements starting `offset` bytes into `map`.
    ///
    /// Returns `None` when the view cannot be used in place: the host is not
    /// little-endian, the range falls outside the map, or the payload is not
    /// aligned for `T`. Callers fall back to decoding into an owned vector.
    pub(crate) fn mapped(map: Arc<Mmap>, offset: usize, len: usize) -> Option<Self> {
        if !cfg!(target_endian = "little") {
            return None;
        }
        let end = len.checked_mul(T::SIZE)?.checked_add(offset)?;
        if end > map.len() {
            return None;
        }
        let addr = map.as_ptr() as usize + offset;
        if addr % std::mem::align_of::<T>() != 0 {
            return None;
        }
        Some(Self {
            backing: Backing::Mapped { map, offset, len },
        })
    }

    /// Borrowed view of the elements.
    pub fn as_slice(&self) -> &[T] {
        match &self.backing {
            Backing::Owned(values) => values,
            Backing::Mapped { len: 0, .. } => &[],
            Backing::Mapped { map, offset, len } => mapped_slice(map, *offset, *len),
        }
    }

    /// Whether the elements live in a memory map.
    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped { .. })
    }

    /// Size of the element payload in bytes.
    pub fn nbytes(&self) -> usize {
        self.as_slice().len() * T::SIZE
    }
}

#[allow(unsafe_code)]
fn mapped_slice<T: Element>(map: &Mmap, offset: usize, len: usize) -> &[T] {
    // SAFETY: `CsrArray::mapped` verified that `offset..offset + len * size_of::<T>()`
    // lies inside the map, that the start is aligned for `T` and that the host is
    // little-endian. `T` is a plain unsigned integer valid for every bit pattern,
    // the map is read-only, and the returned borrow is tied to `map`.
    unsafe { std::slice::from_raw_parts(map.as_ptr().add(offset).cast::<T>(), len) }
}

impl<T: Element> Deref for CsrArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Element> From<Vec<T>> for CsrArray<T> {
    fn from(values: Vec<T>) -> Self {
        Self::owned(values)
    }
}

impl<T: Element> fmt::Debug for CsrArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrArray")
            .field("len", &self.as_slice().len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

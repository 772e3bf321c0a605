// MIT/Apache2 License

//! Provides a simple wrapper over C allocations.

use core::{
    fmt,
    ops::Deref,
    ptr::{self, NonNull},
};

/// An allocation, made using the `libc` `malloc` function.
///
/// `libxcb` hands out every reply, event and error as a `malloc`'d block
/// that the caller is expected to `free`. This type owns one such block.
pub(crate) struct CBox<T: ?Sized> {
    ptr: NonNull<T>,
}

// SAFETY: a CBox is a unique owner of its contents, like a Box.
unsafe impl<T: ?Sized + Send> Send for CBox<T> {}
unsafe impl<T: ?Sized + Sync> Sync for CBox<T> {}

impl<T: ?Sized> CBox<T> {
    /// Creates a new `CBox` from a pointer.
    ///
    /// # Safety
    ///
    /// The pointer must be valid, not null and
    /// made from `malloc`.
    pub(crate) unsafe fn new(ptr: *mut T) -> Self {
        CBox {
            ptr: NonNull::new_unchecked(ptr),
        }
    }

    /// Returns the pointer.
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the inner data as a reference.
    pub(crate) fn as_ref(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }
}

impl CBox<[u8]> {
    /// Copy `bytes` into a fresh `malloc` allocation.
    ///
    /// Returns `None` if the allocation fails.
    pub(crate) fn copy_from_slice(bytes: &[u8]) -> Option<Self> {
        // malloc(0) may legally return null, so always ask for one byte
        let raw = unsafe { libc::malloc(bytes.len().max(1)) } as *mut u8;
        if raw.is_null() {
            return None;
        }

        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), raw, bytes.len());
            Some(CBox::new(ptr::slice_from_raw_parts_mut(raw, bytes.len())))
        }
    }

    /// Wrap a `malloc`'d byte block of `len` bytes.
    ///
    /// # Safety
    ///
    /// `raw` must be non-null, made from `malloc`, and valid for `len`
    /// bytes of reads.
    pub(crate) unsafe fn from_raw_parts(raw: *mut u8, len: usize) -> Self {
        CBox::new(ptr::slice_from_raw_parts_mut(raw, len))
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        self.as_ref()
    }
}

impl<T: ?Sized> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.as_ref()
    }
}

impl fmt::Debug for CBox<[u8]> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CBox").field("len", &self.len()).finish()
    }
}

impl<T: ?Sized> Drop for CBox<T> {
    fn drop(&mut self) {
        unsafe {
            libc::free(self.as_ptr() as *mut libc::c_void);
        }
    }
}

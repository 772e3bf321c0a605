// MIT/Apache2 License

//! Shared, `libc`-owned protocol buffers.
//!
//! Replies, events and errors all arrive from `libxcb` as heap blocks that
//! must be released with `free`. [`Buffer`] puts one of those blocks behind
//! an atomic reference count so that typed wrappers, list views and cursors
//! can all hold on to the same reply without copying it.

use crate::cbox::CBox;
use alloc::sync::Arc;
use core::{fmt, mem, ptr};

/// Plain-old-data structures that can be read out of a protocol buffer.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` (or `#[repr(transparent)]`) and valid
/// for every bit pattern.
pub unsafe trait RawStruct: Copy + 'static {}

macro_rules! raw_primitive {
    ($($ty:ty),*) => {
        $(unsafe impl RawStruct for $ty {})*
    };
}

raw_primitive!(u8, i8, u16, i16, u32, i32, u64, i64);

unsafe impl<T: RawStruct, const N: usize> RawStruct for [T; N] {}

/// A reference-counted byte block whose last owner calls `free`.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<CBox<[u8]>>,
}

impl Buffer {
    pub(crate) fn from_cbox(cbox: CBox<[u8]>) -> Self {
        Self {
            inner: Arc::new(cbox),
        }
    }

    /// Take ownership of a block handed out by `libxcb`.
    ///
    /// # Safety
    ///
    /// `raw` must be non-null, allocated by `malloc` and valid for `len`
    /// bytes. Nothing else may free it.
    pub unsafe fn from_raw_parts(raw: *mut u8, len: usize) -> Self {
        Self::from_cbox(CBox::from_raw_parts(raw, len))
    }

    /// Copy `bytes` into a new `malloc`'d buffer.
    ///
    /// This is mostly useful for feeding synthetic data through the typed
    /// layer. Returns `None` if the allocation fails.
    pub fn copy_from_slice(bytes: &[u8]) -> Option<Self> {
        CBox::copy_from_slice(bytes).map(Self::from_cbox)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.bytes()
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Whether `self` and `other` share the same allocation.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read a `T` starting at `offset`, if it fits.
    pub fn read<T: RawStruct>(&self, offset: usize) -> Option<T> {
        let bytes = self.as_bytes();
        let end = offset.checked_add(mem::size_of::<T>())?;
        if end > bytes.len() {
            return None;
        }

        // SAFETY: bounds were checked above, T is POD
        Some(unsafe { ptr::read_unaligned(bytes.as_ptr().add(offset) as *const T) })
    }

    /// Reinterpret the start of the buffer as a `T`.
    ///
    /// Callers that built the buffer through a validated constructor know it
    /// is long enough; a short buffer yields a zeroed view rather than
    /// reading out of bounds.
    pub(crate) fn view<T: RawStruct>(&self) -> T {
        self.read(0).unwrap_or_else(|| unsafe { mem::zeroed() })
    }

    /// Whether the buffer can hold a `T`.
    pub(crate) fn fits<T: RawStruct>(&self) -> bool {
        self.len() >= mem::size_of::<T>()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("head", &&self.as_bytes()[..self.len().min(4)])
            .finish()
    }
}

/// An event as it came off the wire, before opcode dispatch.
#[derive(Clone, Debug)]
pub struct GenericEvent {
    buffer: Buffer,
}

/// Size of every fixed-length event and error.
pub const EVENT_SIZE: usize = 32;

/// Flag set on the discriminant of events delivered through `SendEvent`.
pub const SENT_EVENT_FLAG: u8 = 0x80;

impl GenericEvent {
    /// Wrap a buffer as an event. Returns `None` if it is shorter than an
    /// event header.
    pub fn new(buffer: Buffer) -> Option<Self> {
        if buffer.len() < EVENT_SIZE {
            return None;
        }

        Some(Self { buffer })
    }

    /// The discriminant byte, including the "sent" flag.
    pub fn response_type(&self) -> u8 {
        self.buffer.as_bytes()[0]
    }

    /// The discriminant with the `SendEvent` flag stripped.
    pub fn opcode(&self) -> u8 {
        self.response_type() & !SENT_EVENT_FLAG
    }

    /// Whether this event was synthesized by another client.
    pub fn is_sent(&self) -> bool {
        self.response_type() & SENT_EVENT_FLAG != 0
    }

    /// The low 16 bits of the last request sequence the server processed.
    pub fn sequence(&self) -> u16 {
        self.buffer.read(2).unwrap_or(0)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

/// An error as it came off the wire, before code dispatch.
#[derive(Clone)]
pub struct GenericError {
    buffer: Buffer,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct GenericErrorRaw {
    pub(crate) response_type: u8,
    pub(crate) error_code: u8,
    pub(crate) sequence: u16,
    pub(crate) resource_id: u32,
    pub(crate) minor_code: u16,
    pub(crate) major_code: u8,
    pub(crate) pad0: u8,
    pub(crate) pad: [u32; 5],
}

unsafe impl RawStruct for GenericErrorRaw {}

impl GenericError {
    /// Wrap a buffer as an error. Returns `None` if it is not a complete
    /// error packet.
    pub fn new(buffer: Buffer) -> Option<Self> {
        if buffer.len() < EVENT_SIZE || buffer.as_bytes()[0] != 0 {
            return None;
        }

        Some(Self { buffer })
    }

    fn raw(&self) -> GenericErrorRaw {
        self.buffer.view()
    }

    /// The error code, absolute for this connection.
    pub fn error_code(&self) -> u8 {
        self.raw().error_code
    }

    pub fn sequence(&self) -> u16 {
        self.raw().sequence
    }

    /// The offending value: a resource id, atom or plain integer depending
    /// on the error.
    pub fn resource_id(&self) -> u32 {
        self.raw().resource_id
    }

    pub fn minor_code(&self) -> u16 {
        self.raw().minor_code
    }

    pub fn major_code(&self) -> u8 {
        self.raw().major_code
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

impl fmt::Debug for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericError")
            .field("error_code", &self.error_code())
            .field("sequence", &self.sequence())
            .field("resource_id", &self.resource_id())
            .field("major_code", &self.major_code())
            .field("minor_code", &self.minor_code())
            .finish()
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error code {} (sequence {}, major {}, minor {})",
            self.error_code(),
            self.sequence(),
            self.major_code(),
            self.minor_code()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_allocation() {
        let buf = Buffer::copy_from_slice(&[7; 40]).unwrap();
        let other = buf.clone();
        assert!(buf.ptr_eq(&other));

        let copy = Buffer::copy_from_slice(&[7; 40]).unwrap();
        assert!(!buf.ptr_eq(&copy));
    }

    #[test]
    fn reads_are_bounds_checked() {
        let buf = Buffer::copy_from_slice(&[1, 0, 0, 0, 2]).unwrap();
        assert_eq!(buf.read::<u32>(0), Some(u32::from_ne_bytes([1, 0, 0, 0])));
        assert_eq!(buf.read::<u32>(2), None);
        assert_eq!(buf.read::<u8>(4), Some(2));
        assert_eq!(buf.read::<u8>(usize::MAX), None);
    }

    #[test]
    fn event_masks_sent_flag() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x80 | 12;
        let event = GenericEvent::new(Buffer::copy_from_slice(&bytes).unwrap()).unwrap();
        assert_eq!(event.opcode(), 12);
        assert!(event.is_sent());
    }

    #[test]
    fn short_event_is_rejected() {
        let buf = Buffer::copy_from_slice(&[2; 8]).unwrap();
        assert!(GenericEvent::new(buf).is_none());
    }

    #[test]
    fn error_fields() {
        let mut bytes = [0u8; 32];
        bytes[1] = 3;
        bytes[2..4].copy_from_slice(&9u16.to_ne_bytes());
        bytes[4..8].copy_from_slice(&0x0040_0001u32.to_ne_bytes());
        bytes[8..10].copy_from_slice(&0u16.to_ne_bytes());
        bytes[10] = 8;
        let error = GenericError::new(Buffer::copy_from_slice(&bytes).unwrap()).unwrap();

        assert_eq!(error.error_code(), 3);
        assert_eq!(error.sequence(), 9);
        assert_eq!(error.resource_id(), 0x0040_0001);
        assert_eq!(error.major_code(), 8);
        assert_eq!(error.minor_code(), 0);
    }
}

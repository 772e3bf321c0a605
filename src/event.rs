// MIT/Apache2 License

//! Typed event and error envelopes.
//!
//! Every concrete event or error type wraps the shared packet it was decoded
//! from and reads its fields through a `#[repr(C)]` view of that packet. The
//! concrete types themselves are generated per protocol in [`crate::proto`].

use crate::buffer::{GenericError, GenericEvent};

/// An event type with a fixed opcode.
pub trait TypedEvent<'c, C: ?Sized>: Sized {
    /// The opcode, relative to the protocol's first event.
    const OPCODE: u8;
    /// A human-readable name, for diagnostics only.
    const DESCRIPTION: &'static str;

    /// Wrap `event` without looking at its opcode.
    ///
    /// Returns `None` if the packet is too short for this event.
    fn from_generic(event: GenericEvent, conn: &'c C) -> Option<Self>;

    /// The packet this event reads from.
    fn generic(&self) -> &GenericEvent;

    /// Whether this event was synthesized with `SendEvent`.
    fn is_sent(&self) -> bool {
        self.generic().is_sent()
    }
}

/// An event that belongs to an extension, whose absolute opcode is only
/// known once the extension has been queried.
pub trait ExtensionEvent<'c, C: ?Sized>: TypedEvent<'c, C> {
    /// The absolute opcode given the extension's first event.
    fn opcode_at(first_event: u8) -> u8 {
        first_event.wrapping_add(Self::OPCODE)
    }
}

/// An error type with a fixed code.
pub trait TypedError: Sized {
    /// The error code, relative to the protocol's first error.
    const CODE: u8;
    /// A human-readable name, for diagnostics only.
    const DESCRIPTION: &'static str;

    /// Wrap `error` without looking at its code.
    fn from_generic(error: GenericError) -> Self;

    /// The packet this error reads from.
    fn generic(&self) -> &GenericError;
}

/// An error that belongs to an extension.
pub trait ExtensionError: TypedError {
    /// The absolute code given the extension's first error.
    fn code_at(first_error: u8) -> u8 {
        first_error.wrapping_add(Self::CODE)
    }
}

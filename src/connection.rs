// MIT/Apache2 License

//! The transport interface consumed by the typed layer.

use crate::{
    buffer::{Buffer, GenericError, GenericEvent},
    extension_manager::ExtensionInfo,
    request::RawRequest,
    Result,
};

/// What came back for a sequence number.
#[derive(Clone, Debug)]
pub enum Fetched {
    /// The reply buffer.
    Reply(Buffer),
    /// The server rejected the request.
    Error(GenericError),
    /// Nothing: the request had no reply, or its error went to the event
    /// queue because it was sent unchecked.
    Empty,
}

/// A live protocol session.
///
/// This is the only thing the typed layer needs from a transport. It never
/// mutates connection state on its own; every call here is forwarded
/// straight from a request, reply or dispatch wrapper.
///
/// [`XcbConnection`] is the `libxcb`-backed implementation.
///
/// [`XcbConnection`]: crate::XcbConnection
pub trait RawConnection {
    /// Send a fully described request, returning its sequence number.
    fn send_request(&self, request: &RawRequest<'_>) -> Result<u64>;

    /// Block until the reply (or error) for `sequence` arrives.
    fn wait_for_reply(&self, sequence: u64) -> Result<Fetched>;

    /// Check whether the reply for `sequence` has arrived without blocking.
    fn poll_for_reply(&self, sequence: u64) -> Result<Option<Fetched>>;

    /// Tell the transport nobody will fetch the reply for `sequence`.
    fn discard_reply(&self, sequence: u64);

    /// Block until a checked void request is known to have succeeded or
    /// failed.
    fn check_request(&self, sequence: u64) -> Result<Option<GenericError>>;

    /// Look up the runtime-assigned opcodes of an extension.
    ///
    /// Returns `Ok(None)` if the server does not support it.
    fn extension(&self, name: &'static str) -> Result<Option<ExtensionInfo>>;

    /// Allocate a new resource id.
    fn generate_id(&self) -> Result<u32>;

    /// Push all pending requests to the server.
    fn flush(&self) -> Result<()>;

    /// Block until the next event arrives.
    fn wait_for_event(&self) -> Result<GenericEvent>;

    /// Return the next event if one is queued.
    fn poll_for_event(&self) -> Result<Option<GenericEvent>>;
}

impl<C: RawConnection + ?Sized> RawConnection for &C {
    fn send_request(&self, request: &RawRequest<'_>) -> Result<u64> {
        (**self).send_request(request)
    }

    fn wait_for_reply(&self, sequence: u64) -> Result<Fetched> {
        (**self).wait_for_reply(sequence)
    }

    fn poll_for_reply(&self, sequence: u64) -> Result<Option<Fetched>> {
        (**self).poll_for_reply(sequence)
    }

    fn discard_reply(&self, sequence: u64) {
        (**self).discard_reply(sequence)
    }

    fn check_request(&self, sequence: u64) -> Result<Option<GenericError>> {
        (**self).check_request(sequence)
    }

    fn extension(&self, name: &'static str) -> Result<Option<ExtensionInfo>> {
        (**self).extension(name)
    }

    fn generate_id(&self) -> Result<u32> {
        (**self).generate_id()
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn wait_for_event(&self) -> Result<GenericEvent> {
        (**self).wait_for_event()
    }

    fn poll_for_event(&self) -> Result<Option<GenericEvent>> {
        (**self).poll_for_event()
    }
}

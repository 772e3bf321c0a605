// MIT/Apache2 License

//! Opcode dispatch.
//!
//! The core protocol's event and error numbers are fixed, but every
//! extension gets a contiguous block starting at a base the server picks
//! when the connection is set up. Dispatchers for extensions are therefore
//! built from an [`ExtensionInfo`] and match on the extension-relative
//! number.

use crate::{
    buffer::{GenericError, GenericEvent},
    connection::RawConnection,
    error::ProtocolError,
    extension_manager::ExtensionInfo,
    proto::xproto,
    Error,
};

/// A family of requests, events and errors: the core protocol or one
/// extension.
pub trait Protocol {
    /// The extension name, `None` for the core protocol.
    const EXTENSION: Option<&'static str>;

    /// The error table for this protocol.
    type Errors: DispatchError;

    /// Build the error table. `info` is `None` for the core protocol.
    fn errors(info: Option<&ExtensionInfo>) -> Self::Errors;
}

/// Decodes raw events into a protocol's typed events.
pub trait DispatchEvent {
    /// The typed event this table produces.
    type Event;

    /// Decode `event` and hand it to `handler`.
    ///
    /// Returns `false`, without calling `handler`, if the opcode does not
    /// belong to this table. The `SendEvent` flag is ignored.
    fn dispatch<H: FnOnce(Self::Event)>(&self, handler: H, event: &GenericEvent) -> bool;
}

/// Decodes raw errors into a protocol's typed errors.
pub trait DispatchError {
    /// Returns the typed error as `Err` if the code belongs to this table,
    /// or `Ok(())` so the next table can be tried.
    fn check(&self, error: &GenericError) -> Result<(), ProtocolError>;
}

/// The number of `opcode` within a block starting at `base`, if it falls
/// after the base.
pub(crate) fn relative(opcode: u8, base: u8) -> Option<u8> {
    opcode.checked_sub(base)
}

/// Turn an error packet received for a request of protocol `P` into an
/// [`Error`].
///
/// Core errors can be caused by any request, so the core table is always
/// consulted first.
pub(crate) fn route_error<P: Protocol, C: RawConnection + ?Sized>(
    conn: &C,
    error: GenericError,
) -> Error {
    if let Err(err) = xproto::ErrorDispatcher::new().check(&error) {
        return err.into();
    }

    if let Some(name) = P::EXTENSION {
        match conn.extension(name) {
            Ok(Some(info)) => {
                if let Err(err) = P::errors(Some(&info)).check(&error) {
                    return err.into();
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(extension = name, "unable to resolve extension error: {}", err);
            }
        }
    }

    tracing::debug!(code = error.error_code(), "no error table claimed the error");
    ProtocolError::Unknown(error).into()
}

// MIT/Apache2 License

//! Error types.

use crate::{
    buffer::GenericError,
    proto::{xinput, xproto},
};
use libc::c_int;

/// The result type used throughout this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong while talking to the X server.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The server answered a request with an error packet.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The connection is broken.
    #[error("the connection was terminated: {0}")]
    Connection(#[from] ConnectionError),
    /// Neither a reply nor an error arrived for a request that expects one.
    #[error("the X server did not send a reply to a request")]
    MissingReply,
    /// The server does not implement an extension the request belongs to.
    #[error("the X server does not support the {0} extension")]
    MissingExtension(&'static str),
    /// A buffer was too short for the structure it claims to hold.
    #[error("{what} is malformed ({len} bytes)")]
    Malformed { what: &'static str, len: usize },
    /// The request does not fit in a length field.
    #[error("request of {len} bytes exceeds the maximum of {max} bytes")]
    RequestTooLarge { len: usize, max: usize },
    /// A variable-length field is longer than its length field can count.
    #[error("{what} of {len} bytes exceeds the maximum of {max} bytes")]
    FieldTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },
    /// `libxcb` could not be loaded.
    #[cfg(feature = "dl")]
    #[error("unable to load libxcb: {0}")]
    Library(alloc::string::String),
}

/// Reasons `libxcb` gives for shutting a connection down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConnectionError {
    #[error("an I/O error occurred")]
    Io,
    #[error("a request used an extension the server does not support")]
    UnsupportedExtension,
    #[error("out of memory")]
    OutOfMemory,
    #[error("a request was longer than the server accepts")]
    RequestLength,
    #[error("the display string could not be parsed")]
    DisplayString,
    #[error("the requested screen does not exist")]
    InvalidScreen,
    #[error("file descriptor passing failed")]
    FdPassing,
    #[error("unknown connection error {0}")]
    Unknown(c_int),
}

pub(crate) mod codes {
    use libc::c_int;

    pub(crate) const XCB_CONN_ERROR: c_int = 1;
    pub(crate) const XCB_CONN_CLOSED_EXT_NOTSUPPORTED: c_int = 2;
    pub(crate) const XCB_CONN_CLOSED_MEM_INSUFFICIENT: c_int = 3;
    pub(crate) const XCB_CONN_CLOSED_REQ_LEN_EXCEED: c_int = 4;
    pub(crate) const XCB_CONN_CLOSED_PARSE_ERR: c_int = 5;
    pub(crate) const XCB_CONN_CLOSED_INVALID_SCREEN: c_int = 6;
    pub(crate) const XCB_CONN_CLOSED_FDPASSING_FAILED: c_int = 7;
}

impl ConnectionError {
    /// Map an `xcb_connection_has_error` result. Zero means "no error".
    pub fn from_code(code: c_int) -> Option<Self> {
        use codes::*;

        Some(match code {
            0 => return None,
            XCB_CONN_ERROR => Self::Io,
            XCB_CONN_CLOSED_EXT_NOTSUPPORTED => Self::UnsupportedExtension,
            XCB_CONN_CLOSED_MEM_INSUFFICIENT => Self::OutOfMemory,
            XCB_CONN_CLOSED_REQ_LEN_EXCEED => Self::RequestLength,
            XCB_CONN_CLOSED_PARSE_ERR => Self::DisplayString,
            XCB_CONN_CLOSED_INVALID_SCREEN => Self::InvalidScreen,
            XCB_CONN_CLOSED_FDPASSING_FAILED => Self::FdPassing,
            code => Self::Unknown(code),
        })
    }
}

/// A typed protocol error, resolved through the error dispatch tables.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error(transparent)]
    Xproto(#[from] xproto::Error),
    #[error("XInput extension error: {0}")]
    Xinput(#[from] xinput::Error),
    /// No dispatch table claimed the error code.
    #[error("unrecognized X11 {0}")]
    Unknown(GenericError),
}

impl ProtocolError {
    /// The packet the error was decoded from.
    pub fn generic(&self) -> &GenericError {
        match self {
            Self::Xproto(err) => err.generic(),
            Self::Xinput(err) => err.generic(),
            Self::Unknown(err) => err,
        }
    }
}

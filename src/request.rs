// MIT/Apache2 License

//! Issuing requests.

use crate::{
    connection::RawConnection,
    dispatch::{route_error, Protocol},
    reply::{Checked, FetchMode, Unchecked},
    Error, Result,
};
use alloc::vec::Vec;
use core::{fmt, marker::PhantomData};

/// A request as handed to the transport.
#[derive(Clone, Copy, Debug)]
pub struct RawRequest<'a> {
    /// The extension the request belongs to, `None` for the core protocol.
    pub extension: Option<&'static str>,
    /// The major opcode for core requests, the minor opcode for
    /// extension requests.
    pub opcode: u8,
    /// The second header byte of a core request.
    pub data: u8,
    /// Everything after the four byte header, unpadded.
    pub body: &'a [u8],
    /// Whether the server sends a reply.
    pub has_reply: bool,
    /// Whether errors should be held for the reply fetch instead of being
    /// delivered as events.
    pub checked: bool,
}

/// Largest request expressible without BIG-REQUESTS, in bytes.
pub const MAX_REQUEST_LEN: usize = u16::MAX as usize * 4;

impl RawRequest<'_> {
    /// Lay the request out on the wire.
    ///
    /// `major_opcode` is the extension's major opcode as negotiated on this
    /// connection; it is ignored for core requests.
    pub fn encode(&self, major_opcode: Option<u8>) -> Result<Vec<u8>> {
        let (first, second) = match self.extension {
            Some(name) => (major_opcode.ok_or(Error::MissingExtension(name))?, self.opcode),
            None => (self.opcode, self.data),
        };

        let padded = (4 + self.body.len() + 3) & !3;
        if padded > MAX_REQUEST_LEN {
            return Err(Error::RequestTooLarge {
                len: padded,
                max: MAX_REQUEST_LEN,
            });
        }

        let mut out = Vec::with_capacity(padded);
        out.push(first);
        out.push(second);
        out.put_u16((padded / 4) as u16);
        out.extend_from_slice(self.body);
        out.resize(padded, 0);
        Ok(out)
    }
}

/// A protocol request.
pub trait Request {
    /// The protocol (core or extension) this request belongs to.
    type Protocol: Protocol;

    /// Major opcode for core requests, minor opcode for extension requests.
    const OPCODE: u8;

    /// The second header byte. Only meaningful for core requests.
    fn data(&self) -> u8 {
        0
    }

    /// Write everything after the header.
    fn serialize(&self, body: &mut Vec<u8>) -> Result<()>;
}

/// A request that does not produce a reply.
pub trait VoidRequest: Request {}

/// Native-endian writers for request bodies.
pub(crate) trait Put {
    fn put_u8(&mut self, value: u8);
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
    fn pad(&mut self, count: usize);
    /// Write the 16-bit length of a string field, refusing lengths that do
    /// not fit.
    fn put_len16(&mut self, what: &'static str, len: usize) -> Result<()>;
}

impl Put for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_ne_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_ne_bytes());
    }

    fn pad(&mut self, count: usize) {
        self.resize(self.len() + count, 0);
    }

    fn put_len16(&mut self, what: &'static str, len: usize) -> Result<()> {
        let value = u16::try_from(len).map_err(|_| Error::FieldTooLong {
            what,
            len,
            max: u16::MAX as usize,
        })?;
        self.put_u16(value);
        Ok(())
    }
}

/// Serialize `request` and hand it to the transport.
pub(crate) fn send<R: Request, C: RawConnection + ?Sized>(
    conn: &C,
    request: &R,
    has_reply: bool,
    checked: bool,
) -> Result<u64> {
    let mut body = Vec::new();
    request.serialize(&mut body)?;

    let raw = RawRequest {
        extension: R::Protocol::EXTENSION,
        opcode: R::OPCODE,
        data: request.data(),
        body: &body,
        has_reply,
        checked,
    };

    let sequence = conn.send_request(&raw)?;
    tracing::trace!(
        extension = ?raw.extension,
        opcode = raw.opcode,
        sequence,
        checked,
        "sent request"
    );
    Ok(sequence)
}

/// The sequence number of a request that has no reply.
pub struct VoidCookie<R, M> {
    sequence: u64,
    _marker: PhantomData<(fn() -> R, M)>,
}

impl<R, M> VoidCookie<R, M> {
    pub(crate) fn new(sequence: u64) -> Self {
        Self {
            sequence,
            _marker: PhantomData,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<R, M: FetchMode> fmt::Debug for VoidCookie<R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoidCookie")
            .field("sequence", &self.sequence)
            .field("checked", &M::CHECKED)
            .finish()
    }
}

impl<R: Request> VoidCookie<R, Checked> {
    /// Wait for the server to process the request, surfacing its error if
    /// it failed.
    pub fn check<C: RawConnection + ?Sized>(self, conn: &C) -> Result<()> {
        match conn.check_request(self.sequence)? {
            None => Ok(()),
            Some(error) => Err(route_error::<R::Protocol, C>(conn, error)),
        }
    }
}

/// Send a request without a reply. Any error it causes is delivered
/// through the event queue.
pub fn request<R: VoidRequest, C: RawConnection + ?Sized>(
    conn: &C,
    request: &R,
) -> Result<VoidCookie<R, Unchecked>> {
    send(conn, request, false, Unchecked::CHECKED).map(VoidCookie::new)
}

/// Send a request without a reply, holding any error it causes for
/// [`VoidCookie::check`].
pub fn request_checked<R: VoidRequest, C: RawConnection + ?Sized>(
    conn: &C,
    request: &R,
) -> Result<VoidCookie<R, Checked>> {
    send(conn, request, false, Checked::CHECKED).map(VoidCookie::new)
}

// MIT/Apache2 License

//! The request/reply round trip.
//!
//! Sending a request that expects a reply yields a [`Cookie`]. A [`Fetch`]
//! consumes the cookie and, the first time it is asked, blocks until the
//! reply arrives. What happens when the server answers with an error
//! instead is decided by the fetch mode:
//!
//! - [`Checked`]: the error is decoded through the dispatch tables and
//!   returned as an [`Error`]. A successful fetch always has a reply.
//! - [`Unchecked`]: errors (and broken connections) are swallowed and the
//!   fetch is simply empty.
//!
//! Either way the outcome is cached, so asking twice never blocks twice.

use crate::{
    buffer::{Buffer, GenericError, RawStruct},
    connection::{Fetched, RawConnection},
    dispatch::route_error,
    factory::FromWire,
    iter::{Cursor, List},
    request::{self, Request},
    Error, Result,
};
use core::{cell::OnceCell, fmt, marker::PhantomData};

mod sealed {
    pub trait Sealed {}
}

/// The policy for surfacing errors when a reply is fetched.
pub trait FetchMode: sealed::Sealed {
    /// Whether requests are sent with `libxcb`'s checked flag.
    const CHECKED: bool;

    /// The cached outcome of a fetch.
    type Slot<T>;

    /// What callers get when they look at the outcome.
    type Access<'a, T: 'a>;

    /// Turn what the transport returned into a cached outcome.
    fn settle<T>(
        outcome: Result<Fetched>,
        wrap: impl FnOnce(Buffer) -> Result<T>,
        route: impl FnOnce(GenericError) -> Error,
    ) -> Self::Slot<T>;

    fn access<'a, T: 'a>(slot: &'a Self::Slot<T>) -> Self::Access<'a, T>;
}

/// Errors are returned from the fetch.
#[derive(Debug)]
pub enum Checked {}

/// Errors are dropped, the fetch may be empty.
#[derive(Debug)]
pub enum Unchecked {}

impl sealed::Sealed for Checked {}
impl sealed::Sealed for Unchecked {}

impl FetchMode for Checked {
    const CHECKED: bool = true;

    type Slot<T> = Result<T>;
    type Access<'a, T: 'a> = Result<&'a T>;

    fn settle<T>(
        outcome: Result<Fetched>,
        wrap: impl FnOnce(Buffer) -> Result<T>,
        route: impl FnOnce(GenericError) -> Error,
    ) -> Result<T> {
        match outcome? {
            Fetched::Reply(buffer) => wrap(buffer),
            Fetched::Error(error) => Err(route(error)),
            Fetched::Empty => Err(Error::MissingReply),
        }
    }

    fn access<'a, T: 'a>(slot: &'a Result<T>) -> Result<&'a T> {
        slot.as_ref().map_err(Clone::clone)
    }
}

impl FetchMode for Unchecked {
    const CHECKED: bool = false;

    type Slot<T> = Option<T>;
    type Access<'a, T: 'a> = Option<&'a T>;

    fn settle<T>(
        outcome: Result<Fetched>,
        wrap: impl FnOnce(Buffer) -> Result<T>,
        _route: impl FnOnce(GenericError) -> Error,
    ) -> Option<T> {
        match outcome {
            Ok(Fetched::Reply(buffer)) => match wrap(buffer) {
                Ok(reply) => Some(reply),
                Err(err) => {
                    tracing::debug!("dropping unusable reply: {}", err);
                    None
                }
            },
            Ok(Fetched::Error(error)) => {
                tracing::debug!(code = error.error_code(), "unchecked request failed");
                None
            }
            Ok(Fetched::Empty) => None,
            Err(err) => {
                tracing::debug!("unchecked fetch failed: {}", err);
                None
            }
        }
    }

    fn access<'a, T: 'a>(slot: &'a Option<T>) -> Option<&'a T> {
        slot.as_ref()
    }
}

/// A request that the server answers with a reply.
pub trait ReplyRequest: Request {
    /// The fixed-size head of the reply.
    type Raw: RawStruct;
}

/// The sequence number of a request awaiting its reply.
///
/// A cookie is consumed by the [`Fetch`] built from it, so a reply can
/// only be fetched once.
pub struct Cookie<R, M> {
    sequence: u64,
    _marker: PhantomData<(fn() -> R, M)>,
}

impl<R: ReplyRequest, M: FetchMode> Cookie<R, M> {
    /// Send `request`.
    pub fn send<C: RawConnection + ?Sized>(conn: &C, request: &R) -> Result<Self> {
        request::send(conn, request, true, M::CHECKED).map(|sequence| Self {
            sequence,
            _marker: PhantomData,
        })
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Give up on the reply.
    pub fn discard<C: RawConnection + ?Sized>(self, conn: &C) {
        conn.discard_reply(self.sequence);
    }
}

impl<R, M: FetchMode> fmt::Debug for Cookie<R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("sequence", &self.sequence)
            .field("checked", &M::CHECKED)
            .finish()
    }
}

/// A fetched, non-empty reply to a request of type `R`.
///
/// Field accessors for each reply type are defined next to the request
/// in [`crate::proto`].
pub struct Reply<'c, R, C: ?Sized> {
    conn: &'c C,
    buffer: Buffer,
    _kind: PhantomData<fn() -> R>,
}

impl<'c, R: ReplyRequest, C: ?Sized> Reply<'c, R, C> {
    /// Wrap a reply buffer, checking it is long enough for `R::Raw`.
    pub fn new(conn: &'c C, buffer: Buffer) -> Result<Self> {
        if !buffer.fits::<R::Raw>() || buffer.as_bytes()[0] != 1 {
            return Err(Error::Malformed {
                what: "reply",
                len: buffer.len(),
            });
        }

        Ok(Self {
            conn,
            buffer,
            _kind: PhantomData,
        })
    }

    pub(crate) fn raw(&self) -> R::Raw {
        self.buffer.view()
    }

    /// Run a wire value through the conversion factory.
    pub(crate) fn field<W, T: FromWire<'c, W, C>>(&self, wire: W) -> T {
        T::from_wire(wire, self.conn)
    }

    /// A view of one of the reply's lists.
    pub(crate) fn list<K: Cursor<'c, C>>(&self) -> List<'c, K, C> {
        List::new(self.conn, self.buffer.clone())
    }

    /// The low 16 bits of the request's sequence number.
    pub fn sequence(&self) -> u16 {
        self.buffer.read(2).unwrap_or(0)
    }

    /// The reply length in 4-byte units beyond the first 32 bytes.
    pub fn length(&self) -> u32 {
        self.buffer.read(4).unwrap_or(0)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn connection(&self) -> &'c C {
        self.conn
    }
}

impl<R, C: ?Sized> Clone for Reply<'_, R, C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn,
            buffer: self.buffer.clone(),
            _kind: PhantomData,
        }
    }
}

impl<R, C: ?Sized> fmt::Debug for Reply<'_, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("request", &core::any::type_name::<R>())
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// A reply that is fetched at most once.
pub struct Fetch<'c, R: ReplyRequest, M: FetchMode, C: RawConnection + ?Sized> {
    conn: &'c C,
    sequence: u64,
    slot: OnceCell<M::Slot<Reply<'c, R, C>>>,
}

impl<'c, R: ReplyRequest, M: FetchMode, C: RawConnection + ?Sized> Fetch<'c, R, M, C> {
    /// Wrap a cookie. Nothing blocks until [`Fetch::get`] is called.
    pub fn new(conn: &'c C, cookie: Cookie<R, M>) -> Self {
        Self {
            conn,
            sequence: cookie.sequence,
            slot: OnceCell::new(),
        }
    }

    /// Wrap a cookie and block for its reply right away.
    pub fn now(conn: &'c C, cookie: Cookie<R, M>) -> Self {
        let fetch = Self::new(conn, cookie);
        fetch.slot();
        fetch
    }

    /// Send `request` and wrap its cookie.
    pub fn send(conn: &'c C, request: &R) -> Result<Self> {
        Cookie::send(conn, request).map(|cookie| Self::new(conn, cookie))
    }

    /// The reply, fetching it first if needed.
    pub fn get(&self) -> M::Access<'_, Reply<'c, R, C>> {
        M::access(self.slot())
    }

    /// Try to fill the cache without blocking. Returns whether the outcome
    /// is now known.
    pub fn poll(&self) -> Result<bool> {
        if self.slot.get().is_some() {
            return Ok(true);
        }

        match self.conn.poll_for_reply(self.sequence)? {
            Some(fetched) => {
                let _ = self.slot.set(self.settle(Ok(fetched)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the reply has been fetched yet.
    pub fn is_fetched(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn slot(&self) -> &M::Slot<Reply<'c, R, C>> {
        self.slot
            .get_or_init(|| self.settle(self.conn.wait_for_reply(self.sequence)))
    }

    fn settle(&self, outcome: Result<Fetched>) -> M::Slot<Reply<'c, R, C>> {
        let conn = self.conn;
        M::settle(
            outcome,
            |buffer| Reply::new(conn, buffer),
            |error| route_error::<R::Protocol, C>(conn, error),
        )
    }
}

impl<'c, R: ReplyRequest, C: RawConnection + ?Sized> Fetch<'c, R, Unchecked, C> {
    /// Whether the fetch came back without a reply.
    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }
}

impl<R: ReplyRequest, M: FetchMode, C: RawConnection + ?Sized> Drop for Fetch<'_, R, M, C> {
    fn drop(&mut self) {
        if self.slot.get().is_none() {
            self.conn.discard_reply(self.sequence);
        }
    }
}

impl<R: ReplyRequest, M: FetchMode, C: RawConnection + ?Sized> fmt::Debug for Fetch<'_, R, M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetch")
            .field("sequence", &self.sequence)
            .field("checked", &M::CHECKED)
            .field("fetched", &self.is_fetched())
            .finish()
    }
}

// MIT/Apache2 License

//! Iteration over the variable-length parts of a reply.
//!
//! Replies carry their trailing data in one of two shapes:
//!
//! - a *chained* sequence of self-describing records, where the size of
//!   each record can only be learned by looking at it (strings, device
//!   class descriptions), and
//! - a *strided* array of fixed-size elements (resource ids, property
//!   data).
//!
//! Each list in a reply is described by a small zero-sized type that
//! implements [`Chained`] or [`Strided`]. A [`List`] pairs the descriptor
//! with the reply buffer and hands out independent [`Cursor`]s, or an
//! ordinary [`Iterator`] through [`List::iter`].

use crate::{
    buffer::{Buffer, RawStruct},
    factory::FromWire,
};
use alloc::{string::String, vec::Vec};
use core::{fmt, marker::PhantomData, mem};

/// A position in a reply list.
///
/// Two cursors are equal when they have the same number of elements left
/// *and* read from the same reply allocation.
pub trait Cursor<'c, C: ?Sized>: Clone + PartialEq {
    /// The logical element type.
    type Item;

    /// A cursor at the first element.
    fn begin(conn: &'c C, reply: &Buffer) -> Self;

    /// A cursor one past the last element. Never dereference it.
    fn end(conn: &'c C, reply: &Buffer) -> Self;

    /// The element under the cursor, or `None` at the end or if the reply
    /// is truncated.
    fn get(&self) -> Option<Self::Item>;

    /// Step forward. Returns `false` if the cursor was already at the end.
    fn advance(&mut self) -> bool;

    /// Step back. Returns `false` if there is nothing to step back to.
    fn retreat(&mut self) -> bool;

    /// The number of elements from here to the end.
    fn remaining(&self) -> usize;
}

/// Describes a list of self-describing, variable-size records.
pub trait Chained {
    /// The logical element type.
    type Item;

    /// The offset of the first record in `reply`, and the record count.
    fn start(reply: &[u8]) -> (usize, usize);

    /// The size in bytes of the record at the start of `record`.
    fn size_of(record: &[u8]) -> Option<usize>;

    /// The offset of the record that follows the one at `offset`.
    fn advance(reply: &[u8], offset: usize) -> Option<usize> {
        let size = Self::size_of(reply.get(offset..)?)?;
        offset.checked_add(size)
    }

    /// Produce the logical value of one record.
    fn decode(record: &[u8]) -> Self::Item;
}

/// Describes an array of fixed-size elements.
pub trait Strided {
    /// The element as it is laid out in the reply.
    type Wire: RawStruct;

    /// The offset of the first element in `reply`.
    fn offset(reply: &[u8]) -> usize;

    /// The number of elements the reply claims to hold.
    fn len(reply: &[u8]) -> usize;
}

/// A cursor over a [`Chained`] list.
pub struct ChainedCursor<'c, D, C: ?Sized> {
    reply: Buffer,
    offset: usize,
    remaining: usize,
    // byte strides of every step taken so far, popped by `retreat`
    strides: Vec<usize>,
    // count before an advance that ran past the reply
    truncated_from: Option<usize>,
    _marker: PhantomData<(fn() -> D, &'c C)>,
}

impl<D: Chained, C: ?Sized> ChainedCursor<'_, D, C> {
    fn at(reply: &Buffer, at_end: bool) -> Self {
        let (offset, count) = D::start(reply.as_bytes());

        Self {
            reply: reply.clone(),
            offset,
            remaining: if at_end { 0 } else { count },
            strides: Vec::new(),
            truncated_from: None,
            _marker: PhantomData,
        }
    }

    /// The byte offset of the current record within the reply.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<D, C: ?Sized> Clone for ChainedCursor<'_, D, C> {
    fn clone(&self) -> Self {
        Self {
            reply: self.reply.clone(),
            offset: self.offset,
            remaining: self.remaining,
            strides: self.strides.clone(),
            truncated_from: self.truncated_from,
            _marker: PhantomData,
        }
    }
}

impl<D, C: ?Sized> PartialEq for ChainedCursor<'_, D, C> {
    fn eq(&self, other: &Self) -> bool {
        self.remaining == other.remaining && self.reply.ptr_eq(&other.reply)
    }
}

impl<D, C: ?Sized> fmt::Debug for ChainedCursor<'_, D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedCursor")
            .field("offset", &self.offset)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'c, D: Chained, C: ?Sized> Cursor<'c, C> for ChainedCursor<'c, D, C> {
    type Item = D::Item;

    fn begin(_conn: &'c C, reply: &Buffer) -> Self {
        Self::at(reply, false)
    }

    fn end(_conn: &'c C, reply: &Buffer) -> Self {
        Self::at(reply, true)
    }

    fn get(&self) -> Option<D::Item> {
        if self.remaining == 0 {
            return None;
        }

        let rest = self.reply.as_bytes().get(self.offset..)?;
        let size = D::size_of(rest)?;
        rest.get(..size).map(D::decode)
    }

    fn advance(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }

        match D::advance(self.reply.as_bytes(), self.offset) {
            Some(next) if next <= self.reply.len() => {
                self.strides.push(next - self.offset);
                self.offset = next;
                self.remaining -= 1;
                true
            }
            _ => {
                tracing::trace!(offset = self.offset, "record runs past the end of the reply");
                self.truncated_from = Some(self.remaining);
                self.remaining = 0;
                false
            }
        }
    }

    fn retreat(&mut self) -> bool {
        // undo a failed advance in place, the offset never moved
        if let Some(remaining) = self.truncated_from.take() {
            self.remaining = remaining;
            return true;
        }

        match self.strides.pop() {
            Some(stride) => {
                self.offset -= stride;
                self.remaining += 1;
                true
            }
            None => false,
        }
    }

    fn remaining(&self) -> usize {
        self.remaining
    }
}

/// A cursor over a [`Strided`] list, producing `T` through [`FromWire`].
pub struct StridedCursor<'c, D, T, C: ?Sized> {
    conn: &'c C,
    reply: Buffer,
    index: usize,
    len: usize,
    _marker: PhantomData<fn() -> (D, T)>,
}

impl<'c, D: Strided, T, C: ?Sized> StridedCursor<'c, D, T, C> {
    fn at(conn: &'c C, reply: &Buffer, at_end: bool) -> Self {
        let bytes = reply.as_bytes();
        let offset = D::offset(bytes);
        let room = bytes.len().saturating_sub(offset) / mem::size_of::<D::Wire>().max(1);
        let len = D::len(bytes).min(room);

        Self {
            conn,
            reply: reply.clone(),
            index: if at_end { len } else { 0 },
            len,
            _marker: PhantomData,
        }
    }

    /// The index of the current element.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<D, T, C: ?Sized> Clone for StridedCursor<'_, D, T, C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn,
            reply: self.reply.clone(),
            index: self.index,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

impl<D, T, C: ?Sized> PartialEq for StridedCursor<'_, D, T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.reply.ptr_eq(&other.reply)
    }
}

impl<D, T, C: ?Sized> fmt::Debug for StridedCursor<'_, D, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedCursor")
            .field("index", &self.index)
            .field("len", &self.len)
            .finish()
    }
}

impl<'c, D, T, C> Cursor<'c, C> for StridedCursor<'c, D, T, C>
where
    D: Strided,
    T: FromWire<'c, D::Wire, C>,
    C: ?Sized,
{
    type Item = T;

    fn begin(conn: &'c C, reply: &Buffer) -> Self {
        Self::at(conn, reply, false)
    }

    fn end(conn: &'c C, reply: &Buffer) -> Self {
        Self::at(conn, reply, true)
    }

    fn get(&self) -> Option<T> {
        if self.index >= self.len {
            return None;
        }

        let offset = D::offset(self.reply.as_bytes()) + self.index * mem::size_of::<D::Wire>();
        self.reply
            .read::<D::Wire>(offset)
            .map(|wire| T::from_wire(wire, self.conn))
    }

    fn advance(&mut self) -> bool {
        if self.index < self.len {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn retreat(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    fn remaining(&self) -> usize {
        self.len - self.index
    }
}

/// A restartable view of one list inside a reply.
pub struct List<'c, K, C: ?Sized> {
    conn: &'c C,
    reply: Buffer,
    _cursor: PhantomData<fn() -> K>,
}

/// A list of self-describing records.
pub type ChainedList<'c, D, C> = List<'c, ChainedCursor<'c, D, C>, C>;

/// A list of fixed-size elements converted to `T`.
pub type StridedList<'c, D, T, C> = List<'c, StridedCursor<'c, D, T, C>, C>;

impl<'c, K: Cursor<'c, C>, C: ?Sized> List<'c, K, C> {
    pub(crate) fn new(conn: &'c C, reply: Buffer) -> Self {
        Self {
            conn,
            reply,
            _cursor: PhantomData,
        }
    }

    /// A fresh cursor at the first element.
    pub fn begin(&self) -> K {
        K::begin(self.conn, &self.reply)
    }

    /// A fresh cursor one past the last element.
    pub fn end(&self) -> K {
        K::end(self.conn, &self.reply)
    }

    pub fn iter(&self) -> Iter<'c, K, C> {
        Iter {
            front: self.begin(),
            back: self.end(),
            _conn: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.begin().remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, C: ?Sized> Clone for List<'_, K, C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn,
            reply: self.reply.clone(),
            _cursor: PhantomData,
        }
    }
}

impl<'c, K: Cursor<'c, C>, C: ?Sized> fmt::Debug for List<'c, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("len", &self.len()).finish()
    }
}

impl<'c, K: Cursor<'c, C>, C: ?Sized> IntoIterator for &List<'c, K, C> {
    type Item = K::Item;
    type IntoIter = Iter<'c, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'c, K: Cursor<'c, C>, C: ?Sized> IntoIterator for List<'c, K, C> {
    type Item = K::Item;
    type IntoIter = Iter<'c, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An [`Iterator`] between two cursors.
pub struct Iter<'c, K, C: ?Sized> {
    front: K,
    back: K,
    _conn: PhantomData<&'c C>,
}

impl<'c, K: Cursor<'c, C>, C: ?Sized> Iterator for Iter<'c, K, C> {
    type Item = K::Item;

    fn next(&mut self) -> Option<K::Item> {
        if self.front == self.back {
            return None;
        }

        let item = self.front.get();
        if item.is_none() {
            // truncated reply, stop here
            self.front = self.back.clone();
            return None;
        }

        self.front.advance();
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.front.remaining().saturating_sub(self.back.remaining());
        (0, Some(left))
    }
}

impl<'c, D, T, C> DoubleEndedIterator for Iter<'c, StridedCursor<'c, D, T, C>, C>
where
    D: Strided,
    T: FromWire<'c, D::Wire, C>,
    C: ?Sized,
{
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        self.back.retreat();
        self.back.get()
    }
}

/// Size of an X11 `STR`: a length byte followed by that many bytes.
pub(crate) fn str_size_of(record: &[u8]) -> Option<usize> {
    record.first().map(|&len| 1 + len as usize)
}

/// Decode an X11 `STR` record. Protocol strings are Latin-1.
pub(crate) fn str_decode(record: &[u8]) -> String {
    record.iter().skip(1).map(|&b| char::from(b)).collect()
}

// MIT/Apache2 License

//! Statically typed requests, replies, events and errors over `libxcb`.
//!
//! `libxcb` hands out untyped byte blocks: replies, events and errors all
//! come back as `malloc`'d packets that the caller has to cast and free.
//! This crate puts a typed layer over those packets without copying them:
//!
//! - requests are sent through [`Fetch`] (when they have a reply) or
//!   [`request`] and [`request_checked`] (when they don't),
//! - replies are read through accessors on [`Reply`], with the variable
//!   length parts exposed as restartable [`List`] views,
//! - events and errors are decoded by the dispatch tables in [`proto`],
//!   which account for the opcode offsets the server assigns to
//!   extensions.
//!
//! Field accessors are generic over what they return. Resource fields can
//! come back as plain integers, typed ids, or [`Bound`] handles that
//! carry the connection along for follow-up requests.
//!
//! The transport is abstracted behind [`RawConnection`]. [`XcbConnection`]
//! implements it over a real `xcb_connection_t`, whose pointer stays
//! available for C libraries built on `libxcb`.
//!
//! ## Features
//!
//! - `std` (enabled by default) - Implements the standard library's
//!   error trait plumbing and lets `tracing` use `std`.
//! - `real_mutex` (enabled by default) - This feature imports `std` so
//!   that all synchronous data can be locked behind standard library
//!   lock types. With this feature disabled, the standard library is
//!   not used, but spinlocks are used to secure data instead.
//! - `dl` (enabled by default) - Loads `libxcb` at runtime instead of
//!   linking to it. Also imports the standard library.
//! - `pl` - Uses `parking_lot` locks instead of `std` locks throughout
//!   the program. Implies `real_mutex`.

#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[path = "alloc.rs"]
pub(crate) mod cbox;
pub(crate) mod sync;

#[macro_use]
pub mod factory;
#[macro_use]
mod macros;

pub mod buffer;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod extension_manager;
pub mod iter;
pub mod proto;
pub mod reply;
pub mod request;
pub mod signature;

pub(crate) mod xcb_ffi;
mod xcb_connection;

#[cfg(test)]
mod test;

pub use buffer::{Buffer, GenericError, GenericEvent};
pub use connection::{Fetched, RawConnection};
pub use dispatch::{DispatchError, DispatchEvent, Protocol};
pub use error::{ConnectionError, Error, ProtocolError, Result};
pub use event::{ExtensionError, ExtensionEvent, TypedError, TypedEvent};
pub use extension_manager::ExtensionInfo;
pub use factory::{Bound, FromWire, Resource};
pub use iter::{Cursor, List};
pub use reply::{Checked, Cookie, Fetch, FetchMode, Reply, ReplyRequest, Unchecked};
pub use request::{request, request_checked, RawRequest, Request, VoidCookie, VoidRequest};
pub use xcb_connection::XcbConnection;

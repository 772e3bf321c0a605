// MIT/Apache2 License

//! The `libxcb` entry points this crate calls.
//!
//! Each function is described exactly once, as a function pointer type
//! below. The static and dynamic backends both fill a [`Functions`] table
//! with pointers of those types, and callers go through
//! [`Signature::call`] so argument and return types always follow the
//! declared type.

use crate::signature::{Output, Signature};
use core::ptr::null_mut;
use libc::{c_char, c_int, c_uint, c_void};

cfg_if::cfg_if! {
    if #[cfg(feature = "dl")] {
        mod dynamic_link;
        pub(crate) use dynamic_link::xcb;
    } else {
        mod static_link;
        pub(crate) use static_link::xcb;
    }
}

/// Opaque type for the `libxcb` connection.
#[repr(C)]
pub(crate) struct Connection {
    _opaque_type: [u8; 0],
}

/// Type for authorization info.
#[repr(C)]
pub(crate) struct AuthInfo {
    pub(crate) namelen: c_int,
    pub(crate) name: *mut c_char,
    pub(crate) datalen: c_int,
    pub(crate) data: *mut c_char,
}

/// An event, error or reply block. Its size depends on its header.
#[repr(C)]
pub(crate) struct RawPacket {
    _opaque_type: [u8; 0],
}

/// Extension handle, unused with raw requests.
#[repr(C)]
pub(crate) struct Extension {
    _opaque_type: [u8; 0],
}

#[cfg(unix)]
pub(crate) use libc::iovec as Iovec;
#[cfg(not(unix))]
#[repr(C)]
pub(crate) struct Iovec {
    pub(crate) iov_base: *mut c_void,
    pub(crate) iov_len: usize,
}

pub(crate) fn empty_iov() -> Iovec {
    Iovec {
        iov_base: null_mut(),
        iov_len: 0,
    }
}

/// `xcb_protocol_request_t`.
#[repr(C)]
pub(crate) struct ProtocolRequest {
    pub(crate) count: usize,
    pub(crate) extension: *mut Extension,
    pub(crate) opcode: u8,
    pub(crate) isvoid: u8,
}

/// `xcb_void_cookie_t`.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct VoidCookie {
    pub(crate) sequence: c_uint,
}

pub(crate) type Connect = unsafe extern "C" fn(*const c_char, *mut c_int) -> *mut Connection;
pub(crate) type ConnectWithAuthInfo =
    unsafe extern "C" fn(*const c_char, *mut AuthInfo, *mut c_int) -> *mut Connection;
pub(crate) type ConnectToFd = unsafe extern "C" fn(c_int, *mut AuthInfo) -> *mut Connection;
pub(crate) type GetFileDescriptor = unsafe extern "C" fn(*mut Connection) -> c_int;
pub(crate) type ConnectionHasError = unsafe extern "C" fn(*mut Connection) -> c_int;
pub(crate) type Disconnect = unsafe extern "C" fn(*mut Connection);
pub(crate) type GenerateId = unsafe extern "C" fn(*mut Connection) -> u32;
pub(crate) type Flush = unsafe extern "C" fn(*mut Connection) -> c_int;
pub(crate) type GetMaximumRequestLength = unsafe extern "C" fn(*mut Connection) -> u32;
pub(crate) type WaitForEvent = unsafe extern "C" fn(*mut Connection) -> *mut RawPacket;
pub(crate) type PollForEvent = unsafe extern "C" fn(*mut Connection) -> *mut RawPacket;
pub(crate) type SendRequest64 =
    unsafe extern "C" fn(*mut Connection, c_int, *mut Iovec, *const ProtocolRequest) -> u64;
pub(crate) type WaitForReply64 =
    unsafe extern "C" fn(*mut Connection, u64, *mut *mut RawPacket) -> *mut c_void;
pub(crate) type PollForReply64 = unsafe extern "C" fn(
    *mut Connection,
    u64,
    *mut *mut c_void,
    *mut *mut RawPacket,
) -> c_int;
pub(crate) type DiscardReply64 = unsafe extern "C" fn(*mut Connection, u64);
pub(crate) type RequestCheck = unsafe extern "C" fn(*mut Connection, VoidCookie) -> *mut RawPacket;

macro_rules! functions {
    ($($field:ident: $ty:ident = $symbol:ident;)*) => {
        /// The resolved `libxcb` function table.
        pub(crate) struct Functions {
            $(pub(crate) $field: $ty,)*
        }

        impl Functions {
            $(
                pub(crate) unsafe fn $field(&self, args: <$ty as Signature>::Args) -> Output<$ty> {
                    self.$field.call(args)
                }
            )*
        }

        /// Symbol names, in table order.
        #[allow(dead_code)]
        pub(crate) const SYMBOLS: &[&str] = &[$(stringify!($symbol),)*];
    };
}

functions! {
    connect: Connect = xcb_connect;
    connect_with_auth_info: ConnectWithAuthInfo = xcb_connect_to_display_with_auth_info;
    connect_to_fd: ConnectToFd = xcb_connect_to_fd;
    get_file_descriptor: GetFileDescriptor = xcb_get_file_descriptor;
    connection_has_error: ConnectionHasError = xcb_connection_has_error;
    disconnect: Disconnect = xcb_disconnect;
    generate_id: GenerateId = xcb_generate_id;
    flush: Flush = xcb_flush;
    get_maximum_request_length: GetMaximumRequestLength = xcb_get_maximum_request_length;
    wait_for_event: WaitForEvent = xcb_wait_for_event;
    poll_for_event: PollForEvent = xcb_poll_for_event;
    send_request64: SendRequest64 = xcb_send_request64;
    wait_for_reply64: WaitForReply64 = xcb_wait_for_reply64;
    poll_for_reply64: PollForReply64 = xcb_poll_for_reply64;
    discard_reply64: DiscardReply64 = xcb_discard_reply64;
    request_check: RequestCheck = xcb_request_check;
}

pub(crate) mod flags {
    use super::SendRequest64;
    use crate::signature::Arg;

    type Flags = Arg<SendRequest64, 1>;

    pub(crate) const CHECKED: Flags = 1 << 0;
    pub(crate) const RAW: Flags = 1 << 1;
    #[allow(dead_code)]
    pub(crate) const DISCARD_REPLY: Flags = 1 << 2;
    #[allow(dead_code)]
    pub(crate) const REPLY_FDS: Flags = 1 << 3;
}

// MIT/Apache2 License

use super::{AuthInfo, Connection, Functions, Iovec, ProtocolRequest, RawPacket, VoidCookie};
use crate::Result;
use libc::{c_char, c_int, c_void};

static FUNCTIONS: Functions = Functions {
    connect: xcb_connect,
    connect_with_auth_info: xcb_connect_to_display_with_auth_info,
    connect_to_fd: xcb_connect_to_fd,
    get_file_descriptor: xcb_get_file_descriptor,
    connection_has_error: xcb_connection_has_error,
    disconnect: xcb_disconnect,
    generate_id: xcb_generate_id,
    flush: xcb_flush,
    get_maximum_request_length: xcb_get_maximum_request_length,
    wait_for_event: xcb_wait_for_event,
    poll_for_event: xcb_poll_for_event,
    send_request64: xcb_send_request64,
    wait_for_reply64: xcb_wait_for_reply64,
    poll_for_reply64: xcb_poll_for_reply64,
    discard_reply64: xcb_discard_reply64,
    request_check: xcb_request_check,
};

/// The linked-in `libxcb`. Never fails.
pub(crate) fn xcb() -> Result<&'static Functions> {
    Ok(&FUNCTIONS)
}

// actual import
#[link(name = "xcb")]
extern "C" {
    fn xcb_connect(display: *const c_char, screenp: *mut c_int) -> *mut Connection;
    fn xcb_connect_to_display_with_auth_info(
        display: *const c_char,
        auth_info: *mut AuthInfo,
        screenp: *mut c_int,
    ) -> *mut Connection;
    fn xcb_connect_to_fd(fd: c_int, auth_info: *mut AuthInfo) -> *mut Connection;
    fn xcb_get_file_descriptor(conn: *mut Connection) -> c_int;
    fn xcb_connection_has_error(conn: *mut Connection) -> c_int;
    fn xcb_disconnect(conn: *mut Connection);
    fn xcb_generate_id(conn: *mut Connection) -> u32;
    fn xcb_flush(conn: *mut Connection) -> c_int;
    fn xcb_get_maximum_request_length(conn: *mut Connection) -> u32;
    fn xcb_wait_for_event(conn: *mut Connection) -> *mut RawPacket;
    fn xcb_poll_for_event(conn: *mut Connection) -> *mut RawPacket;
    fn xcb_send_request64(
        conn: *mut Connection,
        flags: c_int,
        iov: *mut Iovec,
        request: *const ProtocolRequest,
    ) -> u64;
    fn xcb_wait_for_reply64(
        conn: *mut Connection,
        seq: u64,
        error: *mut *mut RawPacket,
    ) -> *mut c_void;
    fn xcb_poll_for_reply64(
        conn: *mut Connection,
        seq: u64,
        reply: *mut *mut c_void,
        error: *mut *mut RawPacket,
    ) -> c_int;
    fn xcb_discard_reply64(conn: *mut Connection, seq: u64);
    fn xcb_request_check(conn: *mut Connection, cookie: VoidCookie) -> *mut RawPacket;
}

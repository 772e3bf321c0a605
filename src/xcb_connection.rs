// MIT/Apache2 License

use crate::{
    buffer::{Buffer, GenericError, GenericEvent, EVENT_SIZE},
    connection::{Fetched, RawConnection},
    error::ConnectionError,
    extension_manager::{ExtensionInfo, ExtensionManager},
    request::RawRequest,
    xcb_ffi::{
        empty_iov, flags, xcb, AuthInfo, Connection, Iovec, ProtocolRequest, RawPacket,
        VoidCookie,
    },
    Error, Result,
};
use core::{
    mem::MaybeUninit,
    ptr::{self, null, null_mut, NonNull},
    slice,
};
use cstr_core::CStr;
use libc::{c_int, c_void};

/// The XGE event code; such events carry a length field.
const GE_GENERIC_EVENT: u8 = 35;

/// A [`RawConnection`] over a `libxcb` `xcb_connection_t`.
///
/// The raw pointer is available through [`XcbConnection::as_ptr`], so the
/// same connection can be shared with C libraries built on `libxcb`.
pub struct XcbConnection {
    /// Pointer to the real connection object.
    connection: NonNull<Connection>,
    /// Whether we should call `xcb_disconnect` on drop.
    disconnect: bool,
    /// Extension info manager.
    extension_manager: ExtensionManager,
    /// The screen we're using.
    screen: usize,
}

unsafe impl Send for XcbConnection {}
unsafe impl Sync for XcbConnection {}

impl XcbConnection {
    /// Connect to the X server.
    ///
    /// `None` uses the `DISPLAY` environment variable.
    pub fn connect(display: Option<&CStr>) -> Result<Self> {
        let mut screen = MaybeUninit::<c_int>::zeroed();
        let display = display.map_or(null(), CStr::as_ptr);

        let connection = unsafe { xcb()?.connect((display, screen.as_mut_ptr())) };

        unsafe { Self::connected(connection, screen.assume_init() as usize) }
    }

    /// Connect to the X server with the given authorization protocol name
    /// and data.
    pub fn connect_with_auth_info(
        display: Option<&CStr>,
        auth_name: &[u8],
        auth_data: &[u8],
    ) -> Result<Self> {
        let mut screen = MaybeUninit::<c_int>::zeroed();
        let mut auth_info = auth_info(auth_name, auth_data);
        let display = display.map_or(null(), CStr::as_ptr);

        let connection = unsafe {
            xcb()?.connect_with_auth_info((
                display,
                &mut auth_info as *mut AuthInfo,
                screen.as_mut_ptr(),
            ))
        };

        unsafe { Self::connected(connection, screen.assume_init() as usize) }
    }

    /// Connect over an already open socket.
    ///
    /// # Safety
    ///
    /// `fd` must be a valid, connected socket. `libxcb` takes ownership of it.
    pub unsafe fn connect_to_fd(
        fd: c_int,
        auth_name: &[u8],
        auth_data: &[u8],
        screen: usize,
    ) -> Result<Self> {
        let mut auth_info = auth_info(auth_name, auth_data);

        let connection = unsafe { xcb()?.connect_to_fd((fd, &mut auth_info as *mut AuthInfo)) };

        unsafe { Self::connected(connection, screen) }
    }

    unsafe fn connected(ptr: *mut Connection, screen: usize) -> Result<Self> {
        // libxcb hands out a static error object rather than null on failure,
        // but guard against null anyway
        let ptr = match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => return Err(ConnectionError::Io.into()),
        };

        let this = unsafe { Self::from_ptr(ptr.as_ptr().cast(), true, screen) };

        match this.take_error() {
            Some(err) => Err(err.into()),
            None => {
                tracing::debug!(screen, "connected to the X server");
                Ok(this)
            }
        }
    }

    /// Wrap around an existing pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be a valid, non-null pointer to a `xcb_connection_t`. In
    /// addition `disconnect` should only be `true` if we logically own the
    /// connection.
    pub unsafe fn from_ptr(ptr: *mut c_void, disconnect: bool, screen: usize) -> Self {
        Self {
            connection: unsafe { NonNull::new_unchecked(ptr.cast()) },
            disconnect,
            extension_manager: ExtensionManager::new(),
            screen,
        }
    }

    /// The underlying `xcb_connection_t`.
    pub fn as_ptr(&self) -> *mut c_void {
        self.connection.as_ptr().cast()
    }

    fn conn(&self) -> *mut Connection {
        self.connection.as_ptr()
    }

    /// The screen chosen when connecting.
    pub fn default_screen_index(&self) -> usize {
        self.screen
    }

    /// The file descriptor of the underlying socket.
    pub fn get_fd(&self) -> Result<c_int> {
        Ok(unsafe { xcb()?.get_file_descriptor((self.conn(),)) })
    }

    /// The reason the connection was shut down, if it was.
    pub fn take_error(&self) -> Option<ConnectionError> {
        let code = match xcb() {
            Ok(xcb) => unsafe { xcb.connection_has_error((self.conn(),)) },
            Err(_) => return None,
        };

        let err = ConnectionError::from_code(code);
        if let Some(err) = err {
            tracing::warn!("connection is in an error state: {}", err);
        }
        err
    }

    /// The connection's error, or a generic I/O error if `libxcb` did not
    /// record one.
    fn current_error(&self) -> Error {
        self.take_error().unwrap_or(ConnectionError::Io).into()
    }

    /// The largest request the server accepts, in bytes.
    pub fn maximum_request_length(&self) -> Result<usize> {
        let units = unsafe { xcb()?.get_maximum_request_length((self.conn(),)) };
        Ok(units as usize * 4)
    }

    /// Take ownership of an event block.
    unsafe fn wrap_event(&self, event: *mut RawPacket) -> Result<GenericEvent> {
        let bytes = event.cast::<u8>();
        let header = unsafe { slice::from_raw_parts(bytes as *const u8, EVENT_SIZE) };

        // libxcb appends a 4 byte full sequence number after the first 32
        // bytes, XGE payloads start after it
        let mut length = EVENT_SIZE;
        if header[0] & 0x7f == GE_GENERIC_EVENT {
            let extra = u32::from_ne_bytes([header[4], header[5], header[6], header[7]]) as usize * 4;
            unsafe { ptr::copy(bytes.add(EVENT_SIZE + 4), bytes.add(EVENT_SIZE), extra) };
            length += extra;
        }

        let buffer = unsafe { Buffer::from_raw_parts(bytes, length) };
        GenericEvent::new(buffer).ok_or(Error::Malformed {
            what: "event",
            len: length,
        })
    }

    /// Take ownership of an error block.
    unsafe fn wrap_error(&self, error: *mut RawPacket) -> Result<GenericError> {
        let buffer = unsafe { Buffer::from_raw_parts(error.cast(), EVENT_SIZE) };
        GenericError::new(buffer).ok_or(Error::Malformed {
            what: "error",
            len: EVENT_SIZE,
        })
    }

    /// Sort out what `xcb_wait_for_reply64` and friends handed back.
    unsafe fn fetched(&self, reply: *mut c_void, error: *mut RawPacket) -> Result<Fetched> {
        match (reply.is_null(), error.is_null()) {
            (true, true) => Ok(Fetched::Empty),
            (false, true) => Ok(Fetched::Reply(unsafe { wrap_reply(reply) })),
            (true, false) => unsafe { self.wrap_error(error) }.map(Fetched::Error),
            (false, false) => {
                // never happens in practice, keep the reply and drop the error
                unsafe { libc::free(error.cast()) };
                Ok(Fetched::Reply(unsafe { wrap_reply(reply) }))
            }
        }
    }
}

impl RawConnection for XcbConnection {
    fn send_request(&self, request: &RawRequest<'_>) -> Result<u64> {
        let major_opcode = match request.extension {
            Some(name) => match self.extension(name)? {
                Some(info) => Some(info.major_opcode),
                None => return Err(Error::MissingExtension(name)),
            },
            None => None,
        };

        let mut buf = request.encode(major_opcode)?;
        let max = self.maximum_request_length()?;
        if buf.len() > max {
            return Err(Error::RequestTooLarge { len: buf.len(), max });
        }

        // libxcb needs two spare iovecs in front of the ones we pass
        let mut iov = [
            empty_iov(),
            empty_iov(),
            Iovec {
                iov_base: buf.as_mut_ptr().cast(),
                iov_len: buf.len(),
            },
        ];

        let proto_request = ProtocolRequest {
            count: 1,
            extension: null_mut(),
            opcode: request.opcode,
            isvoid: (!request.has_reply) as u8,
        };

        let mut sr_flags = flags::RAW;
        if request.checked {
            sr_flags |= flags::CHECKED;
        }

        let xcb = xcb()?;
        let seq = unsafe {
            xcb.send_request64((
                self.conn(),
                sr_flags,
                iov[2..].as_mut_ptr(),
                &proto_request as *const ProtocolRequest,
            ))
        };

        // a zero sequence number means the connection broke
        if seq == 0 {
            return Err(self.current_error());
        }

        Ok(seq)
    }

    fn wait_for_reply(&self, sequence: u64) -> Result<Fetched> {
        let mut error: *mut RawPacket = null_mut();
        let reply = unsafe {
            xcb()?.wait_for_reply64((self.conn(), sequence, &mut error as *mut *mut RawPacket))
        };

        if reply.is_null() && error.is_null() {
            if let Some(err) = self.take_error() {
                return Err(err.into());
            }
        }

        unsafe { self.fetched(reply, error) }
    }

    fn poll_for_reply(&self, sequence: u64) -> Result<Option<Fetched>> {
        let mut reply: *mut c_void = null_mut();
        let mut error: *mut RawPacket = null_mut();

        let found = unsafe {
            xcb()?.poll_for_reply64((
                self.conn(),
                sequence,
                &mut reply as *mut *mut c_void,
                &mut error as *mut *mut RawPacket,
            ))
        };

        if found == 0 {
            return match self.take_error() {
                Some(err) => Err(err.into()),
                None => Ok(None),
            };
        }

        unsafe { self.fetched(reply, error) }.map(Some)
    }

    fn discard_reply(&self, sequence: u64) {
        match xcb() {
            Ok(xcb) => unsafe { xcb.discard_reply64((self.conn(), sequence)) },
            Err(err) => tracing::warn!("unable to discard reply {}: {}", sequence, err),
        }
    }

    fn check_request(&self, sequence: u64) -> Result<Option<GenericError>> {
        let cookie = VoidCookie {
            sequence: sequence as _,
        };
        let error = unsafe { xcb()?.request_check((self.conn(), cookie)) };

        if error.is_null() {
            return match self.take_error() {
                Some(err) => Err(err.into()),
                None => Ok(None),
            };
        }

        unsafe { self.wrap_error(error) }.map(Some)
    }

    fn extension(&self, name: &'static str) -> Result<Option<ExtensionInfo>> {
        self.extension_manager.extension(self, name)
    }

    fn generate_id(&self) -> Result<u32> {
        let xid = unsafe { xcb()?.generate_id((self.conn(),)) };

        if xid == u32::MAX {
            Err(self.current_error())
        } else {
            Ok(xid)
        }
    }

    fn flush(&self) -> Result<()> {
        let res = unsafe { xcb()?.flush((self.conn(),)) };

        if res <= 0 {
            Err(self.current_error())
        } else {
            Ok(())
        }
    }

    fn wait_for_event(&self) -> Result<GenericEvent> {
        let event = unsafe { xcb()?.wait_for_event((self.conn(),)) };

        if event.is_null() {
            return Err(self.current_error());
        }

        unsafe { self.wrap_event(event) }
    }

    fn poll_for_event(&self) -> Result<Option<GenericEvent>> {
        let event = unsafe { xcb()?.poll_for_event((self.conn(),)) };

        if event.is_null() {
            // tell if the null corresponds to an error
            return match self.take_error() {
                Some(err) => Err(err.into()),
                None => Ok(None),
            };
        }

        unsafe { self.wrap_event(event) }.map(Some)
    }
}

impl XcbConnection {
    /// The cached extension whose events start at `first_event`, if it
    /// has been looked up on this connection.
    pub fn extension_for_event(&self, first_event: u8) -> Option<(&'static str, ExtensionInfo)> {
        self.extension_manager.by_first_event(first_event)
    }

    /// The cached extension whose errors start at `first_error`.
    pub fn extension_for_error(&self, first_error: u8) -> Option<(&'static str, ExtensionInfo)> {
        self.extension_manager.by_first_error(first_error)
    }

    /// The cached extension with this major opcode.
    pub fn extension_for_opcode(&self, major_opcode: u8) -> Option<(&'static str, ExtensionInfo)> {
        self.extension_manager.by_major_opcode(major_opcode)
    }
}

impl Drop for XcbConnection {
    fn drop(&mut self) {
        if self.disconnect {
            match xcb() {
                Ok(xcb) => unsafe { xcb.disconnect((self.conn(),)) },
                Err(err) => tracing::warn!("unable to disconnect: {}", err),
            }
        }
    }
}

/// Take ownership of a reply block, sized from its length field.
unsafe fn wrap_reply(reply: *mut c_void) -> Buffer {
    let header = unsafe { slice::from_raw_parts(reply as *const u8, EVENT_SIZE) };
    let length = u32::from_ne_bytes([header[4], header[5], header[6], header[7]]);

    // length is 32 plus four times the len
    let length = EVENT_SIZE + 4 * length as usize;
    unsafe { Buffer::from_raw_parts(reply.cast(), length) }
}

fn auth_info(auth_name: &[u8], auth_data: &[u8]) -> AuthInfo {
    AuthInfo {
        namelen: auth_name.len() as _,
        name: auth_name.as_ptr() as *const _ as *mut _,
        datalen: auth_data.len() as _,
        data: auth_data.as_ptr() as *const _ as *mut _,
    }
}

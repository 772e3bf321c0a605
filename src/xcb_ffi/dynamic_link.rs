//               Copyright John Nunley, 2022.
// Distributed under the Boost Software License, Version 1.0.
//       (See accompanying file LICENSE or copy at
//         https://www.boost.org/LICENSE_1_0.txt)

use super::Functions;
use crate::{sync::Lazy, Error, Result};
use alloc::{format, string::String};
use libloading::Library;

const LIBRARY_PATH: &str = "libxcb.so.1";

struct DynamicFfi {
    // keeps the symbols in `funcs` alive
    _library: Library,
    funcs: Functions,
}

impl DynamicFfi {
    fn load() -> core::result::Result<Self, String> {
        let library = unsafe { Library::new(LIBRARY_PATH) }
            .map_err(|err| format!("unable to open {}: {}", LIBRARY_PATH, err))?;

        let funcs = unsafe { load_functions(&library) }?;
        tracing::debug!("loaded {}", LIBRARY_PATH);

        Ok(Self {
            _library: library,
            funcs,
        })
    }
}

macro_rules! symbol {
    ($library:expr, $name:literal) => {
        *$library
            .get(concat!($name, "\0").as_bytes())
            .map_err(|err| format!("could not find symbol {}: {}", $name, err))?
    };
}

unsafe fn load_functions(library: &Library) -> core::result::Result<Functions, String> {
    Ok(Functions {
        connect: symbol!(library, "xcb_connect"),
        connect_with_auth_info: symbol!(library, "xcb_connect_to_display_with_auth_info"),
        connect_to_fd: symbol!(library, "xcb_connect_to_fd"),
        get_file_descriptor: symbol!(library, "xcb_get_file_descriptor"),
        connection_has_error: symbol!(library, "xcb_connection_has_error"),
        disconnect: symbol!(library, "xcb_disconnect"),
        generate_id: symbol!(library, "xcb_generate_id"),
        flush: symbol!(library, "xcb_flush"),
        get_maximum_request_length: symbol!(library, "xcb_get_maximum_request_length"),
        wait_for_event: symbol!(library, "xcb_wait_for_event"),
        poll_for_event: symbol!(library, "xcb_poll_for_event"),
        send_request64: symbol!(library, "xcb_send_request64"),
        wait_for_reply64: symbol!(library, "xcb_wait_for_reply64"),
        poll_for_reply64: symbol!(library, "xcb_poll_for_reply64"),
        discard_reply64: symbol!(library, "xcb_discard_reply64"),
        request_check: symbol!(library, "xcb_request_check"),
    })
}

/// Global object used to make `libxcb` calls, loaded on first use.
static XCB: Lazy<core::result::Result<DynamicFfi, String>> = Lazy::new(DynamicFfi::load);

pub(crate) fn xcb() -> Result<&'static Functions> {
    match &*XCB {
        Ok(ffi) => Ok(&ffi.funcs),
        Err(msg) => Err(Error::Library(msg.clone())),
    }
}

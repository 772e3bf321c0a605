// MIT/Apache2 License

use super::{MockConnection, Packet};
use crate::{
    connection::Fetched,
    error::{ConnectionError, Error, ProtocolError},
    extension_manager::ExtensionInfo,
    proto::{
        xinput,
        xproto::{self, checked, unchecked, GetGeometry, GetInputFocus, Window},
    },
    reply::{Checked, Cookie, Fetch, Unchecked},
    Buffer,
};

fn input_focus(focus: u32, revert_to: u8) -> Fetched {
    Packet::reply().u8(1, revert_to).u32(8, focus).fetched()
}

fn geometry_request() -> GetGeometry {
    GetGeometry {
        drawable: Window(0x0040_0001).into(),
    }
}

#[test]
fn checked_fetch_blocks_once() {
    let conn = MockConnection::new();
    conn.respond(1, input_focus(0x0040_0001, 2));

    let fetch: checked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    assert!(!fetch.is_fetched());
    assert!(conn.waits().is_empty());

    let reply = fetch.get().unwrap();
    assert_eq!(reply.revert_to(), 2);
    assert_eq!(reply.focus::<Window>(), Window(0x0040_0001));
    assert_eq!(reply.focus::<u32>(), 0x0040_0001);

    // cached
    let again = fetch.get().unwrap();
    assert!(again.buffer().ptr_eq(reply.buffer()));
    assert_eq!(conn.waits(), [1]);

    drop(fetch);
    assert!(conn.discarded().is_empty());
}

#[test]
fn checked_error_is_decoded() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Fetched::Error(
            Packet::error(3)
                .u16(2, 1)
                .u32(4, 0x0040_0001)
                .u8(10, 14)
                .generic_error(),
        ),
    );

    let fetch: checked::GetGeometry<'_, MockConnection> =
        Fetch::send(&conn, &geometry_request()).unwrap();

    match fetch.get() {
        Err(Error::Protocol(ProtocolError::Xproto(xproto::Error::Window(err)))) => {
            assert_eq!(err.bad_resource::<Window>(), Window(0x0040_0001));
            assert_eq!(err.major_opcode(), 14);
            assert_eq!(err.sequence(), 1);
        }
        other => panic!("expected a Window error, got {:?}", other),
    }

    // the failure is cached as well
    assert!(fetch.get().is_err());
    assert_eq!(conn.waits(), [1]);
}

#[test]
fn checked_and_unchecked_diverge_on_the_same_error() {
    let conn = MockConnection::new();
    let error = Packet::error(9).u32(4, 0xdead).generic_error();
    conn.respond(1, Fetched::Error(error.clone()));
    conn.respond(2, Fetched::Error(error));

    let checked: checked::GetGeometry<'_, MockConnection> =
        Fetch::send(&conn, &geometry_request()).unwrap();
    let unchecked: unchecked::GetGeometry<'_, MockConnection> =
        Fetch::send(&conn, &geometry_request()).unwrap();

    assert!(matches!(
        checked.get(),
        Err(Error::Protocol(ProtocolError::Xproto(
            xproto::Error::Drawable(_)
        )))
    ));
    assert!(unchecked.is_empty());
    assert!(unchecked.get().is_none());

    let sent = conn.sent();
    assert_eq!(sent[0].opcode, sent[1].opcode);
    assert_eq!(sent[0].body, sent[1].body);
    assert!(sent[0].checked);
    assert!(!sent[1].checked);
}

#[test]
fn unchecked_success_has_a_reply() {
    let conn = MockConnection::new();
    conn.respond(1, input_focus(0x0020_0004, 1));

    let fetch: unchecked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    assert!(!fetch.is_empty());
    assert_eq!(fetch.get().map(|reply| reply.focus::<u32>()), Some(0x0020_0004));
}

#[test]
fn missing_reply_is_an_error_only_when_checked() {
    let conn = MockConnection::new();

    let checked: checked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    assert!(matches!(checked.get(), Err(Error::MissingReply)));

    let unchecked: unchecked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    assert!(unchecked.is_empty());
}

#[test]
fn broken_connection() {
    let conn = MockConnection::new();
    let checked: checked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    let unchecked: unchecked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();

    conn.break_with(ConnectionError::Io);
    assert!(matches!(
        checked.get(),
        Err(Error::Connection(ConnectionError::Io))
    ));
    assert!(unchecked.get().is_none());

    assert!(matches!(
        Fetch::<GetInputFocus, Checked, MockConnection>::send(&conn, &GetInputFocus),
        Err(Error::Connection(ConnectionError::Io))
    ));
}

#[test]
fn short_reply_is_malformed() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Fetched::Reply(Buffer::copy_from_slice(&[1, 0, 1, 0, 0, 0, 0, 0]).unwrap()),
    );

    let fetch: checked::GetGeometry<'_, MockConnection> =
        Fetch::send(&conn, &geometry_request()).unwrap();
    assert!(matches!(
        fetch.get(),
        Err(Error::Malformed { what: "reply", len: 8 })
    ));
}

#[test]
fn unfetched_reply_is_discarded_on_drop() {
    let conn = MockConnection::new();

    let fetch: checked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    drop(fetch);
    assert_eq!(conn.discarded(), [1]);

    let cookie = Cookie::<GetInputFocus, Unchecked>::send(&conn, &GetInputFocus).unwrap();
    assert_eq!(cookie.sequence(), 2);
    cookie.discard(&conn);
    assert_eq!(conn.discarded(), [1, 2]);
    assert!(conn.waits().is_empty());
}

#[test]
fn lazy_and_eager_construction() {
    let conn = MockConnection::new();
    conn.respond(1, input_focus(1, 0));
    conn.respond(2, input_focus(2, 0));

    let cookie = Cookie::<GetInputFocus, Checked>::send(&conn, &GetInputFocus).unwrap();
    let lazy = Fetch::new(&conn, cookie);
    assert!(!lazy.is_fetched());

    let cookie = Cookie::<GetInputFocus, Checked>::send(&conn, &GetInputFocus).unwrap();
    let eager = Fetch::now(&conn, cookie);
    assert!(eager.is_fetched());
    assert_eq!(conn.waits(), [2]);

    assert_eq!(lazy.get().unwrap().focus::<u32>(), 1);
    assert_eq!(eager.get().unwrap().focus::<u32>(), 2);
    assert_eq!(conn.waits(), [2, 1]);
}

#[test]
fn polling_fills_the_cache() {
    let conn = MockConnection::new();
    conn.respond(1, input_focus(7, 0));
    conn.delay(1);

    let fetch: checked::GetInputFocus<'_, MockConnection> =
        Fetch::send(&conn, &GetInputFocus).unwrap();
    assert!(!fetch.poll().unwrap());
    assert!(!fetch.is_fetched());

    conn.release(1);
    assert!(fetch.poll().unwrap());
    assert!(fetch.poll().unwrap());
    assert_eq!(conn.polls(), [1, 1]);

    assert_eq!(fetch.get().unwrap().focus::<u32>(), 7);
    assert!(conn.waits().is_empty());
}

#[test]
fn extension_errors_are_routed_through_the_extension_table() {
    let conn = MockConnection::new();
    conn.add_extension(
        xinput::NAME,
        ExtensionInfo {
            major_opcode: 131,
            first_event: 66,
            first_error: 129,
        },
    );

    conn.respond(1, Fetched::Error(Packet::error(129 + 3).generic_error()));
    conn.respond(2, Fetched::Error(Packet::error(2).generic_error()));
    conn.respond(3, Fetched::Error(Packet::error(200).generic_error()));

    let busy: xinput::checked::ListInputDevices<'_, MockConnection> =
        Fetch::send(&conn, &xinput::ListInputDevices).unwrap();
    let value: xinput::checked::ListInputDevices<'_, MockConnection> =
        Fetch::send(&conn, &xinput::ListInputDevices).unwrap();
    let unknown: xinput::checked::ListInputDevices<'_, MockConnection> =
        Fetch::send(&conn, &xinput::ListInputDevices).unwrap();

    assert!(matches!(
        busy.get(),
        Err(Error::Protocol(ProtocolError::Xinput(
            xinput::Error::DeviceBusy(_)
        )))
    ));
    assert!(matches!(
        value.get(),
        Err(Error::Protocol(ProtocolError::Xproto(xproto::Error::Value(_))))
    ));
    match unknown.get() {
        Err(Error::Protocol(ProtocolError::Unknown(err))) => assert_eq!(err.error_code(), 200),
        other => panic!("expected an unknown error, got {:?}", other),
    }

    let sent = conn.last_sent();
    assert_eq!(sent.extension, Some(xinput::NAME));
    assert_eq!(sent.opcode, 2);
}

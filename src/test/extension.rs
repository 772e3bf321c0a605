// MIT/Apache2 License

use super::{MockConnection, Packet};
use crate::{
    connection::Fetched,
    error::{ConnectionError, Error},
    extension_manager::{ExtensionInfo, ExtensionManager},
    proto::xinput,
};
use alloc::vec::Vec;

const XKB: &str = "XKEYBOARD";
const MISSING: &str = "NOT-AN-EXTENSION";

/// A server that knows XInput and XKEYBOARD and nothing else.
fn server() -> MockConnection {
    let conn = MockConnection::new();
    conn.answer(98, |req| {
        let len = u16::from_ne_bytes([req.body[0], req.body[1]]) as usize;
        let (major, first_event, first_error) = match &req.body[4..4 + len] {
            b"XInputExtension" => (131, 66, 129),
            b"XKEYBOARD" => (135, 85, 137),
            _ => return Packet::reply().fetched(),
        };

        Packet::reply()
            .u8(8, 1)
            .u8(9, major)
            .u8(10, first_event)
            .u8(11, first_error)
            .fetched()
    });
    conn
}

fn queries(conn: &MockConnection) -> usize {
    conn.sent().iter().filter(|req| req.opcode == 98).count()
}

#[test]
fn present_extension_is_asked_about_once() {
    let conn = server();
    let manager = ExtensionManager::new();

    let info = manager.extension(&conn, xinput::NAME).unwrap();
    assert_eq!(
        info,
        Some(ExtensionInfo {
            major_opcode: 131,
            first_event: 66,
            first_error: 129,
        })
    );
    assert_eq!(manager.extension(&conn, xinput::NAME).unwrap(), info);
    assert_eq!(queries(&conn), 1);

    let sent = conn.last_sent();
    assert!(sent.checked);
    assert_eq!(&sent.body[4..], xinput::NAME.as_bytes());
}

#[test]
fn absent_extension_is_cached_too() {
    let conn = server();
    let manager = ExtensionManager::new();

    assert_eq!(manager.extension(&conn, MISSING).unwrap(), None);
    assert_eq!(manager.extension(&conn, MISSING).unwrap(), None);
    assert_eq!(queries(&conn), 1);
}

#[test]
fn reverse_lookups_only_see_cached_entries() {
    let conn = server();
    let manager = ExtensionManager::new();

    assert_eq!(manager.by_major_opcode(131), None);

    manager.extension(&conn, xinput::NAME).unwrap();
    manager.extension(&conn, XKB).unwrap();
    manager.extension(&conn, MISSING).unwrap();

    assert_eq!(manager.by_major_opcode(131).map(|(name, _)| name), Some(xinput::NAME));
    assert_eq!(manager.by_first_event(85).map(|(name, _)| name), Some(XKB));
    assert_eq!(
        manager.by_first_error(137).map(|(_, info)| info.major_opcode),
        Some(135)
    );

    // only exact block starts match
    assert_eq!(manager.by_first_event(67), None);
    assert_eq!(manager.by_first_error(0), None);
    assert_eq!(manager.by_major_opcode(98), None);
}

#[test]
fn failed_queries_are_not_cached() {
    let conn = MockConnection::new();
    let manager = ExtensionManager::new();

    conn.break_with(ConnectionError::Io);
    assert!(matches!(
        manager.extension(&conn, XKB),
        Err(Error::Connection(ConnectionError::Io))
    ));

    // the server never answered, so nothing is remembered
    let conn = MockConnection::new();
    assert!(matches!(
        manager.extension(&conn, XKB),
        Err(Error::MissingReply)
    ));
    conn.respond(
        2,
        Packet::reply().u8(8, 1).u8(9, 135).u8(10, 85).u8(11, 137).fetched(),
    );
    assert_eq!(
        manager.extension(&conn, XKB).unwrap().map(|info| info.first_event),
        Some(85)
    );

    let opcodes: Vec<u8> = conn.sent().iter().map(|req| req.opcode).collect();
    assert_eq!(opcodes, [98, 98]);
}

#[test]
fn error_replies_surface_as_errors() {
    let conn = MockConnection::new();
    let manager = ExtensionManager::new();
    conn.respond(1, Fetched::Error(Packet::error(11).generic_error()));

    assert!(matches!(
        manager.extension(&conn, XKB),
        Err(Error::Protocol(_))
    ));
}

// MIT/Apache2 License

use super::{MockConnection, Packet};
use crate::{
    connection::Fetched,
    error::Error,
    extension_manager::ExtensionInfo,
    factory::Bound,
    iter::Cursor,
    proto::xproto::{
        checked, unchecked, Atom, GetAtomName, GetProperty, InternAtom, ListExtensions,
        ListFonts, QueryExtension, QueryTree, Window,
    },
    reply::Fetch,
};
use alloc::{string::String, vec::Vec};

fn query_tree_reply(root: u32, parent: u32, children: &[u32]) -> Fetched {
    let mut packet = Packet::reply()
        .u32(8, root)
        .u32(12, parent)
        .u16(16, children.len() as u16);
    for child in children {
        packet = packet.append(&child.to_ne_bytes());
    }
    packet.fetched()
}

#[test]
fn intern_atom() {
    let conn = MockConnection::new();
    conn.respond(1, Packet::reply().u32(8, 321).fetched());

    let fetch: checked::InternAtom<'_, MockConnection> = Fetch::send(
        &conn,
        &InternAtom {
            only_if_exists: true,
            name: "_NET_WM_NAME".into(),
        },
    )
    .unwrap();
    assert_eq!(fetch.get().unwrap().atom::<Atom>(), Atom(321));

    let sent = conn.last_sent();
    assert_eq!(sent.opcode, 16);
    assert_eq!(sent.data, 1);
    assert!(sent.has_reply);
    assert_eq!(&sent.body[..2], &12u16.to_ne_bytes());
    assert_eq!(&sent.body[4..], b"_NET_WM_NAME");
}

#[test]
fn names_longer_than_their_length_field_are_refused() {
    let conn = MockConnection::new();
    let long = "a".repeat(70_000);

    let interned: crate::Result<checked::InternAtom<'_, MockConnection>> = Fetch::send(
        &conn,
        &InternAtom {
            only_if_exists: false,
            name: long.clone(),
        },
    );
    assert!(matches!(
        interned,
        Err(Error::FieldTooLong {
            what: "name",
            len: 70_000,
            ..
        })
    ));

    let fonts: crate::Result<checked::ListFonts<'_, MockConnection>> = Fetch::send(
        &conn,
        &ListFonts {
            max_names: 1,
            pattern: long,
        },
    );
    assert!(matches!(
        fonts,
        Err(Error::FieldTooLong { what: "pattern", .. })
    ));
    assert!(conn.sent().is_empty());

    // the longest name that still fits is sent as is
    let longest = "b".repeat(u16::MAX as usize);
    let _fetch: checked::InternAtom<'_, MockConnection> = Fetch::send(
        &conn,
        &InternAtom {
            only_if_exists: true,
            name: longest,
        },
    )
    .unwrap();
    let sent = conn.last_sent();
    assert_eq!(&sent.body[..2], &u16::MAX.to_ne_bytes());
    assert_eq!(sent.body.len(), 4 + u16::MAX as usize);
}

#[test]
fn atom_name() {
    let conn = MockConnection::new();
    conn.respond(1, Packet::reply().u16(8, 7).append(b"WM_NAME").fetched());

    let atom = Bound::new(Atom::WM_NAME, &conn);
    let fetch = atom.name().unwrap();
    let reply = fetch.get().unwrap();
    assert_eq!(reply.name_bytes(), b"WM_NAME");
    assert_eq!(reply.name(), "WM_NAME");

    let sent = conn.last_sent();
    assert_eq!(sent.opcode, 17);
    assert_eq!(sent.body, 39u32.to_ne_bytes());

    // a lying length never reads past the reply
    conn.respond(2, Packet::reply().u16(8, 200).append(b"abc").fetched());
    let fetch: checked::GetAtomName<'_, MockConnection> =
        Fetch::send(&conn, &GetAtomName { atom: Atom(1) }).unwrap();
    assert_eq!(fetch.get().unwrap().name_bytes(), b"abc\0");
}

#[test]
fn geometry_fields_and_bound_root() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Packet::reply()
            .u8(1, 24)
            .u32(8, 0x0000_0100)
            .i16(12, -10)
            .i16(14, 20)
            .u16(16, 800)
            .u16(18, 600)
            .u16(20, 2)
            .fetched(),
    );
    conn.respond(2, query_tree_reply(0x100, 0, &[0x0040_0001]));

    let window = Bound::new(Window(0x0040_0001), &conn);
    let geometry = window.geometry().unwrap();
    let reply = geometry.get().unwrap();

    assert_eq!(reply.depth(), 24);
    assert_eq!((reply.x(), reply.y()), (-10, 20));
    assert_eq!((reply.width(), reply.height()), (800, 600));
    assert_eq!(reply.border_width(), 2);

    // the root comes back bound to the same connection
    let root: Bound<'_, Window, MockConnection> = reply.root();
    assert_eq!(root.resource(), Window(0x100));
    assert!(core::ptr::eq(root.connection(), &conn));

    let tree = root.query_tree().unwrap();
    let children: Vec<Window> = tree.get().unwrap().children::<Window>().iter().collect();
    assert_eq!(children, [Window(0x0040_0001)]);

    let sent = conn.sent();
    assert_eq!(sent[1].opcode, 15);
    assert_eq!(sent[1].body, 0x100u32.to_ne_bytes());
}

#[test]
fn query_tree_children() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        query_tree_reply(0x100, 0x200, &[0x0040_0001, 0x0040_0002, 0x0060_0001]),
    );

    let fetch: checked::QueryTree<'_, MockConnection> = Fetch::send(
        &conn,
        &QueryTree {
            window: Window(0x200),
        },
    )
    .unwrap();
    let reply = fetch.get().unwrap();

    assert_eq!(reply.root::<u32>(), 0x100);
    assert_eq!(reply.parent::<Window>(), Window(0x200));

    let children = reply.children::<u32>();
    assert_eq!(children.len(), 3);
    assert_eq!(
        children.iter().collect::<Vec<_>>(),
        [0x0040_0001, 0x0040_0002, 0x0060_0001]
    );
    assert_eq!(
        children.iter().rev().collect::<Vec<_>>(),
        [0x0060_0001, 0x0040_0002, 0x0040_0001]
    );

    // index walk from begin to end takes exactly len steps
    let mut cursor = children.begin();
    let end = children.end();
    assert_eq!((cursor.index(), end.index()), (0, 3));
    let mut steps = 0;
    while cursor != end {
        assert!(cursor.advance());
        steps += 1;
    }
    assert_eq!(steps, 3);

    let bound: Vec<_> = reply
        .children::<Bound<'_, Window, MockConnection>>()
        .iter()
        .collect();
    assert!(bound.iter().all(|child| core::ptr::eq(child.connection(), &conn)));
    assert_eq!(bound[2].xid(), 0x0060_0001);
}

#[test]
fn list_views_outlive_the_fetch_borrow() {
    let conn = MockConnection::new();
    conn.respond(1, query_tree_reply(1, 0, &[5, 6]));

    let fetch: checked::QueryTree<'_, MockConnection> =
        Fetch::send(&conn, &QueryTree { window: Window(1) }).unwrap();
    let children = fetch.get().unwrap().children::<u32>();
    let copy = children.clone();
    drop(fetch);

    assert_eq!(children.iter().chain(copy.iter()).collect::<Vec<_>>(), [5, 6, 5, 6]);
}

#[test]
fn property_value_follows_format() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Packet::reply()
            .u8(1, 32)
            .u32(8, Atom::CARDINAL.0)
            .u32(12, 4)
            .u32(16, 3)
            .append(&7u32.to_ne_bytes())
            .append(&8u32.to_ne_bytes())
            .append(&9u32.to_ne_bytes())
            .fetched(),
    );

    let window = Bound::new(Window(0x0040_0001), &conn);
    let fetch = window.property(Atom(250), 3).unwrap();
    let reply = fetch.get().unwrap();

    assert_eq!(reply.format(), 32);
    assert_eq!(reply.type_::<Atom>(), Atom::CARDINAL);
    assert_eq!(reply.bytes_after(), 4);
    assert_eq!(reply.value_len(), 3);
    assert_eq!(reply.value::<u32>().iter().collect::<Vec<_>>(), [7, 8, 9]);
    assert_eq!(
        reply.value::<Atom>().iter().collect::<Vec<_>>(),
        [Atom(7), Atom(8), Atom(9)]
    );

    // asking for the wrong unit size yields nothing rather than garbage
    assert!(reply.value::<u8>().is_empty());
    assert!(reply.value::<u16>().is_empty());

    let sent = conn.last_sent();
    assert_eq!(sent.opcode, 20);
    assert_eq!(sent.data, 0);
    assert_eq!(sent.body.len(), 20);
}

#[test]
fn property_of_bytes() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Packet::reply()
            .u8(1, 8)
            .u32(8, Atom::STRING.0)
            .u32(16, 5)
            .append(b"hello")
            .fetched(),
    );

    let fetch: unchecked::GetProperty<'_, MockConnection> = Fetch::send(
        &conn,
        &GetProperty {
            delete: true,
            window: Window(1),
            property: Atom::WM_NAME,
            type_: Atom::STRING,
            long_offset: 0,
            long_length: 16,
        },
    )
    .unwrap();

    let value: Vec<u8> = fetch.get().unwrap().value::<u8>().iter().collect();
    assert_eq!(value, b"hello");
    assert_eq!(conn.last_sent().data, 1);
}

#[test]
fn font_names() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Packet::reply()
            .u16(8, 3)
            .append_str("fixed")
            .append_str("")
            .append_str("-misc-fixed-medium-r-normal--13-120-75-75-c-70-iso8859-1")
            .fetched(),
    );

    let fetch: checked::ListFonts<'_, MockConnection> = Fetch::send(
        &conn,
        &ListFonts {
            max_names: 10,
            pattern: "*".into(),
        },
    )
    .unwrap();
    let names = fetch.get().unwrap().names();

    assert_eq!(names.len(), 3);
    assert_eq!(
        names.iter().collect::<Vec<String>>(),
        [
            "fixed",
            "",
            "-misc-fixed-medium-r-normal--13-120-75-75-c-70-iso8859-1"
        ]
    );

    // a cursor can walk back over variable-size records
    let mut cursor = names.begin();
    cursor.advance();
    cursor.advance();
    assert!(cursor.retreat());
    assert_eq!(cursor.get().as_deref(), Some(""));
    assert!(cursor.retreat());
    assert_eq!(cursor.get().as_deref(), Some("fixed"));
    assert!(!cursor.retreat());

    let sent = conn.last_sent();
    assert_eq!(sent.opcode, 49);
    assert_eq!(&sent.body[..2], &10u16.to_ne_bytes());
    assert_eq!(&sent.body[4..], b"*");
}

#[test]
fn extension_names() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Packet::reply()
            .u8(1, 2)
            .append_str("BIG-REQUESTS")
            .append_str("XInputExtension")
            .fetched(),
    );

    let fetch: checked::ListExtensions<'_, MockConnection> =
        Fetch::send(&conn, &ListExtensions).unwrap();
    let names: Vec<String> = fetch.get().unwrap().names().into_iter().collect();
    assert_eq!(names, ["BIG-REQUESTS", "XInputExtension"]);
}

#[test]
fn query_extension_reply() {
    let conn = MockConnection::new();
    conn.respond(
        1,
        Packet::reply()
            .u8(8, 1)
            .u8(9, 131)
            .u8(10, 66)
            .u8(11, 129)
            .fetched(),
    );
    conn.respond(2, Packet::reply().fetched());

    let present: checked::QueryExtension<'_, MockConnection> = Fetch::send(
        &conn,
        &QueryExtension {
            name: "XInputExtension".into(),
        },
    )
    .unwrap();
    let absent: checked::QueryExtension<'_, MockConnection> = Fetch::send(
        &conn,
        &QueryExtension {
            name: "NOT-AN-EXTENSION".into(),
        },
    )
    .unwrap();

    assert_eq!(
        present.get().unwrap().info(),
        Some(ExtensionInfo {
            major_opcode: 131,
            first_event: 66,
            first_error: 129,
        })
    );
    assert!(!absent.get().unwrap().present());
    assert_eq!(absent.get().unwrap().info(), None);
}

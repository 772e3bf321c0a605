// MIT/Apache2 License

//! Turning wire values into the types callers ask for.
//!
//! Every field accessor in this crate is generic over its return type and
//! produces it through [`FromWire`]. Most fields are returned as-is, but a
//! resource id can come back as its plain integer, as its typed id, or as a
//! [`Bound`] handle that remembers which connection it lives on. The caller
//! picks by naming the type:
//!
//! ```ignore
//! let root: Window = geometry.root();
//! let raw: u32 = geometry.root();
//! let handle: Bound<'_, Window, _> = geometry.root();
//! ```

use core::fmt;

/// Build `Self` from a wire value `W` read over connection `C`.
pub trait FromWire<'c, W, C: ?Sized>: Sized {
    fn from_wire(wire: W, conn: &'c C) -> Self;
}

impl<'c, W, C: ?Sized> FromWire<'c, W, C> for W {
    fn from_wire(wire: W, _conn: &'c C) -> Self {
        wire
    }
}

/// A server-side resource identified by an XID.
pub trait Resource: Copy + Eq + fmt::Debug {
    /// The resource kind, for diagnostics.
    const KIND: &'static str;

    fn from_xid(xid: u32) -> Self;
    fn xid(self) -> u32;

    /// Whether this is the `None` resource.
    fn is_none(self) -> bool {
        self.xid() == 0
    }
}

/// A resource together with the connection it belongs to.
pub struct Bound<'c, R, C: ?Sized> {
    resource: R,
    conn: &'c C,
}

impl<'c, R: Resource, C: ?Sized> Bound<'c, R, C> {
    pub fn new(resource: R, conn: &'c C) -> Self {
        Self { resource, conn }
    }

    pub fn resource(&self) -> R {
        self.resource
    }

    pub fn xid(&self) -> u32 {
        self.resource.xid()
    }

    pub fn connection(&self) -> &'c C {
        self.conn
    }
}

impl<R: Copy, C: ?Sized> Clone for Bound<'_, R, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Copy, C: ?Sized> Copy for Bound<'_, R, C> {}

impl<R: Resource, C: ?Sized> fmt::Debug for Bound<'_, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bound<{}>({:#x})", R::KIND, self.resource.xid())
    }
}

impl<R: Resource, C: ?Sized> PartialEq for Bound<'_, R, C> {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource && core::ptr::eq(self.conn, other.conn)
    }
}

/// Declare XID newtypes and their conversions.
macro_rules! resources {
    ($($(#[$meta:meta])* $name:ident = $kind:literal;)*) => {
        $(
            $(#[$meta])*
            #[repr(transparent)]
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);

            impl $name {
                /// The `None` resource.
                pub const NONE: Self = Self(0);
            }

            unsafe impl $crate::buffer::RawStruct for $name {}

            impl $crate::factory::Resource for $name {
                const KIND: &'static str = $kind;

                fn from_xid(xid: u32) -> Self {
                    Self(xid)
                }

                fn xid(self) -> u32 {
                    self.0
                }
            }

            impl From<$name> for u32 {
                fn from(resource: $name) -> u32 {
                    resource.0
                }
            }

            impl<'c, C: ?Sized> $crate::factory::FromWire<'c, $name, C> for u32 {
                fn from_wire(wire: $name, _conn: &'c C) -> u32 {
                    wire.0
                }
            }

            impl<'c, C: ?Sized> $crate::factory::FromWire<'c, $name, C>
                for $crate::factory::Bound<'c, $name, C>
            {
                fn from_wire(wire: $name, conn: &'c C) -> Self {
                    $crate::factory::Bound::new(wire, conn)
                }
            }
        )*
    };
}

// MIT/Apache2 License

//! Declaration macros for protocol events and errors.
//!
//! Events are declared as a wire layout followed by the names and opcodes
//! that share it:
//!
//! ```ignore
//! events! {
//!     KeyPress = 2, KeyRelease = 3 => KeyPressRaw {
//!         response_type: u8,
//!         #[get] detail: u8,
//!         sequence: u16,
//!         #[wire] root: Window,
//!     }
//! }
//! ```
//!
//! Fields marked `#[get]` get a plain accessor, fields marked `#[wire]` get
//! an accessor generic over [`FromWire`](crate::factory::FromWire), and
//! unmarked fields are only part of the layout.

/// Declare the events of one protocol, its `Event` enum and the
/// `decode_event` lookup used by its dispatcher.
macro_rules! events {
    ($(
        $($(#[$meta:meta])* $name:ident = $opcode:literal),+ => $raw:ident $fields:tt
    )*) => {
        $(
            event_layout!($raw $fields);
            $(
                typed_event!($(#[$meta])* $name = $opcode, $raw $fields);
            )+
        )*

        /// Any event of this protocol.
        #[non_exhaustive]
        pub enum Event<'c, C: ?Sized> {
            $($(
                $name($name<'c, C>),
            )+)*
        }

        impl<'c, C: ?Sized> Event<'c, C> {
            /// The packet the event was decoded from.
            pub fn generic(&self) -> &$crate::buffer::GenericEvent {
                match self {
                    $($(
                        Self::$name(event) => $crate::event::TypedEvent::generic(event),
                    )+)*
                }
            }

            /// The opcode, relative to the protocol's first event.
            pub fn opcode(&self) -> u8 {
                match self {
                    $($(
                        Self::$name(_) => $opcode,
                    )+)*
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $($(
                        Self::$name(_) => stringify!($name),
                    )+)*
                }
            }

            /// Whether this event was synthesized with `SendEvent`.
            pub fn is_sent(&self) -> bool {
                self.generic().is_sent()
            }
        }

        impl<C: ?Sized> Clone for Event<'_, C> {
            fn clone(&self) -> Self {
                match self {
                    $($(
                        Self::$name(event) => Self::$name(event.clone()),
                    )+)*
                }
            }
        }

        impl<C: ?Sized> core::fmt::Debug for Event<'_, C> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $($(
                        Self::$name(event) => core::fmt::Debug::fmt(event, f),
                    )+)*
                }
            }
        }

        /// Decode `event` given its opcode relative to the first event.
        pub(crate) fn decode_event<'c, C: ?Sized>(
            opcode: u8,
            event: &$crate::buffer::GenericEvent,
            conn: &'c C,
        ) -> Option<Event<'c, C>> {
            use $crate::event::TypedEvent;

            match opcode {
                $($(
                    $opcode => $name::from_generic(event.clone(), conn).map(Event::$name),
                )+)*
                _ => None,
            }
        }
    };
}

macro_rules! event_layout {
    ($raw:ident {
        $($(#[$kind:ident])? $field:ident : $fty:ty),* $(,)?
    }) => {
        #[doc(hidden)]
        #[allow(dead_code)]
        #[repr(C)]
        #[derive(Clone, Copy, Debug)]
        pub(crate) struct $raw {
            $(pub(crate) $field: $fty,)*
        }

        unsafe impl $crate::buffer::RawStruct for $raw {}
    };
}

macro_rules! typed_event {
    ($(#[$meta:meta])* $name:ident = $opcode:literal, $raw:ident {
        $($(#[$kind:ident])? $field:ident : $fty:ty),* $(,)?
    }) => {
        $(#[$meta])*
        pub struct $name<'c, C: ?Sized> {
            event: $crate::buffer::GenericEvent,
            conn: &'c C,
        }

        impl<'c, C: ?Sized> $name<'c, C> {
            fn raw(&self) -> $raw {
                self.event.buffer().view()
            }

            pub fn connection(&self) -> &'c C {
                self.conn
            }

            $(
                field_accessor!($($kind)?; 'c, C; $field: $fty);
            )*
        }

        impl<'c, C: ?Sized> $crate::event::TypedEvent<'c, C> for $name<'c, C> {
            const OPCODE: u8 = $opcode;
            const DESCRIPTION: &'static str = stringify!($name);

            fn from_generic(event: $crate::buffer::GenericEvent, conn: &'c C) -> Option<Self> {
                if !event.buffer().fits::<$raw>() {
                    return None;
                }

                Some(Self { event, conn })
            }

            fn generic(&self) -> &$crate::buffer::GenericEvent {
                &self.event
            }
        }

        impl<C: ?Sized> Clone for $name<'_, C> {
            fn clone(&self) -> Self {
                Self {
                    event: self.event.clone(),
                    conn: self.conn,
                }
            }
        }

        impl<C: ?Sized> core::fmt::Debug for $name<'_, C> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("sent", &self.event.is_sent())
                    .field("raw", &self.raw())
                    .finish()
            }
        }
    };
}

macro_rules! field_accessor {
    (; $lt:lifetime, $conn:ident; $field:ident : $fty:ty) => {};
    (get; $lt:lifetime, $conn:ident; $field:ident : $fty:ty) => {
        pub fn $field(&self) -> $fty {
            self.raw().$field
        }
    };
    (wire; $lt:lifetime, $conn:ident; $field:ident : $fty:ty) => {
        pub fn $field<T: $crate::factory::FromWire<$lt, $fty, $conn>>(&self) -> T {
            T::from_wire(self.raw().$field, self.conn)
        }
    };
}

/// Declare the errors of one protocol, its `Error` enum and the
/// `decode_error` lookup used by its dispatcher.
///
/// Every X error shares the same 32-byte layout, so only the enum variant,
/// the struct name and the code are given.
macro_rules! errors {
    ($($(#[$meta:meta])* $variant:ident($name:ident) = $code:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug)]
            pub struct $name {
                error: $crate::buffer::GenericError,
            }

            impl $name {
                /// The offending value: a resource id, atom or out of range
                /// integer, depending on the error.
                pub fn bad_value(&self) -> u32 {
                    self.error.resource_id()
                }

                /// The offending value as a resource of kind `R`.
                pub fn bad_resource<R: $crate::factory::Resource>(&self) -> R {
                    R::from_xid(self.error.resource_id())
                }

                pub fn major_opcode(&self) -> u8 {
                    self.error.major_code()
                }

                pub fn minor_opcode(&self) -> u16 {
                    self.error.minor_code()
                }

                pub fn sequence(&self) -> u16 {
                    self.error.sequence()
                }
            }

            impl $crate::event::TypedError for $name {
                const CODE: u8 = $code;
                const DESCRIPTION: &'static str = stringify!($variant);

                fn from_generic(error: $crate::buffer::GenericError) -> Self {
                    Self { error }
                }

                fn generic(&self) -> &$crate::buffer::GenericError {
                    &self.error
                }
            }

            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    write!(
                        f,
                        "{} error (bad value {:#x}, request {}.{}, sequence {})",
                        stringify!($variant),
                        self.bad_value(),
                        self.major_opcode(),
                        self.minor_opcode(),
                        self.sequence(),
                    )
                }
            }

            impl core::error::Error for $name {}
        )*

        /// Any error of this protocol.
        #[derive(Clone, Debug)]
        #[non_exhaustive]
        pub enum Error {
            $($variant($name),)*
        }

        impl Error {
            /// The packet the error was decoded from.
            pub fn generic(&self) -> &$crate::buffer::GenericError {
                match self {
                    $(Self::$variant(error) => $crate::event::TypedError::generic(error),)*
                }
            }

            /// The code, relative to the protocol's first error.
            pub fn code(&self) -> u8 {
                match self {
                    $(Self::$variant(_) => $code,)*
                }
            }
        }

        impl core::fmt::Display for Error {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $(Self::$variant(error) => core::fmt::Display::fmt(error, f),)*
                }
            }
        }

        impl core::error::Error for Error {}

        /// Decode `error` given its code relative to the first error.
        pub(crate) fn decode_error(code: u8, error: &$crate::buffer::GenericError) -> Option<Error> {
            use $crate::event::TypedError;

            match code {
                $($code => Some(Error::$variant($name::from_generic(error.clone()))),)*
                _ => None,
            }
        }
    };
}

/// Mark events and errors as belonging to an extension.
macro_rules! extension_members {
    (events: $($event:ident),* ; errors: $($error:ident),* $(;)?) => {
        $(
            impl<'c, C: ?Sized> $crate::event::ExtensionEvent<'c, C> for $event<'c, C> {}
        )*
        $(
            impl $crate::event::ExtensionError for $error {}
        )*
    };
}

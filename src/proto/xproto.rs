// MIT/Apache2 License

//! The core X11 protocol.

use crate::{
    buffer::{GenericError, GenericEvent, RawStruct},
    connection::RawConnection,
    dispatch::{DispatchError, DispatchEvent, Protocol},
    error::ProtocolError,
    extension_manager::ExtensionInfo,
    factory::{Bound, FromWire},
    iter::{str_decode, str_size_of, Chained, ChainedList, Strided, StridedList},
    reply::{Checked, Fetch, Reply, ReplyRequest},
    request::{request_checked, Put, Request, VoidCookie, VoidRequest},
    Result,
};
use alloc::{string::String, vec::Vec};
use core::{marker::PhantomData, mem};

resources! {
    Window = "Window";
    Pixmap = "Pixmap";
    Cursor = "Cursor";
    Font = "Font";
    GContext = "GContext";
    Colormap = "Colormap";
    /// A window or a pixmap.
    Drawable = "Drawable";
    Atom = "Atom";
}

impl From<Window> for Drawable {
    fn from(window: Window) -> Self {
        Drawable(window.0)
    }
}

impl From<Pixmap> for Drawable {
    fn from(pixmap: Pixmap) -> Self {
        Drawable(pixmap.0)
    }
}

impl Atom {
    pub const PRIMARY: Atom = Atom(1);
    pub const ATOM: Atom = Atom(4);
    pub const CARDINAL: Atom = Atom(6);
    pub const STRING: Atom = Atom(31);
    pub const WINDOW: Atom = Atom(33);
    pub const WM_NAME: Atom = Atom(39);
}

/// The core protocol.
#[derive(Debug)]
pub enum Xproto {}

impl Protocol for Xproto {
    const EXTENSION: Option<&'static str> = None;

    type Errors = ErrorDispatcher;

    fn errors(_info: Option<&ExtensionInfo>) -> ErrorDispatcher {
        ErrorDispatcher::new()
    }
}

// events

events! {
    /// A key was pressed.
    KeyPress = 2,
    /// A key was released.
    KeyRelease = 3,
    /// A pointer button was pressed.
    ButtonPress = 4,
    /// A pointer button was released.
    ButtonRelease = 5,
    /// The pointer moved.
    MotionNotify = 6 => KeyPressRaw {
        response_type: u8,
        #[get] detail: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] root: Window,
        #[wire] event: Window,
        #[wire] child: Window,
        #[get] root_x: i16,
        #[get] root_y: i16,
        #[get] event_x: i16,
        #[get] event_y: i16,
        #[get] state: u16,
        #[get] same_screen: u8,
        pad0: u8,
    }

    EnterNotify = 7, LeaveNotify = 8 => EnterNotifyRaw {
        response_type: u8,
        #[get] detail: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] root: Window,
        #[wire] event: Window,
        #[wire] child: Window,
        #[get] root_x: i16,
        #[get] root_y: i16,
        #[get] event_x: i16,
        #[get] event_y: i16,
        #[get] state: u16,
        #[get] mode: u8,
        #[get] same_screen_focus: u8,
    }

    FocusIn = 9, FocusOut = 10 => FocusInRaw {
        response_type: u8,
        #[get] detail: u8,
        sequence: u16,
        #[wire] event: Window,
        #[get] mode: u8,
        pad0: [u8; 3],
    }

    KeymapNotify = 11 => KeymapNotifyRaw {
        response_type: u8,
        #[get] keys: [u8; 31],
    }

    /// Part of a window needs to be redrawn.
    Expose = 12 => ExposeRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] window: Window,
        #[get] x: u16,
        #[get] y: u16,
        #[get] width: u16,
        #[get] height: u16,
        #[get] count: u16,
        pad1: [u8; 2],
    }

    GraphicsExposure = 13 => GraphicsExposureRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] drawable: Drawable,
        #[get] x: u16,
        #[get] y: u16,
        #[get] width: u16,
        #[get] height: u16,
        #[get] minor_opcode: u16,
        #[get] count: u16,
        #[get] major_opcode: u8,
        pad1: [u8; 3],
    }

    NoExposure = 14 => NoExposureRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] drawable: Drawable,
        #[get] minor_opcode: u16,
        #[get] major_opcode: u8,
        pad1: u8,
    }

    VisibilityNotify = 15 => VisibilityNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] window: Window,
        #[get] state: u8,
        pad1: [u8; 3],
    }

    CreateNotify = 16 => CreateNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] parent: Window,
        #[wire] window: Window,
        #[get] x: i16,
        #[get] y: i16,
        #[get] width: u16,
        #[get] height: u16,
        #[get] border_width: u16,
        #[get] override_redirect: u8,
        pad1: u8,
    }

    DestroyNotify = 17 => DestroyNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
    }

    UnmapNotify = 18 => UnmapNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
        #[get] from_configure: u8,
        pad1: [u8; 3],
    }

    MapNotify = 19 => MapNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
        #[get] override_redirect: u8,
        pad1: [u8; 3],
    }

    MapRequest = 20 => MapRequestRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] parent: Window,
        #[wire] window: Window,
    }

    ReparentNotify = 21 => ReparentNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
        #[wire] parent: Window,
        #[get] x: i16,
        #[get] y: i16,
        #[get] override_redirect: u8,
        pad1: [u8; 3],
    }

    ConfigureNotify = 22 => ConfigureNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
        #[wire] above_sibling: Window,
        #[get] x: i16,
        #[get] y: i16,
        #[get] width: u16,
        #[get] height: u16,
        #[get] border_width: u16,
        #[get] override_redirect: u8,
        pad1: u8,
    }

    ConfigureRequest = 23 => ConfigureRequestRaw {
        response_type: u8,
        #[get] stack_mode: u8,
        sequence: u16,
        #[wire] parent: Window,
        #[wire] window: Window,
        #[wire] sibling: Window,
        #[get] x: i16,
        #[get] y: i16,
        #[get] width: u16,
        #[get] height: u16,
        #[get] border_width: u16,
        #[get] value_mask: u16,
    }

    GravityNotify = 24 => GravityNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
        #[get] x: i16,
        #[get] y: i16,
    }

    ResizeRequest = 25 => ResizeRequestRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] window: Window,
        #[get] width: u16,
        #[get] height: u16,
    }

    CirculateNotify = 26, CirculateRequest = 27 => CirculateNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] event: Window,
        #[wire] window: Window,
        pad1: [u8; 4],
        #[get] place: u8,
        pad2: [u8; 3],
    }

    /// A window property changed or was deleted.
    PropertyNotify = 28 => PropertyNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] window: Window,
        #[wire] atom: Atom,
        #[get] time: u32,
        #[get] state: u8,
        pad1: [u8; 3],
    }

    SelectionClear = 29 => SelectionClearRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] owner: Window,
        #[wire] selection: Atom,
    }

    SelectionRequest = 30 => SelectionRequestRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] owner: Window,
        #[wire] requestor: Window,
        #[wire] selection: Atom,
        #[wire] target: Atom,
        #[wire] property: Atom,
    }

    SelectionNotify = 31 => SelectionNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] requestor: Window,
        #[wire] selection: Atom,
        #[wire] target: Atom,
        #[wire] property: Atom,
    }

    ColormapNotify = 32 => ColormapNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[wire] window: Window,
        #[wire] colormap: Colormap,
        #[get] is_new: u8,
        #[get] state: u8,
        pad1: [u8; 2],
    }

    /// A message sent by another client.
    ClientMessage = 33 => ClientMessageRaw {
        response_type: u8,
        #[get] format: u8,
        sequence: u16,
        #[wire] window: Window,
        #[wire] message_type: Atom,
        #[get] data: [u8; 20],
    }

    MappingNotify = 34 => MappingNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[get] request: u8,
        #[get] first_keycode: u8,
        #[get] count: u8,
        pad1: u8,
    }
}

impl<C: ?Sized> ClientMessage<'_, C> {
    /// The payload as 32-bit values, for `format == 32` messages.
    pub fn data32(&self) -> [u32; 5] {
        let data = self.data();
        let mut out = [0u32; 5];
        for (value, chunk) in out.iter_mut().zip(data.chunks_exact(4)) {
            *value = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        out
    }
}

/// Decodes core events. Opcodes 0 and 1 (errors and replies) and anything
/// past [`MappingNotify`] are not claimed.
pub struct EventDispatcher<'c, C: ?Sized> {
    conn: &'c C,
}

impl<'c, C: ?Sized> EventDispatcher<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<'c, C: ?Sized> DispatchEvent for EventDispatcher<'c, C> {
    type Event = Event<'c, C>;

    fn dispatch<H: FnOnce(Self::Event)>(&self, handler: H, event: &GenericEvent) -> bool {
        match decode_event(event.opcode(), event, self.conn) {
            Some(event) => {
                handler(event);
                true
            }
            None => {
                tracing::trace!(opcode = event.opcode(), "not a core event");
                false
            }
        }
    }
}

// errors

errors! {
    /// The request had a bad opcode or length.
    Request(RequestError) = 1;
    /// A numeric argument was out of range.
    Value(ValueError) = 2;
    Window(WindowError) = 3;
    Pixmap(PixmapError) = 4;
    Atom(AtomError) = 5;
    Cursor(CursorError) = 6;
    Font(FontError) = 7;
    /// Arguments do not match each other.
    Match(MatchError) = 8;
    Drawable(DrawableError) = 9;
    Access(AccessError) = 10;
    /// The server ran out of resources.
    Alloc(AllocError) = 11;
    Colormap(ColormapError) = 12;
    GContext(GContextError) = 13;
    /// A resource id outside the client's range, or already in use.
    IdChoice(IdChoiceError) = 14;
    /// A font or color name does not exist.
    Name(NameError) = 15;
    Length(LengthError) = 16;
    Implementation(ImplementationError) = 17;
}

/// Decodes core errors. Codes outside 1..=17 are passed on.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorDispatcher {
    _private: (),
}

impl ErrorDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchError for ErrorDispatcher {
    fn check(&self, error: &GenericError) -> Result<(), ProtocolError> {
        match decode_error(error.error_code(), error) {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

// requests

/// Look up (or create) the atom with the given name.
#[derive(Clone, Debug, Default)]
pub struct InternAtom {
    pub only_if_exists: bool,
    pub name: String,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct InternAtomReply {
    response_type: u8,
    pad0: u8,
    sequence: u16,
    length: u32,
    atom: Atom,
}

unsafe impl RawStruct for InternAtomReply {}

impl Request for InternAtom {
    type Protocol = Xproto;
    const OPCODE: u8 = 16;

    fn data(&self) -> u8 {
        self.only_if_exists as u8
    }

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_len16("name", self.name.len())?;
        body.pad(2);
        body.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}

impl ReplyRequest for InternAtom {
    type Raw = InternAtomReply;
}

impl<'c, C: ?Sized> Reply<'c, InternAtom, C> {
    /// The atom, or [`Atom::NONE`] if it does not exist and `only_if_exists`
    /// was set.
    pub fn atom<T: FromWire<'c, Atom, C>>(&self) -> T {
        self.field(self.raw().atom)
    }
}

/// Get the name of an atom.
#[derive(Clone, Copy, Debug)]
pub struct GetAtomName {
    pub atom: Atom,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GetAtomNameReply {
    response_type: u8,
    pad0: u8,
    sequence: u16,
    length: u32,
    name_len: u16,
    pad1: [u8; 22],
}

unsafe impl RawStruct for GetAtomNameReply {}

impl Request for GetAtomName {
    type Protocol = Xproto;
    const OPCODE: u8 = 17;

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_u32(self.atom.0);
        Ok(())
    }
}

impl ReplyRequest for GetAtomName {
    type Raw = GetAtomNameReply;
}

impl<C: ?Sized> Reply<'_, GetAtomName, C> {
    pub fn name_bytes(&self) -> &[u8] {
        let len = self.raw().name_len as usize;
        let rest = self
            .buffer()
            .as_bytes()
            .get(mem::size_of::<GetAtomNameReply>()..)
            .unwrap_or_default();
        &rest[..len.min(rest.len())]
    }

    /// The name, decoded as Latin-1.
    pub fn name(&self) -> String {
        self.name_bytes().iter().map(|&b| char::from(b)).collect()
    }
}

/// Get the position and size of a drawable.
#[derive(Clone, Copy, Debug)]
pub struct GetGeometry {
    pub drawable: Drawable,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GetGeometryReply {
    response_type: u8,
    depth: u8,
    sequence: u16,
    length: u32,
    root: Window,
    x: i16,
    y: i16,
    width: u16,
    height: u16,
    border_width: u16,
    pad0: [u8; 2],
}

unsafe impl RawStruct for GetGeometryReply {}

impl Request for GetGeometry {
    type Protocol = Xproto;
    const OPCODE: u8 = 14;

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_u32(self.drawable.0);
        Ok(())
    }
}

impl ReplyRequest for GetGeometry {
    type Raw = GetGeometryReply;
}

impl<'c, C: ?Sized> Reply<'c, GetGeometry, C> {
    pub fn depth(&self) -> u8 {
        self.raw().depth
    }

    pub fn root<T: FromWire<'c, Window, C>>(&self) -> T {
        self.field(self.raw().root)
    }

    pub fn x(&self) -> i16 {
        self.raw().x
    }

    pub fn y(&self) -> i16 {
        self.raw().y
    }

    pub fn width(&self) -> u16 {
        self.raw().width
    }

    pub fn height(&self) -> u16 {
        self.raw().height
    }

    pub fn border_width(&self) -> u16 {
        self.raw().border_width
    }
}

/// Get the root, parent and children of a window.
#[derive(Clone, Copy, Debug)]
pub struct QueryTree {
    pub window: Window,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct QueryTreeReply {
    response_type: u8,
    pad0: u8,
    sequence: u16,
    length: u32,
    root: Window,
    parent: Window,
    children_len: u16,
    pad1: [u8; 14],
}

unsafe impl RawStruct for QueryTreeReply {}

impl Request for QueryTree {
    type Protocol = Xproto;
    const OPCODE: u8 = 15;

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_u32(self.window.0);
        Ok(())
    }
}

impl ReplyRequest for QueryTree {
    type Raw = QueryTreeReply;
}

/// The child windows in a `QueryTree` reply, bottom-most first.
#[derive(Debug)]
pub enum Children {}

impl Strided for Children {
    type Wire = Window;

    fn offset(_reply: &[u8]) -> usize {
        mem::size_of::<QueryTreeReply>()
    }

    fn len(reply: &[u8]) -> usize {
        reply
            .get(16..18)
            .map_or(0, |len| u16::from_ne_bytes([len[0], len[1]]) as usize)
    }
}

impl<'c, C: ?Sized> Reply<'c, QueryTree, C> {
    pub fn root<T: FromWire<'c, Window, C>>(&self) -> T {
        self.field(self.raw().root)
    }

    pub fn parent<T: FromWire<'c, Window, C>>(&self) -> T {
        self.field(self.raw().parent)
    }

    pub fn children<T: FromWire<'c, Window, C>>(&self) -> StridedList<'c, Children, T, C> {
        self.list()
    }
}

/// An element type a property can hold.
pub trait PropertyFormat: RawStruct {
    /// The property format: 8, 16 or 32.
    const FORMAT: u8;

    fn put(self, out: &mut Vec<u8>);
}

impl PropertyFormat for u8 {
    const FORMAT: u8 = 8;

    fn put(self, out: &mut Vec<u8>) {
        out.put_u8(self);
    }
}

impl PropertyFormat for u16 {
    const FORMAT: u8 = 16;

    fn put(self, out: &mut Vec<u8>) {
        out.put_u16(self);
    }
}

impl PropertyFormat for u32 {
    const FORMAT: u8 = 32;

    fn put(self, out: &mut Vec<u8>) {
        out.put_u32(self);
    }
}

impl PropertyFormat for Atom {
    const FORMAT: u8 = 32;

    fn put(self, out: &mut Vec<u8>) {
        out.put_u32(self.0);
    }
}

impl PropertyFormat for Window {
    const FORMAT: u8 = 32;

    fn put(self, out: &mut Vec<u8>) {
        out.put_u32(self.0);
    }
}

/// Read a window property.
#[derive(Clone, Copy, Debug)]
pub struct GetProperty {
    pub delete: bool,
    pub window: Window,
    pub property: Atom,
    /// [`Atom::NONE`] matches any type.
    pub type_: Atom,
    pub long_offset: u32,
    pub long_length: u32,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GetPropertyReply {
    response_type: u8,
    format: u8,
    sequence: u16,
    length: u32,
    type_: Atom,
    bytes_after: u32,
    value_len: u32,
    pad0: [u8; 12],
}

unsafe impl RawStruct for GetPropertyReply {}

impl Request for GetProperty {
    type Protocol = Xproto;
    const OPCODE: u8 = 20;

    fn data(&self) -> u8 {
        self.delete as u8
    }

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_u32(self.window.0);
        body.put_u32(self.property.0);
        body.put_u32(self.type_.0);
        body.put_u32(self.long_offset);
        body.put_u32(self.long_length);
        Ok(())
    }
}

impl ReplyRequest for GetProperty {
    type Raw = GetPropertyReply;
}

/// The value of a `GetProperty` reply, read as `W`. Empty unless the
/// property's format matches `W`.
pub struct PropertyValue<W>(PhantomData<fn() -> W>);

impl<W: PropertyFormat> Strided for PropertyValue<W> {
    type Wire = W;

    fn offset(_reply: &[u8]) -> usize {
        mem::size_of::<GetPropertyReply>()
    }

    fn len(reply: &[u8]) -> usize {
        match (reply.get(1), reply.get(16..20)) {
            (Some(&format), Some(len)) if format == W::FORMAT => {
                u32::from_ne_bytes([len[0], len[1], len[2], len[3]]) as usize
            }
            _ => 0,
        }
    }
}

impl<'c, C: ?Sized> Reply<'c, GetProperty, C> {
    /// 8, 16 or 32, or 0 if the property does not exist.
    pub fn format(&self) -> u8 {
        self.raw().format
    }

    pub fn type_<T: FromWire<'c, Atom, C>>(&self) -> T {
        self.field(self.raw().type_)
    }

    pub fn bytes_after(&self) -> u32 {
        self.raw().bytes_after
    }

    /// Number of elements in the value.
    pub fn value_len(&self) -> u32 {
        self.raw().value_len
    }

    pub fn value<W: PropertyFormat>(&self) -> StridedList<'c, PropertyValue<W>, W, C> {
        self.list()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum PropMode {
    #[default]
    Replace = 0,
    Prepend = 1,
    Append = 2,
}

/// Write a window property.
#[derive(Clone, Debug)]
pub struct ChangeProperty {
    pub mode: PropMode,
    pub window: Window,
    pub property: Atom,
    pub type_: Atom,
    pub format: u8,
    /// Raw value bytes, a whole number of `format`-bit elements.
    pub data: Vec<u8>,
}

impl ChangeProperty {
    /// Build the request from a sequence of elements, collecting them into
    /// one contiguous value.
    pub fn from_iter<W: PropertyFormat>(
        mode: PropMode,
        window: Window,
        property: Atom,
        type_: Atom,
        values: impl IntoIterator<Item = W>,
    ) -> Self {
        let values = values.into_iter();
        let mut data = Vec::with_capacity(values.size_hint().0 * mem::size_of::<W>());
        values.for_each(|value| value.put(&mut data));

        Self {
            mode,
            window,
            property,
            type_,
            format: W::FORMAT,
            data,
        }
    }

    /// Number of elements in `data`.
    pub fn data_len(&self) -> u32 {
        match self.format / 8 {
            0 => 0,
            unit => (self.data.len() / unit as usize) as u32,
        }
    }
}

impl Request for ChangeProperty {
    type Protocol = Xproto;
    const OPCODE: u8 = 18;

    fn data(&self) -> u8 {
        self.mode as u8
    }

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_u32(self.window.0);
        body.put_u32(self.property.0);
        body.put_u32(self.type_.0);
        body.put_u8(self.format);
        body.pad(3);
        body.put_u32(self.data_len());
        body.extend_from_slice(&self.data);
        Ok(())
    }
}

impl VoidRequest for ChangeProperty {}

/// Get the window holding the input focus.
#[derive(Clone, Copy, Debug, Default)]
pub struct GetInputFocus;

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GetInputFocusReply {
    response_type: u8,
    revert_to: u8,
    sequence: u16,
    length: u32,
    focus: Window,
}

unsafe impl RawStruct for GetInputFocusReply {}

impl Request for GetInputFocus {
    type Protocol = Xproto;
    const OPCODE: u8 = 43;

    fn serialize(&self, _body: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

impl ReplyRequest for GetInputFocus {
    type Raw = GetInputFocusReply;
}

impl<'c, C: ?Sized> Reply<'c, GetInputFocus, C> {
    pub fn revert_to(&self) -> u8 {
        self.raw().revert_to
    }

    pub fn focus<T: FromWire<'c, Window, C>>(&self) -> T {
        self.field(self.raw().focus)
    }
}

/// List font names matching a pattern.
#[derive(Clone, Debug, Default)]
pub struct ListFonts {
    pub max_names: u16,
    pub pattern: String,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ListFontsReply {
    response_type: u8,
    pad0: u8,
    sequence: u16,
    length: u32,
    names_len: u16,
    pad1: [u8; 22],
}

unsafe impl RawStruct for ListFontsReply {}

impl Request for ListFonts {
    type Protocol = Xproto;
    const OPCODE: u8 = 49;

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_u16(self.max_names);
        body.put_len16("pattern", self.pattern.len())?;
        body.extend_from_slice(self.pattern.as_bytes());
        Ok(())
    }
}

impl ReplyRequest for ListFonts {
    type Raw = ListFontsReply;
}

/// Font names in a `ListFonts` reply.
#[derive(Debug)]
pub enum FontNames {}

impl Chained for FontNames {
    type Item = String;

    fn start(reply: &[u8]) -> (usize, usize) {
        let count = reply
            .get(8..10)
            .map_or(0, |len| u16::from_ne_bytes([len[0], len[1]]) as usize);
        (mem::size_of::<ListFontsReply>(), count)
    }

    fn size_of(record: &[u8]) -> Option<usize> {
        str_size_of(record)
    }

    fn decode(record: &[u8]) -> String {
        str_decode(record)
    }
}

impl<'c, C: ?Sized> Reply<'c, ListFonts, C> {
    pub fn names(&self) -> ChainedList<'c, FontNames, C> {
        self.list()
    }
}

/// List the extensions the server supports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListExtensions;

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ListExtensionsReply {
    response_type: u8,
    names_len: u8,
    sequence: u16,
    length: u32,
    pad0: [u8; 24],
}

unsafe impl RawStruct for ListExtensionsReply {}

impl Request for ListExtensions {
    type Protocol = Xproto;
    const OPCODE: u8 = 99;

    fn serialize(&self, _body: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

impl ReplyRequest for ListExtensions {
    type Raw = ListExtensionsReply;
}

/// Extension names in a `ListExtensions` reply.
#[derive(Debug)]
pub enum ExtensionNames {}

impl Chained for ExtensionNames {
    type Item = String;

    fn start(reply: &[u8]) -> (usize, usize) {
        let count = reply.get(1).copied().unwrap_or(0) as usize;
        (mem::size_of::<ListExtensionsReply>(), count)
    }

    fn size_of(record: &[u8]) -> Option<usize> {
        str_size_of(record)
    }

    fn decode(record: &[u8]) -> String {
        str_decode(record)
    }
}

impl<'c, C: ?Sized> Reply<'c, ListExtensions, C> {
    pub fn names(&self) -> ChainedList<'c, ExtensionNames, C> {
        self.list()
    }
}

/// Ask whether the server supports an extension, and where its opcodes
/// live.
#[derive(Clone, Debug, Default)]
pub struct QueryExtension {
    pub name: String,
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct QueryExtensionReply {
    response_type: u8,
    pad0: u8,
    sequence: u16,
    length: u32,
    present: u8,
    major_opcode: u8,
    first_event: u8,
    first_error: u8,
}

unsafe impl RawStruct for QueryExtensionReply {}

impl Request for QueryExtension {
    type Protocol = Xproto;
    const OPCODE: u8 = 98;

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_len16("name", self.name.len())?;
        body.pad(2);
        body.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}

impl ReplyRequest for QueryExtension {
    type Raw = QueryExtensionReply;
}

impl<C: ?Sized> Reply<'_, QueryExtension, C> {
    pub fn present(&self) -> bool {
        self.raw().present != 0
    }

    pub fn major_opcode(&self) -> u8 {
        self.raw().major_opcode
    }

    pub fn first_event(&self) -> u8 {
        self.raw().first_event
    }

    pub fn first_error(&self) -> u8 {
        self.raw().first_error
    }

    /// The extension's placement, if it is present.
    pub fn info(&self) -> Option<ExtensionInfo> {
        self.present().then(|| ExtensionInfo {
            major_opcode: self.major_opcode(),
            first_event: self.first_event(),
            first_error: self.first_error(),
        })
    }
}

macro_rules! window_request {
    ($($(#[$meta:meta])* $name:ident = $opcode:literal ($field:ident: $res:ident);)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug)]
            pub struct $name {
                pub $field: $res,
            }

            impl Request for $name {
                type Protocol = Xproto;
                const OPCODE: u8 = $opcode;

                fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
                    body.put_u32(self.$field.0);
                    Ok(())
                }
            }

            impl VoidRequest for $name {}
        )*
    };
}

window_request! {
    DestroyWindow = 4 (window: Window);
    MapWindow = 8 (window: Window);
    UnmapWindow = 10 (window: Window);
    FreePixmap = 54 (pixmap: Pixmap);
}

/// Fetches that return the server's error.
pub mod checked {
    use crate::reply::{Checked, Fetch};

    pub type InternAtom<'c, C> = Fetch<'c, super::InternAtom, Checked, C>;
    pub type GetAtomName<'c, C> = Fetch<'c, super::GetAtomName, Checked, C>;
    pub type GetGeometry<'c, C> = Fetch<'c, super::GetGeometry, Checked, C>;
    pub type QueryTree<'c, C> = Fetch<'c, super::QueryTree, Checked, C>;
    pub type GetProperty<'c, C> = Fetch<'c, super::GetProperty, Checked, C>;
    pub type GetInputFocus<'c, C> = Fetch<'c, super::GetInputFocus, Checked, C>;
    pub type ListFonts<'c, C> = Fetch<'c, super::ListFonts, Checked, C>;
    pub type ListExtensions<'c, C> = Fetch<'c, super::ListExtensions, Checked, C>;
    pub type QueryExtension<'c, C> = Fetch<'c, super::QueryExtension, Checked, C>;
}

/// Fetches that are empty on error.
pub mod unchecked {
    use crate::reply::{Fetch, Unchecked};

    pub type InternAtom<'c, C> = Fetch<'c, super::InternAtom, Unchecked, C>;
    pub type GetAtomName<'c, C> = Fetch<'c, super::GetAtomName, Unchecked, C>;
    pub type GetGeometry<'c, C> = Fetch<'c, super::GetGeometry, Unchecked, C>;
    pub type QueryTree<'c, C> = Fetch<'c, super::QueryTree, Unchecked, C>;
    pub type GetProperty<'c, C> = Fetch<'c, super::GetProperty, Unchecked, C>;
    pub type GetInputFocus<'c, C> = Fetch<'c, super::GetInputFocus, Unchecked, C>;
    pub type ListFonts<'c, C> = Fetch<'c, super::ListFonts, Unchecked, C>;
    pub type ListExtensions<'c, C> = Fetch<'c, super::ListExtensions, Unchecked, C>;
    pub type QueryExtension<'c, C> = Fetch<'c, super::QueryExtension, Unchecked, C>;
}

// capabilities of bound resources

impl<'c, C: RawConnection + ?Sized> Bound<'c, Window, C> {
    pub fn geometry(&self) -> Result<checked::GetGeometry<'c, C>> {
        Fetch::send(
            self.connection(),
            &GetGeometry {
                drawable: self.resource().into(),
            },
        )
    }

    pub fn query_tree(&self) -> Result<checked::QueryTree<'c, C>> {
        Fetch::send(
            self.connection(),
            &QueryTree {
                window: self.resource(),
            },
        )
    }

    /// Read up to `long_length` 32-bit units of a property, of any type.
    pub fn property(&self, property: Atom, long_length: u32) -> Result<checked::GetProperty<'c, C>> {
        Fetch::send(
            self.connection(),
            &GetProperty {
                delete: false,
                window: self.resource(),
                property,
                type_: Atom::NONE,
                long_offset: 0,
                long_length,
            },
        )
    }

    pub fn change_property<W: PropertyFormat>(
        &self,
        mode: PropMode,
        property: Atom,
        type_: Atom,
        values: impl IntoIterator<Item = W>,
    ) -> Result<VoidCookie<ChangeProperty, Checked>> {
        request_checked(
            self.connection(),
            &ChangeProperty::from_iter(mode, self.resource(), property, type_, values),
        )
    }

    pub fn map(&self) -> Result<VoidCookie<MapWindow, Checked>> {
        request_checked(
            self.connection(),
            &MapWindow {
                window: self.resource(),
            },
        )
    }

    pub fn unmap(&self) -> Result<VoidCookie<UnmapWindow, Checked>> {
        request_checked(
            self.connection(),
            &UnmapWindow {
                window: self.resource(),
            },
        )
    }

    pub fn destroy(&self) -> Result<VoidCookie<DestroyWindow, Checked>> {
        request_checked(
            self.connection(),
            &DestroyWindow {
                window: self.resource(),
            },
        )
    }
}

impl<'c, C: RawConnection + ?Sized> Bound<'c, Atom, C> {
    pub fn name(&self) -> Result<checked::GetAtomName<'c, C>> {
        Fetch::send(
            self.connection(),
            &GetAtomName {
                atom: self.resource(),
            },
        )
    }
}

impl<'c, C: RawConnection + ?Sized> Bound<'c, Pixmap, C> {
    pub fn free(&self) -> Result<VoidCookie<FreePixmap, Checked>> {
        request_checked(
            self.connection(),
            &FreePixmap {
                pixmap: self.resource(),
            },
        )
    }
}

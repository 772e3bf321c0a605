// MIT/Apache2 License

//! The X Input extension, version 1.
//!
//! Unlike the core protocol, this extension's event and error numbers are
//! offsets from bases that are only known once the server has been asked
//! about it. Both dispatchers are built from the [`ExtensionInfo`] returned
//! by [`query`].

use crate::{
    buffer::{GenericError, GenericEvent, RawStruct},
    connection::RawConnection,
    dispatch::{relative, DispatchError, DispatchEvent, Protocol},
    error::ProtocolError,
    extension_manager::ExtensionInfo,
    iter::{str_decode, str_size_of, Chained, ChainedList, Strided, StridedList},
    proto::xproto::{Atom, Window},
    reply::{Reply, ReplyRequest},
    request::{Put, Request},
    Result,
};
use alloc::{string::String, vec::Vec};
use core::mem;

/// The name the server knows the extension by.
pub const NAME: &str = "XInputExtension";

/// The X Input extension.
#[derive(Debug)]
pub enum XInput {}

impl Protocol for XInput {
    const EXTENSION: Option<&'static str> = Some(NAME);

    type Errors = ErrorDispatcher;

    fn errors(info: Option<&ExtensionInfo>) -> ErrorDispatcher {
        ErrorDispatcher {
            first_error: info.map_or(0, |info| info.first_error),
        }
    }
}

/// Ask the connection where the extension lives.
///
/// Returns `Ok(None)` if the server does not support it.
pub fn query<C: RawConnection + ?Sized>(conn: &C) -> Result<Option<ExtensionInfo>> {
    conn.extension(NAME)
}

// events

events! {
    DeviceValuator = 0 => DeviceValuatorRaw {
        response_type: u8,
        #[get] device_id: u8,
        sequence: u16,
        #[get] device_state: u16,
        #[get] num_valuators: u8,
        #[get] first_valuator: u8,
        #[get] valuators: [i32; 6],
    }

    DeviceKeyPress = 1,
    DeviceKeyRelease = 2,
    DeviceButtonPress = 3,
    DeviceButtonRelease = 4,
    /// A device other than the core pointer moved.
    DeviceMotionNotify = 5,
    ProximityIn = 8,
    ProximityOut = 9 => DeviceKeyPressRaw {
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
        #[get] device_id: u8,
    }

    DeviceFocusIn = 6, DeviceFocusOut = 7 => DeviceFocusInRaw {
        response_type: u8,
        #[get] detail: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] window: Window,
        #[get] mode: u8,
        #[get] device_id: u8,
        pad0: [u8; 18],
    }

    DeviceStateNotify = 10 => DeviceStateNotifyRaw {
        response_type: u8,
        #[get] device_id: u8,
        sequence: u16,
        #[get] time: u32,
        #[get] num_keys: u8,
        #[get] num_buttons: u8,
        #[get] num_valuators: u8,
        #[get] classes_reported: u8,
        #[get] buttons: [u8; 4],
        #[get] keys: [u8; 4],
        #[get] valuators: [u32; 3],
    }

    DeviceMappingNotify = 11 => DeviceMappingNotifyRaw {
        response_type: u8,
        #[get] device_id: u8,
        sequence: u16,
        #[get] request: u8,
        #[get] first_keycode: u8,
        #[get] count: u8,
        pad0: u8,
        #[get] time: u32,
        pad1: [u8; 20],
    }

    ChangeDeviceNotify = 12 => ChangeDeviceNotifyRaw {
        response_type: u8,
        #[get] device_id: u8,
        sequence: u16,
        #[get] time: u32,
        #[get] request: u8,
        pad0: [u8; 23],
    }

    DeviceKeyStateNotify = 13 => DeviceKeyStateNotifyRaw {
        response_type: u8,
        #[get] device_id: u8,
        sequence: u16,
        #[get] keys: [u8; 28],
    }

    DeviceButtonStateNotify = 14 => DeviceButtonStateNotifyRaw {
        response_type: u8,
        #[get] device_id: u8,
        sequence: u16,
        #[get] buttons: [u8; 28],
    }

    /// A device was added, removed, enabled or disabled.
    DevicePresenceNotify = 15 => DevicePresenceNotifyRaw {
        response_type: u8,
        pad0: u8,
        sequence: u16,
        #[get] time: u32,
        #[get] devchange: u8,
        #[get] device_id: u8,
        #[get] control: u16,
        pad1: [u8; 20],
    }

    DevicePropertyNotify = 16 => DevicePropertyNotifyRaw {
        response_type: u8,
        #[get] state: u8,
        sequence: u16,
        #[get] time: u32,
        #[wire] property: Atom,
        pad0: [u8; 19],
        #[get] device_id: u8,
    }
}

/// Decodes this extension's events, given where the server placed them.
pub struct EventDispatcher<'c, C: ?Sized> {
    conn: &'c C,
    first_event: u8,
}

impl<'c, C: ?Sized> EventDispatcher<'c, C> {
    pub fn new(conn: &'c C, info: &ExtensionInfo) -> Self {
        Self {
            conn,
            first_event: info.first_event,
        }
    }
}

impl<'c, C: ?Sized> DispatchEvent for EventDispatcher<'c, C> {
    type Event = Event<'c, C>;

    fn dispatch<H: FnOnce(Self::Event)>(&self, handler: H, event: &GenericEvent) -> bool {
        let decoded = relative(event.opcode(), self.first_event)
            .and_then(|opcode| decode_event(opcode, event, self.conn));

        match decoded {
            Some(event) => {
                handler(event);
                true
            }
            None => {
                tracing::trace!(
                    opcode = event.opcode(),
                    first_event = self.first_event,
                    "not an XInput event"
                );
                false
            }
        }
    }
}

// errors

errors! {
    Device(DeviceError) = 0;
    Event(EventError) = 1;
    Mode(ModeError) = 2;
    DeviceBusy(DeviceBusyError) = 3;
    Class(ClassError) = 4;
}

extension_members! {
    events: DeviceValuator, DeviceKeyPress, DeviceKeyRelease, DeviceButtonPress,
        DeviceButtonRelease, DeviceMotionNotify, DeviceFocusIn, DeviceFocusOut,
        ProximityIn, ProximityOut, DeviceStateNotify, DeviceMappingNotify,
        ChangeDeviceNotify, DeviceKeyStateNotify, DeviceButtonStateNotify,
        DevicePresenceNotify, DevicePropertyNotify;
    errors: DeviceError, EventError, ModeError, DeviceBusyError, ClassError;
}

/// Decodes this extension's errors, given where the server placed them.
#[derive(Clone, Copy, Debug)]
pub struct ErrorDispatcher {
    first_error: u8,
}

impl ErrorDispatcher {
    pub fn new(info: &ExtensionInfo) -> Self {
        Self {
            first_error: info.first_error,
        }
    }
}

impl DispatchError for ErrorDispatcher {
    fn check(&self, error: &GenericError) -> Result<(), ProtocolError> {
        match relative(error.error_code(), self.first_error)
            .and_then(|code| decode_error(code, error))
        {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

// requests

/// Negotiate the extension version.
#[derive(Clone, Debug)]
pub struct GetExtensionVersion {
    pub name: String,
}

impl Default for GetExtensionVersion {
    fn default() -> Self {
        Self { name: NAME.into() }
    }
}

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GetExtensionVersionReply {
    response_type: u8,
    xi_reply_type: u8,
    sequence: u16,
    length: u32,
    server_major: u16,
    server_minor: u16,
    present: u8,
    pad0: [u8; 19],
}

unsafe impl RawStruct for GetExtensionVersionReply {}

impl Request for GetExtensionVersion {
    type Protocol = XInput;
    const OPCODE: u8 = 1;

    fn serialize(&self, body: &mut Vec<u8>) -> Result<()> {
        body.put_len16("name", self.name.len())?;
        body.pad(2);
        body.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}

impl ReplyRequest for GetExtensionVersion {
    type Raw = GetExtensionVersionReply;
}

impl<C: ?Sized> Reply<'_, GetExtensionVersion, C> {
    pub fn server_major(&self) -> u16 {
        self.raw().server_major
    }

    pub fn server_minor(&self) -> u16 {
        self.raw().server_minor
    }

    pub fn present(&self) -> bool {
        self.raw().present != 0
    }
}

/// List the input devices known to the server.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListInputDevices;

#[doc(hidden)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ListInputDevicesReply {
    response_type: u8,
    xi_reply_type: u8,
    sequence: u16,
    length: u32,
    devices_len: u8,
    pad0: [u8; 23],
}

unsafe impl RawStruct for ListInputDevicesReply {}

impl Request for ListInputDevices {
    type Protocol = XInput;
    const OPCODE: u8 = 2;

    fn serialize(&self, _body: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

impl ReplyRequest for ListInputDevices {
    type Raw = ListInputDevicesReply;
}

/// One entry of the fixed-size device array.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: Atom,
    pub device_id: u8,
    pub num_class_info: u8,
    pub device_use: u8,
    pad0: u8,
}

unsafe impl RawStruct for DeviceInfo {}

fn devices_len(reply: &[u8]) -> usize {
    reply.get(8).copied().unwrap_or(0) as usize
}

const DEVICES_OFFSET: usize = mem::size_of::<ListInputDevicesReply>();

/// The device array of a `ListInputDevices` reply.
#[derive(Debug)]
pub enum Devices {}

impl Strided for Devices {
    type Wire = DeviceInfo;

    fn offset(_reply: &[u8]) -> usize {
        DEVICES_OFFSET
    }

    fn len(reply: &[u8]) -> usize {
        devices_len(reply)
    }
}

/// A valuator axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisInfo {
    pub resolution: u32,
    pub minimum: i32,
    pub maximum: i32,
}

/// One class record describing part of a device.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputInfo {
    Key {
        min_keycode: u8,
        max_keycode: u8,
        num_keys: u16,
    },
    Button {
        num_buttons: u16,
    },
    Valuator {
        mode: u8,
        motion_size: u32,
        axes: Vec<AxisInfo>,
    },
    /// A class this crate does not decode.
    Other {
        class_id: u8,
    },
}

const KEY_CLASS: u8 = 0;
const BUTTON_CLASS: u8 = 1;
const VALUATOR_CLASS: u8 = 2;

fn u16_at(record: &[u8], at: usize) -> u16 {
    record
        .get(at..at + 2)
        .map_or(0, |b| u16::from_ne_bytes([b[0], b[1]]))
}

fn u32_at(record: &[u8], at: usize) -> u32 {
    record
        .get(at..at + 4)
        .map_or(0, |b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
}

/// The class records of a `ListInputDevices` reply, for all devices in
/// order. Each device owns `num_class_info` consecutive records.
#[derive(Debug)]
pub enum InputInfos {}

impl Chained for InputInfos {
    type Item = InputInfo;

    fn start(reply: &[u8]) -> (usize, usize) {
        let devices = devices_len(reply);
        let count = (0..devices)
            .filter_map(|i| reply.get(DEVICES_OFFSET + i * mem::size_of::<DeviceInfo>() + 5))
            .map(|&n| n as usize)
            .sum();
        (DEVICES_OFFSET + devices * mem::size_of::<DeviceInfo>(), count)
    }

    fn size_of(record: &[u8]) -> Option<usize> {
        // the length byte covers the whole record, header included
        match record.get(1) {
            Some(&len) if len >= 2 => Some(len as usize),
            _ => None,
        }
    }

    fn decode(record: &[u8]) -> InputInfo {
        let class_id = record[0];
        match class_id {
            KEY_CLASS => InputInfo::Key {
                min_keycode: record.get(2).copied().unwrap_or(0),
                max_keycode: record.get(3).copied().unwrap_or(0),
                num_keys: u16_at(record, 4),
            },
            BUTTON_CLASS => InputInfo::Button {
                num_buttons: u16_at(record, 2),
            },
            VALUATOR_CLASS => {
                let axes_len = record.get(2).copied().unwrap_or(0) as usize;
                let axes = (0..axes_len)
                    .map(|i| 8 + i * 12)
                    .take_while(|at| at + 12 <= record.len())
                    .map(|at| AxisInfo {
                        resolution: u32_at(record, at),
                        minimum: u32_at(record, at + 4) as i32,
                        maximum: u32_at(record, at + 8) as i32,
                    })
                    .collect();

                InputInfo::Valuator {
                    mode: record.get(3).copied().unwrap_or(0),
                    motion_size: u32_at(record, 4),
                    axes,
                }
            }
            class_id => InputInfo::Other { class_id },
        }
    }
}

/// The device names of a `ListInputDevices` reply, one per device.
#[derive(Debug)]
pub enum DeviceNames {}

impl Chained for DeviceNames {
    type Item = String;

    fn start(reply: &[u8]) -> (usize, usize) {
        let devices = devices_len(reply);
        let (mut offset, infos) = InputInfos::start(reply);

        for _ in 0..infos {
            match InputInfos::advance(reply, offset) {
                Some(next) if next <= reply.len() => offset = next,
                _ => return (reply.len(), 0),
            }
        }

        (offset, devices)
    }

    fn size_of(record: &[u8]) -> Option<usize> {
        str_size_of(record)
    }

    fn decode(record: &[u8]) -> String {
        str_decode(record)
    }
}

impl<'c, C: ?Sized> Reply<'c, ListInputDevices, C> {
    pub fn devices(&self) -> StridedList<'c, Devices, DeviceInfo, C> {
        self.list()
    }

    pub fn infos(&self) -> ChainedList<'c, InputInfos, C> {
        self.list()
    }

    pub fn names(&self) -> ChainedList<'c, DeviceNames, C> {
        self.list()
    }
}

pub mod checked {
    use crate::reply::{Checked, Fetch};

    pub type GetExtensionVersion<'c, C> = Fetch<'c, super::GetExtensionVersion, Checked, C>;
    pub type ListInputDevices<'c, C> = Fetch<'c, super::ListInputDevices, Checked, C>;
}

pub mod unchecked {
    use crate::reply::{Fetch, Unchecked};

    pub type GetExtensionVersion<'c, C> = Fetch<'c, super::GetExtensionVersion, Unchecked, C>;
    pub type ListInputDevices<'c, C> = Fetch<'c, super::ListInputDevices, Unchecked, C>;
}

// MIT/Apache2 License

//! A scripted transport and packet builders for exercising the typed layer
//! without an X server.

#![allow(dead_code)]

use crate::{
    buffer::{Buffer, GenericError, GenericEvent, EVENT_SIZE},
    connection::{Fetched, RawConnection},
    error::ConnectionError,
    extension_manager::ExtensionInfo,
    request::RawRequest,
    Result,
};
use alloc::{boxed::Box, collections::VecDeque, vec, vec::Vec};
use core::cell::RefCell;
use std::collections::{HashMap, HashSet};

mod extension;
mod reply;
mod xproto;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// A request as the mock received it.
#[derive(Clone, Debug)]
pub(crate) struct SentRequest {
    pub(crate) sequence: u64,
    pub(crate) extension: Option<&'static str>,
    pub(crate) opcode: u8,
    pub(crate) data: u8,
    pub(crate) body: Vec<u8>,
    pub(crate) has_reply: bool,
    pub(crate) checked: bool,
}

type Responder = Box<dyn Fn(&SentRequest) -> Fetched>;

#[derive(Default)]
struct State {
    last_sequence: u64,
    sent: Vec<SentRequest>,
    replies: HashMap<u64, Fetched>,
    responders: HashMap<u8, Responder>,
    check_errors: HashMap<u64, GenericError>,
    delayed: HashSet<u64>,
    extensions: HashMap<&'static str, ExtensionInfo>,
    events: VecDeque<GenericEvent>,
    waits: Vec<u64>,
    polls: Vec<u64>,
    discarded: Vec<u64>,
    broken: Option<ConnectionError>,
    last_id: u32,
}

/// A [`RawConnection`] that answers from a script.
///
/// Sequence numbers start at 1. Replies are looked up first by sequence
/// (see [`MockConnection::respond`]), then by core opcode (see
/// [`MockConnection::answer`]); anything else comes back empty.
#[derive(Default)]
pub(crate) struct MockConnection {
    state: RefCell<State>,
}

impl MockConnection {
    pub(crate) fn new() -> Self {
        init_tracing();
        Self::default()
    }

    /// Answer request `sequence` with `fetched`.
    pub(crate) fn respond(&self, sequence: u64, fetched: Fetched) {
        self.state.borrow_mut().replies.insert(sequence, fetched);
    }

    /// Answer every core request with this opcode through `responder`.
    pub(crate) fn answer(&self, opcode: u8, responder: impl Fn(&SentRequest) -> Fetched + 'static) {
        self.state
            .borrow_mut()
            .responders
            .insert(opcode, Box::new(responder));
    }

    /// Make the checked void request `sequence` fail with `error`.
    pub(crate) fn fail_check(&self, sequence: u64, error: GenericError) {
        self.state.borrow_mut().check_errors.insert(sequence, error);
    }

    /// Keep `poll_for_reply` from seeing `sequence` until it is released.
    pub(crate) fn delay(&self, sequence: u64) {
        self.state.borrow_mut().delayed.insert(sequence);
    }

    pub(crate) fn release(&self, sequence: u64) {
        self.state.borrow_mut().delayed.remove(&sequence);
    }

    pub(crate) fn add_extension(&self, name: &'static str, info: ExtensionInfo) {
        self.state.borrow_mut().extensions.insert(name, info);
    }

    pub(crate) fn push_event(&self, event: GenericEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    /// Fail every call from now on.
    pub(crate) fn break_with(&self, error: ConnectionError) {
        self.state.borrow_mut().broken = Some(error);
    }

    pub(crate) fn sent(&self) -> Vec<SentRequest> {
        self.state.borrow().sent.clone()
    }

    pub(crate) fn last_sent(&self) -> SentRequest {
        self.state
            .borrow()
            .sent
            .last()
            .cloned()
            .expect("nothing was sent")
    }

    pub(crate) fn waits(&self) -> Vec<u64> {
        self.state.borrow().waits.clone()
    }

    pub(crate) fn polls(&self) -> Vec<u64> {
        self.state.borrow().polls.clone()
    }

    pub(crate) fn discarded(&self) -> Vec<u64> {
        self.state.borrow().discarded.clone()
    }

    fn check_broken(&self) -> Result<()> {
        match self.state.borrow().broken {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn take(&self, sequence: u64) -> Result<Fetched> {
        self.check_broken()?;
        let mut state = self.state.borrow_mut();

        if let Some(fetched) = state.replies.remove(&sequence) {
            return Ok(fetched);
        }

        let request = state
            .sent
            .iter()
            .find(|req| req.sequence == sequence)
            .cloned();
        let answered = request.and_then(|req| {
            if req.extension.is_some() {
                return None;
            }
            state.responders.get(&req.opcode).map(|respond| respond(&req))
        });

        Ok(answered.unwrap_or(Fetched::Empty))
    }
}

impl RawConnection for MockConnection {
    fn send_request(&self, request: &RawRequest<'_>) -> Result<u64> {
        self.check_broken()?;
        let mut state = self.state.borrow_mut();

        state.last_sequence += 1;
        let sequence = state.last_sequence;
        state.sent.push(SentRequest {
            sequence,
            extension: request.extension,
            opcode: request.opcode,
            data: request.data,
            body: request.body.to_vec(),
            has_reply: request.has_reply,
            checked: request.checked,
        });

        Ok(sequence)
    }

    fn wait_for_reply(&self, sequence: u64) -> Result<Fetched> {
        self.state.borrow_mut().waits.push(sequence);
        self.take(sequence)
    }

    fn poll_for_reply(&self, sequence: u64) -> Result<Option<Fetched>> {
        self.state.borrow_mut().polls.push(sequence);
        if self.state.borrow().delayed.contains(&sequence) {
            return Ok(None);
        }

        self.take(sequence).map(Some)
    }

    fn discard_reply(&self, sequence: u64) {
        self.state.borrow_mut().discarded.push(sequence);
    }

    fn check_request(&self, sequence: u64) -> Result<Option<GenericError>> {
        self.check_broken()?;
        let mut state = self.state.borrow_mut();
        state.waits.push(sequence);
        Ok(state.check_errors.remove(&sequence))
    }

    fn extension(&self, name: &'static str) -> Result<Option<ExtensionInfo>> {
        self.check_broken()?;
        Ok(self.state.borrow().extensions.get(name).copied())
    }

    fn generate_id(&self) -> Result<u32> {
        self.check_broken()?;
        let mut state = self.state.borrow_mut();
        state.last_id += 1;
        Ok(0x0020_0000 | state.last_id)
    }

    fn flush(&self) -> Result<()> {
        self.check_broken()
    }

    fn wait_for_event(&self) -> Result<GenericEvent> {
        self.check_broken()?;
        self.state
            .borrow_mut()
            .events
            .pop_front()
            .ok_or_else(|| ConnectionError::Io.into())
    }

    fn poll_for_event(&self) -> Result<Option<GenericEvent>> {
        self.check_broken()?;
        Ok(self.state.borrow_mut().events.pop_front())
    }
}

/// Builds reply, event and error packets byte by byte, in native order.
pub(crate) struct Packet {
    bytes: Vec<u8>,
    is_reply: bool,
}

impl Packet {
    pub(crate) fn reply() -> Self {
        let mut bytes = vec![0; EVENT_SIZE];
        bytes[0] = 1;
        Self {
            bytes,
            is_reply: true,
        }
    }

    pub(crate) fn event(response_type: u8) -> Self {
        let mut bytes = vec![0; EVENT_SIZE];
        bytes[0] = response_type;
        Self {
            bytes,
            is_reply: false,
        }
    }

    pub(crate) fn error(code: u8) -> Self {
        let mut bytes = vec![0; EVENT_SIZE];
        bytes[1] = code;
        Self {
            bytes,
            is_reply: false,
        }
    }

    pub(crate) fn put(mut self, at: usize, data: &[u8]) -> Self {
        if self.bytes.len() < at + data.len() {
            self.bytes.resize(at + data.len(), 0);
        }
        self.bytes[at..at + data.len()].copy_from_slice(data);
        self
    }

    pub(crate) fn u8(self, at: usize, value: u8) -> Self {
        self.put(at, &[value])
    }

    pub(crate) fn u16(self, at: usize, value: u16) -> Self {
        self.put(at, &value.to_ne_bytes())
    }

    pub(crate) fn u32(self, at: usize, value: u32) -> Self {
        self.put(at, &value.to_ne_bytes())
    }

    pub(crate) fn i16(self, at: usize, value: i16) -> Self {
        self.put(at, &value.to_ne_bytes())
    }

    /// Add bytes after everything written so far.
    pub(crate) fn append(self, data: &[u8]) -> Self {
        let at = self.bytes.len();
        self.put(at, data)
    }

    /// Add an X11 `STR`.
    pub(crate) fn append_str(self, s: &str) -> Self {
        self.append(&[s.len() as u8]).append(s.as_bytes())
    }

    pub(crate) fn build(mut self) -> Buffer {
        if self.is_reply {
            let padded = (self.bytes.len() + 3) & !3;
            self.bytes.resize(padded, 0);
            let length = ((padded - EVENT_SIZE) / 4) as u32;
            self.bytes[4..8].copy_from_slice(&length.to_ne_bytes());
        }

        Buffer::copy_from_slice(&self.bytes).expect("malloc failed")
    }

    pub(crate) fn fetched(self) -> Fetched {
        Fetched::Reply(self.build())
    }

    pub(crate) fn generic_event(self) -> GenericEvent {
        GenericEvent::new(self.build()).expect("event too short")
    }

    pub(crate) fn generic_error(self) -> GenericError {
        GenericError::new(self.build()).expect("not an error packet")
    }
}

// MIT/Apache2 License

use crate::{
    connection::RawConnection,
    proto::xproto::QueryExtension,
    reply::{Checked, Fetch},
    sync::{rwl_read, rwl_write, RwLock},
    Result,
};
use core::mem;

/// Where the server placed an extension's requests, events and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionInfo {
    pub major_opcode: u8,
    pub first_event: u8,
    pub first_error: u8,
}

/// Per-connection cache of `QueryExtension` results.
///
/// Absent extensions are cached too, so a missing extension is only asked
/// about once.
pub(crate) struct ExtensionManager {
    entries: RwLock<HashMap<&'static str, Option<ExtensionInfo>>>,
}

impl ExtensionManager {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::with_hasher(Default::default())),
        }
    }

    /// Look up `name`, asking the server over `conn` the first time.
    pub(crate) fn extension<C: RawConnection + ?Sized>(
        &self,
        conn: &C,
        name: &'static str,
    ) -> Result<Option<ExtensionInfo>> {
        // fast path: already cached
        let guard = rwl_read(&self.entries);

        if let Some(entry) = guard.get(&name) {
            return Ok(*entry);
        }

        mem::drop(guard);
        let mut guard = rwl_write(&self.entries);

        // someone may have filled it in while we waited for the lock
        if let Some(entry) = guard.get(&name) {
            return Ok(*entry);
        }

        let fetch = Fetch::<'_, QueryExtension, Checked, C>::send(
            conn,
            &QueryExtension { name: name.into() },
        )?;
        let reply = fetch.get()?;

        let info = reply.info();

        tracing::debug!(extension = name, ?info, "cached extension");
        guard.insert(name, info);
        Ok(info)
    }

    fn find(&self, mut f: impl FnMut(&ExtensionInfo) -> bool) -> Option<(&'static str, ExtensionInfo)> {
        let guard = rwl_read(&self.entries);

        for (name, info) in guard.iter() {
            if let Some(info) = info {
                if f(info) {
                    return Some((*name, *info));
                }
            }
        }

        None
    }

    /// The cached extension with this major opcode.
    pub(crate) fn by_major_opcode(&self, opcode: u8) -> Option<(&'static str, ExtensionInfo)> {
        self.find(|info| info.major_opcode == opcode)
    }

    /// The cached extension whose event block starts exactly at `first_event`.
    pub(crate) fn by_first_event(&self, first_event: u8) -> Option<(&'static str, ExtensionInfo)> {
        self.find(|info| info.first_event != 0 && info.first_event == first_event)
    }

    /// The cached extension whose error block starts exactly at `first_error`.
    pub(crate) fn by_first_error(&self, first_error: u8) -> Option<(&'static str, ExtensionInfo)> {
        self.find(|info| info.first_error != 0 && info.first_error == first_error)
    }
}

type HashMap<K, V> = hashbrown::HashMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

// MIT/Apache2 License

//! Current synchronization primitives for this crate.

cfg_if::cfg_if! {
    if #[cfg(feature = "pl")] {
        pub(crate) use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
        #[allow(unused_imports)]
        pub(crate) use once_cell::sync::Lazy;

        pub(crate) fn rwl_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
            lock.read()
        }

        pub(crate) fn rwl_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
            lock.write()
        }
    } else if #[cfg(feature = "real_mutex")] {
        pub(crate) use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
        #[allow(unused_imports)]
        pub(crate) use once_cell::sync::Lazy;

        // the cached data is plain values, a panic mid-write can't break it
        pub(crate) fn rwl_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
            lock.read().unwrap_or_else(PoisonError::into_inner)
        }

        pub(crate) fn rwl_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
            lock.write().unwrap_or_else(PoisonError::into_inner)
        }
    } else {
        pub(crate) use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};
        #[allow(unused_imports)]
        pub(crate) use spin::Lazy;

        pub(crate) fn rwl_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
            lock.read()
        }

        pub(crate) fn rwl_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
            lock.write()
        }
    }
}

//! Process-wide shim state: readiness, debug switch, and the watched-file
//! cache. Everything here is atomics over fixed storage: no locks, no
//! teardown; lifetime is the process.

use libc::c_int;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

pub(crate) const PATH_CAP: usize = libc::PATH_MAX as usize;

/// Flipped by the `.init_array` constructor once the loader has mapped the
/// shim. Hooked calls arriving earlier pass straight through.
static READY: AtomicBool = AtomicBool::new(false);

pub static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub(crate) fn mark_ready() {
    // getenv only: malloc may not be usable this early in process startup.
    let dbg = unsafe { libc::getenv(c"MIRAGE_DEBUG".as_ptr()) };
    if !dbg.is_null() {
        DEBUG_ENABLED.store(true, Ordering::Relaxed);
    }
    READY.store(true, Ordering::Release);
}

pub(crate) fn is_ready() -> bool {
    READY.load(Ordering::Acquire)
}

/// Best-known identity of the watched file.
///
/// Advisory only: every shim call re-derives target membership from its own
/// path or descriptor, so a stale entry can neither suppress tampering nor
/// redirect it at an unrelated file. The path slot saves repeated
/// canonicalization, the descriptor slot is a plain hint. Races are benign:
/// the path is written once by whichever confirming call claims it first,
/// and the descriptor is an atomic overwrite.
pub(crate) struct WatchedFileState {
    path: UnsafeCell<[u8; PATH_CAP]>,
    /// 0 while unset; the recorded path length once published.
    path_len: AtomicUsize,
    /// Claim flag for the one-time path write.
    path_claim: AtomicBool,
    fd: AtomicI32,
}

// The path buffer is written exactly once, before path_len publishes it.
unsafe impl Sync for WatchedFileState {}

pub(crate) static WATCHED: WatchedFileState = WatchedFileState::new();

impl WatchedFileState {
    pub(crate) const fn new() -> Self {
        Self {
            path: UnsafeCell::new([0; PATH_CAP]),
            path_len: AtomicUsize::new(0),
            path_claim: AtomicBool::new(false),
            fd: AtomicI32::new(-1),
        }
    }

    pub(crate) fn record_fd(&self, fd: c_int) {
        self.fd.store(fd, Ordering::Relaxed);
    }

    pub(crate) fn last_fd(&self) -> c_int {
        self.fd.load(Ordering::Relaxed)
    }

    pub(crate) fn path_recorded(&self) -> bool {
        self.path_len.load(Ordering::Acquire) != 0
    }

    /// Record the canonical path. Only the first confirming caller writes;
    /// everyone else keeps the published value, so readers never observe a
    /// half-updated buffer. Input longer than the platform limit is
    /// truncated.
    pub(crate) fn record_path(&self, path: &[u8]) {
        if self.path_claim.swap(true, Ordering::AcqRel) {
            return;
        }
        let len = path.len().min(PATH_CAP - 1);
        unsafe {
            std::ptr::copy_nonoverlapping(path.as_ptr(), self.path.get() as *mut u8, len);
        }
        self.path_len.store(len, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn path_snapshot(&self) -> Vec<u8> {
        let len = self.path_len.load(Ordering::Acquire);
        let mut out = vec![0u8; len];
        if len > 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    self.path.get() as *const u8,
                    out.as_mut_ptr(),
                    len,
                );
            }
        }
        out
    }
}

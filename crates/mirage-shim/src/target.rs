//! Watched-file identification.
//!
//! Path matching is a substring test; no symlink or dot-segment
//! normalization happens here. Descriptor matching resolves the descriptor
//! through /proc on every call; descriptor numbers are recycled after
//! close, so a cached association is never allowed to answer.

use crate::state::{PATH_CAP, WATCHED};
use libc::{c_char, c_int};
use std::ffi::CStr;

/// Fixed path fragment naming the watched file.
pub(crate) const WATCH_KEYWORD: &[u8] = b"position.jsonl";

pub(crate) fn is_target_path(path: &[u8]) -> bool {
    path.windows(WATCH_KEYWORD.len()).any(|w| w == WATCH_KEYWORD)
}

pub(crate) unsafe fn is_target_path_ptr(path: *const c_char) -> bool {
    if path.is_null() {
        return false;
    }
    is_target_path(CStr::from_ptr(path).to_bytes())
}

/// Resolve a descriptor to its backing path via /proc, writing it into
/// `out` (NUL-terminated). Returns the path length.
unsafe fn fd_path(fd: c_int, out: &mut [u8; PATH_CAP]) -> Option<usize> {
    use std::fmt::Write;
    let mut link = [0u8; 64];
    let mut w = crate::macros::StackWriter::new(&mut link);
    let _ = write!(w, "/proc/self/fd/{}\0", fd);

    let len = libc::readlink(
        link.as_ptr() as *const c_char,
        out.as_mut_ptr() as *mut c_char,
        PATH_CAP - 1,
    );
    if len < 0 {
        return None;
    }
    let len = len as usize;
    out[len] = 0;
    Some(len)
}

/// Whether `fd` currently refers to the watched file; on a match, `resolved`
/// holds the backing path and its length is returned so the caller can
/// record it without resolving again.
pub(crate) unsafe fn is_target_fd(fd: c_int, resolved: &mut [u8; PATH_CAP]) -> Option<usize> {
    let len = fd_path(fd, resolved)?;
    if is_target_path(&resolved[..len]) {
        Some(len)
    } else {
        None
    }
}

/// Record a match confirmed by path (open-shaped shims). Canonicalization
/// runs only while no path is recorded yet; when it fails, the raw string
/// is kept, truncated to the platform limit by the state layer.
pub(crate) unsafe fn confirm_path(path: *const c_char, fd: c_int) {
    if fd >= 0 && WATCHED.last_fd() != fd {
        shim_debug!("watched file now at fd={}", fd);
    }
    if fd >= 0 {
        WATCHED.record_fd(fd);
    }
    if WATCHED.path_recorded() || path.is_null() {
        return;
    }
    let mut resolved = [0u8; PATH_CAP];
    let got = libc::realpath(path, resolved.as_mut_ptr() as *mut c_char);
    if got.is_null() {
        WATCHED.record_path(CStr::from_ptr(path).to_bytes());
    } else {
        let len = libc::strlen(resolved.as_ptr() as *const c_char);
        WATCHED.record_path(&resolved[..len]);
    }
}

/// Record a match confirmed by descriptor (read-shaped shims). The /proc
/// link target is already canonical, so it is recorded as-is.
pub(crate) fn confirm_fd(fd: c_int, resolved_path: &[u8]) {
    if WATCHED.last_fd() != fd {
        shim_debug!("watched file now at fd={}", fd);
    }
    WATCHED.record_fd(fd);
    if !WATCHED.path_recorded() {
        WATCHED.record_path(resolved_path);
    }
}

//! Open-shaped shims: `fopen`/`fopen64` and `open`/`open64`.
//!
//! No content exists at open time, so a confirmed match only records the
//! watched-file state for the read shims that follow.

use crate::reals;
use crate::syscalls::{set_errno, tampering_active};
use crate::target;
use libc::{c_char, c_int, mode_t, FILE};
use std::ptr;

unsafe fn after_stream_open(path: *const c_char, stream: *mut FILE) {
    if stream.is_null() || !target::is_target_path_ptr(path) {
        return;
    }
    target::confirm_path(path, libc::fileno(stream));
}

#[no_mangle]
pub unsafe extern "C" fn fopen(path: *const c_char, mode: *const c_char) -> *mut FILE {
    let Some(real) = reals::fopen() else {
        set_errno(libc::ENOSYS);
        return ptr::null_mut();
    };
    let stream = real(path, mode);
    if tampering_active() {
        after_stream_open(path, stream);
    }
    stream
}

#[no_mangle]
pub unsafe extern "C" fn fopen64(path: *const c_char, mode: *const c_char) -> *mut FILE {
    let Some(real) = reals::fopen64() else {
        set_errno(libc::ENOSYS);
        return ptr::null_mut();
    };
    let stream = real(path, mode);
    if tampering_active() {
        after_stream_open(path, stream);
    }
    stream
}

/// `open`'s creation mode is variadic in C; the shim receives it as a fixed
/// third parameter (register-compatible on the supported targets) and
/// forwards it only when the flags say one was actually supplied.
unsafe fn open_impl(real: reals::OpenFn, path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    // O_TMPFILE embeds O_DIRECTORY, so it needs the exact-mask compare.
    let wants_mode =
        flags & libc::O_CREAT != 0 || (flags & libc::O_TMPFILE) == libc::O_TMPFILE;
    let mode = if wants_mode { mode } else { 0 };
    let fd = real(path, flags, mode);
    if fd >= 0 && tampering_active() && target::is_target_path_ptr(path) {
        target::confirm_path(path, fd);
    }
    fd
}

#[no_mangle]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    let Some(real) = reals::open() else {
        set_errno(libc::ENOSYS);
        return -1;
    };
    open_impl(real, path, flags, mode)
}

#[no_mangle]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
    let Some(real) = reals::open64() else {
        set_errno(libc::ENOSYS);
        return -1;
    };
    open_impl(real, path, flags, mode)
}

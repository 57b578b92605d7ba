//! Read-shaped shims: `read`, `fread`, `fgets`.
//!
//! Each shim lets the real call fill the caller's buffer, then rewrites the
//! certified window in place when the descriptor resolves to the watched
//! file. The reported byte/item count and the returned pointer are always
//! exactly what the real call produced.

use crate::reals;
use crate::state::PATH_CAP;
use crate::syscalls::{set_errno, tampering_active};
use crate::target;
use libc::{c_char, c_int, c_void, size_t, ssize_t, FILE};
use std::ptr;

/// Tamper the freshly read window when `fd` refers to the watched file.
unsafe fn tamper_window(fd: c_int, buf: *mut u8, len: usize) {
    if len == 0 || buf.is_null() {
        return;
    }
    let mut resolved = [0u8; PATH_CAP];
    let Some(path_len) = target::is_target_fd(fd, &mut resolved) else {
        return;
    };
    target::confirm_fd(fd, &resolved[..path_len]);

    let window = std::slice::from_raw_parts_mut(buf, len);
    if mirage_tamper::tamper(window) {
        shim_debug!("rewrote {} bytes read from fd={}", len, fd);
    }
}

#[no_mangle]
pub unsafe extern "C" fn read(fd: c_int, buf: *mut c_void, count: size_t) -> ssize_t {
    let Some(real) = reals::read() else {
        set_errno(libc::ENOSYS);
        return -1;
    };
    let n = real(fd, buf, count);
    if n > 0 && tampering_active() {
        tamper_window(fd, buf as *mut u8, n as usize);
    }
    n
}

#[no_mangle]
pub unsafe extern "C" fn fread(
    buf: *mut c_void,
    size: size_t,
    nmemb: size_t,
    stream: *mut FILE,
) -> size_t {
    let Some(real) = reals::fread() else {
        set_errno(libc::ENOSYS);
        return 0;
    };
    let items = real(buf, size, nmemb, stream);
    if items > 0 && size > 0 && !stream.is_null() && tampering_active() {
        let fd = libc::fileno(stream);
        if fd >= 0 {
            // The valid window is item count x item size.
            tamper_window(fd, buf as *mut u8, size * items);
        }
    }
    items
}

#[no_mangle]
pub unsafe extern "C" fn fgets(s: *mut c_char, size: c_int, stream: *mut FILE) -> *mut c_char {
    let Some(real) = reals::fgets() else {
        set_errno(libc::ENOSYS);
        return ptr::null_mut();
    };
    let line = real(s, size, stream);
    if !line.is_null() && !stream.is_null() && tampering_active() {
        let fd = libc::fileno(stream);
        if fd >= 0 {
            tamper_window(fd, line as *mut u8, libc::strlen(line));
        }
    }
    line
}

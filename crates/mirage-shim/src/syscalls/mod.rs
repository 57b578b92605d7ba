//! One shim per hooked libc API. Every shim performs the real operation
//! first and returns its result (count, pointer, errno) unchanged; tampering
//! only rewrites bytes the real call already certified.

pub mod io;
pub mod open;

pub(crate) fn set_errno(e: libc::c_int) {
    unsafe {
        *libc::__errno_location() = e;
    }
}

/// Shims stay inert until the library constructor has run; after that the
/// process-wide policy decides. Pass-through must be indistinguishable from
/// an unhooked call, so this gate precedes any target inspection.
pub(crate) fn tampering_active() -> bool {
    crate::state::is_ready() && mirage_tamper::TamperPolicy::current().is_enabled()
}

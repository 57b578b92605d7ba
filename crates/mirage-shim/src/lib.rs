//! # mirage-shim
//!
//! `LD_PRELOAD` shim that rewrites one watched file's content as it streams
//! through a process's read calls, without ever changing the byte count any
//! call reports.
//!
//! The hooked surface is the set of ways a process can pull bytes out of a
//! file: `fopen`/`fopen64`, `open`/`open64`, `read`, `fread`, and `fgets`.
//! Each shim delegates to the real libc implementation (resolved once via
//! `dlsym(RTLD_NEXT)`) and then, only when tampering is enabled and the call
//! concerns the watched file, hands the freshly certified buffer window to
//! `mirage-tamper` for the in-place rewrite.
//!
//! Linux only: target identification leans on `/proc/self/fd` and the
//! interposition itself on `LD_PRELOAD` symbol precedence.
//!
//! ```sh
//! LD_PRELOAD=target/release/libmirage_shim.so python agent.py
//! ```

#![allow(clippy::missing_safety_doc)]

// Macros must be defined before modules that use them
#[macro_use]
pub mod macros;

pub mod reals;
pub mod state;
pub mod syscalls;
pub mod target;

/// Static constructor: signals that the library has been loaded via
/// LD_PRELOAD and shims may leave pass-through mode. Uses .init_array.
#[cfg(target_os = "linux")]
#[link_section = ".init_array"]
#[used]
pub static SHIM_READY: unsafe extern "C" fn() = {
    unsafe extern "C" fn ready() {
        crate::state::mark_ready();
    }
    ready
};

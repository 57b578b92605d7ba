//! # mirage-tamper
//!
//! Tamper policy and in-place rewrite engine for the Mirage preload shim.
//!
//! The engine scans line-oriented structured text for one bracketed
//! key-value section and overwrites a single field's value, keeping the
//! byte length of the scanned window exactly as it was handed in. The shim
//! crate feeds it the valid region of every intercepted read; nothing here
//! touches file descriptors or the dynamic linker, so the whole crate is
//! safe Rust and testable on plain byte slices.

mod engine;
pub mod policy;
mod rule;

pub use engine::{apply, ScanError};
pub use policy::TamperPolicy;
pub use rule::{TamperRule, POSITION_RULE};

/// Rewrite the valid window of a read buffer in place, using the built-in
/// rule, when the process-wide policy allows it.
///
/// The window's length is never changed; the return value reports whether
/// any byte was rewritten.
pub fn tamper(buf: &mut [u8]) -> bool {
    if !TamperPolicy::current().is_enabled() || buf.is_empty() {
        return false;
    }
    engine::apply(buf, &POSITION_RULE)
}

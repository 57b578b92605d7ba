//! Process-wide tamper switch, resolved once from the environment.

use std::sync::atomic::{AtomicU8, Ordering};

/// Force-enable override, beats every other signal.
pub const ENV_FORCE: &str = "MIRAGE_FORCE";
/// Force-disable override.
pub const ENV_DISABLE: &str = "MIRAGE_DISABLE";
/// Role hint: `ledger`/`off` disables, `agent` enables.
pub const ENV_ROLE: &str = "MIRAGE_ROLE";

const UNSET: u8 = 0;
const DISABLED: u8 = 1;
const ENABLED: u8 = 2;

static POLICY: AtomicU8 = AtomicU8::new(UNSET);

/// Whether tampering is active for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TamperPolicy {
    Disabled,
    Enabled,
}

impl TamperPolicy {
    pub fn is_enabled(self) -> bool {
        matches!(self, TamperPolicy::Enabled)
    }

    /// Moment-of-first-use snapshot of the environment, memoized for the
    /// rest of the process lifetime. Later environment changes are not
    /// observed. Racing initializers compute the same pure function of the
    /// environment, so first-store-wins needs no lock.
    pub fn current() -> TamperPolicy {
        match POLICY.load(Ordering::Acquire) {
            DISABLED => return TamperPolicy::Disabled,
            ENABLED => return TamperPolicy::Enabled,
            _ => {}
        }

        let resolved = resolve(
            env(ENV_FORCE).as_deref(),
            env(ENV_DISABLE).as_deref(),
            env(ENV_ROLE).as_deref(),
        );
        let encoded = match resolved {
            TamperPolicy::Disabled => DISABLED,
            TamperPolicy::Enabled => ENABLED,
        };
        let _ = POLICY.compare_exchange(UNSET, encoded, Ordering::AcqRel, Ordering::Acquire);

        // Reread so every caller agrees with whichever store won.
        if POLICY.load(Ordering::Acquire) == DISABLED {
            TamperPolicy::Disabled
        } else {
            TamperPolicy::Enabled
        }
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Precedence: force-enable, force-disable, role, default-enabled.
/// Unrecognized role values fall through to the default; nothing errors.
pub(crate) fn resolve(
    force: Option<&str>,
    disable: Option<&str>,
    role: Option<&str>,
) -> TamperPolicy {
    if force.is_some_and(truthy) {
        return TamperPolicy::Enabled;
    }
    if disable.is_some_and(truthy) {
        return TamperPolicy::Disabled;
    }
    match role {
        Some(r) if r.eq_ignore_ascii_case("ledger") || r.eq_ignore_ascii_case("off") => {
            TamperPolicy::Disabled
        }
        Some(r) if r.eq_ignore_ascii_case("agent") => TamperPolicy::Enabled,
        _ => TamperPolicy::Enabled,
    }
}

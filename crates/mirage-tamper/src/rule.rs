/// A single (section, field, replacement) rewrite directive.
///
/// The engine applies exactly one rule per process; the type exists so the
/// scan logic carries no embedded literals and so tests can exercise other
/// shapes.
#[derive(Debug, Clone, Copy)]
pub struct TamperRule {
    /// Name of the quoted section whose bracketed body is scanned.
    pub section: &'static str,
    /// Field key inside the section whose value gets rewritten.
    pub field: &'static str,
    /// Canonical replacement text written over the value span.
    pub text: &'static str,
    /// Numeric reading of `text`; values already equal are left alone.
    pub value: f64,
}

/// The rule this build ships: pin the NVDA position to 20.
pub const POSITION_RULE: TamperRule = TamperRule {
    section: "positions",
    field: "NVDA",
    text: "20",
    value: 20.0,
};

// 🔐 Clearance Gate - who may read what
//
// Pure comparison: a caller at level C may read a record at level R iff C >= R.
// No parsing, no state. Collaborators turn headers into levels with
// `caller_level_from_header` before asking the gate.

/// Lowest clearance. Used for callers that declare nothing and for legacy
/// records stored without a level.
pub const DEFAULT_ACCESS_LEVEL: i64 = 1;

/// Conventional upper bound for record levels.
pub const MAX_ACCESS_LEVEL: i64 = 9;

// ============================================================================
// DECISION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Carries both levels so the caller can explain the refusal.
    Deny { required: i64, provided: i64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Compare a caller's clearance against a record's required level.
///
/// Total over all integer pairs, including levels outside 1-9.
pub fn authorize(caller_level: i64, required_level: i64) -> Decision {
    if caller_level >= required_level {
        Decision::Allow
    } else {
        Decision::Deny {
            required: required_level,
            provided: caller_level,
        }
    }
}

/// Turn a raw header value into a caller level.
///
/// Absent or unparsable values fall back to `DEFAULT_ACCESS_LEVEL`. The value
/// is trusted as-is otherwise; there is no identity check behind it.
pub fn caller_level_from_header(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_ACCESS_LEVEL)
}

//! The gate: which mutating register actions are permitted for a date.
//!
//! A pure decision over (date vs today, cached status, unknown-status
//! policy). No clock, no network, no stored state. The rules:
//!
//! - any future date is inert: nothing can be dated ahead;
//! - any past date is read-only regardless of its own historical status
//!   (prior days' financial records are never mutated retroactively);
//! - today is operable only while not closed.
//!
//! The decision is a derived view. It is recomputed after every cache
//! refresh and date change and emitted to the shell, never stored.

use serde::Serialize;

use crate::register::RegisterStatus;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// What to do when the backend cannot report a status for today.
///
/// `Permissive` treats an unknown status as open (the shop has always run
/// this way); `ReadOnly` refuses to operate blind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownPolicy {
    #[default]
    Permissive,
    ReadOnly,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Why the gate denied an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    FutureDate,
    NotToday,
    AlreadyClosed,
    StatusUnavailable,
}

/// The permission set for one date, plus a short label for the register
/// banner/button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub can_record_expense: bool,
    pub can_record_income: bool,
    pub can_close: bool,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
}

impl GateDecision {
    fn open() -> Self {
        Self {
            can_record_expense: true,
            can_record_income: true,
            can_close: true,
            label: "open",
            denial: None,
        }
    }

    fn denied(label: &'static str, reason: DenialReason) -> Self {
        Self {
            can_record_expense: false,
            can_record_income: false,
            can_close: false,
            label,
            denial: Some(reason),
        }
    }
}

/// Evaluate the gate for `date`, given `today` (both `YYYY-MM-DD`).
///
/// `today` is an argument rather than a clock read so the decision stays
/// a pure function; callers pass `dates::today_local()`.
pub fn evaluate(
    date: &str,
    today: &str,
    status: RegisterStatus,
    policy: UnknownPolicy,
) -> GateDecision {
    if date > today {
        return GateDecision::denied("future date", DenialReason::FutureDate);
    }

    if date < today {
        return match status {
            RegisterStatus::Closed => {
                GateDecision::denied("closed (read-only)", DenialReason::NotToday)
            }
            _ => GateDecision::denied("read-only (past)", DenialReason::NotToday),
        };
    }

    // date == today
    match status {
        RegisterStatus::Closed => GateDecision::denied("closed", DenialReason::AlreadyClosed),
        RegisterStatus::Unknown if policy == UnknownPolicy::ReadOnly => {
            GateDecision::denied("status unavailable", DenialReason::StatusUnavailable)
        }
        _ => GateDecision::open(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

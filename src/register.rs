//! Register ("caja") day state: the per-date status snapshot and its
//! read-through cache.
//!
//! The backend is the single source of truth for whether a day's register
//! is open or closed; the client only caches snapshots per date. Entries
//! have no TTL; they live until force-refreshed or overwritten. Refreshes
//! are fenced with a monotonic per-date ticket so that when two refreshes
//! for the same date interleave, the response of the older request can
//! never overwrite the newer one.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::backend::RegisterBackend;

/// Wire token for an open register day.
pub const ESTADO_ABIERTA: &str = "ABIERTA";
/// Wire token for a closed register day.
pub const ESTADO_CERRADA: &str = "CERRADA";

// ---------------------------------------------------------------------------
// Status snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
    /// The backend could not report a status (both queries failed or
    /// neither carried a status field).
    Unknown,
}

impl RegisterStatus {
    /// Map a wire `estado` to a status. Anything that is not one of the
    /// two known tokens (including absence) is `Unknown`.
    pub fn from_wire(estado: Option<&str>) -> Self {
        match estado {
            Some(ESTADO_CERRADA) => Self::Closed,
            Some(ESTADO_ABIERTA) => Self::Open,
            _ => Self::Unknown,
        }
    }

    /// The wire token, when the status has one.
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            Self::Open => Some(ESTADO_ABIERTA),
            Self::Closed => Some(ESTADO_CERRADA),
            Self::Unknown => None,
        }
    }
}

/// Last-known reconciliation state of one calendar date. The date is the
/// identity; snapshots are replaced whole, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterDay {
    pub date: String,
    pub status: RegisterStatus,
    /// Set only when `status` is `Closed`.
    pub closed_at: Option<String>,
}

impl RegisterDay {
    pub fn unknown(date: &str) -> Self {
        Self {
            date: date.to_string(),
            status: RegisterStatus::Unknown,
            closed_at: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == RegisterStatus::Closed
    }

    /// Wire-shaped JSON for the command layer.
    pub fn to_wire(&self) -> Value {
        json!({
            "fecha": self.date,
            "estado": self.status.as_wire(),
            "cerradaEn": self.closed_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DaySlot {
    snapshot: Option<RegisterDay>,
    /// Highest refresh ticket handed out for this date.
    last_issued: u64,
}

/// In-memory per-date status cache. Session-scoped, no expiry.
#[derive(Default)]
pub struct StatusCache {
    slots: Mutex<HashMap<String, DaySlot>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached snapshot for a date, if any. Never queries the backend.
    pub fn peek(&self, date: &str) -> Option<RegisterDay> {
        let slots = self.slots.lock().expect("status cache poisoned");
        slots.get(date).and_then(|s| s.snapshot.clone())
    }

    /// Store a snapshot obtained outside a refresh (a close receipt, or a
    /// status that rode along on another endpoint). Also bumps the ticket
    /// so any refresh already in flight for this date lands stale.
    pub fn store(&self, snapshot: RegisterDay) {
        let mut slots = self.slots.lock().expect("status cache poisoned");
        let slot = slots.entry(snapshot.date.clone()).or_default();
        slot.last_issued += 1;
        slot.snapshot = Some(snapshot);
    }

    fn issue_ticket(&self, date: &str) -> u64 {
        let mut slots = self.slots.lock().expect("status cache poisoned");
        let slot = slots.entry(date.to_string()).or_default();
        slot.last_issued += 1;
        slot.last_issued
    }

    /// Apply a refresh result if its ticket is still the latest issued for
    /// the date. Returns false when the response lost the race.
    fn apply(&self, date: &str, ticket: u64, snapshot: RegisterDay) -> bool {
        let mut slots = self.slots.lock().expect("status cache poisoned");
        let slot = slots.entry(date.to_string()).or_default();
        if ticket < slot.last_issued {
            return false;
        }
        slot.snapshot = Some(snapshot);
        true
    }

    /// Read-through lookup. Returns the cached snapshot unless `force` is
    /// set or nothing is cached, in which case the backend is queried and
    /// the result (`Unknown` included) is cached before returning.
    ///
    /// Never fails: an unreachable backend yields an `Unknown` snapshot,
    /// and the gate decides what that means.
    pub async fn get_status(
        &self,
        backend: &dyn RegisterBackend,
        date: &str,
        force: bool,
    ) -> RegisterDay {
        if !force {
            if let Some(snapshot) = self.peek(date) {
                return snapshot;
            }
        }

        let ticket = self.issue_ticket(date);
        let snapshot = resolve_status(backend, date).await;

        if self.apply(date, ticket, snapshot.clone()) {
            snapshot
        } else {
            debug!(fecha = %date, ticket, "stale status response dropped");
            // A newer refresh or direct store won the race; hand back
            // whatever is current now.
            self.peek(date).unwrap_or(snapshot)
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution strategy
// ---------------------------------------------------------------------------

/// Resolve a date's status: the dedicated meta endpoint first; when it
/// fails or carries no status, the income summary (which may embed
/// `estado`); when both come up empty, `Unknown`.
async fn resolve_status(backend: &dyn RegisterBackend, date: &str) -> RegisterDay {
    match backend.fetch_register_meta(date).await {
        Ok(meta) if meta.estado.is_some() => {
            return RegisterDay {
                date: date.to_string(),
                status: RegisterStatus::from_wire(meta.estado.as_deref()),
                closed_at: meta.cerrada_en,
            };
        }
        Ok(_) => {
            debug!(fecha = %date, "register meta carried no status, trying income summary");
        }
        Err(err) => {
            warn!(fecha = %date, error = %err, "register meta query failed, trying income summary");
        }
    }

    match backend.fetch_income_summary(date).await {
        Ok(income) if income.estado.is_some() => RegisterDay {
            date: date.to_string(),
            status: RegisterStatus::from_wire(income.estado.as_deref()),
            closed_at: income.cerrada_en,
        },
        Ok(_) => RegisterDay::unknown(date),
        Err(err) => {
            warn!(fecha = %date, error = %err, "status unavailable from both endpoints");
            RegisterDay::unknown(date)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

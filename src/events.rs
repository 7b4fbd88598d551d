//! UI events emitted to whatever renders the POS.
//!
//! The core never touches a rendering surface. Workflows emit events and
//! the embedding shell decides how to draw them: enable/disable buttons
//! from `GateChanged`/`ActionPending`, toast on `Notice`, repaint tables
//! on the load events. Emission is fire-and-forget: a sink must never
//! fail or block a workflow.

use serde::Serialize;

use crate::backend::{
    CategoryTotals, ExpenseRow, HistoricalSummary, IncomeSummary, LedgerRow,
};
use crate::gate::GateDecision;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// User-triggered operations that hold an in-flight guard. While one is
/// pending the shell should disable its control (`ActionPending`), and a
/// duplicate invocation is rejected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserAction {
    RecordExpense,
    RecordDeliveryIncome,
    CloseRegister,
    RecordLedgerExpense,
    RefreshHistorical,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordExpense => "record-expense",
            Self::RecordDeliveryIncome => "record-delivery-income",
            Self::CloseRegister => "close-register",
            Self::RecordLedgerExpense => "record-ledger-expense",
            Self::RefreshHistorical => "refresh-historical",
        }
    }
}

/// Input forms the shell should clear after a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Expense,
    DeliveryIncome,
    LedgerExpense,
}

/// Notification severity for `Notice` events (the toast analog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum UiEvent {
    /// The permission set for a date changed (cache refresh/date change).
    GateChanged {
        fecha: String,
        decision: GateDecision,
    },
    IncomeSummaryLoaded {
        fecha: String,
        summary: IncomeSummary,
    },
    ExpensesLoaded {
        fecha: String,
        rows: Vec<ExpenseRow>,
    },
    BalanceUpdated {
        fecha: String,
        balance: f64,
    },
    /// The register for a date was closed in this session.
    RegisterClosed {
        fecha: String,
        cerrada_en: Option<String>,
        balance_final: Option<f64>,
    },
    /// A guarded action went in or out of flight.
    ActionPending {
        action: UserAction,
        pending: bool,
    },
    FormCleared {
        form: FormKind,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
    HistoricalSummaryLoaded {
        summary: HistoricalSummary,
    },
    LedgerTotalsLoaded {
        totals: CategoryTotals,
    },
    LedgerDailyLoaded {
        rows: Vec<LedgerRow>,
    },
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

pub trait EventSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

/// Discards every event. For headless use and as the default sink.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: UiEvent) {}
}

/// Buffers events for shells that poll each frame instead of subscribing.
#[derive(Debug, Default)]
pub struct BufferedSink {
    events: std::sync::Mutex<Vec<UiEvent>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything emitted since the last drain, in emission order.
    pub fn drain(&self) -> Vec<UiEvent> {
        std::mem::take(&mut *self.events.lock().expect("event buffer poisoned"))
    }
}

impl EventSink for BufferedSink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().expect("event buffer poisoned").push(event);
    }
}

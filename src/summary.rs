//! Read-side loaders: the per-date register view and the all-time
//! accumulated summary.
//!
//! These never mutate anything on the backend, but loading the income
//! summary can refresh the status cache as a side effect when the server
//! embeds `estado` in that response (it saves the shell a meta query).

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{ExpenseRow, HistoricalSummary, IncomeSummary};
use crate::context::PosContext;
use crate::dates;
use crate::error::RegisterError;
use crate::events::{NoticeLevel, UiEvent, UserAction};
use crate::gate::{self, DenialReason, GateDecision};
use crate::register::{RegisterDay, RegisterStatus};

// ---------------------------------------------------------------------------
// Per-date loaders
// ---------------------------------------------------------------------------

/// Load income totals for a date. When the response carries `estado`, the
/// cache entry for the date is replaced so a separate meta query is not
/// needed.
pub async fn load_income_summary(
    ctx: &PosContext,
    date: &str,
) -> Result<IncomeSummary, RegisterError> {
    let summary = ctx
        .backend()
        .fetch_income_summary(date)
        .await
        .map_err(RegisterError::Backend)?;

    if summary.estado.is_some() {
        ctx.cache().store(RegisterDay {
            date: date.to_string(),
            status: RegisterStatus::from_wire(summary.estado.as_deref()),
            closed_at: summary.cerrada_en.clone(),
        });
    }

    ctx.emit(UiEvent::IncomeSummaryLoaded {
        fecha: date.to_string(),
        summary: summary.clone(),
    });
    Ok(summary)
}

/// Load the register-day expense rows for a date.
pub async fn load_expenses(ctx: &PosContext, date: &str) -> Result<Vec<ExpenseRow>, RegisterError> {
    let rows = ctx
        .backend()
        .fetch_expenses(date)
        .await
        .map_err(RegisterError::Backend)?;

    ctx.emit(UiEvent::ExpensesLoaded {
        fecha: date.to_string(),
        rows: rows.clone(),
    });
    Ok(rows)
}

/// Load the authoritative balance for a date. The backend owns the
/// aggregation and rounding; the client never recomputes this from rows.
pub async fn load_balance(ctx: &PosContext, date: &str) -> Result<f64, RegisterError> {
    let snapshot = ctx
        .backend()
        .fetch_balance(date)
        .await
        .map_err(RegisterError::Backend)?;

    ctx.emit(UiEvent::BalanceUpdated {
        fecha: date.to_string(),
        balance: snapshot.balance,
    });
    Ok(snapshot.balance)
}

// ---------------------------------------------------------------------------
// Date-selector workflow
// ---------------------------------------------------------------------------

/// Everything the register screen shows for one date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub fecha: String,
    pub fecha_visual: String,
    pub estado: Option<&'static str>,
    pub cerrada_en: Option<String>,
    pub gate: GateDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingresos: Option<IncomeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egresos: Option<Vec<ExpenseRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

/// Switch the register view to a date: force-refresh its status, emit the
/// gate, then load income, expenses, and balance concurrently. A loader
/// failing does not abort the others; its slice of the view is just
/// absent (and logged).
pub async fn view_date(ctx: &PosContext, date: &str) -> Result<DayView, RegisterError> {
    let today = dates::today_local();

    if date > today.as_str() {
        // Still reflect the inert gate so the shell disables its controls.
        let decision = gate::evaluate(date, &today, RegisterStatus::Unknown, ctx.config().unknown_policy);
        ctx.emit(UiEvent::GateChanged {
            fecha: date.to_string(),
            decision,
        });
        let message = "No podés buscar una fecha futura.".to_string();
        ctx.emit(UiEvent::Notice {
            level: NoticeLevel::Error,
            message: message.clone(),
        });
        return Err(RegisterError::not_permitted(DenialReason::FutureDate, message));
    }

    let day = ctx.cache().get_status(ctx.backend(), date, true).await;
    let decision = gate::evaluate(date, &today, day.status, ctx.config().unknown_policy);
    ctx.emit(UiEvent::GateChanged {
        fecha: date.to_string(),
        decision,
    });

    let (ingresos, egresos, balance) = tokio::join!(
        load_income_summary(ctx, date),
        load_expenses(ctx, date),
        load_balance(ctx, date),
    );

    for err in [
        ingresos.as_ref().err(),
        egresos.as_ref().err(),
        balance.as_ref().err(),
    ]
    .into_iter()
    .flatten()
    {
        warn!(fecha = %date, error = %err, "day view loader failed");
    }

    // The income loader may have refreshed the cached status; report the
    // freshest snapshot.
    let day = ctx.cache().peek(date).unwrap_or(day);

    Ok(DayView {
        fecha: date.to_string(),
        fecha_visual: dates::display_date(date),
        estado: day.status.as_wire(),
        cerrada_en: day.closed_at,
        gate: gate::evaluate(date, &today, day.status, ctx.config().unknown_policy),
        ingresos: ingresos.ok(),
        egresos: egresos.ok(),
        balance: balance.ok(),
    })
}

// ---------------------------------------------------------------------------
// Accumulated summary
// ---------------------------------------------------------------------------

/// Load the all-time accumulated summary. A 204 from the backend means
/// "nothing recorded yet" and yields a zeroed summary flagged `empty`.
/// Guarded: overlapping refreshes are rejected as busy.
pub async fn load_historical_summary(ctx: &PosContext) -> Result<HistoricalSummary, RegisterError> {
    let _guard = ctx.try_begin(UserAction::RefreshHistorical)?;

    let summary = match ctx.backend().fetch_historical_summary().await {
        Ok(Some(summary)) => summary,
        Ok(None) => {
            info!("accumulated summary: no data yet");
            HistoricalSummary::no_data()
        }
        Err(err) => {
            ctx.emit(UiEvent::Notice {
                level: NoticeLevel::Error,
                message: "No se pudo cargar el resumen histórico.".into(),
            });
            return Err(RegisterError::Backend(err));
        }
    };

    ctx.emit(UiEvent::HistoricalSummaryLoaded {
        summary: summary.clone(),
    });
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The mutating register workflows: record an expense, record
//! third-party-delivery income, close the day.
//!
//! All three follow the same protocol: claim the in-flight guard,
//! force-refresh the date's status and re-run the gate (a stale gate
//! decision is never trusted; another terminal may have closed the day
//! in the meantime), validate the entry locally, then submit exactly one
//! request. A denied gate or failed validation produces zero calls to the
//! mutating endpoint. Nothing is retried automatically.

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{DeliveryIncomeEntry, ExpenseEntry};
use crate::context::PosContext;
use crate::dates;
use crate::error::RegisterError;
use crate::events::{FormKind, NoticeLevel, UiEvent, UserAction};
use crate::gate::{self, DenialReason};
use crate::register::{RegisterDay, RegisterStatus};
use crate::summary;

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Expense form contents as typed by the user. `fecha` defaults to today.
#[derive(Debug, Clone, Default)]
pub struct ExpenseDraft {
    pub fecha: Option<String>,
    pub descripcion: String,
    pub monto: f64,
}

/// Delivery-platform income form contents.
#[derive(Debug, Clone, Default)]
pub struct DeliveryIncomeDraft {
    pub fecha: Option<String>,
    pub monto: f64,
}

/// What closing the day produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseOutcome {
    pub fecha: String,
    pub cerrada_en: Option<String>,
    pub balance_final: Option<f64>,
}

// ---------------------------------------------------------------------------
// Shared protocol pieces
// ---------------------------------------------------------------------------

/// The toast text for a denial, per action (the shop UI speaks Spanish).
fn denial_message(action: UserAction, reason: DenialReason) -> String {
    match reason {
        DenialReason::FutureDate => match action {
            UserAction::CloseRegister => "No podés cerrar una fecha futura.".into(),
            _ => "No podés operar una fecha futura.".into(),
        },
        DenialReason::NotToday => match action {
            UserAction::RecordExpense => "Solo podés registrar egresos en el día de hoy.".into(),
            UserAction::RecordDeliveryIncome => {
                "Solo podés cargar PedidosYa en el día de hoy.".into()
            }
            _ => "Solo podés cerrar la caja del día de hoy.".into(),
        },
        DenialReason::AlreadyClosed => match action {
            UserAction::CloseRegister => "La caja ya está cerrada.".into(),
            _ => "La caja de hoy está cerrada.".into(),
        },
        DenialReason::StatusUnavailable => "No se pudo verificar el estado de la caja.".into(),
    }
}

fn deny(ctx: &PosContext, action: UserAction, reason: DenialReason) -> RegisterError {
    let message = denial_message(action, reason);
    ctx.emit(UiEvent::Notice {
        level: NoticeLevel::Error,
        message: message.clone(),
    });
    RegisterError::not_permitted(reason, message)
}

fn reject_field(ctx: &PosContext, field: &'static str, message: &str) -> RegisterError {
    ctx.emit(UiEvent::Notice {
        level: NoticeLevel::Error,
        message: message.to_string(),
    });
    RegisterError::validation(field, message)
}

fn validate_date(ctx: &PosContext, fecha: &str) -> Result<(), RegisterError> {
    if dates::parse_date(fecha).is_none() {
        return Err(reject_field(ctx, "fecha", &format!("Fecha inválida: {fecha}")));
    }
    Ok(())
}

/// Steps 2–3 of the protocol: cheap local date rejections first (a future
/// or past date can never become operable, so no network), then a forced
/// status refresh and a fresh gate decision.
async fn ensure_permitted(
    ctx: &PosContext,
    fecha: &str,
    action: UserAction,
) -> Result<(), RegisterError> {
    let today = dates::today_local();

    if fecha > today.as_str() {
        return Err(deny(ctx, action, DenialReason::FutureDate));
    }
    if fecha < today.as_str() {
        return Err(deny(ctx, action, DenialReason::NotToday));
    }

    let day = ctx.cache().get_status(ctx.backend(), fecha, true).await;
    let decision = gate::evaluate(fecha, &today, day.status, ctx.config().unknown_policy);
    ctx.emit(UiEvent::GateChanged {
        fecha: fecha.to_string(),
        decision,
    });

    let allowed = match action {
        UserAction::RecordExpense => decision.can_record_expense,
        UserAction::RecordDeliveryIncome => decision.can_record_income,
        UserAction::CloseRegister => decision.can_close,
        _ => true,
    };
    if !allowed {
        let reason = decision.denial.unwrap_or(DenialReason::StatusUnavailable);
        return Err(deny(ctx, action, reason));
    }
    Ok(())
}

/// Step 6 of the protocol: the backend changed, so the cached status and
/// the gate shown to the user must be re-derived.
async fn refresh_gate(ctx: &PosContext, fecha: &str) {
    let day = ctx.cache().get_status(ctx.backend(), fecha, true).await;
    let decision = gate::evaluate(
        fecha,
        &dates::today_local(),
        day.status,
        ctx.config().unknown_policy,
    );
    ctx.emit(UiEvent::GateChanged {
        fecha: fecha.to_string(),
        decision,
    });
}

// ---------------------------------------------------------------------------
// Expense
// ---------------------------------------------------------------------------

pub async fn record_expense(ctx: &PosContext, draft: ExpenseDraft) -> Result<(), RegisterError> {
    let fecha = dates::or_today(draft.fecha.as_deref());
    let _guard = ctx.try_begin(UserAction::RecordExpense)?;

    validate_date(ctx, &fecha)?;
    ensure_permitted(ctx, &fecha, UserAction::RecordExpense).await?;

    let descripcion = draft.descripcion.trim();
    if descripcion.is_empty() {
        return Err(reject_field(
            ctx,
            "descripcion",
            "Poné una descripción para el egreso.",
        ));
    }
    if !draft.monto.is_finite() || draft.monto <= 0.0 {
        return Err(reject_field(ctx, "monto", "El monto tiene que ser mayor a 0."));
    }

    let entry = ExpenseEntry {
        descripcion: descripcion.to_string(),
        monto: draft.monto,
        fecha: fecha.clone(),
    };

    if let Err(err) = ctx.backend().submit_expense(&entry).await {
        warn!(fecha = %fecha, error = %err, "expense submission failed");
        ctx.emit(UiEvent::Notice {
            level: NoticeLevel::Error,
            message: "No se pudo registrar el egreso.".into(),
        });
        return Err(RegisterError::Backend(err));
    }

    info!(fecha = %fecha, monto = entry.monto, "expense recorded");
    ctx.emit(UiEvent::FormCleared {
        form: FormKind::Expense,
    });
    ctx.emit(UiEvent::Notice {
        level: NoticeLevel::Success,
        message: "Egreso registrado".into(),
    });

    refresh_gate(ctx, &fecha).await;
    let _ = tokio::join!(
        summary::load_expenses(ctx, &fecha),
        summary::load_balance(ctx, &fecha),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Third-party-delivery income
// ---------------------------------------------------------------------------

pub async fn record_delivery_income(
    ctx: &PosContext,
    draft: DeliveryIncomeDraft,
) -> Result<(), RegisterError> {
    let fecha = dates::or_today(draft.fecha.as_deref());
    let _guard = ctx.try_begin(UserAction::RecordDeliveryIncome)?;

    validate_date(ctx, &fecha)?;
    ensure_permitted(ctx, &fecha, UserAction::RecordDeliveryIncome).await?;

    if !draft.monto.is_finite() || draft.monto <= 0.0 {
        return Err(reject_field(ctx, "monto", "El monto tiene que ser mayor a 0."));
    }

    let entry = DeliveryIncomeEntry {
        fecha: fecha.clone(),
        monto: draft.monto,
    };

    if let Err(err) = ctx.backend().submit_delivery_income(&entry).await {
        warn!(fecha = %fecha, error = %err, "delivery income submission failed");
        ctx.emit(UiEvent::Notice {
            level: NoticeLevel::Error,
            message: "No se pudo registrar PedidosYa.".into(),
        });
        return Err(RegisterError::Backend(err));
    }

    info!(fecha = %fecha, monto = entry.monto, "delivery income recorded");
    ctx.emit(UiEvent::FormCleared {
        form: FormKind::DeliveryIncome,
    });
    ctx.emit(UiEvent::Notice {
        level: NoticeLevel::Success,
        message: "PedidosYa registrado".into(),
    });

    refresh_gate(ctx, &fecha).await;
    let _ = tokio::join!(
        summary::load_income_summary(ctx, &fecha),
        summary::load_balance(ctx, &fecha),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

/// Close the register for a date (today, in practice; the gate enforces
/// it). Terminal: there is no reopen operation anywhere in this crate.
pub async fn close_register(
    ctx: &PosContext,
    fecha: Option<String>,
) -> Result<CloseOutcome, RegisterError> {
    let fecha = dates::or_today(fecha.as_deref());
    let _guard = ctx.try_begin(UserAction::CloseRegister)?;

    validate_date(ctx, &fecha)?;
    ensure_permitted(ctx, &fecha, UserAction::CloseRegister).await?;

    let receipt = match ctx.backend().close_register(&fecha).await {
        Ok(receipt) => receipt,
        Err(err) => {
            warn!(fecha = %fecha, error = %err, "register close failed");
            ctx.emit(UiEvent::Notice {
                level: NoticeLevel::Error,
                message: "No se pudo cerrar la caja.".into(),
            });
            return Err(RegisterError::Backend(err));
        }
    };

    // Trust the receipt when it reports the new state; otherwise ask again.
    if receipt.estado.is_some() {
        ctx.cache().store(RegisterDay {
            date: fecha.clone(),
            status: RegisterStatus::from_wire(receipt.estado.as_deref()),
            closed_at: receipt.cerrada_en.clone(),
        });
    } else {
        ctx.cache().get_status(ctx.backend(), &fecha, true).await;
    }

    // The server's final balance wins; only re-query when it sent none.
    // The client never aggregates entries itself.
    let balance_final = match receipt.balance_final {
        Some(balance) => {
            ctx.emit(UiEvent::BalanceUpdated {
                fecha: fecha.clone(),
                balance,
            });
            Some(balance)
        }
        None => summary::load_balance(ctx, &fecha).await.ok(),
    };

    let today = dates::today_local();
    let day = ctx
        .cache()
        .peek(&fecha)
        .unwrap_or_else(|| RegisterDay::unknown(&fecha));
    ctx.emit(UiEvent::GateChanged {
        fecha: fecha.clone(),
        decision: gate::evaluate(&fecha, &today, day.status, ctx.config().unknown_policy),
    });
    ctx.emit(UiEvent::RegisterClosed {
        fecha: fecha.clone(),
        cerrada_en: receipt.cerrada_en.clone(),
        balance_final,
    });

    info!(fecha = %fecha, balance_final = ?balance_final, "register closed");
    Ok(CloseOutcome {
        fecha,
        cerrada_en: receipt.cerrada_en,
        balance_final,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

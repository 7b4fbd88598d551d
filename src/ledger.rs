//! The categorized expense ledger (personal / producción / día a día).
//!
//! Independent of the register day: ledger entries are not date-gated, so
//! there is no status check here, only field validation and the usual
//! in-flight guard on the save button. Amounts are rounded to 2 decimals
//! before submission; the backend owns all aggregation.

use tracing::{info, warn};

use crate::backend::{
    CategoryMonthStat, CategoryPage, CategoryTotals, ExpenseCategory, LedgerExpenseEntry,
    LedgerRow,
};
use crate::context::PosContext;
use crate::error::RegisterError;
use crate::events::{FormKind, NoticeLevel, UiEvent, UserAction};

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

/// Accumulated totals per category (the KPI cards).
pub async fn load_totals(ctx: &PosContext) -> Result<CategoryTotals, RegisterError> {
    let totals = ctx
        .backend()
        .fetch_ledger_totals()
        .await
        .map_err(RegisterError::Backend)?;
    ctx.emit(UiEvent::LedgerTotalsLoaded {
        totals: totals.clone(),
    });
    Ok(totals)
}

/// Recent activity (the daily table).
pub async fn load_daily(ctx: &PosContext) -> Result<Vec<LedgerRow>, RegisterError> {
    let rows = ctx
        .backend()
        .fetch_ledger_daily()
        .await
        .map_err(RegisterError::Backend)?;
    ctx.emit(UiEvent::LedgerDailyLoaded { rows: rows.clone() });
    Ok(rows)
}

/// One page of a category's history.
pub async fn load_category_page(
    ctx: &PosContext,
    category: ExpenseCategory,
    page: u32,
    size: u32,
) -> Result<CategoryPage, RegisterError> {
    ctx.backend()
        .fetch_ledger_page(category, page, size)
        .await
        .map_err(RegisterError::Backend)
}

/// Current-month totals and percent change per category.
pub async fn load_percentages(ctx: &PosContext) -> Result<Vec<CategoryMonthStat>, RegisterError> {
    ctx.backend()
        .fetch_ledger_percentages()
        .await
        .map_err(RegisterError::Backend)
}

// ---------------------------------------------------------------------------
// Write side
// ---------------------------------------------------------------------------

/// Ledger expense form contents. A missing/unknown category lands in
/// `Otros`, like everywhere else the category appears.
#[derive(Debug, Clone, Default)]
pub struct LedgerDraft {
    pub tipo_egreso: Option<String>,
    pub descripcion: String,
    pub monto: f64,
}

pub async fn record_ledger_expense(
    ctx: &PosContext,
    draft: LedgerDraft,
) -> Result<(), RegisterError> {
    let _guard = ctx.try_begin(UserAction::RecordLedgerExpense)?;

    let descripcion = draft.descripcion.trim();
    if descripcion.is_empty() {
        let message = "Poné un detalle (obligatorio).";
        ctx.emit(UiEvent::Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
        return Err(RegisterError::validation("descripcion", message));
    }
    if !draft.monto.is_finite() || draft.monto <= 0.0 {
        let message = "El monto tiene que ser mayor a 0.";
        ctx.emit(UiEvent::Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
        return Err(RegisterError::validation("monto", message));
    }

    let category = ExpenseCategory::from_wire(draft.tipo_egreso.as_deref());
    let entry = LedgerExpenseEntry {
        tipo_egreso: category.as_wire().to_string(),
        descripcion: descripcion.to_string(),
        // Two decimals on the wire; the backend re-validates anyway.
        monto: (draft.monto * 100.0).round() / 100.0,
    };

    if let Err(err) = ctx.backend().submit_ledger_expense(&entry).await {
        warn!(categoria = category.as_wire(), error = %err, "ledger expense submission failed");
        ctx.emit(UiEvent::Notice {
            level: NoticeLevel::Error,
            message: "No se pudo guardar el egreso.".into(),
        });
        return Err(RegisterError::Backend(err));
    }

    info!(categoria = category.as_wire(), monto = entry.monto, "ledger expense recorded");
    ctx.emit(UiEvent::FormCleared {
        form: FormKind::LedgerExpense,
    });
    ctx.emit(UiEvent::Notice {
        level: NoticeLevel::Success,
        message: "Egreso guardado".into(),
    });

    // Refresh what the screen shows; per-category pages are re-requested
    // by the shell, which knows which page it is on.
    let _ = tokio::join!(load_totals(ctx), load_daily(ctx));
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;
    use crate::config::PosConfig;
    use crate::events::BufferedSink;
    use std::sync::Arc;

    fn context_with(backend: MockBackend) -> (PosContext, Arc<BufferedSink>, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let sink = Arc::new(BufferedSink::new());
        let ctx = PosContext::new(
            PosConfig::default(),
            Arc::clone(&backend) as Arc<dyn crate::backend::RegisterBackend>,
            Arc::clone(&sink) as Arc<dyn crate::events::EventSink>,
        );
        (ctx, sink, backend)
    }

    fn draft(tipo: Option<&str>, descripcion: &str, monto: f64) -> LedgerDraft {
        LedgerDraft {
            tipo_egreso: tipo.map(|s| s.to_string()),
            descripcion: descripcion.into(),
            monto,
        }
    }

    #[tokio::test]
    async fn test_record_rounds_amount_to_two_decimals() {
        let (ctx, _sink, backend) = context_with(MockBackend::new());

        record_ledger_expense(&ctx, draft(Some("PERSONAL"), "sueldo", 123.456))
            .await
            .unwrap();

        let sent = backend.ledger_submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].monto, 123.46);
        assert_eq!(sent[0].tipo_egreso, "PERSONAL");
    }

    #[tokio::test]
    async fn test_record_defaults_unknown_category_to_otros() {
        let (ctx, _sink, backend) = context_with(MockBackend::new());

        record_ledger_expense(&ctx, draft(None, "bolsas", 50.0))
            .await
            .unwrap();
        record_ledger_expense(&ctx, draft(Some("???"), "cinta", 20.0))
            .await
            .unwrap();

        let sent = backend.ledger_submissions();
        assert!(sent.iter().all(|e| e.tipo_egreso == "OTROS"));
    }

    #[tokio::test]
    async fn test_record_validates_before_submitting() {
        let (ctx, _sink, backend) = context_with(MockBackend::new());

        let err = record_ledger_expense(&ctx, draft(None, "  ", 10.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Poné un detalle (obligatorio).");

        let err = record_ledger_expense(&ctx, draft(None, "bolsas", 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "El monto tiene que ser mayor a 0.");

        assert!(backend.ledger_submissions().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_keeps_form() {
        let backend = MockBackend::new();
        backend.fail_submit_ledger("HTTP 500");
        let (ctx, sink, _backend) = context_with(backend);

        let err = record_ledger_expense(&ctx, draft(Some("PRODUCCION"), "carne", 8000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::Backend(_)));

        let events = sink.drain();
        assert!(!events
            .iter()
            .any(|e| matches!(e, UiEvent::FormCleared { .. })));
    }

    #[tokio::test]
    async fn test_record_success_reloads_totals_and_daily() {
        let backend = MockBackend::new();
        backend.script_ledger_totals(CategoryTotals {
            total_personal: 100.0,
            total_produccion: 200.0,
            total_otros: 50.0,
        });
        let (ctx, sink, _backend) = context_with(backend);

        record_ledger_expense(&ctx, draft(Some("PERSONAL"), "sueldo", 100.0))
            .await
            .unwrap();

        let events = sink.drain();
        assert!(events.iter().any(
            |e| matches!(e, UiEvent::LedgerTotalsLoaded { totals } if totals.total_produccion == 200.0)
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, UiEvent::LedgerDailyLoaded { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            UiEvent::FormCleared {
                form: FormKind::LedgerExpense
            }
        )));
    }

    #[tokio::test]
    async fn test_category_page_passes_through() {
        let backend = MockBackend::new();
        backend.script_ledger_page(CategoryPage {
            content: vec![LedgerRow {
                tipo_egreso: Some("PERSONAL".into()),
                descripcion: "sueldo".into(),
                monto: 100.0,
                creado_en: Some("2026-08-01T10:00:00".into()),
            }],
            total_pages: 3,
            page: 1,
        });
        let (ctx, _sink, _backend) = context_with(backend);

        let page = load_category_page(&ctx, ExpenseCategory::Personal, 1, 10)
            .await
            .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 1);
    }
}

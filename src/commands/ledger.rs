//! Expense-ledger screen commands.

use serde_json::{json, Value};

use crate::backend::ExpenseCategory;
use crate::context::PosContext;
use crate::ledger::{self, LedgerDraft};

use super::{arg0_as_string, value_f64, value_str, value_u32};

/// Default page size for category history, matching the table the shell
/// renders.
const DEFAULT_PAGE_SIZE: u32 = 10;

pub async fn ledger_totals(ctx: &PosContext, _arg0: Option<Value>) -> Result<Value, String> {
    let totals = ledger::load_totals(ctx).await.map_err(|e| e.to_string())?;
    serde_json::to_value(totals).map_err(|e| e.to_string())
}

pub async fn ledger_daily(ctx: &PosContext, _arg0: Option<Value>) -> Result<Value, String> {
    let rows = ledger::load_daily(ctx).await.map_err(|e| e.to_string())?;
    serde_json::to_value(rows).map_err(|e| e.to_string())
}

pub async fn ledger_category_page(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let tipo = arg0_as_string(&arg0, &["tipo", "tipoEgreso"]);
    let category = ExpenseCategory::from_wire(tipo.as_deref());
    let payload = arg0.unwrap_or(Value::Null);
    let page = value_u32(&payload, &["page"]).unwrap_or(0);
    let size = value_u32(&payload, &["size"]).unwrap_or(DEFAULT_PAGE_SIZE);

    let page = ledger::load_category_page(ctx, category, page, size)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(page).map_err(|e| e.to_string())
}

pub async fn ledger_percentages(ctx: &PosContext, _arg0: Option<Value>) -> Result<Value, String> {
    let stats = ledger::load_percentages(ctx)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(stats).map_err(|e| e.to_string())
}

pub async fn ledger_record_expense(
    ctx: &PosContext,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let payload = arg0.unwrap_or(Value::Null);
    let draft = LedgerDraft {
        tipo_egreso: value_str(&payload, &["tipoEgreso", "tipo"]),
        descripcion: value_str(&payload, &["descripcion", "detalle"]).unwrap_or_default(),
        monto: value_f64(&payload, &["monto"]).unwrap_or(0.0),
    };
    ledger::record_ledger_expense(ctx, draft)
        .await
        .map_err(|e| e.to_string())?;
    Ok(json!({ "success": true }))
}

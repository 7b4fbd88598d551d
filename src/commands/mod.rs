//! Command layer: the seam a rendering shell drives.
//!
//! Handlers take loose JSON payloads (an object, or a bare string where a
//! single field is enough), normalise the accepted key variants, call into
//! the workflows, and answer wire-shaped JSON. Command names are
//! snake_case, grouped by screen: `register_*`, `ledger_*`, `summary_*`.

use serde_json::Value;

use crate::context::PosContext;
use crate::diagnostics;

pub mod ledger;
pub mod register;
pub mod summary;

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// First non-empty string found under any of `keys`.
pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// First number found under any of `keys`. Tolerates numbers that arrive
/// as strings, which is how input fields serialize.
pub(crate) fn value_f64(v: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match v.get(*key) {
            Some(x) if x.is_number() => return x.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(n) = s.trim().parse::<f64>() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn value_u32(v: &Value, keys: &[&str]) -> Option<u32> {
    value_f64(v, keys).map(|n| n.max(0.0) as u32)
}

/// A payload that is either a bare string or an object carrying the
/// string under one of `keys`.
pub(crate) fn arg0_as_string(arg0: &Option<Value>, keys: &[&str]) -> Option<String> {
    match arg0 {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(v) => value_str(v, keys),
        None => None,
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route a command by name. Unknown names are an error, not a panic; the
/// shell decides how to surface that.
pub async fn dispatch(
    ctx: &PosContext,
    command: &str,
    arg0: Option<Value>,
) -> Result<Value, String> {
    match command {
        "register_view_date" => register::register_view_date(ctx, arg0).await,
        "register_status" => register::register_status(ctx, arg0).await,
        "register_gate" => register::register_gate(ctx, arg0).await,
        "register_record_expense" => register::register_record_expense(ctx, arg0).await,
        "register_record_delivery_income" => {
            register::register_record_delivery_income(ctx, arg0).await
        }
        "register_close_day" => register::register_close_day(ctx, arg0).await,
        "register_income_summary" => register::register_income_summary(ctx, arg0).await,
        "register_expenses" => register::register_expenses(ctx, arg0).await,
        "register_balance" => register::register_balance(ctx, arg0).await,
        "summary_historical" => summary::summary_historical(ctx, arg0).await,
        "ledger_totals" => ledger::ledger_totals(ctx, arg0).await,
        "ledger_daily" => ledger::ledger_daily(ctx, arg0).await,
        "ledger_category_page" => ledger::ledger_category_page(ctx, arg0).await,
        "ledger_percentages" => ledger::ledger_percentages(ctx, arg0).await,
        "ledger_record_expense" => ledger::ledger_record_expense(ctx, arg0).await,
        "about_info" => Ok(diagnostics::about_info()),
        other => Err(format!("Unknown command: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;
    use crate::config::PosConfig;
    use crate::events::NullSink;
    use serde_json::json;
    use std::sync::Arc;

    fn test_context() -> PosContext {
        PosContext::new(
            PosConfig::default(),
            Arc::new(MockBackend::new()),
            Arc::new(NullSink),
        )
    }

    #[test]
    fn test_value_f64_tolerates_string_numbers() {
        let v = json!({"monto": "1250.50"});
        assert_eq!(value_f64(&v, &["monto"]), Some(1250.50));

        let v = json!({"monto": 99});
        assert_eq!(value_f64(&v, &["monto"]), Some(99.0));

        let v = json!({"monto": "no"});
        assert_eq!(value_f64(&v, &["monto"]), None);
    }

    #[test]
    fn test_value_str_skips_blank_values() {
        let v = json!({"fecha": "  ", "date": "2026-08-07"});
        assert_eq!(value_str(&v, &["fecha", "date"]), Some("2026-08-07".into()));
    }

    #[test]
    fn test_arg0_as_string_accepts_both_shapes() {
        assert_eq!(
            arg0_as_string(&Some(json!("2026-08-07")), &["fecha"]),
            Some("2026-08-07".into())
        );
        assert_eq!(
            arg0_as_string(&Some(json!({"fecha": "2026-08-07"})), &["fecha"]),
            Some("2026-08-07".into())
        );
        assert_eq!(arg0_as_string(&None, &["fecha"]), None);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_command() {
        let ctx = test_context();
        let err = dispatch(&ctx, "caja_reopen", None).await.unwrap_err();
        assert!(err.contains("Unknown command"));
    }

    #[tokio::test]
    async fn test_dispatch_about_info() {
        let ctx = test_context();
        let info = dispatch(&ctx, "about_info", None).await.unwrap();
        assert!(info.get("version").is_some());
    }
}

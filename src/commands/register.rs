//! Register ("caja") screen commands.

use serde_json::{json, Value};

use crate::context::PosContext;
use crate::dates;
use crate::gate;
use crate::recorders::{self, DeliveryIncomeDraft, ExpenseDraft};
use crate::summary;

use super::{arg0_as_string, value_f64, value_str};

/// Resolve the `fecha` of a loose payload (bare string or object field),
/// defaulting to today, and validate the wire format.
fn parse_fecha(arg0: &Option<Value>) -> Result<String, String> {
    let fecha = dates::or_today(arg0_as_string(arg0, &["fecha"]).as_deref());
    if dates::parse_date(&fecha).is_none() {
        return Err(format!("Fecha inválida: {fecha}"));
    }
    Ok(fecha)
}

/// Switch the register view to a date and load everything it shows.
pub async fn register_view_date(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let view = summary::view_date(ctx, &fecha)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(view).map_err(|e| e.to_string())
}

/// The cached (or freshly queried, with `force`) status snapshot.
pub async fn register_status(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let force = arg0
        .as_ref()
        .and_then(|v| v.get("force"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let day = ctx.cache().get_status(ctx.backend(), &fecha, force).await;
    Ok(day.to_wire())
}

/// The permission set for a date, from the cached status.
pub async fn register_gate(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let day = ctx.cache().get_status(ctx.backend(), &fecha, false).await;
    let decision = gate::evaluate(
        &fecha,
        &dates::today_local(),
        day.status,
        ctx.config().unknown_policy,
    );
    serde_json::to_value(decision).map_err(|e| e.to_string())
}

pub async fn register_record_expense(
    ctx: &PosContext,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let payload = arg0.unwrap_or(Value::Null);
    let draft = ExpenseDraft {
        fecha: value_str(&payload, &["fecha"]),
        descripcion: value_str(&payload, &["descripcion", "detalle"]).unwrap_or_default(),
        monto: value_f64(&payload, &["monto"]).unwrap_or(0.0),
    };
    recorders::record_expense(ctx, draft)
        .await
        .map_err(|e| e.to_string())?;
    Ok(json!({ "success": true }))
}

pub async fn register_record_delivery_income(
    ctx: &PosContext,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let payload = arg0.unwrap_or(Value::Null);
    let draft = DeliveryIncomeDraft {
        fecha: value_str(&payload, &["fecha"]),
        monto: value_f64(&payload, &["monto"]).unwrap_or(0.0),
    };
    recorders::record_delivery_income(ctx, draft)
        .await
        .map_err(|e| e.to_string())?;
    Ok(json!({ "success": true }))
}

pub async fn register_close_day(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let outcome = recorders::close_register(ctx, Some(fecha))
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(outcome).map_err(|e| e.to_string())
}

pub async fn register_income_summary(
    ctx: &PosContext,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let summary = summary::load_income_summary(ctx, &fecha)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(summary).map_err(|e| e.to_string())
}

pub async fn register_expenses(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let rows = summary::load_expenses(ctx, &fecha)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(rows).map_err(|e| e.to_string())
}

pub async fn register_balance(ctx: &PosContext, arg0: Option<Value>) -> Result<Value, String> {
    let fecha = parse_fecha(&arg0)?;
    let balance = summary::load_balance(ctx, &fecha)
        .await
        .map_err(|e| e.to_string())?;
    Ok(json!({ "fecha": fecha, "balance": balance }))
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use crate::backend::testing::{MockBackend, ScriptedMeta};
    use crate::config::PosConfig;
    use crate::events::NullSink;
    use serde_json::json;
    use std::sync::Arc;

    fn context_with(backend: MockBackend) -> (PosContext, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let ctx = PosContext::new(
            PosConfig::default(),
            Arc::clone(&backend) as Arc<dyn crate::backend::RegisterBackend>,
            Arc::new(NullSink),
        );
        (ctx, backend)
    }

    #[test]
    fn test_parse_fecha_accepts_bare_string_and_object() {
        assert_eq!(
            parse_fecha(&Some(json!("2026-08-07"))).unwrap(),
            "2026-08-07"
        );
        assert_eq!(
            parse_fecha(&Some(json!({"fecha": "2026-08-07"}))).unwrap(),
            "2026-08-07"
        );
    }

    #[test]
    fn test_parse_fecha_defaults_to_today() {
        assert_eq!(parse_fecha(&None).unwrap(), dates::today_local());
        assert_eq!(parse_fecha(&Some(json!({}))).unwrap(), dates::today_local());
    }

    #[test]
    fn test_parse_fecha_rejects_malformed_dates() {
        let err = parse_fecha(&Some(json!("07/08/2026"))).unwrap_err();
        assert!(err.contains("Fecha inválida"));
    }

    #[tokio::test]
    async fn test_register_status_returns_wire_shape() {
        let (ctx, _backend) = context_with({
            let b = MockBackend::new();
            b.script_meta("2026-02-02", ScriptedMeta::closed("2026-02-02T21:00:00"));
            b
        });

        let v = register_status(&ctx, Some(json!({"fecha": "2026-02-02", "force": true})))
            .await
            .unwrap();
        assert_eq!(v["estado"], "CERRADA");
        assert_eq!(v["cerradaEn"], "2026-02-02T21:00:00");
    }

    #[tokio::test]
    async fn test_record_expense_accepts_string_monto() {
        let (ctx, backend) = context_with(MockBackend::new());

        register_record_expense(
            &ctx,
            Some(json!({"descripcion": "harina", "monto": "1250.50"})),
        )
        .await
        .unwrap();

        let sent = backend.expense_submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].monto, 1250.50);
    }

    #[tokio::test]
    async fn test_record_expense_flattens_domain_errors() {
        let (ctx, backend) = context_with(MockBackend::new());

        let err = register_record_expense(&ctx, Some(json!({"monto": 100.0})))
            .await
            .unwrap_err();
        assert_eq!(err, "Poné una descripción para el egreso.");
        assert!(backend.expense_submissions().is_empty());
    }
}

//! Backend interface: the REST operations the shop server exposes.
//!
//! `RegisterBackend` is the seam between the workflows and the network:
//! the reqwest implementation lives here, and the unit tests drive the
//! workflows through a scripted mock instead. Wire field names stay
//! Spanish (that is what the backend speaks); Rust identifiers are
//! English with serde renames/aliases covering the spelling variants the
//! server has shipped over time (`cerradaEn`/`cerradoEn`, ...).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiClient;

// ---------------------------------------------------------------------------
// Register-day wire types
// ---------------------------------------------------------------------------

/// `GET /api/caja/meta` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMeta {
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default, alias = "cerradoEn")]
    pub cerrada_en: Option<String>,
}

/// `GET /api/caja/ingresos` response. The status occasionally rides along
/// on this endpoint, which is the fallback when the meta query fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    #[serde(default)]
    pub ingresos_totales: f64,
    #[serde(default)]
    pub ingresos_efectivo: f64,
    #[serde(default, alias = "ingresosTransferencias")]
    pub ingresos_transferencia: f64,
    #[serde(default, alias = "mermas")]
    pub total_mermas: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, alias = "cerradoEn", skip_serializing_if = "Option::is_none")]
    pub cerrada_en: Option<String>,
}

/// One row of `GET /api/caja/egresos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRow {
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub monto: f64,
    #[serde(default)]
    pub hora: Option<String>,
}

/// `GET /api/caja/balance` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    #[serde(default, alias = "balanceFinal")]
    pub balance: f64,
}

/// `POST /api/caja/cierre` response. Every field is optional: older
/// backend builds answer with an empty body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseReceipt {
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default, alias = "cerradoEn")]
    pub cerrada_en: Option<String>,
    #[serde(default)]
    pub balance_final: Option<f64>,
}

/// `POST /api/caja/registrar` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEntry {
    pub descripcion: String,
    pub monto: f64,
    pub fecha: String,
}

/// `POST /api/caja/registrar-py` body (third-party-delivery income).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryIncomeEntry {
    pub fecha: String,
    pub monto: f64,
}

// ---------------------------------------------------------------------------
// Expense-ledger wire types
// ---------------------------------------------------------------------------

/// Ledger expense category. Unknown wire strings map to `Otros`, same as
/// the badge rendering the shop has always done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Personal,
    Produccion,
    Otros,
}

impl ExpenseCategory {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("PERSONAL") => Self::Personal,
            Some("PRODUCCION") => Self::Produccion,
            _ => Self::Otros,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Produccion => "PRODUCCION",
            Self::Otros => "OTROS",
        }
    }

    /// Display label for the category chip.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Produccion => "Producción",
            Self::Otros => "Día a Día",
        }
    }
}

/// `GET /api/egreso/acumulado` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    #[serde(default)]
    pub total_personal: f64,
    #[serde(default)]
    pub total_produccion: f64,
    #[serde(default, alias = "totalDia")]
    pub total_otros: f64,
}

/// One row of `GET /api/egreso/diario`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    #[serde(default)]
    pub tipo_egreso: Option<String>,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub monto: f64,
    #[serde(default, alias = "creadoEn")]
    pub creado_en: Option<String>,
}

/// Page envelope of `GET /api/egreso/tipo/{tipo}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    #[serde(default)]
    pub content: Vec<LedgerRow>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, alias = "number")]
    pub page: u32,
}

/// One row of `GET /api/egreso/porcentajes`: current-month total and
/// percent change per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMonthStat {
    #[serde(default)]
    pub tipo_egreso: Option<String>,
    #[serde(default)]
    pub total_mes_actual: f64,
    #[serde(default)]
    pub porcentaje: f64,
}

/// `POST /api/egreso/registrar` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExpenseEntry {
    pub tipo_egreso: String,
    pub descripcion: String,
    pub monto: f64,
}

// ---------------------------------------------------------------------------
// Accumulated-summary wire type
// ---------------------------------------------------------------------------

/// `GET /api/resumen/acumulado` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSummary {
    #[serde(default)]
    pub acumulado_efectivo: f64,
    #[serde(default)]
    pub acumulado_transferencia: f64,
    #[serde(default)]
    pub acumulado_pedidosya: f64,
    #[serde(default)]
    pub acumulado_total: f64,
    #[serde(default)]
    pub egreso_acumulado: f64,
    /// Set by the loader when the backend answered "no data yet" (204).
    #[serde(default, skip_deserializing)]
    pub empty: bool,
}

impl HistoricalSummary {
    pub fn no_data() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Every REST operation the front-end core performs, as an object-safe
/// async trait so the workflows can be exercised against a scripted
/// backend in tests.
#[async_trait]
pub trait RegisterBackend: Send + Sync {
    /// `GET /api/caja/meta?fecha=`: the dedicated status endpoint.
    async fn fetch_register_meta(&self, fecha: &str) -> Result<RegisterMeta, String>;

    /// `GET /api/caja/ingresos?fecha=`: income totals for one date.
    async fn fetch_income_summary(&self, fecha: &str) -> Result<IncomeSummary, String>;

    /// `GET /api/caja/egresos?fecha=`: register-day expense rows.
    async fn fetch_expenses(&self, fecha: &str) -> Result<Vec<ExpenseRow>, String>;

    /// `GET /api/caja/balance?fecha=`: the authoritative day balance.
    async fn fetch_balance(&self, fecha: &str) -> Result<BalanceSnapshot, String>;

    /// `POST /api/caja/registrar`: record a register-day expense.
    async fn submit_expense(&self, entry: &ExpenseEntry) -> Result<(), String>;

    /// `POST /api/caja/registrar-py`: record third-party-delivery income.
    async fn submit_delivery_income(&self, entry: &DeliveryIncomeEntry) -> Result<(), String>;

    /// `POST /api/caja/cierre?fecha=`: close the register for a date.
    async fn close_register(&self, fecha: &str) -> Result<CloseReceipt, String>;

    /// `GET /api/egreso/acumulado`: accumulated ledger totals.
    async fn fetch_ledger_totals(&self) -> Result<CategoryTotals, String>;

    /// `GET /api/egreso/diario`: recent ledger activity.
    async fn fetch_ledger_daily(&self) -> Result<Vec<LedgerRow>, String>;

    /// `GET /api/egreso/tipo/{tipo}?page=&size=`: per-category history.
    async fn fetch_ledger_page(
        &self,
        category: ExpenseCategory,
        page: u32,
        size: u32,
    ) -> Result<CategoryPage, String>;

    /// `GET /api/egreso/porcentajes`: per-category month stats.
    async fn fetch_ledger_percentages(&self) -> Result<Vec<CategoryMonthStat>, String>;

    /// `POST /api/egreso/registrar`: record a categorized ledger expense.
    async fn submit_ledger_expense(&self, entry: &LedgerExpenseEntry) -> Result<(), String>;

    /// `GET /api/resumen/acumulado`. `None` means "no data yet" (204).
    async fn fetch_historical_summary(&self) -> Result<Option<HistoricalSummary>, String>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Decode a JSON body, treating a null/empty body as the type's default.
/// The shop backend answers some endpoints with an empty body rather than
/// an empty object.
fn decode<T: DeserializeOwned + Default>(body: Value, what: &str) -> Result<T, String> {
    if body.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(body).map_err(|e| format!("Invalid {what} payload: {e}"))
}

pub struct HttpRegisterBackend {
    api: ApiClient,
}

impl HttpRegisterBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RegisterBackend for HttpRegisterBackend {
    async fn fetch_register_meta(&self, fecha: &str) -> Result<RegisterMeta, String> {
        let body = self.api.get_json("/api/caja/meta", &[("fecha", fecha)]).await?;
        decode(body, "register meta")
    }

    async fn fetch_income_summary(&self, fecha: &str) -> Result<IncomeSummary, String> {
        let body = self
            .api
            .get_json("/api/caja/ingresos", &[("fecha", fecha)])
            .await?;
        decode(body, "income summary")
    }

    async fn fetch_expenses(&self, fecha: &str) -> Result<Vec<ExpenseRow>, String> {
        let body = self
            .api
            .get_json("/api/caja/egresos", &[("fecha", fecha)])
            .await?;
        decode(body, "expense list")
    }

    async fn fetch_balance(&self, fecha: &str) -> Result<BalanceSnapshot, String> {
        let body = self
            .api
            .get_json("/api/caja/balance", &[("fecha", fecha)])
            .await?;
        decode(body, "balance")
    }

    async fn submit_expense(&self, entry: &ExpenseEntry) -> Result<(), String> {
        let body = serde_json::to_value(entry).map_err(|e| e.to_string())?;
        self.api
            .post_json("/api/caja/registrar", &[], Some(&body))
            .await?;
        Ok(())
    }

    async fn submit_delivery_income(&self, entry: &DeliveryIncomeEntry) -> Result<(), String> {
        let body = serde_json::to_value(entry).map_err(|e| e.to_string())?;
        self.api
            .post_json("/api/caja/registrar-py", &[], Some(&body))
            .await?;
        Ok(())
    }

    async fn close_register(&self, fecha: &str) -> Result<CloseReceipt, String> {
        let body = self
            .api
            .post_json("/api/caja/cierre", &[("fecha", fecha)], None)
            .await?;
        decode(body, "close receipt")
    }

    async fn fetch_ledger_totals(&self) -> Result<CategoryTotals, String> {
        let body = self.api.get_json("/api/egreso/acumulado", &[]).await?;
        decode(body, "ledger totals")
    }

    async fn fetch_ledger_daily(&self) -> Result<Vec<LedgerRow>, String> {
        let body = self.api.get_json("/api/egreso/diario", &[]).await?;
        decode(body, "ledger daily activity")
    }

    async fn fetch_ledger_page(
        &self,
        category: ExpenseCategory,
        page: u32,
        size: u32,
    ) -> Result<CategoryPage, String> {
        let path = format!("/api/egreso/tipo/{}", category.as_wire());
        let page_s = page.to_string();
        let size_s = size.to_string();
        let body = self
            .api
            .get_json(&path, &[("page", page_s.as_str()), ("size", size_s.as_str())])
            .await?;
        decode(body, "ledger page")
    }

    async fn fetch_ledger_percentages(&self) -> Result<Vec<CategoryMonthStat>, String> {
        let body = self.api.get_json("/api/egreso/porcentajes", &[]).await?;
        decode(body, "ledger percentages")
    }

    async fn submit_ledger_expense(&self, entry: &LedgerExpenseEntry) -> Result<(), String> {
        let body = serde_json::to_value(entry).map_err(|e| e.to_string())?;
        self.api
            .post_json("/api/egreso/registrar", &[], Some(&body))
            .await?;
        Ok(())
    }

    async fn fetch_historical_summary(&self) -> Result<Option<HistoricalSummary>, String> {
        let body = self.api.get_json("/api/resumen/acumulado", &[]).await?;
        if body.is_null() {
            return Ok(None);
        }
        decode(body, "accumulated summary").map(Some)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

/// Scripted backend used by the workflow tests: responses are staged per
/// date, every call is counted, and submitted entries are kept for
/// assertions. Anything not scripted answers with the type's default.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Builder for staged `/api/caja/meta` responses.
    pub struct ScriptedMeta(RegisterMeta);

    impl ScriptedMeta {
        pub fn open() -> Self {
            Self(RegisterMeta {
                estado: Some("ABIERTA".into()),
                cerrada_en: None,
            })
        }

        pub fn closed(at: &str) -> Self {
            Self(RegisterMeta {
                estado: Some("CERRADA".into()),
                cerrada_en: Some(at.into()),
            })
        }

        /// A 200 that carries no status field.
        pub fn none() -> Self {
            Self(RegisterMeta::default())
        }
    }

    #[derive(Default)]
    pub struct MockBackend {
        meta: Mutex<HashMap<String, Result<RegisterMeta, String>>>,
        income: Mutex<HashMap<String, Result<IncomeSummary, String>>>,
        balance: Mutex<HashMap<String, Result<BalanceSnapshot, String>>>,
        close: Mutex<HashMap<String, Result<CloseReceipt, String>>>,
        ledger_totals: Mutex<Option<CategoryTotals>>,
        ledger_page: Mutex<Option<CategoryPage>>,
        submit_expense_error: Mutex<Option<String>>,
        submit_delivery_error: Mutex<Option<String>>,
        submit_ledger_error: Mutex<Option<String>>,
        historical_no_data: AtomicBool,
        historical_error: Mutex<Option<String>>,
        meta_count: AtomicUsize,
        income_count: AtomicUsize,
        balance_count: AtomicUsize,
        close_count: AtomicUsize,
        submitted_expenses: Mutex<Vec<ExpenseEntry>>,
        submitted_delivery: Mutex<Vec<DeliveryIncomeEntry>>,
        submitted_ledger: Mutex<Vec<LedgerExpenseEntry>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        // -- scripting ------------------------------------------------------

        pub fn script_meta(&self, fecha: &str, meta: ScriptedMeta) {
            self.meta.lock().unwrap().insert(fecha.into(), Ok(meta.0));
        }

        pub fn fail_meta(&self, fecha: &str, error: &str) {
            self.meta
                .lock()
                .unwrap()
                .insert(fecha.into(), Err(error.into()));
        }

        pub fn script_income_estado(&self, fecha: &str, estado: &str) {
            self.income.lock().unwrap().insert(
                fecha.into(),
                Ok(IncomeSummary {
                    estado: Some(estado.into()),
                    ..IncomeSummary::default()
                }),
            );
        }

        pub fn fail_income(&self, fecha: &str, error: &str) {
            self.income
                .lock()
                .unwrap()
                .insert(fecha.into(), Err(error.into()));
        }

        pub fn script_balance(&self, fecha: &str, balance: f64) {
            self.balance
                .lock()
                .unwrap()
                .insert(fecha.into(), Ok(BalanceSnapshot { balance }));
        }

        pub fn fail_balance(&self, fecha: &str, error: &str) {
            self.balance
                .lock()
                .unwrap()
                .insert(fecha.into(), Err(error.into()));
        }

        pub fn script_close(&self, fecha: &str, receipt: CloseReceipt) {
            self.close.lock().unwrap().insert(fecha.into(), Ok(receipt));
        }

        pub fn script_ledger_totals(&self, totals: CategoryTotals) {
            *self.ledger_totals.lock().unwrap() = Some(totals);
        }

        pub fn script_ledger_page(&self, page: CategoryPage) {
            *self.ledger_page.lock().unwrap() = Some(page);
        }

        pub fn fail_submit_expense(&self, error: &str) {
            *self.submit_expense_error.lock().unwrap() = Some(error.into());
        }

        pub fn fail_submit_ledger(&self, error: &str) {
            *self.submit_ledger_error.lock().unwrap() = Some(error.into());
        }

        pub fn script_historical_no_data(&self) {
            self.historical_no_data.store(true, Ordering::SeqCst);
        }

        pub fn fail_historical(&self, error: &str) {
            *self.historical_error.lock().unwrap() = Some(error.into());
        }

        // -- observations ---------------------------------------------------

        pub fn meta_calls(&self) -> usize {
            self.meta_count.load(Ordering::SeqCst)
        }

        pub fn income_calls(&self) -> usize {
            self.income_count.load(Ordering::SeqCst)
        }

        pub fn balance_calls(&self) -> usize {
            self.balance_count.load(Ordering::SeqCst)
        }

        pub fn close_calls(&self) -> usize {
            self.close_count.load(Ordering::SeqCst)
        }

        pub fn expense_submissions(&self) -> Vec<ExpenseEntry> {
            self.submitted_expenses.lock().unwrap().clone()
        }

        pub fn delivery_submissions(&self) -> Vec<DeliveryIncomeEntry> {
            self.submitted_delivery.lock().unwrap().clone()
        }

        pub fn ledger_submissions(&self) -> Vec<LedgerExpenseEntry> {
            self.submitted_ledger.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RegisterBackend for MockBackend {
        async fn fetch_register_meta(&self, fecha: &str) -> Result<RegisterMeta, String> {
            self.meta_count.fetch_add(1, Ordering::SeqCst);
            self.meta
                .lock()
                .unwrap()
                .get(fecha)
                .cloned()
                .unwrap_or_else(|| Ok(RegisterMeta::default()))
        }

        async fn fetch_income_summary(&self, fecha: &str) -> Result<IncomeSummary, String> {
            self.income_count.fetch_add(1, Ordering::SeqCst);
            self.income
                .lock()
                .unwrap()
                .get(fecha)
                .cloned()
                .unwrap_or_else(|| Ok(IncomeSummary::default()))
        }

        async fn fetch_expenses(&self, _fecha: &str) -> Result<Vec<ExpenseRow>, String> {
            Ok(Vec::new())
        }

        async fn fetch_balance(&self, fecha: &str) -> Result<BalanceSnapshot, String> {
            self.balance_count.fetch_add(1, Ordering::SeqCst);
            self.balance
                .lock()
                .unwrap()
                .get(fecha)
                .cloned()
                .unwrap_or_else(|| Ok(BalanceSnapshot::default()))
        }

        async fn submit_expense(&self, entry: &ExpenseEntry) -> Result<(), String> {
            if let Some(err) = self.submit_expense_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.submitted_expenses.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn submit_delivery_income(&self, entry: &DeliveryIncomeEntry) -> Result<(), String> {
            if let Some(err) = self.submit_delivery_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.submitted_delivery.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn close_register(&self, fecha: &str) -> Result<CloseReceipt, String> {
            self.close_count.fetch_add(1, Ordering::SeqCst);
            self.close
                .lock()
                .unwrap()
                .get(fecha)
                .cloned()
                .unwrap_or_else(|| Ok(CloseReceipt::default()))
        }

        async fn fetch_ledger_totals(&self) -> Result<CategoryTotals, String> {
            Ok(self
                .ledger_totals
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_default())
        }

        async fn fetch_ledger_daily(&self) -> Result<Vec<LedgerRow>, String> {
            Ok(Vec::new())
        }

        async fn fetch_ledger_page(
            &self,
            _category: ExpenseCategory,
            _page: u32,
            _size: u32,
        ) -> Result<CategoryPage, String> {
            Ok(self.ledger_page.lock().unwrap().clone().unwrap_or_default())
        }

        async fn fetch_ledger_percentages(&self) -> Result<Vec<CategoryMonthStat>, String> {
            Ok(Vec::new())
        }

        async fn submit_ledger_expense(&self, entry: &LedgerExpenseEntry) -> Result<(), String> {
            if let Some(err) = self.submit_ledger_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.submitted_ledger.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn fetch_historical_summary(&self) -> Result<Option<HistoricalSummary>, String> {
            if let Some(err) = self.historical_error.lock().unwrap().clone() {
                return Err(err);
            }
            if self.historical_no_data.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(Some(HistoricalSummary::default()))
        }
    }
}

//! Empanada shop POS front-end core.
//!
//! The business logic behind the shop's point-of-sale screens, kept free
//! of any rendering surface: a thin shell (webview, TUI, whatever) drives
//! it through [`commands::dispatch`] and repaints from the [`events`] it
//! emits. The core talks to the shop's REST backend and owns:
//!
//! - the register ("caja") day state: per-date open/closed snapshots,
//!   cached with request fencing ([`register`]);
//! - the gate deciding which mutating actions a date permits ([`gate`]);
//! - the transaction recorders: expenses, PedidosYa income, and the
//!   irreversible daily close ([`recorders`]);
//! - the day summary and accumulated-summary loaders ([`summary`]);
//! - the categorized expense ledger ([`ledger`]).
//!
//! All shared state lives in a [`context::PosContext`]; several contexts
//! (multi-store) can coexist in one process.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod backend;
pub mod commands;
pub mod config;
pub mod context;
pub mod dates;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod gate;
pub mod ledger;
pub mod recorders;
pub mod register;
pub mod summary;

/// Initialize structured logging (console + daily rolling file).
///
/// Call once from the embedding shell before building a context. The
/// rolling-file guard is intentionally leaked; the logs flush when the
/// process exits.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,empanada_pos_lib=debug"));

    // Prune old log files before setting up the appender
    diagnostics::prune_old_logs();

    let log_dir = diagnostics::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "pos");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    std::mem::forget(guard);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "empanada POS core initialized"
    );
}

//! The context object every workflow operates on.
//!
//! Config, backend handle, status cache, event sink, and the in-flight
//! action set live here instead of in module-level globals, so several
//! register views (multi-store) can coexist in one process without
//! cross-talk. Cloning is cheap, the fields are shared handles.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::api::ApiClient;
use crate::backend::{HttpRegisterBackend, RegisterBackend};
use crate::config::PosConfig;
use crate::error::RegisterError;
use crate::events::{EventSink, NullSink, UiEvent, UserAction};
use crate::register::StatusCache;

#[derive(Clone)]
pub struct PosContext {
    config: PosConfig,
    backend: Arc<dyn RegisterBackend>,
    cache: Arc<StatusCache>,
    sink: Arc<dyn EventSink>,
    in_flight: Arc<Mutex<HashSet<UserAction>>>,
}

impl PosContext {
    pub fn new(
        config: PosConfig,
        backend: Arc<dyn RegisterBackend>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            backend,
            cache: Arc::new(StatusCache::new()),
            sink,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Context wired to the real backend over HTTP.
    pub fn over_http(config: PosConfig, sink: Arc<dyn EventSink>) -> Result<Self, String> {
        let api = ApiClient::new(&config.api_base_url, config.request_timeout)?;
        let backend: Arc<dyn RegisterBackend> = Arc::new(HttpRegisterBackend::new(api));
        Ok(Self::new(config, backend, sink))
    }

    /// Headless HTTP context (events discarded).
    pub fn headless(config: PosConfig) -> Result<Self, String> {
        Self::over_http(config, Arc::new(NullSink))
    }

    pub fn config(&self) -> &PosConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn RegisterBackend {
        self.backend.as_ref()
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn emit(&self, event: UiEvent) {
        self.sink.emit(event);
    }

    /// Claim the in-flight slot for an action. Fails with `Busy` when the
    /// same action already has a request out; the guard frees the slot
    /// (and notifies the shell) when dropped, success or not.
    pub fn try_begin(&self, action: UserAction) -> Result<InFlightGuard, RegisterError> {
        {
            let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
            if !in_flight.insert(action) {
                return Err(RegisterError::Busy {
                    action,
                    message: "Esa operación ya está en curso, esperá un momento.".into(),
                });
            }
        }
        self.emit(UiEvent::ActionPending {
            action,
            pending: true,
        });
        Ok(InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            sink: Arc::clone(&self.sink),
            action,
        })
    }
}

/// RAII guard for one in-flight action; see [`PosContext::try_begin`].
pub struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<UserAction>>>,
    sink: Arc<dyn EventSink>,
    action: UserAction,
}

impl std::fmt::Debug for InFlightGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightGuard")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .expect("in-flight set poisoned")
            .remove(&self.action);
        self.sink.emit(UiEvent::ActionPending {
            action: self.action,
            pending: false,
        });
    }
}

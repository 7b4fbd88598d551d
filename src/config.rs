//! Front-end configuration.
//!
//! Everything the core needs from the outside: where the backend lives,
//! how to treat an unreportable register status, and the request timeout.
//! Read from the environment at startup; there is no persisted client
//! state beyond the in-memory status cache.

use std::time::Duration;

use crate::api;
use crate::gate::UnknownPolicy;

/// Fallback backend address for a dev workstation.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const ENV_BASE_URL: &str = "API_BASE_URL";
const ENV_UNKNOWN_POLICY: &str = "CAJA_UNKNOWN_POLICY";

#[derive(Debug, Clone)]
pub struct PosConfig {
    /// Normalised backend base URL (no trailing slash, no `/api` suffix).
    pub api_base_url: String,
    pub unknown_policy: UnknownPolicy,
    pub request_timeout: Duration,
}

impl Default for PosConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl PosConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            api_base_url: api::normalize_base_url(base_url),
            unknown_policy: UnknownPolicy::default(),
            request_timeout: api::DEFAULT_TIMEOUT,
        }
    }

    /// Build from the environment: `API_BASE_URL` for the backend address,
    /// `CAJA_UNKNOWN_POLICY` = `read-only` to refuse operating when the
    /// register status cannot be determined (default is permissive, the
    /// shop's historical behavior).
    pub fn from_env() -> Self {
        let base_url = std::env::var(ENV_BASE_URL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let unknown_policy = match std::env::var(ENV_UNKNOWN_POLICY).ok().as_deref() {
            Some("read-only") | Some("read_only") | Some("readonly") => UnknownPolicy::ReadOnly,
            _ => UnknownPolicy::Permissive,
        };

        Self {
            unknown_policy,
            ..Self::new(&base_url)
        }
    }

    pub fn with_unknown_policy(mut self, policy: UnknownPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_points_at_local_backend() {
        let cfg = PosConfig::default();
        assert_eq!(cfg.api_base_url, "http://localhost:8080");
        assert_eq!(cfg.unknown_policy, UnknownPolicy::Permissive);
    }

    #[test]
    fn test_new_normalizes_base_url() {
        let cfg = PosConfig::new("backend.lacasadelaempanada.ar/api/");
        assert_eq!(cfg.api_base_url, "https://backend.lacasadelaempanada.ar");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_base_url_and_policy() {
        std::env::set_var("API_BASE_URL", "http://10.0.0.7:9000/");
        std::env::set_var("CAJA_UNKNOWN_POLICY", "read-only");

        let cfg = PosConfig::from_env();
        assert_eq!(cfg.api_base_url, "http://10.0.0.7:9000");
        assert_eq!(cfg.unknown_policy, UnknownPolicy::ReadOnly);

        std::env::remove_var("API_BASE_URL");
        std::env::remove_var("CAJA_UNKNOWN_POLICY");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_when_unset() {
        std::env::remove_var("API_BASE_URL");
        std::env::remove_var("CAJA_UNKNOWN_POLICY");

        let cfg = PosConfig::from_env();
        assert_eq!(cfg.api_base_url, "http://localhost:8080");
        assert_eq!(cfg.unknown_policy, UnknownPolicy::Permissive);
    }
}

//! Handler configuration
//!
//! Secrets are injected by the platform runtime; alert criteria are set by
//! whoever embeds the handler.

use regex::Regex;
use std::collections::HashMap;

use crate::Vulnerability;

/// Secret key for the Slack webhook URL.
pub const SLACK_URL_KEY: &str = "Slack_URL";
/// Secret key for the Elasticsearch API key.
pub const ELASTIC_API_KEY_KEY: &str = "Elastic_API_Key";
/// Secret key for the Elasticsearch base URL.
pub const ELASTIC_URL_KEY: &str = "Elastic_URL";

/// Elasticsearch index receiving the stat documents.
pub const DEFAULT_ELASTIC_INDEX: &str = "runtime_leap";

/// Platform-injected secret accessor.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

impl SecretStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub slack_webhook_url: Option<String>,
    pub elastic_url: Option<String>,
    pub elastic_api_key: Option<String>,
    pub elastic_index: String,
    pub alert: AlertCriteria,
}

impl HandlerConfig {
    /// Resolve configuration from the platform secret store. Missing secrets
    /// leave the corresponding sink unconfigured; the handler skips it with a
    /// warning instead of failing.
    pub fn from_secrets(secrets: &dyn SecretStore) -> Self {
        Self {
            slack_webhook_url: secrets.get(SLACK_URL_KEY),
            elastic_url: secrets.get(ELASTIC_URL_KEY),
            elastic_api_key: secrets.get(ELASTIC_API_KEY_KEY),
            elastic_index: DEFAULT_ELASTIC_INDEX.to_string(),
            alert: AlertCriteria::default(),
        }
    }
}

/// Optional alert conditions, all unset by default.
#[derive(Debug, Clone, Default)]
pub struct AlertCriteria {
    /// Exact severity match, e.g. `"CRITICAL"`.
    pub severity: Option<String>,
    /// Exact CVE id match.
    pub cve_id: Option<String>,
    /// Regex matched against the workload namespace.
    pub namespace_pattern: Option<Regex>,
}

impl AlertCriteria {
    pub fn with_namespace_pattern(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.namespace_pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// True when any configured condition matches the vulnerability or the
    /// workload namespace. Unset conditions never match.
    pub fn matches(&self, vuln: &Vulnerability, namespace: &str) -> bool {
        if let Some(severity) = &self.severity {
            if &vuln.severity == severity {
                return true;
            }
        }
        if let Some(cve_id) = &self.cve_id {
            if &vuln.cve_id == cve_id {
                return true;
            }
        }
        if let Some(pattern) = &self.namespace_pattern {
            if pattern.is_match(namespace) {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid namespace pattern: {0}")]
    InvalidNamespacePattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> HashMap<String, String> {
        HashMap::from([
            (SLACK_URL_KEY.to_string(), "https://hooks.example/T/B".to_string()),
            (ELASTIC_URL_KEY.to_string(), "https://es.example:9200".to_string()),
            (ELASTIC_API_KEY_KEY.to_string(), "key123".to_string()),
        ])
    }

    #[test]
    fn from_secrets_maps_all_keys() {
        let config = HandlerConfig::from_secrets(&secrets());
        assert_eq!(config.slack_webhook_url.as_deref(), Some("https://hooks.example/T/B"));
        assert_eq!(config.elastic_url.as_deref(), Some("https://es.example:9200"));
        assert_eq!(config.elastic_api_key.as_deref(), Some("key123"));
        assert_eq!(config.elastic_index, DEFAULT_ELASTIC_INDEX);
    }

    #[test]
    fn missing_secrets_leave_sinks_unconfigured() {
        let config = HandlerConfig::from_secrets(&HashMap::new());
        assert!(config.slack_webhook_url.is_none());
        assert!(config.elastic_url.is_none());
        assert!(config.elastic_api_key.is_none());
    }

    #[test]
    fn unset_criteria_never_match() {
        let criteria = AlertCriteria::default();
        let vuln = Vulnerability {
            cve_id: "CVE-2024-0001".into(),
            severity: "CRITICAL".into(),
            ..Default::default()
        };
        assert!(!criteria.matches(&vuln, "testing"));
    }

    #[test]
    fn severity_and_cve_and_namespace_conditions() {
        let vuln = Vulnerability {
            cve_id: "CVE-2024-0001".into(),
            severity: "HIGH".into(),
            ..Default::default()
        };

        let by_severity = AlertCriteria {
            severity: Some("HIGH".into()),
            ..Default::default()
        };
        assert!(by_severity.matches(&vuln, "default"));

        let by_cve = AlertCriteria {
            cve_id: Some("CVE-2024-0001".into()),
            ..Default::default()
        };
        assert!(by_cve.matches(&vuln, "default"));

        let by_namespace = AlertCriteria::default()
            .with_namespace_pattern("^test")
            .unwrap();
        assert!(by_namespace.matches(&vuln, "testing"));
        assert!(!by_namespace.matches(&vuln, "prod"));
    }

    #[test]
    fn invalid_namespace_pattern_is_an_error() {
        assert!(AlertCriteria::default().with_namespace_pattern("(").is_err());
    }
}

//! Container-image scan event handler
//!
//! Invoked by a hosting platform runtime whenever a workload's image scan
//! results change. One pass over the payload, two outbound dispatches:
//!
//! ```text
//! ScanEvent ──▶ transform ──▶ Elasticsearch _bulk (NDJSON)
//!                   │
//!                   └────────▶ Slack webhook (block kit)
//! ```
//!
//! The handler always acknowledges the invocation with `"proceed"`; sink
//! failures are reported through a typed [`handler::DispatchStatus`] so the
//! host runtime can apply its own retry policy.

use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod elastic;
pub mod handler;
pub mod slack;
pub mod transform;

pub use config::{AlertCriteria, HandlerConfig, SecretStore};
pub use handler::{DispatchStatus, HandlerOutcome, ScanHandler};

// =============================================================================
// Event payload
// =============================================================================

/// Scan/workload-change event as delivered by the platform runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    pub workload_changed_object: WorkloadChange,
    #[serde(default)]
    pub image_tags_object: Vec<ImageTag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkloadChange {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageTag {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Scanners occasionally report `null` or a bare string here; anything
    /// that is not an array is treated as no vulnerabilities.
    #[serde(default, deserialize_with = "lenient_vulnerabilities")]
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Accepted as `cve_id` from the scanner, written as `CVEid` so the
    /// documents already in the index keep one key at both nesting levels.
    #[serde(default, rename(serialize = "CVEid"))]
    pub cve_id: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub package: String,
}

fn lenient_vulnerabilities<'de, D>(deserializer: D) -> Result<Vec<Vulnerability>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

//! Event flattening
//!
//! Flattens nested vulnerability/risk records into per-CVE stat documents
//! and evaluates alert conditions in the same pass.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::AlertCriteria;
use crate::slack::{push_alert_block, Block};
use crate::{ImageTag, ScanEvent, Vulnerability, WorkloadChange};

/// One indexed document per vulnerability. Field names match the documents
/// the previous generation of this handler wrote, so existing dashboards
/// keep working.
#[derive(Debug, Clone, Serialize)]
pub struct StatDocument {
    #[serde(rename = "CVEid")]
    pub cve_id: String,
    pub severity: String,
    #[serde(rename = "imageName")]
    pub image_name: String,
    #[serde(rename = "imageTag")]
    pub image_tag: String,
    pub cluster: String,
    pub name: String,
    pub namespace: String,
    pub timestamp: String,
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// NDJSON lines for the `_bulk` request: an index action line followed by
    /// a document line, per vulnerability.
    pub bulk_lines: Vec<String>,
    /// Accumulated Slack blocks (risk alerts only).
    pub blocks: Vec<Block>,
    pub should_alert: bool,
}

/// Flatten the event into bulk lines and alert blocks. Never fails; malformed
/// fields were already coerced at the deserialization boundary.
pub fn transform(event: &ScanEvent, criteria: &AlertCriteria, index: &str) -> TransformOutput {
    let workload = &event.workload_changed_object;
    let mut out = TransformOutput::default();
    let action = serde_json::json!({ "index": { "_index": index } }).to_string();

    for image_tag in &event.image_tags_object {
        for vuln in &image_tag.vulnerabilities {
            let stat = StatDocument {
                cve_id: vuln.cve_id.clone(),
                severity: vuln.severity.clone(),
                image_name: image_tag.name.clone(),
                image_tag: image_tag.tag.clone(),
                cluster: workload.cluster.clone(),
                name: workload.name.clone(),
                namespace: workload.namespace.clone(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                vulnerabilities: image_tag.vulnerabilities.clone(),
            };
            out.bulk_lines.push(action.clone());
            out.bulk_lines
                .push(serde_json::to_string(&stat).unwrap_or_default());

            if criteria.matches(vuln, &workload.namespace) {
                out.should_alert = true;
            }
        }

        if !image_tag.risks.is_empty() {
            out.should_alert = true;
            push_alert_block(&mut out.blocks, &risk_alert_text(workload, image_tag));
        }
    }

    out
}

fn risk_alert_text(workload: &WorkloadChange, image_tag: &ImageTag) -> String {
    format!(
        "⚠️ *Risk Alert!*\n*Workload Details:*\n• *Name:* {}\n• *Namespace:* {}\n• *Cluster:* {}\n• *Risks:* {}\n*Image Details:*\n• *📦 Name:* {}\n• *🏷️ Tag:* {}\n• *⚠️ Risks:* {}",
        workload.name,
        workload.namespace,
        workload.cluster,
        workload.risks.join(","),
        image_tag.name,
        image_tag.tag,
        image_tag.risks.join(", ")
    )
}

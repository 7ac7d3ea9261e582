//! Scan event handler
//!
//! Orchestrates transform → bulk index → alert dispatch for one invocation.
//! The acknowledgment to the platform is always `"proceed"`; per-sink results
//! ride alongside it so the host runtime can decide whether to re-deliver.

use crate::config::HandlerConfig;
use crate::elastic::{BulkDisposition, ElasticSink, SinkError};
use crate::slack::{AlertDisposition, SlackNotifier};
use crate::transform::transform;
use crate::ScanEvent;

/// Fixed acknowledgment expected by the platform runtime.
pub const ACK_MESSAGE: &str = "proceed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Every sink delivered.
    Complete,
    /// At least one sink failed or was skipped for missing configuration.
    Degraded,
    /// Every attempted dispatch failed.
    Failed,
}

#[derive(Debug)]
pub struct HandlerOutcome {
    pub message: &'static str,
    pub status: DispatchStatus,
    pub bulk: Result<BulkDisposition, SinkError>,
    pub alert: AlertDisposition,
}

pub struct ScanHandler {
    config: HandlerConfig,
    elastic: ElasticSink,
    slack: SlackNotifier,
}

impl ScanHandler {
    pub fn new(config: HandlerConfig, client: reqwest::Client) -> Self {
        let elastic = ElasticSink::new(
            config.elastic_url.clone(),
            config.elastic_api_key.clone(),
            client.clone(),
        );
        let slack = SlackNotifier::new(config.slack_webhook_url.clone(), client);
        Self {
            config,
            elastic,
            slack,
        }
    }

    /// Process one scan event: flatten, bulk-index, alert. Sequential awaits,
    /// no state shared across invocations.
    pub async fn handle(&self, event: &ScanEvent) -> HandlerOutcome {
        tracing::info!(
            "Worker is connected to cluster {}",
            event.workload_changed_object.cluster
        );

        let output = transform(event, &self.config.alert, &self.config.elastic_index);

        let bulk = self.elastic.bulk_upload(&output.bulk_lines).await;
        if let Err(e) = &bulk {
            tracing::error!("Bulk upload failed: {}", e);
        }

        let alert = self.slack.post_alert(output.blocks, output.should_alert).await;

        let status = dispatch_status(&bulk, alert);
        tracing::info!("Finished processing scan event: {:?}", status);

        HandlerOutcome {
            message: ACK_MESSAGE,
            status,
            bulk,
            alert,
        }
    }
}

fn dispatch_status(
    bulk: &Result<BulkDisposition, SinkError>,
    alert: AlertDisposition,
) -> DispatchStatus {
    let bulk_skipped = matches!(bulk, Ok(BulkDisposition::Skipped));
    let alert_skipped = alert == AlertDisposition::Skipped;
    let failures =
        usize::from(bulk.is_err()) + usize::from(alert == AlertDisposition::DeliveryFailed);
    let successes = usize::from(matches!(bulk, Ok(BulkDisposition::Indexed)))
        + usize::from(alert == AlertDisposition::Delivered);

    if failures > 0 && successes == 0 {
        DispatchStatus::Failed
    } else if failures > 0 || bulk_skipped || alert_skipped {
        DispatchStatus::Degraded
    } else {
        DispatchStatus::Complete
    }
}

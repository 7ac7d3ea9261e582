//! Slack alert sink
//!
//! Block-kit message construction and webhook delivery. Delivery failures
//! are logged and reported, never propagated: a dead webhook must not fail
//! the invocation.

use serde::{Deserialize, Serialize};

pub const NO_ISSUES_TEXT: &str = "✅ No issues detected in the image scan.";

/// Block-kit block, limited to the shapes this handler emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: SectionText },
    Divider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionText {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl Block {
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: SectionText {
                text_type: "mrkdwn".to_string(),
                text: text.into(),
            },
        }
    }
}

/// Append a section + divider pair and log the alert text.
pub fn push_alert_block(blocks: &mut Vec<Block>, text: &str) {
    tracing::info!("{}", text);
    blocks.push(Block::section(text));
    blocks.push(Block::Divider);
}

/// How alert dispatch ended for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDisposition {
    Delivered,
    DeliveryFailed,
    /// No webhook URL configured; no call was made.
    Skipped,
}

pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>, client: reqwest::Client) -> Self {
        Self {
            webhook_url,
            client,
        }
    }

    /// Post the accumulated blocks to the webhook. When no alert condition
    /// fired, a single "no issues" pair is sent instead of an empty payload.
    pub async fn post_alert(&self, mut blocks: Vec<Block>, should_alert: bool) -> AlertDisposition {
        let Some(url) = &self.webhook_url else {
            tracing::warn!("Slack webhook URL is not set. No alert sent.");
            return AlertDisposition::Skipped;
        };

        if !should_alert {
            push_alert_block(&mut blocks, NO_ISSUES_TEXT);
        }

        tracing::info!("Sending alert to Slack...");
        let result = self
            .client
            .post(url)
            .json(&serde_json::json!({ "blocks": blocks }))
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                tracing::info!("Slack response status: {}", status);
                if status.is_success() {
                    AlertDisposition::Delivered
                } else {
                    tracing::error!("Failed to send alert to Slack. Status: {}", status);
                    AlertDisposition::DeliveryFailed
                }
            }
            Err(e) => {
                tracing::error!("Failed to send alert to Slack: {}", e);
                AlertDisposition::DeliveryFailed
            }
        }
    }
}

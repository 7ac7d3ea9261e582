//! Elasticsearch index sink
//!
//! Single `_bulk` NDJSON upload per invocation. Missing credentials or an
//! empty buffer skip the call with a warning; transport and HTTP failures
//! surface as typed errors for the handler to record.

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("connection failed: {0}")]
    ConnectionFailed(#[from] reqwest::Error),
    #[error("bulk upload rejected with status {0}")]
    Rejected(reqwest::StatusCode),
}

/// How bulk dispatch ended for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkDisposition {
    Indexed,
    /// Credentials or data missing; no call was made.
    Skipped,
}

pub struct ElasticSink {
    url: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ElasticSink {
    pub fn new(url: Option<String>, api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            url,
            api_key,
            client,
        }
    }

    /// Upload the NDJSON lines as one `_bulk` request.
    pub async fn bulk_upload(&self, bulk_lines: &[String]) -> Result<BulkDisposition, SinkError> {
        let (url, api_key) = match (&self.url, &self.api_key) {
            (Some(url), Some(api_key)) if !bulk_lines.is_empty() => (url, api_key),
            _ => {
                tracing::warn!(
                    "Elasticsearch URL, API key, or bulk data is missing. No data sent."
                );
                return Ok(BulkDisposition::Skipped);
            }
        };

        // Bulk API requires a trailing newline.
        let body = bulk_lines.join("\n") + "\n";

        tracing::info!("Sending bulk data to Elasticsearch...");
        let response = self
            .client
            .post(format!("{}/_bulk", url))
            .header("Authorization", format!("ApiKey {}", api_key))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status));
        }

        tracing::info!("Data successfully sent to Elasticsearch with status {}", status);
        Ok(BulkDisposition::Indexed)
    }
}

//! Best-effort delivery of run reports to the operator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use vdna_core::NotifyConfig;

use crate::error::NotifyError;
use crate::report::RunReport;

/// Sink for finished run reports. Callers log failures and move on.
#[async_trait]
pub trait RunNotifier: Send + Sync {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError>;
}

/// Used when email delivery is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl RunNotifier for NoopNotifier {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError> {
        tracing::debug!(run_id = %report.run_id, "viral_cycle: notifications disabled");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

/// Sends the plain-text report through an HTTP JSON email API
/// (`POST {api_url}` with a bearer key).
pub struct EmailNotifier {
    client: Client,
    api_url: String,
    api_key: String,
    from_address: String,
    operator_email: String,
}

impl EmailNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vdna/0.1 (viral-cycle)")
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            operator_email: config.operator_email.clone(),
        })
    }
}

#[async_trait]
impl RunNotifier for EmailNotifier {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError> {
        let payload = EmailPayload {
            from: &self.from_address,
            to: [&self.operator_email],
            subject: report.subject(),
            text: report.render_text(),
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            run_id = %report.run_id,
            to = %self.operator_email,
            "viral_cycle: run report emailed"
        );
        Ok(())
    }
}

/// Build the notifier for the configured environment.
///
/// # Errors
///
/// Returns [`NotifyError::Http`] if the email client cannot be constructed.
pub fn notifier_from_config(
    config: Option<&NotifyConfig>,
) -> Result<Box<dyn RunNotifier>, NotifyError> {
    match config {
        Some(config) => Ok(Box::new(EmailNotifier::new(config)?)),
        None => Ok(Box::new(NoopNotifier)),
    }
}

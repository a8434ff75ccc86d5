//! # Notification Sink
//!
//! Outbound text messages (password reset codes). The auth service only
//! sees the [`NotificationSink`] port; the binary picks the adapter:
//!
//! ```text
//! TWILIO_* set?  ── yes ──► TwilioSink  (POST /Accounts/{sid}/Messages.json)
//!       │
//!       └──────── no ───► LogNotificationSink  (tracing::info!, dev only)
//! ```
//!
//! Delivery failures surface as `CoreError::Storage` so the client sees a
//! generic internal error while the gateway response lands in the log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use pharma_core::{CoreError, CoreResult};

use crate::config::TwilioConfig;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Sends a text body to a phone number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> CoreResult<()>;
}

// =============================================================================
// Log sink
// =============================================================================

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(&self, to: &str, body: &str) -> CoreResult<()> {
        info!(to = %to, body = %body, "SMS gateway not configured, message logged");
        Ok(())
    }
}

// =============================================================================
// Twilio sink
// =============================================================================

/// Twilio Programmable Messaging over its REST API.
pub struct TwilioSink {
    client: Client,
    config: TwilioConfig,
    endpoint: String,
}

impl TwilioSink {
    pub fn new(config: TwilioConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let endpoint = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE, config.account_sid
        );

        Ok(TwilioSink {
            client,
            config,
            endpoint,
        })
    }
}

#[async_trait]
impl NotificationSink for TwilioSink {
    async fn send(&self, to: &str, body: &str) -> CoreResult<()> {
        debug!(to = %to, "Sending SMS via Twilio");

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Twilio request failed");
                CoreError::Storage(format!("SMS delivery failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = %status, body = %detail, "Twilio rejected message");
            return Err(CoreError::Storage(format!(
                "SMS delivery failed with status {}",
                status
            )));
        }

        Ok(())
    }
}

/// Body of the password reset message.
pub fn reset_code_message(code: &str) -> String {
    format!("Your password reset code is: {}", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_always_succeeds() {
        let sink = LogNotificationSink;
        sink.send("+251911000000", "hello").await.unwrap();
    }

    #[test]
    fn test_twilio_endpoint_includes_account() {
        let sink = TwilioSink::new(TwilioConfig {
            account_sid: "AC42".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15550001111".to_string(),
        })
        .unwrap();
        assert_eq!(
            sink.endpoint,
            "https://api.twilio.com/2010-04-01/Accounts/AC42/Messages.json"
        );
    }

    #[test]
    fn test_reset_message_carries_code() {
        assert!(reset_code_message("123456").contains("123456"));
    }
}

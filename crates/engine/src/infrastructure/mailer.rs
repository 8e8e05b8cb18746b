//! Sign-in code delivery.
//!
//! `ResendMailer` talks to the Resend HTTP API. `LogMailer` is used when no
//! API key is configured and only writes the code to the log.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use grupa_domain::{Email, VerificationCode};

use crate::infrastructure::ports::{MailerError, MailerPort};

/// Default Resend API base URL.
pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";

const SUBJECT: &str = "Sign in to Grupa";

#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_RESEND_BASE_URL, api_key, from)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

fn verification_text(code: &VerificationCode) -> String {
    [
        "Your sign-in code is:",
        code.as_str(),
        "",
        "The code is valid for 15 minutes and can be used only once.",
        "Never share this code. We will never ask for it by phone or e-mail.",
        "",
        "Thanks,",
        "The Grupa team",
    ]
    .join("\n")
}

#[async_trait]
impl MailerPort for ResendMailer {
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> Result<(), MailerError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [to.as_str()],
            subject: SUBJECT,
            text: verification_text(code),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| MailerError::RequestFailed(e.to_string()))?;
            tracing::warn!(status = %status, "Resend rejected verification e-mail");
            return Err(MailerError::Rejected(error_text));
        }

        tracing::debug!(to = %to, "Verification e-mail sent");
        Ok(())
    }
}

/// Development mailer: logs the code instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl MailerPort for LogMailer {
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> Result<(), MailerError> {
        tracing::info!(to = %to, code = %code, "Verification code (not sent, no mail provider configured)");
        Ok(())
    }
}

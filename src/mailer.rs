use anyhow::Context;
use axum::async_trait;
use serde_json::json;

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// SendGrid v3 mail/send client.
#[derive(Clone)]
pub struct SendGridMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from_email.clone(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("sendgrid request")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("sendgrid returned {status}: {text}");
        }
        Ok(())
    }
}

pub fn otp_email_html(code: &str) -> String {
    format!("<h3>Your OTP Code:</h3><h1>{code}</h1><p>It expires in 5 minutes.</p>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_contains_the_code() {
        let html = otp_email_html("123456");
        assert!(html.contains("<h1>123456</h1>"));
        assert!(html.contains("5 minutes"));
    }
}

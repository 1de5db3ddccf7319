//! Transactional emails and the delivery seam.
//!
//! Messages are composed here as `EmailData` and handed to a `Mailer`. Delivery
//! itself is not this service's concern: the default `LogMailer` records what
//! would have been sent.
use anyhow::Context as _;
use async_trait::async_trait;
use serde_json::json;
use tera::{Context, Tera};
use tracing::info;

use crate::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailData {
    pub subject: String,
    pub html_content: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &EmailData) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            from: format!("{} <{}>", cfg.emails.from_name, cfg.emails.from_email),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &EmailData) -> anyhow::Result<()> {
        info!(from = %self.from, to = %to, subject = %email.subject, "email send stub");
        Ok(())
    }
}

const TEMPLATES: [(&str, &str); 3] = [
    ("test_email.html", include_str!("../templates/email/test_email.html")),
    ("reset_password.html", include_str!("../templates/email/reset_password.html")),
    ("new_account.html", include_str!("../templates/email/new_account.html")),
];

/// Email bodies, parsed once at startup. Names end in `.html`, so Tera autoescapes them.
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)
            .context("Failed to parse email templates")?;
        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: serde_json::Value) -> anyhow::Result<String> {
        let context =
            Context::from_serialize(context).context("Failed to build email template context")?;
        self.tera
            .render(name, &context)
            .with_context(|| format!("Failed to render email template '{}'", name))
    }

    pub fn test_email(&self, cfg: &AppConfig, email_to: &str) -> anyhow::Result<EmailData> {
        let html_content = self.render(
            "test_email.html",
            json!({ "project_name": cfg.project_name, "email": email_to }),
        )?;
        Ok(EmailData {
            subject: format!("{} - Test email", cfg.project_name),
            html_content,
        })
    }

    pub fn reset_password_email(
        &self,
        cfg: &AppConfig,
        email_to: &str,
        token: &str,
    ) -> anyhow::Result<EmailData> {
        let link = format!("{}/reset-password?token={}", cfg.server_host, token);
        let html_content = self.render(
            "reset_password.html",
            json!({
                "project_name": cfg.project_name,
                "username": email_to,
                "valid_hours": cfg.jwt.reset_ttl_hours,
                "link": link,
            }),
        )?;
        Ok(EmailData {
            subject: format!(
                "{} - Password recovery for user {}",
                cfg.project_name, email_to
            ),
            html_content,
        })
    }

    /// New account notice. The password is never included.
    pub fn new_account_email(&self, cfg: &AppConfig, email_to: &str) -> anyhow::Result<EmailData> {
        let html_content = self.render(
            "new_account.html",
            json!({
                "project_name": cfg.project_name,
                "username": email_to,
                "link": cfg.server_host,
            }),
        )?;
        Ok(EmailData {
            subject: format!("{} - New account for user {}", cfg.project_name, email_to),
            html_content,
        })
    }
}

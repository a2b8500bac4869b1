use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

pub type DynMailer = Arc<dyn Mailer>;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig, from: impl Into<String>) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?.port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self { transport: builder.build(), from: from.into() })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when no SMTP relay is configured: the message is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "smtp not configured, email not delivered");
        tracing::debug!(body = %mail.html);
        Ok(())
    }
}

fn template_source(name: &str) -> Option<&'static str> {
    match name {
        "forgot-password" => Some(include_str!("../../templates/forgot-password.html")),
        _ => None,
    }
}

/// Replaces every `{{ key }}` placeholder. Unknown keys are an error so a typo in a
/// template never ships a literal placeholder.
pub fn render_template(source: &str, vars: &[(&str, String)]) -> anyhow::Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| anyhow!("unterminated placeholder in template"))?;
        let key = after[..end].trim();
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| anyhow!("template variable {key:?} not provided"))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Renders named templates and hands them to the configured [`Mailer`].
#[derive(Clone)]
pub struct MailService {
    mailer: DynMailer,
}

impl MailService {
    pub fn new(mailer: DynMailer) -> Self {
        Self { mailer }
    }

    pub async fn send_email(&self, to: &str, subject: &str, template: &str, vars: &[(&str, String)]) -> anyhow::Result<()> {
        let Some(source) = template_source(template) else {
            bail!("unknown email template {template:?}");
        };
        let html = render_template(source, vars)?;
        self.mailer
            .send(OutgoingMail { to: to.to_string(), subject: subject.to_string(), html })
            .await
    }
}

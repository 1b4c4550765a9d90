use async_trait::async_trait;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to build message: {0}")]
    Build(String),

    #[error("failed to send mail: {0}")]
    Send(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Sends through Amazon SES v2 using the default AWS credential chain.
pub struct SesMailer {
    client: SesClient,
    from: String,
}

impl SesMailer {
    pub async fn from_env(from: impl Into<String>) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: SesClient::new(&sdk_config),
            from: from.into(),
        }
    }

    fn content(data: &str) -> Result<Content, MailError> {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let body = Body::builder()
            .html(Self::content(&mail.html)?)
            .text(Self::content(&mail.text)?)
            .build();
        let message = Message::builder()
            .subject(Self::content(&mail.subject)?)
            .body(body)
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(&mail.to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| MailError::Send(aws_sdk_sesv2::error::DisplayErrorContext(e).to_string()))?;

        info!(to = %mail.to, subject = %mail.subject, "mail sent");
        Ok(())
    }
}

/// Used when no sender address is configured: mail is logged, never delivered.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        warn!(to = %mail.to, subject = %mail.subject, "MAIL_FROM not set, mail not delivered");
        Ok(())
    }
}

/// Welcome / reset mail carrying a generated password.
pub fn password_mail(to: &str, password: &str, project_name: &str) -> OutgoingMail {
    let project = html_escape(project_name);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px;">
  <h2>Bienvenue sur {project} !</h2>
  <p>Voici votre mot de passe pour vous connecter :</p>
  <div style="background: #f4f4f4; padding: 15px; border-radius: 8px; text-align: center;">
    <h1 style="letter-spacing: 8px; color: #333;">{password}</h1>
  </div>
  <p style="color: #666; margin-top: 20px;">
    Nous vous conseillons de changer ce mot de passe après votre première connexion.
  </p>
</div>"#,
        project = project,
        password = html_escape(password),
    );
    let text = format!(
        "Bienvenue sur {} !\n\nVoici votre mot de passe pour vous connecter : {}\n\n\
         Nous vous conseillons de changer ce mot de passe après votre première connexion.\n",
        project_name, password
    );

    OutgoingMail {
        to: to.to_string(),
        subject: "Votre mot de passe".to_string(),
        html,
        text,
    }
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_mail_contains_password_in_both_bodies() {
        let mail = password_mail("new@acme.io", "Zx_9-abc", "Acme");
        assert_eq!(mail.to, "new@acme.io");
        assert_eq!(mail.subject, "Votre mot de passe");
        assert!(mail.html.contains("Zx_9-abc"));
        assert!(mail.text.contains("Zx_9-abc"));
        assert!(mail.html.contains("Bienvenue sur Acme"));
    }

    #[test]
    fn project_name_is_escaped_in_html() {
        let mail = password_mail("a@b.co", "pw", "<script>");
        assert!(mail.html.contains("&lt;script&gt;"));
        assert!(!mail.html.contains("<script>"));
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        let mail = password_mail("a@b.co", "pw", "P");
        assert!(LogMailer.send(mail).await.is_ok());
    }
}

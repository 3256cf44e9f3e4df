// src/services/mail_service.rs
use crate::{config::SmtpConfig, models::user::User};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Envio de emails transacionais.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, user: &User) -> Result<(), MailError>;
}

pub const WELCOME_SUBJECT: &str = "Bem-vindo(a) à Loja!";

pub fn welcome_text(user: &User) -> String {
    format!(
        "Olá, {}!\n\nA sua conta foi criada com sucesso.\nJá pode entrar com o email {} e começar a comprar.\n\nEquipa Loja",
        user.name, user.email
    )
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, MailError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(credentials)
            .build();
        Ok(SmtpMailer {
            transport,
            from_address: from_address.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_welcome(&self, user: &User) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(user
                .email
                .parse()
                .map_err(|_| MailError::InvalidAddress(user.email.clone()))?)
            .subject(WELCOME_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(welcome_text(user))?;

        self.transport.send(message).await?;
        tracing::info!("📧 Email de boas-vindas enviado para {}", user.email);
        Ok(())
    }
}

/// Usado quando não há SMTP configurado: só regista o email no log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_welcome(&self, user: &User) -> Result<(), MailError> {
        tracing::info!(
            "📧 (sem SMTP) Email '{}' para {}:\n{}",
            WELCOME_SUBJECT,
            user.email,
            welcome_text(user)
        );
        Ok(())
    }
}

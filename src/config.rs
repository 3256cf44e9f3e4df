// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr, path::PathBuf};

/// Comprimento mínimo aceite pelo `Key` dos cookies assinados.
const MIN_SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub public_upload_url: String,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub seed_demo_users: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let session_secret = env::var("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::ConfigError(format!(
                "SESSION_SECRET precisa de pelo menos {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }

        let addr = env::var("APP_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3333".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::ConfigError(format!("APP_ADDR inválido: {}", e)))?;

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));
        let public_upload_url = env::var("PUBLIC_UPLOAD_URL")
            .unwrap_or_else(|_| "/uploads".into())
            .trim_end_matches('/')
            .to_string();

        // SMTP só é usado se as três variáveis existirem
        let smtp = match (
            env::var("SMTP_HOST"),
            env::var("SMTP_USERNAME"),
            env::var("SMTP_PASSWORD"),
        ) {
            (Ok(host), Ok(username), Ok(password)) => Some(SmtpConfig {
                host,
                username,
                password,
            }),
            _ => None,
        };

        let mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| "loja@localhost".into());

        let seed_demo_users = env::var("SEED_DEMO_USERS")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            session_secret,
            addr,
            upload_dir,
            public_upload_url,
            smtp,
            mail_from,
            seed_demo_users,
        })
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

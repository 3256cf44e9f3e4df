// src/main.rs
use axum::serve;
use loja_api::{
    build_app,
    config::Config,
    db,
    services::{
        mail_service::{LogMailer, Mailer, SmtpMailer},
        seed_service,
        storage_service::LocalImageStorage,
    },
    state::AppState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_sessions::{cookie::Key, ExpiredDeletion};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "loja_api=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor da loja...");

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Configuração inválida: {}", e))?;

    // --- Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    if config.seed_demo_users {
        seed_service::seed_demo_users(&db_pool)
            .await
            .map_err(|e| anyhow::anyhow!("Falha no seed dos utilizadores: {}", e))?;
    }

    // --- Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao migrar tabela de sessões: {}", e))?;

    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    let key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("SESSION_SECRET inválida: {}", e))?;

    // --- Fotos de perfil e email ---
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let storage = Arc::new(LocalImageStorage::new(
        config.upload_dir.clone(),
        config.public_upload_url.clone(),
    ));

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!("📧 Emails enviados via SMTP ({}).", smtp.host);
            Arc::new(
                SmtpMailer::new(smtp, &config.mail_from)
                    .map_err(|e| anyhow::anyhow!("Falha ao configurar SMTP: {}", e))?,
            )
        }
        None => {
            tracing::warn!("⚠️ SMTP não configurado: emails ficam só no log.");
            Arc::new(LogMailer)
        }
    };

    let app_state = AppState::new(db_pool, storage, mailer);

    // --- Router ---
    tracing::info!("🛠️ Construindo router e aplicando middlewares...");
    let app = build_app(app_state, session_store, key).nest_service(
        &config.public_upload_url,
        ServeDir::new(&config.upload_dir),
    );

    let listener = match TcpListener::bind(config.addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", config.addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Servidor escutando em http://{}", config.addr);

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}

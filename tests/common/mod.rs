#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use loja_api::{
    build_app, db,
    models::user::User,
    services::{
        mail_service::{MailError, Mailer},
        seed_service,
        storage_service::LocalImageStorage,
    },
    state::AppState,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions::cookie::Key;
use tower_sessions_sqlx_store::SqliteStore;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@email.com";
pub const CLIENT_EMAIL: &str = "client@email.com";
pub const EMPLOYEE_EMAIL: &str = "employee@email.com";

const BOUNDARY: &str = "loja-test-boundary";

/// Guarda os destinatários em vez de enviar.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_welcome(&self, user: &User) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(user.email.clone());
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_welcome(&self, _user: &User) -> Result<(), MailError> {
        Err(MailError::Delivery("smtp relay unavailable".into()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub mailer: Arc<RecordingMailer>,
    pub upload_dir: PathBuf,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::build(mailer.clone(), mailer).await
    }

    /// App cujo envio de email falha sempre.
    pub async fn with_failing_mailer() -> Self {
        Self::build(Arc::new(FailingMailer), Arc::new(RecordingMailer::default())).await
    }

    async fn build(mailer: Arc<dyn Mailer>, recorder: Arc<RecordingMailer>) -> Self {
        let id = Uuid::new_v4();
        let db_path = std::env::temp_dir().join(format!("loja-test-{}.db", id));
        let upload_dir = std::env::temp_dir().join(format!("loja-test-uploads-{}", id));
        std::fs::create_dir_all(&upload_dir).unwrap();

        let pool = db::create_db_pool(&format!("sqlite://{}", db_path.display()))
            .await
            .unwrap();
        seed_service::seed_demo_users(&pool).await.unwrap();

        let session_store = SqliteStore::new(pool.clone())
            .with_table_name("sessions")
            .unwrap();
        session_store.migrate().await.unwrap();

        let storage = Arc::new(LocalImageStorage::new(upload_dir.clone(), "/uploads"));
        let state = AppState::new(pool.clone(), storage, mailer);
        let router = build_app(state, session_store, Key::from(&[7u8; 64]));

        TestApp {
            router,
            pool,
            mailer: recorder,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// Faz login e devolve o cookie de sessão pronto para o header `cookie`.
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .json(
                Method::POST,
                "/login",
                None,
                serde_json::json!({ "email": email, "password": seed_service::DEMO_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.set_cookie.expect("login sets a session cookie")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let req = request(method, uri, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> TestResponse {
        let req = request(method, uri, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap();
        self.send(req).await
    }

    /// Cria um produto como admin e devolve o JSON da resposta.
    pub async fn create_product(&self, code: &str, price: f64, categories: &[&str]) -> Value {
        let cookie = self.login(ADMIN_EMAIL).await;
        let response = self
            .json(
                Method::POST,
                "/products",
                Some(&cookie),
                serde_json::json!({
                    "name": format!("Produto {}", code),
                    "code": code,
                    "price": price,
                    "categories": categories,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await.unwrap()
    }
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

/// Campos de um registo válido (o email e o CPF variam por teste).
pub fn registration_fields<'a>(email: &'a str, cpf: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("name", "Maria Silva"),
        ("cpf", cpf),
        ("email", email),
        ("password", "supersecret"),
        ("zipCode", "50000-000"),
        ("state", "PE"),
        ("city", "Recife"),
        ("street", "Rua da Aurora"),
        ("district", "Boa Vista"),
        ("number", "100"),
    ]
}

// PNG mínimo (só a assinatura interessa para o armazenamento)
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"profilePicUrl\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

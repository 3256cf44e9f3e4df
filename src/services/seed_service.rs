// src/services/seed_service.rs
use crate::{
    error::AppResult,
    models::role::{ROLE_ADMIN, ROLE_CLIENT, ROLE_EMPLOYEE},
    services::{auth_service, user_service},
};
use sqlx::SqlitePool;
use uuid::Uuid;

pub const DEMO_PASSWORD: &str = "secret";

struct DemoUser {
    name: &'static str,
    email: &'static str,
    cpf: &'static str,
    role: &'static str,
}

const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        name: "Admin",
        email: "admin@email.com",
        cpf: "000.000.000-01",
        role: ROLE_ADMIN,
    },
    DemoUser {
        name: "Client",
        email: "client@email.com",
        cpf: "000.000.000-02",
        role: ROLE_CLIENT,
    },
    DemoUser {
        name: "Employee",
        email: "employee@email.com",
        cpf: "000.000.000-03",
        role: ROLE_EMPLOYEE,
    },
];

/// Cria os utilizadores de demonstração que ainda não existam. Pode correr várias vezes.
pub async fn seed_demo_users(db_pool: &SqlitePool) -> AppResult<()> {
    let password_hash = auth_service::hash_password(DEMO_PASSWORD).await?;

    for demo in &DEMO_USERS {
        if user_service::find_user_by_email(db_pool, demo.email)
            .await?
            .is_some()
        {
            tracing::debug!("Seed: {} já existe, ignorado.", demo.email);
            continue;
        }

        let mut tx = db_pool.begin().await?;
        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (secure_id, name, cpf, email, password)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(demo.name)
        .bind(demo.cpf)
        .bind(demo.email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        user_service::attach_role_by_name(&mut tx, user_id, demo.role).await?;
        tx.commit().await?;

        tracing::info!("🌱 Seed: utilizador {} ({}) criado.", demo.email, demo.role);
    }

    Ok(())
}

// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult, ResultExt, RowExt},
    models::{
        address::Address,
        pagination::{Listing, Page, PageMeta, PageRequest},
        role::{RoleSummary, ROLE_CLIENT},
        user::{StoreUserPayload, UpdateUserPayload, User, UserDetail, UserFilters},
    },
    services::{
        auth_service,
        mail_service::Mailer,
        storage_service::{self, ImageStorage, StoredImage, UploadedImage},
    },
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Busca um utilizador pelo ID numérico (o que vai na sessão).
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por email: {}", email);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
        .bind(email.trim())
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Busca pelo identificador público (nunca expomos o ID sequencial nas rotas).
pub async fn find_user_by_secure_id(
    db_pool: &SqlitePool,
    secure_id: &str,
) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por secure_id: {}", secure_id);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE secure_id = ?1")
        .bind(secure_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Busca os nomes das roles de um utilizador.
pub async fn get_user_role_names(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<String>> {
    tracing::debug!("Buscando roles para user ID: {}", user_id);
    let roles = sqlx::query_scalar::<_, String>(
        r#"
        SELECT r.name
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = ?1
        ORDER BY r.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!("Roles encontradas para {}: {:?}", user_id, roles);
    Ok(roles)
}

pub async fn check_user_role_any(
    db_pool: &SqlitePool,
    user_id: i64,
    required_roles: &[&str],
) -> AppResult<bool> {
    if required_roles.is_empty() {
        return Ok(true);
    }
    let roles = get_user_role_names(db_pool, user_id).await?;
    Ok(roles
        .iter()
        .any(|role| required_roles.iter().any(|req| req.eq_ignore_ascii_case(role))))
}

/// Pré-carrega roles e moradas (equivalente ao preload do ORM).
pub async fn load_user_detail(conn: &mut SqliteConnection, user: User) -> AppResult<UserDetail> {
    let roles = sqlx::query_as::<_, RoleSummary>(
        r#"
        SELECT r.id, r.name
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = ?1
        ORDER BY r.name ASC
        "#,
    )
    .bind(user.id)
    .fetch_all(&mut *conn)
    .await?;

    let addresses =
        sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE user_id = ?1 ORDER BY id ASC")
            .bind(user.id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(UserDetail {
        user,
        roles,
        addresses,
    })
}

pub async fn fetch_user_detail(conn: &mut SqliteConnection, user_id: i64) -> AppResult<UserDetail> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .or_not_found("User not found")?;
    load_user_detail(conn, user).await
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &UserFilters) {
    if let Some(name) = filters.name.as_deref().filter(|v| !v.trim().is_empty()) {
        qb.push(" AND name LIKE ")
            .push_bind(format!("%{}%", name.trim()));
    }
    if let Some(email) = filters.email.as_deref().filter(|v| !v.trim().is_empty()) {
        qb.push(" AND email = ").push_bind(email.trim().to_string());
    }
    if let Some(cpf) = filters.cpf.as_deref().filter(|v| !v.trim().is_empty()) {
        qb.push(" AND cpf = ").push_bind(cpf.trim().to_string());
    }
}

/// Listagem (admin) com filtros opcionais e paginação.
pub async fn list_users(
    db_pool: &SqlitePool,
    page: Option<PageRequest>,
    filters: &UserFilters,
) -> AppResult<Listing<UserDetail>> {
    tracing::debug!("Listando utilizadores (página {:?}, filtros {:?})", page, filters);

    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE 1 = 1");
    push_user_filters(&mut query, filters);
    query.push(" ORDER BY id ASC");
    if let Some(page) = page {
        query
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
    }
    let users: Vec<User> = query.build_query_as().fetch_all(db_pool).await?;

    let mut conn = db_pool.acquire().await?;
    let mut details = Vec::with_capacity(users.len());
    for user in users {
        details.push(load_user_detail(&mut conn, user).await?);
    }

    match page {
        None => Ok(Listing::All(details)),
        Some(page) => {
            let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
            push_user_filters(&mut count, filters);
            let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;
            Ok(Listing::Paged(Page {
                meta: PageMeta::new(total, page),
                data: details,
            }))
        }
    }
}

/// Liga a role (por nome) ao utilizador. Devolve `false` se a role não existir.
pub async fn attach_role_by_name(
    conn: &mut SqliteConnection,
    user_id: i64,
    role_name: &str,
) -> AppResult<bool> {
    let role_id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?1")
        .bind(role_name)
        .fetch_optional(&mut *conn)
        .await?;

    match role_id {
        Some(role_id) => {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *conn)
                .await?;
            Ok(true)
        }
        None => {
            tracing::warn!("Role '{}' não existe; nada ligado ao user {}", role_name, user_id);
            Ok(false)
        }
    }
}

/// Registo completo: foto -> transação (user, role client, morada, email) -> commit.
///
/// A foto é enviada antes da transação; se algo falhar depois, a transação é
/// desfeita e a foto é apagada (melhor esforço, não é transacional).
pub async fn register_user(
    db_pool: &SqlitePool,
    storage: &dyn ImageStorage,
    mailer: &dyn Mailer,
    payload: StoreUserPayload,
    image: Option<UploadedImage>,
) -> AppResult<UserDetail> {
    tracing::info!("Tentando registar utilizador: {}", payload.email);

    let password_hash = auth_service::hash_password(&payload.password).await?;

    // 1. Upload fora da transação
    let stored = match image {
        Some(image) => Some(
            storage_service::store_profile_picture(storage, &image, &payload.name, &payload.cpf)
                .await
                .or_bad_request("Error in uploading profile picture")?,
        ),
        None => None,
    };

    // 2. Transação: qualquer `?` lá dentro faz rollback (o tx é descartado sem commit)
    let user_id =
        match insert_user_with_address(db_pool, mailer, &payload, &password_hash, stored.as_ref())
            .await
        {
            Ok(user_id) => user_id,
            Err(e) => {
                if let Some(stored) = &stored {
                    storage_service::discard_image(storage, stored).await;
                }
                return Err(e);
            }
        };

    tracing::info!("✅ Utilizador '{}' registado com ID {}.", payload.email, user_id);

    // 3. Recarrega com roles e moradas
    let mut conn = db_pool.acquire().await?;
    fetch_user_detail(&mut conn, user_id).await
}

async fn insert_user_with_address(
    db_pool: &SqlitePool,
    mailer: &dyn Mailer,
    payload: &StoreUserPayload,
    password_hash: &str,
    picture: Option<&StoredImage>,
) -> AppResult<i64> {
    let mut tx = db_pool.begin().await?;

    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (secure_id, name, cpf, email, password)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(payload.name.trim())
    .bind(payload.cpf.trim())
    .bind(payload.email.trim())
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await
    .or_bad_request("Error in creating user")?;

    if let Some(picture) = picture {
        sqlx::query("UPDATE users SET profile_pic_url = ?1 WHERE id = ?2")
            .bind(&picture.url)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .or_bad_request("Error in creating user")?;
    }

    attach_role_by_name(&mut tx, user_id, ROLE_CLIENT)
        .await
        .or_bad_request("Error in creating user")?;

    sqlx::query(
        r#"
        INSERT INTO addresses (user_id, zip_code, state, city, street, district, number, complement)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(user_id)
    .bind(payload.zip_code.as_deref())
    .bind(payload.state.trim())
    .bind(payload.city.trim())
    .bind(payload.street.trim())
    .bind(payload.district.as_deref())
    .bind(payload.number)
    .bind(payload.complement.as_deref())
    .execute(&mut *tx)
    .await
    .or_bad_request("Error in creating address")?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
    mailer
        .send_welcome(&user)
        .await
        .or_bad_request("Error in sending welcome email")?;

    tx.commit().await?;
    Ok(user_id)
}

/// Atualiza dados, foto e (opcionalmente) uma morada do próprio utilizador.
pub async fn update_user(
    db_pool: &SqlitePool,
    storage: &dyn ImageStorage,
    user: User,
    payload: UpdateUserPayload,
    image: Option<UploadedImage>,
) -> AppResult<UserDetail> {
    tracing::info!("Atualizando dados para user: {}", user.secure_id);

    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(auth_service::hash_password(password).await?),
        None => None,
    };

    let stored = match image {
        Some(image) => {
            let name = payload.name.as_deref().unwrap_or(&user.name);
            let cpf = payload.cpf.as_deref().unwrap_or(&user.cpf);
            Some(
                storage_service::store_profile_picture(storage, &image, name, cpf)
                    .await
                    .or_bad_request("Error in uploading profile picture")?,
            )
        }
        None => None,
    };

    if let Err(e) =
        apply_user_update(db_pool, &user, &payload, password_hash.as_deref(), stored.as_ref()).await
    {
        if let Some(stored) = &stored {
            storage_service::discard_image(storage, stored).await;
        }
        return Err(e);
    }

    // Foto nova já gravada: a anterior deixa de ser referenciada
    if stored.is_some() {
        if let Some(previous) = storage_service::stored_image_at(storage, &user.profile_pic_url) {
            storage_service::discard_image(storage, &previous).await;
        }
    }

    tracing::info!("✅ Dados atualizados com sucesso para user: {}", user.secure_id);
    let mut conn = db_pool.acquire().await?;
    fetch_user_detail(&mut conn, user.id).await
}

async fn apply_user_update(
    db_pool: &SqlitePool,
    user: &User,
    payload: &UpdateUserPayload,
    password_hash: Option<&str>,
    picture: Option<&StoredImage>,
) -> AppResult<()> {
    let mut tx = db_pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE users
        SET
            name = COALESCE(?1, name),
            cpf = COALESCE(?2, cpf),
            email = COALESCE(?3, email),
            password = COALESCE(?4, password),
            profile_pic_url = COALESCE(?5, profile_pic_url),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?6
        "#,
    )
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.cpf.as_deref().map(str::trim))
    .bind(payload.email.as_deref().map(str::trim))
    .bind(password_hash)
    .bind(picture.map(|p| p.url.as_str()))
    .bind(user.id)
    .execute(&mut *tx)
    .await
    .or_bad_request("Error in updating user")?;

    if let Some(address_id) = payload.address_id {
        // A morada tem de pertencer ao utilizador que está a ser atualizado
        sqlx::query_scalar::<_, i64>("SELECT id FROM addresses WHERE id = ?1 AND user_id = ?2")
            .bind(address_id)
            .bind(user.id)
            .fetch_one(&mut *tx)
            .await
            .or_not_found("Address not found")?;

        sqlx::query(
            r#"
            UPDATE addresses
            SET
                zip_code = COALESCE(?1, zip_code),
                state = COALESCE(?2, state),
                city = COALESCE(?3, city),
                street = COALESCE(?4, street),
                district = COALESCE(?5, district),
                number = COALESCE(?6, number),
                complement = COALESCE(?7, complement),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?8
            "#,
        )
        .bind(payload.zip_code.as_deref())
        .bind(payload.state.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.street.as_deref())
        .bind(payload.district.as_deref())
        .bind(payload.number)
        .bind(payload.complement.as_deref())
        .bind(address_id)
        .execute(&mut *tx)
        .await
        .or_bad_request("Error in updating address")?;
    } else if payload.touches_address() {
        tracing::warn!(
            "Campos de morada ignorados para {}: falta addressId",
            user.secure_id
        );
    }

    tx.commit().await?;
    Ok(())
}

pub async fn delete_user_by_secure_id(db_pool: &SqlitePool, secure_id: &str) -> AppResult<()> {
    tracing::info!("Removendo utilizador {}", secure_id);
    let rows_affected = sqlx::query("DELETE FROM users WHERE secure_id = ?1")
        .bind(secure_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::not_found(
            "User not found",
            format!("no user with secure id {}", secure_id),
        ));
    }
    Ok(())
}

/// Substitui o conjunto de roles (sync). Nomes desconhecidos são ignorados.
pub async fn sync_user_roles(
    db_pool: &SqlitePool,
    user_id: i64,
    role_names: &[String],
) -> AppResult<UserDetail> {
    tracing::info!("Atualizando roles para user {}: {:?}", user_id, role_names);

    let mut tx = db_pool.begin().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .or_not_found("User not found")?;

    let mut role_ids: Vec<i64> = Vec::new();
    for name in role_names {
        let name = name.trim();
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        match found {
            Some(id) if !role_ids.contains(&id) => role_ids.push(id),
            Some(_) => {}
            None => tracing::warn!("Role desconhecida '{}' ignorada para user {}", name, user_id),
        }
    }

    sqlx::query("DELETE FROM user_roles WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .or_bad_request("Error in access allow")?;

    for role_id in role_ids {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .or_bad_request("Error in access allow")?;
    }

    let detail = load_user_detail(&mut tx, user).await?;
    tx.commit().await?;

    tracing::info!("✅ Roles atualizadas com sucesso para user {}", user_id);
    Ok(detail)
}

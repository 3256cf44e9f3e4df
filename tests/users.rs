mod common;

use axum::http::{Method, StatusCode};
use common::{registration_fields, TestApp, ADMIN_EMAIL, CLIENT_EMAIL, EMPLOYEE_EMAIL, PNG_BYTES};
use serde_json::json;

async fn secure_id_of(app: &TestApp, email: &str) -> String {
    sqlx::query_scalar::<_, String>("SELECT secure_id FROM users WHERE email = ?1")
        .bind(email)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

fn stored_pictures(app: &TestApp) -> usize {
    std::fs::read_dir(app.upload_dir.join("profile-pics"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn registration_creates_user_role_address_and_sends_mail() {
    let app = TestApp::new().await;

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &registration_fields("maria@email.com", "111.222.333-44"),
            Some(("me.png", "image/png", PNG_BYTES)),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let user = &response.body["userFound"];
    assert_eq!(user["email"], "maria@email.com");
    assert!(user.get("password").is_none());
    assert_eq!(user["roles"].as_array().unwrap().len(), 1);
    assert_eq!(user["roles"][0]["name"], "client");
    assert_eq!(user["addresses"].as_array().unwrap().len(), 1);
    assert_eq!(user["addresses"][0]["city"], "Recife");
    assert_eq!(user["addresses"][0]["number"], 100);
    assert!(user["profilePicUrl"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/profile-pics/11122233344-maria-silva-"));

    assert_eq!(stored_pictures(&app), 1);
    assert_eq!(*app.mailer.sent.lock().unwrap(), vec!["maria@email.com".to_string()]);

    // A nova conta consegue fazer login
    let login = app
        .json(
            Method::POST,
            "/login",
            None,
            json!({ "email": "maria@email.com", "password": "supersecret" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn registration_without_picture_keeps_placeholder() {
    let app = TestApp::new().await;

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &registration_fields("semfoto@email.com", "11122233355"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert!(response.body["userFound"]["profilePicUrl"]
        .as_str()
        .unwrap()
        .starts_with("http"));
    assert_eq!(stored_pictures(&app), 0);
}

#[tokio::test]
async fn mail_failure_rolls_back_user_and_discards_picture() {
    let app = TestApp::with_failing_mailer().await;
    let users_before = app.count("SELECT COUNT(*) FROM users").await;

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &registration_fields("rollback@email.com", "999.888.777-66"),
            Some(("me.png", "image/png", PNG_BYTES)),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Error in sending welcome email");
    assert!(response.body["originalErrorMessage"]
        .as_str()
        .unwrap()
        .contains("smtp relay unavailable"));

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, users_before);
    assert_eq!(app.count("SELECT COUNT(*) FROM addresses").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM user_roles").await, 3);
    assert_eq!(stored_pictures(&app), 0);
}

#[tokio::test]
async fn duplicate_email_fails_at_user_creation_step() {
    let app = TestApp::new().await;

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &registration_fields(CLIENT_EMAIL, "555.555.555-55"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Error in creating user");
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn bad_picture_is_rejected_before_any_database_work() {
    let app = TestApp::new().await;
    let users_before = app.count("SELECT COUNT(*) FROM users").await;

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &registration_fields("gif@email.com", "123.123.123-12"),
            Some(("me.gif", "image/gif", &b"GIF89a"[..])),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Error in uploading profile picture");
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, users_before);
}

#[tokio::test]
async fn invalid_registration_lists_field_errors() {
    let app = TestApp::new().await;

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &[("name", "Jo"), ("cpf", "12"), ("email", "nope"), ("number", "dez")],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["errors"]["number"].is_array());

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &[("name", "Jo"), ("cpf", "12"), ("email", "nope")],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    for field in ["name", "cpf", "email", "password", "state", "city", "street"] {
        assert!(response.body["errors"][field].is_array(), "missing {field}");
    }
}

#[tokio::test]
async fn owner_updates_profile_and_address() {
    let app = TestApp::new().await;
    app.multipart(
        Method::POST,
        "/users",
        None,
        &registration_fields("owner@email.com", "321.321.321-32"),
        None,
    )
    .await;
    let secure_id = secure_id_of(&app, "owner@email.com").await;
    let address_id: i64 = sqlx::query_scalar(
        "SELECT a.id FROM addresses a JOIN users u ON u.id = a.user_id WHERE u.email = ?1",
    )
    .bind("owner@email.com")
    .fetch_one(&app.pool)
    .await
    .unwrap();

    let login = app
        .json(
            Method::POST,
            "/login",
            None,
            json!({ "email": "owner@email.com", "password": "supersecret" }),
        )
        .await;
    let cookie = login.set_cookie.unwrap();

    let address_id = address_id.to_string();
    let response = app
        .multipart(
            Method::PUT,
            &format!("/users/{}", secure_id),
            Some(&cookie),
            &[
                ("name", "Maria Souza"),
                ("addressId", address_id.as_str()),
                ("city", "Olinda"),
            ],
            Some(("new.webp", "image/webp", &b"RIFF0000WEBP"[..])),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let user = &response.body["userFound"];
    assert_eq!(user["name"], "Maria Souza");
    assert_eq!(user["addresses"][0]["city"], "Olinda");
    assert_eq!(user["addresses"][0]["street"], "Rua da Aurora");
    assert!(user["profilePicUrl"].as_str().unwrap().ends_with(".webp"));
}

#[tokio::test]
async fn address_of_another_user_cannot_be_updated() {
    let app = TestApp::new().await;
    app.multipart(
        Method::POST,
        "/users",
        None,
        &registration_fields("other@email.com", "456.456.456-45"),
        None,
    )
    .await;
    let foreign_address: i64 = sqlx::query_scalar("SELECT id FROM addresses LIMIT 1")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let cookie = app.login(CLIENT_EMAIL).await;
    let secure_id = secure_id_of(&app, CLIENT_EMAIL).await;
    let foreign_address = foreign_address.to_string();
    let response = app
        .multipart(
            Method::PATCH,
            &format!("/users/{}", secure_id),
            Some(&cookie),
            &[("addressId", foreign_address.as_str()), ("city", "Caruaru")],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Address not found");
}

#[tokio::test]
async fn only_owner_or_admin_may_update() {
    let app = TestApp::new().await;
    let admin_id = secure_id_of(&app, ADMIN_EMAIL).await;
    let client_id = secure_id_of(&app, CLIENT_EMAIL).await;

    let cookie = app.login(CLIENT_EMAIL).await;
    let response = app
        .multipart(
            Method::PUT,
            &format!("/users/{}", admin_id),
            Some(&cookie),
            &[("name", "Hacker")],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let cookie = app.login(ADMIN_EMAIL).await;
    let response = app
        .multipart(
            Method::PUT,
            &format!("/users/{}", client_id),
            Some(&cookie),
            &[("name", "Cliente Renomeado")],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userFound"]["name"], "Cliente Renomeado");

    let response = app
        .multipart(Method::PUT, "/users/does-not-exist", Some(&cookie), &[], None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_lists_users_with_pagination_and_filters() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app.get("/users", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["meta"]["perPage"], 2);
    assert_eq!(response.body["meta"]["total"], 3);
    assert_eq!(response.body["meta"]["lastPage"], 2);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);
    assert!(response.body["data"][0]["roles"].is_array());

    let response = app
        .get(&format!("/users?noPagination=1&email={}", EMPLOYEE_EMAIL), Some(&cookie))
        .await;
    let users = response.body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["roles"][0]["name"], "employee");

    let response = app.get("/users?noPagination=1&name=li", Some(&cookie)).await;
    assert_eq!(response.body.as_array().unwrap().len(), 1);

    let client = app.login(CLIENT_EMAIL).await;
    assert_eq!(app.get("/users", Some(&client)).await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_shows_and_deletes_users() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN_EMAIL).await;
    let employee_id = secure_id_of(&app, EMPLOYEE_EMAIL).await;
    let uri = format!("/users/{}", employee_id);

    let response = app.get(&uri, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], EMPLOYEE_EMAIL);

    let response = app.delete(&uri, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 2);

    assert_eq!(app.get(&uri, Some(&cookie)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, Some(&cookie)).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn access_allow_replaces_role_set() {
    let app = TestApp::new().await;
    let cookie = app.login(ADMIN_EMAIL).await;
    let client_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
        .bind(CLIENT_EMAIL)
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let response = app
        .json(
            Method::POST,
            "/users/access_allow",
            Some(&cookie),
            json!({ "user_id": client_id, "roles": ["employee", "client", "ghost"] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let mut roles: Vec<&str> = response.body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    roles.sort_unstable();
    assert_eq!(roles, vec!["client", "employee"]);

    // O cliente passa a ver o catálogo
    let client = app.login(CLIENT_EMAIL).await;
    assert_eq!(app.get("/products", Some(&client)).await.status, StatusCode::OK);

    let response = app
        .json(
            Method::POST,
            "/users/access_allow",
            Some(&cookie),
            json!({ "user_id": 9999, "roles": ["client"] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .json(
            Method::POST,
            "/users/access_allow",
            Some(&cookie),
            json!({ "user_id": client_id, "roles": [] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .json(
            Method::POST,
            "/users/access_allow",
            Some(&client),
            json!({ "user_id": client_id, "roles": ["admin"] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn address_failure_rolls_back_user_and_discards_picture() {
    let app = TestApp::new().await;
    sqlx::query(
        "CREATE TRIGGER block_addresses BEFORE INSERT ON addresses \
         BEGIN SELECT RAISE(ABORT, 'addresses are read-only'); END",
    )
    .execute(&app.pool)
    .await
    .unwrap();

    let response = app
        .multipart(
            Method::POST,
            "/users",
            None,
            &registration_fields("semmorada@email.com", "444.333.222-11"),
            Some(("me.png", "image/png", PNG_BYTES)),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Error in creating address");
    assert!(response.body["originalErrorMessage"]
        .as_str()
        .unwrap()
        .contains("addresses are read-only"));

    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?1")
        .bind("semmorada@email.com")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
    assert_eq!(stored_pictures(&app), 0);
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn new_picture_replaces_the_previous_file() {
    let app = TestApp::new().await;
    app.multipart(
        Method::POST,
        "/users",
        None,
        &registration_fields("foto@email.com", "777.666.555-44"),
        Some(("me.png", "image/png", PNG_BYTES)),
    )
    .await;
    assert_eq!(stored_pictures(&app), 1);
    let secure_id = secure_id_of(&app, "foto@email.com").await;
    let cookie = app.login(ADMIN_EMAIL).await;

    for _ in 0..2 {
        let response = app
            .multipart(
                Method::PATCH,
                &format!("/users/{}", secure_id),
                Some(&cookie),
                &[],
                Some(("new.webp", "image/webp", &b"RIFF0000WEBP"[..])),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    }

    assert_eq!(stored_pictures(&app), 1);
    let url = sqlx::query_scalar::<_, String>("SELECT profile_pic_url FROM users WHERE email = ?1")
        .bind("foto@email.com")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let key = url.strip_prefix("/uploads/").unwrap();
    assert!(app.upload_dir.join(key).exists());
}

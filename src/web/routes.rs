// src/web/routes.rs
use crate::{
    services::storage_service::MAX_IMAGE_BYTES,
    state::AppState,
    web::{
        auth_handlers, cart_handlers, category_handlers, health_handlers, mw_auth, mw_roles,
        product_handlers, purchase_handlers, user_handlers,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", post(auth_handlers::handle_login))
        .route("/logout", post(auth_handlers::handle_logout))
        .route("/users", post(user_handlers::store))
        .route("/test_db_connections", get(health_handlers::test_db_connections));

    // --- Rotas de Admin ---
    let admin_routes = Router::new()
        .route("/users", get(user_handlers::index))
        .route(
            "/users/{id}",
            get(user_handlers::show).delete(user_handlers::destroy),
        )
        .route("/users/access_allow", post(user_handlers::access_allow))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_roles::require_admin,
        ));

    // --- Catálogo (admin ou employee) ---
    let catalog_routes = Router::new()
        .route(
            "/products",
            get(product_handlers::index).post(product_handlers::store),
        )
        .route(
            "/products/{id}",
            get(product_handlers::show)
                .put(product_handlers::update)
                .patch(product_handlers::update)
                .delete(product_handlers::destroy),
        )
        .route(
            "/categories",
            get(category_handlers::index).post(category_handlers::store),
        )
        .route(
            "/categories/{id}",
            get(category_handlers::show)
                .put(category_handlers::update)
                .patch(category_handlers::update)
                .delete(category_handlers::destroy),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_roles::require_staff,
        ));

    // --- Carrinho e compras (client) ---
    let client_routes = Router::new()
        .route("/cart", get(cart_handlers::index).post(cart_handlers::store))
        .route(
            "/cart/{id}",
            get(cart_handlers::show)
                .put(cart_handlers::update)
                .patch(cart_handlers::update)
                .delete(cart_handlers::destroy),
        )
        .route(
            "/purchases",
            get(purchase_handlers::index).post(purchase_handlers::store),
        )
        .route("/purchases/{id}", get(purchase_handlers::show))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_roles::require_client,
        ));

    // --- Qualquer role ---
    // A alteração de dados aceita qualquer role; o handler restringe ao próprio ou a um admin
    let member_routes = Router::new()
        .route("/test_auth", get(health_handlers::test_auth))
        .route(
            "/users/{id}",
            axum::routing::put(user_handlers::update).patch(user_handlers::update),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_roles::require_any_role,
        ));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .merge(admin_routes)
        .merge(catalog_routes)
        .merge(client_routes)
        .merge(member_routes)
        // require_auth corre antes dos middlewares de role
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        // Foto de perfil (até 2 MiB) mais os campos de texto
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES * 2))
        .with_state(app_state)
}

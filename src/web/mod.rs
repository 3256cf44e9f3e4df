// src/web/mod.rs
pub mod auth_handlers;
pub mod cart_handlers;
pub mod category_handlers;
pub mod extract;
pub mod health_handlers;
pub mod mw_auth;
pub mod mw_roles;
pub mod product_handlers;
pub mod purchase_handlers;
pub mod routes;
pub mod user_handlers;

// src/services/mod.rs
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod mail_service;
pub mod product_service;
pub mod purchase_service;
pub mod seed_service;
pub mod storage_service;
pub mod user_service;

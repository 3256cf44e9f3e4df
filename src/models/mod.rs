// src/models/mod.rs
pub mod address;
pub mod cart;
pub mod category;
pub mod pagination;
pub mod product;
pub mod purchase;
pub mod role;
pub mod user;

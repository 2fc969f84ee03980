pub mod cache_service;
pub mod models;

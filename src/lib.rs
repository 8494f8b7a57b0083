pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod enrich;
pub mod models;
pub mod report;
pub mod storage;

pub mod config;
pub mod dto;
pub mod encoding;
pub mod handlers;
pub mod models;
pub mod query;
pub mod render;
pub mod service;
pub mod transport;

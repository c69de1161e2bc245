pub mod api;
pub mod app;
pub mod config;
pub mod cors;
pub mod error;
pub mod validation;
pub mod workspace;

// web-server/src/lib.rs
pub mod api;
pub mod auth;
pub mod middleware;
pub mod proxy;
pub mod session_registry;
pub mod static_files;
pub mod utils;

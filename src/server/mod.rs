mod admin_routes;
pub mod config;
mod http_layers;
mod media_files;
pub mod metrics;
mod sample_routes;
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::{make_app, run_server};

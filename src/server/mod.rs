mod client;
mod handlers;
mod models;
mod sessions;
mod state;

pub use handlers::run_server;

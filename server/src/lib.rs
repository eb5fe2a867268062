pub mod config;
pub mod format;
pub mod routes;
pub mod server_state;

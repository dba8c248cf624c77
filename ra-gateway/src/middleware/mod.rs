pub mod auth;
pub mod handle_error;
pub mod request_context;

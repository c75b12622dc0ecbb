pub mod request_handler;
pub mod routing;
mod sessions;

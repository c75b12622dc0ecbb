pub mod events;
pub mod server;
pub mod session;

pub use server::run_chat_socket;

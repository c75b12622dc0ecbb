pub mod http_response;
pub mod method;
pub mod request;
pub mod response;
pub mod server;

pub use method::Method;
pub use request::Request;
pub use response::Response;
pub use server::{run_server, RequestHandler};

use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::messenger::Messenger;

use crate::routing;

/// Glue between the http server and the routing table: one clone per
/// request, carrying the campus and messenger services.
#[derive(Clone)]
pub struct RequestHandler<S: DataAccess + MessageStore, A: AuthService> {
    campus: Campus<S, A>,
    messenger: Messenger<S>,
}

impl<S: DataAccess + MessageStore, A: AuthService> RequestHandler<S, A> {
    /// Takes the services rather than a store so the messenger (and its
    /// connection registry) can be shared with the chat socket.
    pub fn new(campus: Campus<S, A>, messenger: Messenger<S>) -> Self {
        RequestHandler { campus, messenger }
    }
}

#[derive(Debug)]
pub struct RequestHandlerError {
    inner: anyhow::Error,
}

impl From<anyhow::Error> for RequestHandlerError {
    fn from(inner: anyhow::Error) -> Self {
        RequestHandlerError { inner }
    }
}

impl std::fmt::Display for RequestHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for RequestHandlerError {}

impl<S, A, T> http_server::RequestHandler<Request<T>> for RequestHandler<S, A>
where
    S: DataAccess + MessageStore,
    A: AuthService,
    T: AsyncRead + Unpin + Sync + Send,
{
    type Error = RequestHandlerError;

    fn handle(self, request: &mut Request<T>) -> impl std::future::Future<Output = anyhow::Result<Response, Self::Error>> + Send {
        routing::route(request, self.campus, self.messenger)
    }
}

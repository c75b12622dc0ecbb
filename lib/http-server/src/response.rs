use stoa_utils::http::Header;

/// Responses the routing layer can produce. Everything the JSON API returns
/// maps onto one of these shapes; the builder in [`crate::http_response`]
/// turns them into bytes.
pub enum Response {
    /// 200 with a JSON body.
    Json { content: String, headers: Vec<Header> },
    /// 201 with a JSON body.
    Created { content: String, headers: Vec<Header> },
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    /// 500 carrying the handler's error text verbatim in a
    /// `{"message": …}` body.
    InternalServerError { message: String },
    Empty,
}

impl Response {
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Response::BadRequest)
    }

    pub fn is_internal_server_error(&self) -> bool {
        matches!(self, Response::InternalServerError { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Empty)
    }
}

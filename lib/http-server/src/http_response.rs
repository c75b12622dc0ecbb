use std::collections::HashMap;

use stoa_utils::http::Header;
use stoa_utils::utils::CaseInsensitiveString;

pub struct HttpResponse(Vec<u8>);

impl HttpResponse {
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

pub struct HttpResponseBuilder<'a> {
    version: HttpVersion,
    status: HttpStatusCode,
    headers: HashMap<CaseInsensitiveString, String>,
    body: Option<&'a str>,
}

impl<'a> HttpResponseBuilder<'a> {
    pub fn new() -> Self {
        let version = HttpVersion::Http11;
        let status = HttpStatusCode::OK;
        let headers = HashMap::new();
        let body = None;
        HttpResponseBuilder { version, status, headers, body }
    }

    pub fn build(&mut self) -> HttpResponse {
        let mut lines = vec![];
        lines.push(format!("{} {}\r\n", self.version, self.status).into_bytes());

        // headers
        if let Some(body) = self.body {
            self.headers
                .insert(CaseInsensitiveString::from("Content-Length"), format!("{}", body.len()));
        };
        for (key, value) in self.headers.iter() {
            lines.push(format!("{key}: {value}\r\n").into_bytes());
        }
        lines.push(b"\r\n".into());

        // body
        if let Some(body) = self.body {
            lines.push(body.as_bytes().to_owned());
        };

        let res: Vec<u8> = lines.concat();
        HttpResponse(res)
    }

    pub fn status(&mut self, status: HttpStatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn header(&mut self, (key, value): Header) -> &mut Self {
        self.headers.insert(key, value);
        self
    }

    pub fn body(&mut self, body: &'a str) -> &mut Self {
        self.body = Some(body);
        self
    }

    pub fn content_json(&mut self) -> &mut Self {
        self.headers.insert(
            CaseInsensitiveString::from("Content-Type"),
            "application/json; charset=utf-8".to_owned(),
        );
        self
    }
}

impl<'a> Default for HttpResponseBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

pub enum HttpStatusCode {
    OK,
    Created,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_repr = match self {
            Self::OK => "200 OK",
            Self::Created => "201 Created",
            Self::BadRequest => "400 Bad Request",
            Self::Unauthorized => "401 Unauthorized",
            Self::Forbidden => "403 Forbidden",
            Self::NotFound => "404 Not Found",
            Self::InternalServerError => "500 Internal Server Error",
        };
        write!(f, "{str_repr}")
    }
}

pub enum HttpVersion {
    Http11,
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_repr = match self {
            Self::Http11 => "HTTP/1.1",
        };
        write!(f, "{str_repr}")
    }
}

use std::collections::HashMap;

use http_server::{Method, Request};
use stoa_utils::http::get_cookies_hashmap;

#[tokio::test]
async fn gibberish_is_not_a_request() {
    let reader = tokio_test::io::Builder::new().read(b"complete nonsense").build();
    let request_res = Request::try_from_stream(reader).await;
    assert!(request_res.is_err())
}

#[tokio::test]
async fn parses_the_request_line_and_headers() {
    let reader = tokio_test::io::Builder::new()
        .read(b"GET /users?search=ada HTTP/1.1\r\n")
        .read(b"Accept: application/json\r\n")
        .read(b"Cookie: _stoa_sid=abc123\r\n")
        .read(b"\r\n")
        .build();
    let request = Request::try_from_stream(reader).await.unwrap();
    assert_eq!(request.url(), "/users?search=ada");
    assert_eq!(request.method(), Method::Get);
    assert_eq!(
        *request.headers(),
        HashMap::from([
            ("Accept".into(), String::from("application/json")),
            ("Cookie".into(), String::from("_stoa_sid=abc123")),
        ])
    );
}

#[tokio::test]
async fn header_names_are_case_insensitive() {
    let reader = tokio_test::io::Builder::new()
        .read(b"PUT /profile HTTP/1.1\r\n")
        .read(b"CONTENT-LENGTH: 2\r\n")
        .read(b"\r\n")
        .read(b"{}")
        .build();
    let mut request = Request::try_from_stream(reader).await.unwrap();
    assert_eq!(request.method(), Method::Put);
    assert_eq!(request.content().await.unwrap(), "{}");
}

#[tokio::test]
async fn content_needs_a_content_length() {
    let reader = tokio_test::io::Builder::new()
        .read(b"POST /messages HTTP/1.1\r\n")
        .read(b"Accept: application/json\r\n")
        .read(b"\r\n")
        .build();
    let mut request = Request::try_from_stream(reader).await.unwrap();
    assert!(request.content().await.is_err());
}

#[tokio::test]
async fn reads_exactly_content_length_bytes() {
    let body = br#"{"receiverId":"0","content":"hi"}"#;
    let reader = tokio_test::io::Builder::new()
        .read(b"POST /messages HTTP/1.1\r\n")
        .read(format!("Content-Length: {}\r\n", body.len()).as_bytes())
        .read(b"\r\n")
        .read(body)
        .build();
    let mut request = Request::try_from_stream(reader).await.unwrap();
    assert_eq!(request.content().await.unwrap(), String::from_utf8_lossy(body));
}

#[tokio::test]
async fn cookies_come_out_of_the_cookie_header() {
    let reader = tokio_test::io::Builder::new()
        .read(b"GET /profile HTTP/1.1\r\n")
        .read(b"Cookie: _stoa_sid=abc123; theme=dark\r\n")
        .read(b"\r\n")
        .build();
    let request = Request::try_from_stream(reader).await.unwrap();
    let cookies = match get_cookies_hashmap(request.headers()) {
        Ok(cookies) => cookies,
        Err(_) => panic!("cookie header did not parse"),
    };
    assert_eq!(
        cookies,
        HashMap::from([
            (String::from("_stoa_sid"), String::from("abc123")),
            (String::from("theme"), String::from("dark")),
        ])
    );
}

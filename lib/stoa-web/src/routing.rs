mod accounts;
mod directory;
mod events;
mod jobs;
mod messages;
mod notifications;

use std::collections::HashMap;

use anyhow::Result;
use tokio::io::AsyncRead;

use http_server::{Request, Response};

use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_campus::Role;
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::messenger::Messenger;
use stoa_utils::http::get_cookies_hashmap;
use stoa_utils::utils::{log_internal_error, CaseInsensitiveString};

use crate::request_handler::RequestHandlerError;
use crate::sessions::{self, SessionInfo};

pub async fn route<S, A, T>(
    request: &mut Request<T>,
    campus: Campus<S, A>,
    messenger: Messenger<S>,
) -> Result<Response, RequestHandlerError>
where
    S: DataAccess + MessageStore,
    A: AuthService,
    T: AsyncRead + Unpin,
{
    let url = request.url();
    let (path, params_anchor) = match url.split_once('?') {
        Some(res) => res,
        None => (url, ""),
    };
    let path = path.to_owned();

    let (params, _anchor) = match params_anchor.split_once('#') {
        Some(res) => res,
        None => (params_anchor, ""),
    };
    let params = params.to_owned();

    let mut path_segments = path
        .split('/')
        .filter(|s| !s.is_empty());

    let method = request.method();
    let query = (
        method,
        path_segments.next(),
        path_segments.next(),
        path_segments.next(),
        path_segments.next(),
    );

    use http_server::Method::*;
    let response = match query {
        (Post, Some("signup"), None, ..) => accounts::signup(request, campus).await,
        (Post, Some("login"), None, ..) => accounts::login(request, campus).await,
        (Get, Some("logout"), None, ..) => accounts::logout(request),
        (Get, Some("users"), None, ..) => directory::search_users(request, campus, &params).await,
        (Get, Some("users"), Some(user_id), None, ..) => directory::user_overview(request, campus, user_id).await,
        (Get, Some("profile"), None, ..) => directory::own_profile(request, campus).await,
        (Put, Some("profile"), None, ..) => directory::update_profile(request, campus).await,
        (Post, Some("messages"), None, ..) => messages::send(request, messenger).await,
        (Get, Some("messages"), Some(other_user), None, ..) => messages::conversation(request, messenger, other_user).await,
        (Put, Some("messages"), Some(message_id), Some("read"), None) => messages::mark_read(request, messenger, message_id).await,
        (Post, Some("events"), None, ..) => events::create(request, campus).await,
        (Get, Some("events"), None, ..) => events::list(request, campus).await,
        (Put, Some("events"), Some(event_id), None, ..) => events::update(request, campus, event_id).await,
        (Delete, Some("events"), Some(event_id), None, ..) => events::delete(request, campus, event_id).await,
        (Post, Some("events"), Some(event_id), Some("register"), None) => events::register(request, campus, event_id).await,
        (Post, Some("jobs"), None, ..) => jobs::create(request, campus).await,
        (Get, Some("jobs"), None, ..) => jobs::list(request, campus).await,
        (Put, Some("jobs"), Some(job_id), None, ..) => jobs::update(request, campus, job_id).await,
        (Delete, Some("jobs"), Some(job_id), None, ..) => jobs::delete(request, campus, job_id).await,
        (Get, Some("notifications"), None, ..) => notifications::list(request, campus).await,
        (Post, Some("notifications"), None, ..) => notifications::create(request, campus).await,
        (Put, Some("notifications"), Some(notification_id), Some("read"), None) => {
            notifications::mark_read(request, campus, notification_id).await
        }
        (Get, Some("favicon.ico"), None, ..) => Ok(Response::Empty),
        _ => Ok(Response::BadRequest),
    };

    let response = response.unwrap_or_else(|error| {
        log_internal_error(&error);
        Response::InternalServerError { message: format!("{error:#}") }
    });

    Ok(response)
}

fn get_authorization(headers: &HashMap<CaseInsensitiveString, String>) -> Result<Option<SessionInfo>> {
    let cookies = match get_cookies_hashmap(headers) {
        Ok(cookies) => cookies,
        Err(_) => return Ok(None),
    };

    let session_id = match cookies.get(sessions::SESSION_ID_COOKIE) {
        Some(session_id) => session_id,
        None => return Ok(None),
    };
    sessions::get_session_info(session_id)
}

fn role_allowed(session: &SessionInfo, allowed: &[Role]) -> bool {
    allowed.contains(&session.role)
}

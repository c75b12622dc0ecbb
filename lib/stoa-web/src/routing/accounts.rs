use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_campus::{Role, User};
use stoa_utils::http::{get_cookies_hashmap, header_set_cookie, header_unset_cookie};

use crate::sessions::{self, SessionInfo};

pub async fn signup<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    #[derive(Deserialize)]
    struct SignupParams {
        name: String,
        email: String,
        password: String,
        role: String,
    }

    #[derive(Serialize)]
    struct SignupResponse {
        success: bool,
        errors: Vec<SignupError>,
    }

    #[derive(Serialize)]
    enum SignupError {
        EmailTaken,
    }

    let content = request.content().await?;
    let signup_params: SignupParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    let role: Role = match signup_params.role.parse() {
        Ok(role) => role,
        Err(_) => return Ok(Response::BadRequest),
    };

    let user_id = match campus
        .register(&signup_params.name, &signup_params.email, role, signup_params.password)
        .await?
    {
        Some(user_id) => user_id,
        None => {
            let signup_response = SignupResponse {
                success: false,
                errors: vec![SignupError::EmailTaken],
            };
            return Ok(Response::Json {
                content: serde_json::json!(signup_response).to_string(),
                headers: vec![],
            });
        }
    };

    let session_id = sessions::generate_session_id();
    let headers = vec![header_set_cookie(sessions::SESSION_ID_COOKIE, &session_id)];
    sessions::update_session_info(session_id, SessionInfo { user_id, role })?;

    let user = User {
        id: user_id,
        name: signup_params.name,
        email: signup_params.email,
        role,
        profile_id: None,
    };
    let body = serde_json::json!({ "success": true, "user": user });

    Ok(Response::Created { content: body.to_string(), headers })
}

pub async fn login<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    #[derive(Deserialize)]
    struct LoginParams {
        email: String,
        password: String,
    }

    let content = request.content().await?;
    let login_params: LoginParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    let user_id = match campus
        .verify_login(&login_params.email, login_params.password)
        .await?
    {
        Some(user_id) => user_id,
        None => return Ok(Response::Unauthorized),
    };

    // the account existed a moment ago, but logins race account changes
    let user = match campus.fetch_user(&user_id).await? {
        Some(user) => user,
        None => return Ok(Response::Unauthorized),
    };

    let session_id = sessions::generate_session_id();
    let headers = vec![header_set_cookie(sessions::SESSION_ID_COOKIE, &session_id)];
    sessions::update_session_info(session_id, SessionInfo { user_id, role: user.role })?;

    let body = serde_json::json!({ "success": true, "user": user });

    Ok(Response::Json { content: body.to_string(), headers })
}

pub fn logout<T: AsyncRead + Unpin>(request: &Request<T>) -> Result<Response> {
    let cookies = match get_cookies_hashmap(request.headers()) {
        Ok(cookies) => cookies,
        Err(_) => return Ok(Response::BadRequest),
    };

    if let Some(session_id) = cookies.get(sessions::SESSION_ID_COOKIE) {
        sessions::remove_session_info(session_id)?;
    }

    let headers = vec![header_unset_cookie(sessions::SESSION_ID_COOKIE)];
    let body = serde_json::json!({ "message": "Logged out" });

    Ok(Response::Json { content: body.to_string(), headers })
}

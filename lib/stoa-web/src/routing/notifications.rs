use anyhow::Result;
use serde::Deserialize;
use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_campus::{NotificationId, Role, UserId};

use crate::routing;

pub async fn list<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let notifications = campus.users_notifications(&session.user_id).await?;

    Ok(Response::Json { content: serde_json::json!(notifications).to_string(), headers: vec![] })
}

pub async fn create<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    // one recipient or a whole role, never both
    #[derive(Deserialize)]
    struct NotificationParams {
        body: String,
        recipient: Option<String>,
        role: Option<String>,
    }

    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };
    if !routing::role_allowed(&session, &[Role::Admin]) {
        return Ok(Response::Forbidden);
    }

    let content = request.content().await?;
    let params: NotificationParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    match (params.recipient, params.role) {
        (Some(recipient), None) => {
            let recipient: UserId = match recipient.parse() {
                Ok(recipient) => recipient,
                Err(_) => return Ok(Response::BadRequest),
            };
            let notification = campus.notify_user(recipient, &params.body).await?;
            Ok(Response::Created {
                content: serde_json::json!(notification).to_string(),
                headers: vec![],
            })
        }
        (None, Some(role)) => {
            let role: Role = match role.parse() {
                Ok(role) => role,
                Err(_) => return Ok(Response::BadRequest),
            };
            let created = campus.notify_roles(&[role], &params.body).await?;
            let body = serde_json::json!({ "created": created });
            Ok(Response::Created { content: body.to_string(), headers: vec![] })
        }
        _ => Ok(Response::BadRequest),
    }
}

pub async fn mark_read<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    notification_id: &str,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let notification_id: NotificationId = match notification_id.parse() {
        Ok(notification_id) => notification_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    if campus.mark_notification_read(&session.user_id, &notification_id).await? {
        let body = serde_json::json!({ "message": "Notification marked as read" });
        Ok(Response::Json { content: body.to_string(), headers: vec![] })
    } else {
        Ok(Response::NotFound)
    }
}

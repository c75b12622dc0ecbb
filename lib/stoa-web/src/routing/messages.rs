use anyhow::Result;
use serde::Deserialize;
use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::data_access::DataAccess;
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::messenger::{Messenger, SendMessageError};
use stoa_messenger::{MessageId, UserId};
use stoa_utils::utils::log_internal_error;

use crate::routing;

pub async fn send<S, T>(request: &mut Request<T>, messenger: Messenger<S>) -> Result<Response>
where
    S: DataAccess + MessageStore,
    T: AsyncRead + Unpin,
{
    #[derive(Deserialize)]
    struct SendMessageParams {
        #[serde(rename = "receiverId")]
        receiver_id: String,
        content: String,
    }

    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let content = request.content().await?;
    let params: SendMessageParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    let receiver: UserId = match params.receiver_id.parse() {
        Ok(receiver) => receiver,
        Err(_) => return Ok(Response::BadRequest),
    };
    if params.content.is_empty() {
        return Ok(Response::BadRequest);
    }

    match messenger.send_message(session.user_id, receiver, params.content).await {
        Ok(delivery) => Ok(Response::Created {
            content: serde_json::json!(delivery).to_string(),
            headers: vec![],
        }),
        // denials and store failures share the 500-with-text shape
        Err(e) => {
            if let SendMessageError::Internal(internal) = &e {
                log_internal_error(internal);
            }
            Ok(Response::InternalServerError { message: format!("{e:#}") })
        }
    }
}

pub async fn conversation<S, T>(
    request: &Request<T>,
    messenger: Messenger<S>,
    other_user: &str,
) -> Result<Response>
where
    S: DataAccess + MessageStore,
    T: AsyncRead + Unpin,
{
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let other_user: UserId = match other_user.parse() {
        Ok(other_user) => other_user,
        Err(_) => return Ok(Response::BadRequest),
    };

    let messages = messenger.conversation(&session.user_id, &other_user).await?;

    Ok(Response::Json { content: serde_json::json!(messages).to_string(), headers: vec![] })
}

pub async fn mark_read<S, T>(
    request: &Request<T>,
    messenger: Messenger<S>,
    message_id: &str,
) -> Result<Response>
where
    S: DataAccess + MessageStore,
    T: AsyncRead + Unpin,
{
    if routing::get_authorization(request.headers())?.is_none() {
        return Ok(Response::Unauthorized);
    }

    let message_id: MessageId = match message_id.parse() {
        Ok(message_id) => message_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    if messenger.mark_read(&message_id).await? {
        let body = serde_json::json!({ "message": "Message marked as read" });
        Ok(Response::Json { content: body.to_string(), headers: vec![] })
    } else {
        Ok(Response::NotFound)
    }
}

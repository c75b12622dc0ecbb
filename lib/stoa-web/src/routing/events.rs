use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_campus::{Event, EventId, Role};

use crate::routing;

#[derive(Deserialize)]
struct EventParams {
    title: String,
    description: String,
    venue: String,
    #[serde(rename = "startsAt")]
    starts_at: String,
}

impl EventParams {
    fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at.parse().ok()
    }
}

pub async fn create<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };
    if !routing::role_allowed(&session, &[Role::Faculty, Role::Admin]) {
        return Ok(Response::Forbidden);
    }

    let content = request.content().await?;
    let params: EventParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };
    let starts_at = match params.starts_at() {
        Some(starts_at) => starts_at,
        None => return Ok(Response::BadRequest),
    };

    let event = campus
        .create_event(params.title, params.description, params.venue, starts_at, session.user_id)
        .await?;

    Ok(Response::Created { content: serde_json::json!(event).to_string(), headers: vec![] })
}

pub async fn list<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    if routing::get_authorization(request.headers())?.is_none() {
        return Ok(Response::Unauthorized);
    }

    let events = campus.fetch_events().await?;

    Ok(Response::Json { content: serde_json::json!(events).to_string(), headers: vec![] })
}

pub async fn update<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    event_id: &str,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };
    if !routing::role_allowed(&session, &[Role::Faculty, Role::Admin]) {
        return Ok(Response::Forbidden);
    }

    let event_id: EventId = match event_id.parse() {
        Ok(event_id) => event_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    let content = request.content().await?;
    let params: EventParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };
    let starts_at = match params.starts_at() {
        Some(starts_at) => starts_at,
        None => return Ok(Response::BadRequest),
    };

    let existing = match campus.fetch_event(&event_id).await? {
        Some(event) => event,
        None => return Ok(Response::NotFound),
    };

    let event = Event {
        id: event_id,
        title: params.title,
        description: params.description,
        venue: params.venue,
        starts_at,
        created_by: existing.created_by,
        attendees: existing.attendees,
    };

    if campus.update_event(&event).await? {
        Ok(Response::Json { content: serde_json::json!(event).to_string(), headers: vec![] })
    } else {
        Ok(Response::NotFound)
    }
}

pub async fn delete<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    event_id: &str,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };
    if !routing::role_allowed(&session, &[Role::Faculty, Role::Admin]) {
        return Ok(Response::Forbidden);
    }

    let event_id: EventId = match event_id.parse() {
        Ok(event_id) => event_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    if campus.delete_event(&event_id).await? {
        let body = serde_json::json!({ "message": "Event deleted" });
        Ok(Response::Json { content: body.to_string(), headers: vec![] })
    } else {
        Ok(Response::NotFound)
    }
}

pub async fn register<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    event_id: &str,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };
    if !routing::role_allowed(&session, &[Role::Student, Role::Alumni]) {
        return Ok(Response::Forbidden);
    }

    let event_id: EventId = match event_id.parse() {
        Ok(event_id) => event_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    match campus.register_for_event(&event_id, &session.user_id).await? {
        Some(event) => Ok(Response::Json {
            content: serde_json::json!(event).to_string(),
            headers: vec![],
        }),
        None => Ok(Response::NotFound),
    }
}

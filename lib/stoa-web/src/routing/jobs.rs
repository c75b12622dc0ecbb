use anyhow::Result;
use serde::Deserialize;
use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_campus::{Job, JobId, Role};

use crate::routing;
use crate::sessions::SessionInfo;

#[derive(Deserialize)]
struct JobParams {
    title: String,
    company: String,
    description: String,
}

// posters manage their own listings, admins manage all of them
fn may_manage(session: &SessionInfo, job: &Job) -> bool {
    session.role == Role::Admin || job.posted_by == session.user_id
}

pub async fn create<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };
    if !routing::role_allowed(&session, &[Role::Alumni, Role::Admin]) {
        return Ok(Response::Forbidden);
    }

    let content = request.content().await?;
    let params: JobParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    let job = campus
        .create_job(params.title, params.company, params.description, session.user_id)
        .await?;

    Ok(Response::Created { content: serde_json::json!(job).to_string(), headers: vec![] })
}

pub async fn list<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    if routing::get_authorization(request.headers())?.is_none() {
        return Ok(Response::Unauthorized);
    }

    let jobs = campus.fetch_jobs().await?;

    Ok(Response::Json { content: serde_json::json!(jobs).to_string(), headers: vec![] })
}

pub async fn update<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    job_id: &str,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let job_id: JobId = match job_id.parse() {
        Ok(job_id) => job_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    let content = request.content().await?;
    let params: JobParams = match serde_json::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    let existing = match campus.fetch_job(&job_id).await? {
        Some(job) => job,
        None => return Ok(Response::NotFound),
    };
    if !may_manage(&session, &existing) {
        return Ok(Response::Forbidden);
    }

    let job = Job {
        id: job_id,
        title: params.title,
        company: params.company,
        description: params.description,
        posted_by: existing.posted_by,
        posted_at: existing.posted_at,
    };

    if campus.update_job(&job).await? {
        Ok(Response::Json { content: serde_json::json!(job).to_string(), headers: vec![] })
    } else {
        Ok(Response::NotFound)
    }
}

pub async fn delete<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    job_id: &str,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let job_id: JobId = match job_id.parse() {
        Ok(job_id) => job_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    let existing = match campus.fetch_job(&job_id).await? {
        Some(job) => job,
        None => return Ok(Response::NotFound),
    };
    if !may_manage(&session, &existing) {
        return Ok(Response::Forbidden);
    }

    if campus.delete_job(&job_id).await? {
        let body = serde_json::json!({ "message": "Job posting deleted" });
        Ok(Response::Json { content: body.to_string(), headers: vec![] })
    } else {
        Ok(Response::NotFound)
    }
}

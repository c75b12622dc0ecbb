use anyhow::Result;
use serde::Deserialize;
use tokio::io::AsyncRead;

use http_server::{Request, Response};
use stoa_campus::authorization::AuthService;
use stoa_campus::campus::Campus;
use stoa_campus::data_access::DataAccess;
use stoa_campus::{
    AlumniProfile, FacultyProfile, Profile, Role, StudentProfile, UserId,
};
use stoa_messenger::UserSummary;
use stoa_utils::serde::query_string;

use crate::routing;

pub async fn user_overview<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    user_id: &str,
) -> Result<Response> {
    if routing::get_authorization(request.headers())?.is_none() {
        return Ok(Response::Unauthorized);
    }

    let user_id: UserId = match user_id.parse() {
        Ok(user_id) => user_id,
        Err(_) => return Ok(Response::BadRequest),
    };

    match campus.user_overview(&user_id).await? {
        Some(overview) => Ok(Response::Json {
            content: serde_json::json!(overview).to_string(),
            headers: vec![],
        }),
        None => Ok(Response::NotFound),
    }
}

pub async fn search_users<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
    params: &str,
) -> Result<Response> {
    #[derive(Deserialize)]
    struct SearchParams {
        search: Option<String>,
    }

    if routing::get_authorization(request.headers())?.is_none() {
        return Ok(Response::Unauthorized);
    }

    let search_params: SearchParams = match query_string::from_str(params) {
        Ok(res) => res,
        Err(_) => return Ok(Response::BadRequest),
    };

    let search = search_params.search.unwrap_or_default();
    let users: Vec<UserSummary> = campus
        .find_users_by_name(&search)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();

    Ok(Response::Json { content: serde_json::json!(users).to_string(), headers: vec![] })
}

pub async fn own_profile<T: AsyncRead + Unpin>(
    request: &Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let overview = match campus.user_overview(&session.user_id).await? {
        Some(overview) => overview,
        None => return Ok(Response::NotFound),
    };

    match overview.profile {
        Some(profile) => Ok(Response::Json {
            content: serde_json::json!(profile).to_string(),
            headers: vec![],
        }),
        None => Ok(Response::NotFound),
    }
}

pub async fn update_profile<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    campus: Campus<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    #[derive(Deserialize)]
    struct StudentProfileParams {
        department: String,
        enrollment_year: i32,
        bio: String,
        skills: Vec<String>,
    }

    #[derive(Deserialize)]
    struct AlumniProfileParams {
        graduation_year: i32,
        company: String,
        position: String,
        bio: String,
    }

    #[derive(Deserialize)]
    struct FacultyProfileParams {
        department: String,
        designation: String,
        bio: String,
    }

    let session = match routing::get_authorization(request.headers())? {
        Some(session) => session,
        None => return Ok(Response::Unauthorized),
    };

    let user = match campus.fetch_user(&session.user_id).await? {
        Some(user) => user,
        None => return Ok(Response::Unauthorized),
    };

    let content = request.content().await?;
    let profile_id = user.profile_id.unwrap_or_else(uuid::Uuid::new_v4);

    // the body's shape follows the caller's role; admins have no profile
    let profile = match user.role {
        Role::Admin => return Ok(Response::NotFound),
        Role::Student => {
            let params: StudentProfileParams = match serde_json::from_str(&content) {
                Ok(params) => params,
                Err(_) => return Ok(Response::BadRequest),
            };
            Profile::Student(StudentProfile {
                id: profile_id,
                user_id: user.id,
                department: params.department,
                enrollment_year: params.enrollment_year,
                bio: params.bio,
                skills: params.skills,
            })
        }
        Role::Alumni => {
            let params: AlumniProfileParams = match serde_json::from_str(&content) {
                Ok(params) => params,
                Err(_) => return Ok(Response::BadRequest),
            };
            Profile::Alumni(AlumniProfile {
                id: profile_id,
                user_id: user.id,
                graduation_year: params.graduation_year,
                company: params.company,
                position: params.position,
                bio: params.bio,
            })
        }
        Role::Faculty => {
            let params: FacultyProfileParams = match serde_json::from_str(&content) {
                Ok(params) => params,
                Err(_) => return Ok(Response::BadRequest),
            };
            Profile::Faculty(FacultyProfile {
                id: profile_id,
                user_id: user.id,
                department: params.department,
                designation: params.designation,
                bio: params.bio,
            })
        }
    };

    match campus.update_own_profile(&user, profile).await? {
        Some(profile) => Ok(Response::Json {
            content: serde_json::json!(profile).to_string(),
            headers: vec![],
        }),
        None => Ok(Response::NotFound),
    }
}

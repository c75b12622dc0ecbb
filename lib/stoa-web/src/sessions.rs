use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;

use stoa_campus::{Role, UserId};

pub type SessionId = String;

pub const SESSION_ID_COOKIE: &str = "_stoa_sid";
static SESSIONS: Lazy<RwLock<HashMap<SessionId, SessionInfo>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// What a session cookie resolves to. The role is captured at login so
/// role gates don't need an account lookup on every request.
#[derive(Clone, Copy)]
pub struct SessionInfo {
    pub user_id: UserId,
    pub role: Role,
}

pub fn generate_session_id() -> SessionId {
    uuid::Uuid::new_v4().into()
}

pub fn update_session_info(session_id: SessionId, session_info: SessionInfo) -> Result<()> {
    match SESSIONS.write() {
        Ok(mut sessions_write_lock) => {
            sessions_write_lock.insert(session_id, session_info);
            Ok(())
        }
        Err(e) => {
            bail!("Could not lock SESSIONS global for write: {}", e)
        }
    }
}

pub fn get_session_info(session_id: &SessionId) -> Result<Option<SessionInfo>> {
    let res = match SESSIONS.read() {
        Ok(sessions_read_lock) => sessions_read_lock.get(session_id).copied(),
        Err(e) => {
            bail!("Could not lock SESSIONS global for read: {}", e)
        }
    };
    Ok(res)
}

pub fn remove_session_info(session_id: &SessionId) -> Result<()> {
    match SESSIONS.write() {
        Ok(mut sessions_write_lock) => {
            sessions_write_lock.remove(session_id);
        }
        Err(e) => bail!("Could not lock SESSIONS global for write: {}", e),
    }
    Ok(())
}

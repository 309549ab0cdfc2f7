//! User directory service: registration and username resolution.
//!
//! The sharing protocol grants access by username; this module maps those
//! usernames to stable user ids. Authentication itself is an external
//! collaborator - the directory only answers "who is `alice`".

use crate::error::{Result, ShareError};
use crate::models::User;
use crate::AppCore;
use std::sync::Arc;

/// Register a new user with a unique username
pub async fn register(core: &Arc<AppCore>, username: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ShareError::InvalidRequest("Username is empty".to_string()));
    }
    if core
        .storage
        .users
        .resolve_username(username)
        .map_err(ShareError::Storage)?
        .is_some()
    {
        return Err(ShareError::InvalidRequest(format!(
            "Username {} already taken",
            username
        )));
    }

    let user = User::new(username);
    let data = serde_json::to_vec(&user).map_err(anyhow::Error::from)?;
    core.storage
        .users
        .put(&user.id, &user.username, &data)
        .map_err(ShareError::Storage)?;
    Ok(user)
}

/// Resolve a username to its user profile
pub async fn resolve(core: &Arc<AppCore>, username: &str) -> Result<Option<User>> {
    let Some(id) = core
        .storage
        .users
        .resolve_username(username)
        .map_err(ShareError::Storage)?
    else {
        return Ok(None);
    };
    get(core, &id).await
}

/// Get a user profile by id
pub async fn get(core: &Arc<AppCore>, id: &str) -> Result<Option<User>> {
    let Some(data) = core.storage.users.get(id).map_err(ShareError::Storage)? else {
        return Ok(None);
    };
    let user = serde_json::from_slice(&data).map_err(anyhow::Error::from)?;
    Ok(Some(user))
}

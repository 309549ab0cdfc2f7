use anyhow::Result;
use std::path::PathBuf;

const STASH_DIR: &str = ".stash";
const DB_FILE: &str = "stash.db";

/// Environment variable to override the Stash directory.
const STASH_DIR_ENV: &str = "STASH_DIR";

/// Resolve the Stash data directory.
/// Priority: STASH_DIR env var > ~/.stash/
pub fn resolve_stash_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(STASH_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(STASH_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Stash directory exists and return its path.
pub fn ensure_stash_dir() -> Result<PathBuf> {
    let dir = resolve_stash_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Ensure database path exists and return it.
pub fn ensure_database_path() -> Result<PathBuf> {
    Ok(ensure_stash_dir()?.join(DB_FILE))
}

/// Convenience helper returning the database path as a UTF-8 string.
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_database_path()?.to_string_lossy().into_owned())
}

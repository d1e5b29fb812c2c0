//! Resolving which angler a command acts for.
//!
//! Reports, surveys and achievements are filed per user. Rather than
//! requiring `--user` on every invocation, the user is resolved through a
//! chain:
//!
//! 1. `--user <id>`: explicit per-command override
//! 2. `JUKA_USER` env var: shell or session level
//! 3. `user-id` in `~/.juka/config.toml`: global default

use std::env;

use crate::config::Config;

/// Error message shown when no user can be resolved.
pub const USER_REQUIRED: &str = "user required: pass --user <id>, \
    set JUKA_USER, or add `user-id = \"...\"` to ~/.juka/config.toml";

/// Resolve the acting user from the resolution chain.
pub fn resolve_user(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    resolve_from(explicit, env::var("JUKA_USER").ok(), config)
}

fn resolve_from(
    explicit: Option<&str>,
    from_env: Option<String>,
    config: &Config,
) -> Result<String, String> {
    // 1. Explicit --user flag.
    if let Some(id) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }

    // 2. JUKA_USER environment variable.
    if let Some(id) = from_env.filter(|s| !s.trim().is_empty()) {
        return Ok(id.trim().to_string());
    }

    // 3. ~/.juka/config.toml.
    if let Some(id) = config.user_id.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(id.trim().to_string());
    }

    Err(USER_REQUIRED.to_string())
}

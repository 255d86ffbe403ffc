//! Database and legacy-document location resolution.
//! First match wins; see each function for the order.

use std::path::PathBuf;

use super::history_config::{EnvSnapshot, HistoryConfig};

/// Environment variable overriding the database file location.
pub const DB_OVERRIDE_VAR: &str = "DRONA_HISTORY_DB";
/// Environment variable naming the scratch-space base directory.
pub const SCRATCH_VAR: &str = "SCRATCH";
/// Environment variables consulted, in order, for the username.
pub const USER_VARS: [&str; 3] = ["DRONA_USER", "USER", "LOGNAME"];
/// Username used when nothing else resolves.
pub const FALLBACK_USER: &str = "user";

/// Directory holding the database and legacy documents, relative to the base.
pub const JOBS_SUBDIR: [&str; 2] = ["drona_composer", "jobs"];
pub const DB_FILE_NAME: &str = "job_history.db";

/// Scratch directory if set, else the home directory, else the current one.
pub fn resolve_base_dir(env: &EnvSnapshot) -> PathBuf {
    match env.get(SCRATCH_VAR) {
        Some(scratch) => expand_path(scratch, env),
        None => env.home().unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Explicit path → `DRONA_HISTORY_DB` → `<base>/drona_composer/jobs/job_history.db`.
pub fn resolve_db_path(config: &HistoryConfig) -> PathBuf {
    if let Some(explicit) = &config.db_path {
        return expand_path(&explicit.to_string_lossy(), &config.env);
    }
    if let Some(overridden) = config.env.get(DB_OVERRIDE_VAR) {
        return expand_path(overridden, &config.env);
    }
    jobs_dir(&config.env).join(DB_FILE_NAME)
}

/// Explicit user → `DRONA_USER` → `USER` → `LOGNAME` → `"user"`.
pub fn resolve_user(config: &HistoryConfig) -> String {
    if let Some(user) = config.user.as_deref().filter(|u| !u.is_empty()) {
        return user.to_string();
    }
    USER_VARS
        .iter()
        .find_map(|var| config.env.get(var))
        .unwrap_or(FALLBACK_USER)
        .to_string()
}

/// Explicit path → `<base>/drona_composer/jobs/{user}_history.json`.
pub fn resolve_legacy_path(config: &HistoryConfig) -> PathBuf {
    if let Some(explicit) = &config.legacy_path {
        return expand_path(&explicit.to_string_lossy(), &config.env);
    }
    jobs_dir(&config.env).join(format!("{}_history.json", resolve_user(config)))
}

fn jobs_dir(env: &EnvSnapshot) -> PathBuf {
    let mut dir = resolve_base_dir(env);
    for part in JOBS_SUBDIR {
        dir.push(part);
    }
    dir
}

/// Expand a leading `~` and any `$VAR` / `${VAR}` references against the
/// snapshot. Unknown variables are left in place.
pub fn expand_path(raw: &str, env: &EnvSnapshot) -> PathBuf {
    let vars_expanded = expand_vars(raw, env);
    match vars_expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match env.home() {
            Some(home) => {
                let mut home = home.into_os_string().into_string().unwrap_or_default();
                home.push_str(rest);
                PathBuf::from(home)
            }
            None => PathBuf::from(vars_expanded),
        },
        _ => PathBuf::from(vars_expanded),
    }
}

fn expand_vars(raw: &str, env: &EnvSnapshot) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), env.get(name)) {
            (false, Some(value)) => out.push_str(value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

//! SQLite DSN preparation: pragma query parameters, memory detection, parent dirs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};

use crate::{ConnectOpts, Result};

/// Query parameters consumed here instead of being handed to SQLx.
const PRAGMA_PARAMS: &[&str] = &["wal", "synchronous", "busy_timeout", "journal_mode"];

pub(crate) struct Prepared {
    pub options: SqliteConnectOptions,
    pub clean_dsn: String,
    pub in_memory: bool,
}

pub(crate) fn prepare(dsn: &str, opts: &ConnectOpts) -> Result<Prepared> {
    let (clean_dsn, pragmas) = split_pragmas(dsn);
    let in_memory = is_memory_dsn(&clean_dsn);

    if opts.create_sqlite_dirs && !in_memory {
        if let Some(parent) = file_path(&clean_dsn).as_deref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let mut options = SqliteConnectOptions::from_str(&clean_dsn)?.create_if_missing(true);

    if !in_memory {
        let journal = match (pragmas.get("journal_mode"), pragmas.get("wal")) {
            (Some(mode), _) => SqliteJournalMode::from_str(mode)?,
            (None, Some(flag)) if matches!(flag.as_str(), "false" | "0") => {
                SqliteJournalMode::Delete
            }
            _ => SqliteJournalMode::Wal,
        };
        let busy = pragmas
            .get("busy_timeout")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(opts.sqlite_busy_timeout);
        options = options.journal_mode(journal).busy_timeout(busy);
    }

    let sync = match pragmas.get("synchronous") {
        Some(mode) => SqliteSynchronous::from_str(mode)?,
        None => SqliteSynchronous::Normal,
    };
    options = options.synchronous(sync);

    Ok(Prepared {
        options,
        clean_dsn,
        in_memory,
    })
}

/// Returns the DSN without pragma parameters plus the extracted pairs (lowercase keys).
pub(crate) fn split_pragmas(dsn: &str) -> (String, HashMap<String, String>) {
    let Ok(mut url) = url::Url::parse(dsn) else {
        return (dsn.to_string(), HashMap::new());
    };
    if url.query().is_none() {
        return (dsn.to_string(), HashMap::new());
    }

    let mut pragmas = HashMap::new();
    let mut kept = Vec::new();
    for (key, value) in url.query_pairs() {
        let lower = key.to_lowercase();
        if PRAGMA_PARAMS.contains(&lower.as_str()) {
            pragmas.insert(lower, value.into_owned());
        } else {
            kept.push(format!("{key}={value}"));
        }
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&kept.join("&")));
    }
    (url.to_string(), pragmas)
}

pub(crate) fn is_memory_dsn(dsn: &str) -> bool {
    if dsn.contains(":memory:") {
        return true;
    }
    url::Url::parse(dsn)
        .map(|url| {
            url.query_pairs()
                .any(|(k, v)| k.eq_ignore_ascii_case("mode") && v.eq_ignore_ascii_case("memory"))
        })
        .unwrap_or(false)
}

fn file_path(dsn: &str) -> Option<PathBuf> {
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.starts_with("file:") {
        return None;
    }
    Some(PathBuf::from(path))
}

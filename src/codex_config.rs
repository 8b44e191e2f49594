//! Wires the bridge into Codex's `config.toml` as its `notify` hook.

use crate::config::write_file_atomic;
use crate::error::NotifyError;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyConfigured,
    Updated { backup: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Restored { backup: PathBuf },
    Removed { backup: PathBuf },
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyState {
    Missing,
    Ours,
    Other(Vec<String>),
}

pub fn default_codex_config_path() -> Result<PathBuf, NotifyError> {
    if let Ok(dir) = std::env::var("CODEX_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir).join("config.toml"));
        }
    }
    let home = std::env::var("HOME").map_err(|_| NotifyError::MissingHome)?;
    Ok(PathBuf::from(home).join(".codex").join("config.toml"))
}

pub fn notify_command(executable: &str) -> Vec<String> {
    vec![executable.to_string(), "hook".to_string()]
}

pub fn init(path: &Path, executable: &str, replace: bool) -> Result<InitOutcome, NotifyError> {
    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };
    let mut doc = toml_edit::DocumentMut::from_str(&existing)?;

    match notify_state(&doc, executable) {
        NotifyState::Ours => return Ok(InitOutcome::AlreadyConfigured),
        NotifyState::Other(_) if !replace => {
            return Err(NotifyError::NotifyExists(path.to_path_buf()));
        }
        _ => {}
    }

    let mut notify = toml_edit::Array::default();
    for part in notify_command(executable) {
        notify.push(part);
    }
    doc["notify"] = toml_edit::value(notify);

    if existing.trim().is_empty() {
        write_file_atomic(path, doc.to_string().as_bytes())?;
        info!(path = %path.display(), "created codex config");
        return Ok(InitOutcome::Created);
    }

    let backup = backup_file(path)?;
    write_file_atomic(path, doc.to_string().as_bytes())?;
    info!(path = %path.display(), backup = %backup.display(), "updated codex notify hook");
    Ok(InitOutcome::Updated { backup })
}

pub fn uninstall(
    path: &Path,
    executable: &str,
    restore: bool,
) -> Result<UninstallOutcome, NotifyError> {
    if restore {
        let backup = latest_backup(path)?.ok_or_else(|| NotifyError::NoBackup(path.to_path_buf()))?;
        let contents = fs::read(&backup)?;
        write_file_atomic(path, &contents)?;
        info!(path = %path.display(), backup = %backup.display(), "restored codex config");
        return Ok(UninstallOutcome::Restored { backup });
    }

    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(UninstallOutcome::NotConfigured);
        }
        Err(err) => return Err(err.into()),
    };
    let mut doc = toml_edit::DocumentMut::from_str(&existing)?;
    if notify_state(&doc, executable) != NotifyState::Ours {
        return Ok(UninstallOutcome::NotConfigured);
    }

    let backup = backup_file(path)?;
    doc.remove("notify");
    write_file_atomic(path, doc.to_string().as_bytes())?;
    info!(path = %path.display(), "removed codex notify hook");
    Ok(UninstallOutcome::Removed { backup })
}

/// Inspects the `notify` key of a Codex config file on disk.
pub fn inspect(path: &Path, executable: &str) -> Result<NotifyState, NotifyError> {
    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(NotifyState::Missing),
        Err(err) => return Err(err.into()),
    };
    let doc = toml_edit::DocumentMut::from_str(&existing)?;
    Ok(notify_state(&doc, executable))
}

fn notify_state(doc: &toml_edit::DocumentMut, executable: &str) -> NotifyState {
    let Some(item) = doc.get("notify") else {
        return NotifyState::Missing;
    };
    let parts: Vec<String> = match item.as_array() {
        Some(array) => array
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        None => item
            .as_str()
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
    };
    if parts.is_empty() {
        return NotifyState::Missing;
    }
    if is_ours(&parts, executable) {
        NotifyState::Ours
    } else {
        NotifyState::Other(parts)
    }
}

fn is_ours(parts: &[String], executable: &str) -> bool {
    let Some(program) = parts.first() else {
        return false;
    };
    let same_program = program == executable
        || Path::new(program).file_name() == Path::new(executable).file_name();
    same_program && parts.get(1).map(String::as_str) == Some("hook")
}

/// Copies `path` to `<path>.bak.<unix-nanos>`.
pub fn backup_file(path: &Path) -> Result<PathBuf, NotifyError> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak.{nanos}"));
    let backup = PathBuf::from(name);
    fs::copy(path, &backup)?;
    Ok(backup)
}

/// Newest `<path>.bak.<digits>` sibling, by the numeric suffix.
pub fn latest_backup(path: &Path) -> Result<Option<PathBuf>, NotifyError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let Some(base) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let prefix = format!("{base}.bak.");

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut best: Option<(u128, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(&prefix) else {
            continue;
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(stamp) = suffix.parse::<u128>() else {
            continue;
        };
        if best.as_ref().map(|(b, _)| stamp > *b).unwrap_or(true) {
            best = Some((stamp, entry.path()));
        }
    }
    Ok(best.map(|(_, path)| path))
}

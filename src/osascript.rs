use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum OsascriptError {
    #[error("osascript not found")]
    NotFound,
    #[error("{status} ({output})")]
    Failed { status: String, output: String },
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Runs an inline AppleScript and returns trimmed combined output.
pub fn run(script: &str) -> Result<String, OsascriptError> {
    let path = lookup_cmd("osascript").ok_or(OsascriptError::NotFound)?;
    let output = Command::new(path).arg("-e").arg(script).output()?;
    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let combined = combined.trim().to_string();
    if !output.status.success() {
        return Err(OsascriptError::Failed {
            status: output.status.to_string(),
            output: combined,
        });
    }
    Ok(combined)
}

/// Escapes a value for embedding in an AppleScript string literal.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn lookup_cmd(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &std::path::Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

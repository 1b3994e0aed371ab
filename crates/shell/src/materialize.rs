// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use tempfile::Builder;
use tokio::io::AsyncWriteExt;

use crate::error::ShellError;

/// A script pulled off the wire and written to a temp file, plus the
/// interpreter line tokens needed to execute it.
pub struct MaterializedScript {
    pub path: PathBuf,
    pub interpreter: String,
}

/// Write `script_content` to a fresh, owner-only-executable temp file
/// under `dir`, after stripping carriage returns and validating it opens
/// with a `#!` shebang line.
///
/// The shebang's interpreter (everything after `#!`) is returned
/// separately so the caller can tokenize and exec it directly, rather
/// than relying on the OS to resolve the shebang (which requires the
/// file's executable bit and doesn't work portably for every interpreter
/// line shape).
pub async fn materialize_script(script_content: &str, dir: &Path) -> Result<MaterializedScript, ShellError> {
    let normalized = script_content.replace('\r', "");

    let first_line = normalized.lines().next().unwrap_or("");
    if !first_line.starts_with("#!") {
        return Err(ShellError::MissingShebang);
    }
    let interpreter = first_line[2..].trim().to_string();
    if interpreter.is_empty() {
        return Err(ShellError::EmptyInterpreter);
    }

    let named = Builder::new()
        .prefix("jrw-run-")
        .tempfile_in(dir)
        .map_err(ShellError::Materialize)?;
    let (std_file, path) = named.keep().map_err(|e| ShellError::Materialize(e.error))?;

    set_owner_executable(&path).await?;

    let mut file = tokio::fs::File::from_std(std_file);
    file.write_all(normalized.as_bytes()).await.map_err(ShellError::Materialize)?;
    file.flush().await.map_err(ShellError::Materialize)?;

    Ok(MaterializedScript { path, interpreter })
}

#[cfg(unix)]
async fn set_owner_executable(path: &Path) -> Result<(), ShellError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o700);
    tokio::fs::set_permissions(path, perms).await.map_err(ShellError::Materialize)
}

#[cfg(not(unix))]
async fn set_owner_executable(_path: &Path) -> Result<(), ShellError> {
    Ok(())
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;

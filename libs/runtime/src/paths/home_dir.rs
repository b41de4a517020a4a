use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("user home directory could not be determined")]
    HomeMissing,
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Expand a leading `~` (or `~/`) to the user home directory.
pub fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    let rest = if raw == "~" {
        ""
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        rest
    } else {
        return Ok(PathBuf::from(raw));
    };

    let home = dirs::home_dir().ok_or(HomeDirError::HomeMissing)?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Resolve the service home directory.
///
/// A configured value may start with `~` and must be absolute after expansion.
/// Without one, `<user home>/<default_subdir>` is used. With `create` the
/// directory is created when missing.
pub fn resolve_home_dir(
    config_home: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match config_home {
        Some(raw) => {
            let expanded = expand_tilde(&raw)?;
            if !expanded.is_absolute() {
                return Err(HomeDirError::AbsoluteRequired(
                    expanded.to_string_lossy().into(),
                ));
            }
            expanded
        }
        None => {
            let home = dirs::home_dir().ok_or(HomeDirError::HomeMissing)?;
            Path::new(&home).join(default_subdir)
        }
    };

    if create {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

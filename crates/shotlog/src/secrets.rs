//! Loading the operator password hash.
//!
//! `APP_PASS_HASH` carries the bcrypt hash inline (quote the `$` signs in
//! shells). `APP_PASS_HASH_FILE` points at a file holding it, which suits
//! Docker and systemd credentials. The inline value wins when both are set.

use std::path::PathBuf;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Neither an inline value nor a file was given")]
    NoSourceProvided,

    #[error("Cannot read secret file '{}': {source}", .path.display())]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{}' is empty", .path.display())]
    EmptyFile { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Picks the inline value if it is non-blank, otherwise reads the file.
///
/// Surrounding whitespace is dropped from either source; secret files
/// usually end in a newline.
pub fn resolve_secret(inline: Option<&str>, file: Option<&str>) -> Result<SecretString> {
    let inline = inline.map(str::trim).filter(|v| !v.is_empty());
    if let Some(value) = inline {
        return Ok(SecretString::from(value));
    }

    let file = file.map(str::trim).filter(|p| !p.is_empty());
    let Some(file) = file else {
        return Err(SecretError::NoSourceProvided);
    };

    let path = with_home(file);
    let contents = std::fs::read_to_string(&path).map_err(|source| SecretError::FileReadError {
        path: path.clone(),
        source,
    })?;
    match contents.trim() {
        "" => Err(SecretError::EmptyFile { path }),
        value => Ok(SecretString::from(value)),
    }
}

/// Shape check for a bcrypt hash: `$2a$`, `$2b$` or `$2y$`, a two-digit
/// cost, then 53 characters of salt and digest.
pub fn looks_like_bcrypt(hash: &str) -> bool {
    let bytes = hash.as_bytes();
    bytes.len() == 60
        && matches!(&bytes[..4], b"$2a$" | b"$2b$" | b"$2y$")
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'$'
}

/// Resolves a leading `~` against HOME, or USERPROFILE on Windows.
fn with_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return PathBuf::from(path),
    };
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => {
            let mut resolved = PathBuf::from(home);
            let rest = rest.trim_start_matches('/');
            if !rest.is_empty() {
                resolved.push(rest);
            }
            resolved
        }
        None => PathBuf::from(path),
    }
}

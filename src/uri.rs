//! URI helpers: validation, clone directory naming and credential injection.

use url::Url;

use crate::error::InvalidUriError;

const GIT_SUFFIX: &str = ".git";
const SCHEME_SEPARATOR: &str = "://";

/// Check that `uri` is present and is an absolute URI with a scheme and an authority.
pub fn validate_uri(uri: Option<&str>) -> Result<Url, InvalidUriError> {
    let raw = uri.ok_or_else(|| InvalidUriError::new(None))?;

    match Url::parse(raw) {
        Ok(parsed) if parsed.has_authority() && raw.contains(SCHEME_SEPARATOR) => Ok(parsed),
        _ => Err(InvalidUriError::new(Some(raw))),
    }
}

/// Name of the local bare clone for a repository URI.
///
/// Takes everything after the final `/` and makes sure it ends in `.git`:
/// `https://host/org/repo` and `https://host/org/repo.git` both give `repo.git`.
pub fn derive_clone_directory(uri: &str) -> Result<String, InvalidUriError> {
    validate_uri(Some(uri))?;

    let name = match uri.rfind('/') {
        Some(pos) => &uri[pos + 1..],
        None => uri,
    };

    Ok(ensure_git_suffix(name))
}

/// Append `.git` unless the name already carries it.
pub fn ensure_git_suffix(name: &str) -> String {
    if name.ends_with(GIT_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, GIT_SUFFIX)
    }
}

/// Embed `token` as the userinfo of `uri`.
///
/// With no token the URI comes back unchanged. Every scheme is treated the same way:
/// `<scheme>://<rest>` becomes `<scheme>://<token>@<rest>`.
pub fn inject_credential(uri: &str, token: Option<&str>) -> Result<String, InvalidUriError> {
    validate_uri(Some(uri))?;

    let Some(token) = token else {
        return Ok(uri.to_string());
    };

    // validate_uri guarantees the separator is present
    let split = uri.find(SCHEME_SEPARATOR).ok_or_else(|| InvalidUriError::new(Some(uri)))?;
    let (scheme, rest) = (&uri[..split], &uri[split + SCHEME_SEPARATOR.len()..]);

    Ok(format!("{}{}{}@{}", scheme, SCHEME_SEPARATOR, token, rest))
}

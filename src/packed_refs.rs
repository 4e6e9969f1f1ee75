//! Pull request ref removal for the `packed-refs` file of a mirror clone.
//!
//! Hosts advertise review refs (`refs/pull/*` on GitHub and Azure Repos,
//! `refs/pull-requests/*` on Bitbucket, `refs/merge-requests/*` on GitLab) that
//! most destinations refuse to accept on a mirror push. They are dropped from the
//! clone before pushing.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::MirrorError;

/// File name of git's flat ref index inside a bare repository.
pub const PACKED_REFS_FILE: &str = "packed-refs";

/// Substrings identifying pull/merge request refs.
pub const REVIEW_REF_MARKERS: &[&str] = &["refs/pull", "refs/merge-requests"];

/// Whether a packed-refs line records a pull/merge request ref.
pub fn is_review_ref(line: &str) -> bool {
    REVIEW_REF_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Drop review ref lines, keeping every other line byte for byte.
///
/// Returns the filtered content and the number of lines removed. Applying it to
/// already filtered content changes nothing.
pub fn filter_review_refs(content: &str) -> (String, usize) {
    let mut removed = 0;
    let kept: Vec<&str> = content
        .split('\n')
        .filter(|line| {
            let review = is_review_ref(line);
            if review {
                removed += 1;
            }
            !review
        })
        .collect();

    (kept.join("\n"), removed)
}

pub fn packed_refs_path(clone_directory: &Path) -> PathBuf {
    clone_directory.join(PACKED_REFS_FILE)
}

/// Rewrite `<clone_directory>/packed-refs` in place without review refs.
pub async fn remove_review_refs(clone_directory: &Path) -> Result<usize, MirrorError> {
    let path = packed_refs_path(clone_directory);
    debug!("Filtering review refs from {}", path.display());

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| MirrorError::ref_file("read", &path, e))?;

    let (filtered, removed) = filter_review_refs(&content);

    tokio::fs::write(&path, filtered)
        .await
        .map_err(|e| MirrorError::ref_file("write", &path, e))?;

    info!("Removed {} pull request refs from {}", removed, path.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn sample() -> String {
        format!(
            "# pack-refs with: peeled fully-peeled sorted \n\
             {SHA} refs/heads/master\n\
             {SHA} refs/pull/12/head\n\
             {SHA} refs/pull/12/merge\n\
             {SHA} refs/tags/v1.0.0\n\
             ^{SHA}\n\
             {SHA} refs/merge-requests/3/head\n"
        )
    }

    #[test]
    fn test_filter_drops_pull_refs() {
        let (filtered, removed) = filter_review_refs(&sample());

        assert_eq!(removed, 3);
        assert!(!filtered.contains("refs/pull"));
        assert!(!filtered.contains("refs/merge-requests"));
        assert!(filtered.contains(&format!("{SHA} refs/heads/master")));
        assert!(filtered.contains(&format!("{SHA} refs/tags/v1.0.0\n^{SHA}")));
        assert!(filtered.starts_with("# pack-refs with:"));
        assert!(filtered.ends_with('\n'));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let (once, _) = filter_review_refs(&sample());
        let (twice, removed) = filter_review_refs(&once);

        assert_eq!(once, twice);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_filter_keeps_content_without_review_refs() {
        let content = format!("{SHA} refs/heads/main\n{SHA} refs/heads/pullout");
        let (filtered, removed) = filter_review_refs(&content);
        assert_eq!(filtered, content);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_bitbucket_pull_requests_are_review_refs() {
        assert!(is_review_ref(&format!("{SHA} refs/pull-requests/7/from")));
        assert!(!is_review_ref(&format!("{SHA} refs/heads/feature/pull")));
    }

    #[tokio::test]
    async fn test_remove_review_refs_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = packed_refs_path(dir.path());
        std::fs::write(&path, sample()).unwrap();

        let removed = remove_review_refs(dir.path()).await.unwrap();
        assert_eq!(removed, 3);

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert_eq!(rewritten, filter_review_refs(&sample()).0);

        // second pass is a no-op
        assert_eq!(remove_review_refs(dir.path()).await.unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), rewritten);
    }

    #[tokio::test]
    async fn test_remove_review_refs_missing_file() {
        let dir = TempDir::new().unwrap();

        let err = remove_review_refs(dir.path()).await.unwrap_err();
        assert_matches!(err, MirrorError::RefFile { action: "read", .. });
    }
}

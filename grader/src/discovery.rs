//! Finding submissions on disk.
//!
//! Each submission is a directory under the submissions root whose name starts with the
//! configured prefix. Its identity is derived once here and carried explicitly afterwards.

use marker::types::Submission;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Derives a submission's identity from its folder name.
#[derive(Debug, Clone, Default)]
pub struct IdentityRule {
    prefix: String,
}

impl IdentityRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, folder: &str) -> bool {
        folder.starts_with(&self.prefix)
    }

    /// Folder name without the prefix and the separator after it.
    ///
    /// Falls back to the whole folder name when nothing would be left.
    pub fn identity(&self, folder: &str) -> String {
        let rest = folder
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(folder)
            .trim_start_matches(['-', '_']);
        if rest.is_empty() {
            folder.to_string()
        } else {
            rest.to_string()
        }
    }
}

/// List every submission directory under `root`, sorted by folder name.
///
/// The artifact path is recorded whether or not the file exists; a missing artifact is
/// reported when that submission is graded.
pub fn discover_submissions(
    root: &Path,
    rule: &IdentityRule,
    artifact_file_name: &str,
) -> io::Result<Vec<Submission>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().into_owned();
        if !rule.matches(&folder) {
            debug!("ignoring {folder}: no submission prefix");
            continue;
        }
        let dir = entry.path();
        found.push((
            folder.clone(),
            Submission {
                identity: rule.identity(&folder),
                artifact: dir.join(artifact_file_name),
                dir,
            },
        ));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, s)| s).collect())
}

/// Groups of identities whose artifacts are byte-identical, by MD5 digest.
///
/// Submissions without an artifact are ignored. Each group is logged as a warning.
pub fn find_duplicate_artifacts(submissions: &[Submission]) -> Vec<Vec<String>> {
    let mut by_digest: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for submission in submissions {
        let Ok(bytes) = fs::read(&submission.artifact) else {
            continue;
        };
        let digest = format!("{:x}", md5::compute(&bytes));
        by_digest
            .entry(digest)
            .or_default()
            .push(submission.identity.clone());
    }

    by_digest
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(digest, ids)| {
            warn!("identical artifacts (md5 {digest}): {}", ids.join(", "));
            ids
        })
        .collect()
}

/// Selection predicate for the cohort loop: everything, or submissions whose identity or
/// folder contains `needle`.
pub fn selection(needle: Option<String>) -> impl Fn(&Submission) -> bool {
    move |submission: &Submission| match &needle {
        None => true,
        Some(needle) => {
            submission.identity.contains(needle.as_str())
                || submission
                    .dir
                    .file_name()
                    .is_some_and(|f| f.to_string_lossy().contains(needle.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use util::test_helpers::{make_submission, setup_test_submissions_root};

    #[test]
    fn test_identity_strips_prefix_and_separator() {
        let rule = IdentityRule::new("final-less");
        assert_eq!(rule.identity("final-less-alice"), "alice");
        assert_eq!(rule.identity("final-less_bob-smith"), "bob-smith");
        assert_eq!(rule.identity("final-less"), "final-less");
    }

    #[test]
    fn test_empty_prefix_keeps_folder_name() {
        let rule = IdentityRule::default();
        assert!(rule.matches("anything"));
        assert_eq!(rule.identity("carol"), "carol");
    }

    #[test]
    fn test_discovery_filters_and_sorts() {
        let root = setup_test_submissions_root();
        make_submission(root.path(), "final-less-zed", Some(("runtime.wasm", b"z".as_slice())));
        make_submission(root.path(), "final-less-amy", None);
        make_submission(root.path(), "scratch", None);
        std::fs::write(root.path().join("final-less-notes.txt"), "x").unwrap();

        let rule = IdentityRule::new("final-less");
        let subs = discover_submissions(root.path(), &rule, "runtime.wasm").unwrap();

        let ids: Vec<&str> = subs.iter().map(|s| s.identity.as_str()).collect();
        assert_eq!(ids, vec!["amy", "zed"]);
        assert_eq!(subs[1].artifact, root.path().join("final-less-zed").join("runtime.wasm"));
        assert!(!subs[0].artifact.exists());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let root = setup_test_submissions_root();
        let missing = root.path().join("nope");
        assert!(discover_submissions(&missing, &IdentityRule::default(), "runtime.wasm").is_err());
    }

    #[test]
    fn test_duplicate_artifacts_are_grouped() {
        let root = setup_test_submissions_root();
        make_submission(root.path(), "a", Some(("runtime.wasm", b"same".as_slice())));
        make_submission(root.path(), "b", Some(("runtime.wasm", b"unique".as_slice())));
        make_submission(root.path(), "c", Some(("runtime.wasm", b"same".as_slice())));
        make_submission(root.path(), "d", None);

        let subs = discover_submissions(root.path(), &IdentityRule::default(), "runtime.wasm")
            .unwrap();
        assert_eq!(find_duplicate_artifacts(&subs), vec![vec!["a".to_string(), "c".to_string()]]);
    }

    #[test]
    fn test_selection() {
        let sub = Submission {
            identity: "alice".to_string(),
            dir: "/subs/final-less-alice".into(),
            artifact: "/subs/final-less-alice/runtime.wasm".into(),
        };
        assert!(selection(None)(&sub));
        assert!(selection(Some("ali".to_string()))(&sub));
        assert!(selection(Some("final-less".to_string()))(&sub));
        assert!(!selection(Some("bob".to_string()))(&sub));
    }
}

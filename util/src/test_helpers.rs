use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a unique temporary directory to act as the submissions root.
///
/// Keep the returned `TempDir` in scope for as long as you need the files.
pub fn setup_test_submissions_root() -> TempDir {
    TempDir::new().expect("failed to create tempdir")
}

/// Creates `{root}/{folder}` and, when `artifact` is given, writes that file
/// into it with `contents`. Returns the submission directory.
pub fn make_submission(root: &Path, folder: &str, artifact: Option<(&str, &[u8])>) -> PathBuf {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).expect("failed to create submission dir");
    if let Some((name, contents)) = artifact {
        fs::write(dir.join(name), contents).expect("failed to write artifact");
    }
    dir
}

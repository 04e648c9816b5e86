// PATH lookup for the programs the pipeline drives (package managers, sudo, uv, sh).

use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Finds `program` in `dirs`, returning the first executable match.
///
/// A `program` containing a path separator is checked as-is instead.
pub fn find_in_dirs(program: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }
    dirs.iter()
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

/// `true` for a regular file with at least one execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn finds_first_executable_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        // Present but not executable in the first directory.
        let plain = first.path().join("tool");
        fs::write(&plain, "#!/bin/sh\n").unwrap();
        let exe = second.path().join("tool");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_in_dirs("tool", &dirs), Some(exe.clone()));
        assert_eq!(find_in_dirs("missing", &dirs), None);
        assert_eq!(find_in_dirs(exe.to_str().unwrap(), &[]), Some(exe));
    }

    #[test]
    fn directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("tool")).unwrap();
        assert_eq!(find_in_dirs("tool", &[dir.path().to_path_buf()]), None);
    }
}

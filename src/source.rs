use std::path::Path;

use taskcal_core::{TaskCalError, TaskCalResult};

/// Read the raw task list, one task per line.
pub fn read_tasks(path: &Path) -> TaskCalResult<String> {
    std::fs::read_to_string(path).map_err(|source| TaskCalError::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_contents_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.txt");
        std::fs::write(&path, "Email client about delay\nClean inbox\n").unwrap();

        assert_eq!(
            read_tasks(&path).unwrap(),
            "Email client about delay\nClean inbox\n"
        );
    }

    #[test]
    fn missing_file_is_a_source_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");

        let err = read_tasks(&path).unwrap_err();
        assert!(matches!(err, TaskCalError::SourceRead { ref path, .. } if path.ends_with("nope.txt")));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("nope.txt"));
    }
}

//! Helpers for the forward-slash path strings exchanged with the backend.
//!
//! Paths are never touched through `std::path` here: they describe the
//! server's filesystem, which may be a Windows host with drive roots.

pub const ROOT: &str = "/";

/// Convert backslash separators to forward slashes.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Paths for which "up" shows the drive list instead of a parent directory.
pub fn is_root_like(path: &str) -> bool {
    matches!(path, "" | "/" | ".")
}

/// Everything before the last separator. Empty when there is none, or when
/// the only separator is the leading one.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Sibling of `path` carrying `new_name` as its last component.
pub fn with_leaf(path: &str, new_name: &str) -> String {
    match path.rfind('/') {
        Some(idx) => format!("{}{}", &path[..=idx], new_name),
        None => new_name.to_string(),
    }
}

/// Child path of a directory, without doubling the root separator.
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Whether a change at `changed` touches the subtree shown at `current`,
/// in either direction.
pub fn overlaps(changed: &str, current: &str) -> bool {
    changed.starts_with(current) || current.starts_with(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(normalize(r"C:\Users\me"), "C:/Users/me");
        assert_eq!(normalize("/already/fine"), "/already/fine");
    }

    #[test]
    fn recognizes_root_like_paths() {
        assert!(is_root_like(""));
        assert!(is_root_like("/"));
        assert!(is_root_like("."));
        assert!(!is_root_like("/a"));
        assert!(!is_root_like("C:"));
    }

    #[test]
    fn parent_cuts_at_last_separator() {
        assert_eq!(parent("/a/b/c"), "/a/b");
        assert_eq!(parent("/a"), "");
        assert_eq!(parent("C:/Users"), "C:");
        assert_eq!(parent("C:"), "");
    }

    #[test]
    fn leaf_replacement_keeps_directory() {
        assert_eq!(with_leaf("/a/old.txt", "new.txt"), "/a/new.txt");
        assert_eq!(with_leaf("/old", "new"), "/new");
        assert_eq!(with_leaf("bare", "other"), "other");
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("/", "x"), "/x");
        assert_eq!(join("/a", "x"), "/a/x");
        assert_eq!(join("C:/", "x"), "C:/x");
    }

    #[test]
    fn overlap_is_symmetric_prefix() {
        assert!(overlaps("/a/b/file.txt", "/a/b"));
        assert!(overlaps("/a", "/a/b"));
        assert!(!overlaps("/c", "/a/b"));
    }
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Archive-internal path handling.
//!
//! Paths inside an archive are always separated by `/`, whatever the host
//! platform says, so these helpers work on `str` rather than `std::path`.
//! The normalized form has no leading or trailing slash, and the root is the
//! empty string.

pub const SEPARATOR: char = '/';

/// Splits a path into its normalized segments.
///
/// Empty segments (leading, trailing or doubled slashes) and `.` are
/// skipped. `..` drops the previous segment and never climbs above the root.
pub fn segments(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split(SEPARATOR) {
        match part {
            "" | "." => {}
            ".." => {
                _ = out.pop();
            }
            name => out.push(name),
        }
    }
    out
}

/// Returns the normalized form of `path`
pub fn normalize(path: &str) -> String {
    segments(path).join("/")
}

/// True when normalizing `path` had to discard a `..` segment
pub fn has_parent_segments(path: &str) -> bool {
    path.split(SEPARATOR).any(|part| part == "..")
}

/// Joins a child name onto a normalized parent path
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent, SEPARATOR, name)
    }
}

/// Extracts the final segment, if any
pub fn basename(path: &str) -> Option<&str> {
    path.split(SEPARATOR).rev().find(|s| !s.is_empty())
}

/// Returns the normalized parent, or `None` for the root
pub fn dirname(path: &str) -> Option<String> {
    let mut parts = segments(path);
    parts.pop().map(|_| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_skip_empty_parts() {
        assert_eq!(segments("a/b/c.txt"), vec!["a", "b", "c.txt"]);
        assert_eq!(segments("/a//b/"), vec!["a", "b"]);
        assert_eq!(segments("///"), Vec::<&str>::new());
        assert_eq!(segments(""), Vec::<&str>::new());
    }

    #[test]
    fn test_segments_dot_handling() {
        assert_eq!(segments("./a/./b"), vec!["a", "b"]);
        assert_eq!(segments("a/../b"), vec!["b"]);
        // Clamped at the root
        assert_eq!(segments("../../etc/passwd"), vec!["etc", "passwd"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a/b/"), "a/b");
        assert_eq!(normalize("/"), "");
        assert!(has_parent_segments("x/../y"));
        assert!(!has_parent_segments("x/..y"));
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a/b", "c"), "a/b/c");

        assert_eq!(basename("a/b/c.txt"), Some("c.txt"));
        assert_eq!(basename("a/b/"), Some("b"));
        assert_eq!(basename("/"), None);

        assert_eq!(dirname("a/b/c.txt"), Some("a/b".to_string()));
        assert_eq!(dirname("a"), Some(String::new()));
        assert_eq!(dirname(""), None);
    }
}

use crate::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub mod utils {
    //! Path helpers shared by name parsers and backends.
    //!
    //! Remote paths are always `/`-separated, whatever the host platform is,
    //! so they are handled as strings rather than `std::path::Path`.

    /// Normalizes a `/`-separated path into its canonical absolute form.
    ///
    /// * `.` segments and empty segments (`//`) are dropped.
    /// * `..` removes the previous segment.
    /// * The result always starts with `/` and never ends with `/` unless it is the root.
    ///
    /// Returns `None` if a `..` segment would climb above the root.
    pub fn normalize(path: &str) -> Option<String> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                _ => segments.push(segment),
            }
        }
        Some(format!("/{}", segments.join("/")))
    }

    /// Resolves `path` against the directory `base`.
    /// An absolute `path` replaces `base` entirely.
    pub fn resolve(base: &str, path: &str) -> Option<String> {
        if path.starts_with('/') {
            normalize(path)
        } else {
            normalize(&format!("{base}/{path}"))
        }
    }

    /// Returns true if `path` is the virtual root.
    pub fn is_root(path: &str) -> bool {
        path == "/"
    }

    /// Parent of a normalized path, `None` for the root.
    pub fn parent(path: &str) -> Option<&str> {
        if is_root(path) {
            return None;
        }
        match path.rfind('/') {
            Some(0) => Some("/"),
            Some(idx) => Some(&path[..idx]),
            None => None,
        }
    }

    /// Last segment of a normalized path, empty for the root.
    pub fn base_name(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or_default()
    }

    /// Joins a normalized directory path and a single child segment.
    pub fn join(dir: &str, child: &str) -> String {
        if is_root(dir) {
            format!("/{child}")
        } else {
            format!("{dir}/{child}")
        }
    }

    /// Returns true if `path` equals `ancestor` or lies below it.
    pub fn starts_with(path: &str, ancestor: &str) -> bool {
        if is_root(ancestor) {
            return true;
        }
        path == ancestor
            || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;

    mod normalize {
        use super::*;

        #[test]
        fn test_normalize_plain() {
            assert_eq!(normalize("/foo/bar").as_deref(), Some("/foo/bar"));
            assert_eq!(normalize("foo/bar").as_deref(), Some("/foo/bar"));
            assert_eq!(normalize("").as_deref(), Some("/"));
            assert_eq!(normalize("/").as_deref(), Some("/"));
        }

        #[test]
        fn test_normalize_dots_and_slashes() {
            assert_eq!(normalize("/foo/././bar").as_deref(), Some("/foo/bar"));
            assert_eq!(normalize("/foo/./../bar").as_deref(), Some("/bar"));
            assert_eq!(normalize("//foo//bar//").as_deref(), Some("/foo/bar"));
            assert_eq!(normalize("/a/b/c/../..").as_deref(), Some("/a"));
        }

        #[test]
        fn test_normalize_escape_root() {
            assert_eq!(normalize("/.."), None);
            assert_eq!(normalize("/foo/../../bar"), None);
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn test_resolve() {
            assert_eq!(resolve("/data", "file.csv").as_deref(), Some("/data/file.csv"));
            assert_eq!(resolve("/data", "/other").as_deref(), Some("/other"));
            assert_eq!(resolve("/data/in", "../out").as_deref(), Some("/data/out"));
            assert_eq!(resolve("/", "../x"), None);
        }

        #[test]
        fn test_parent_and_base_name() {
            assert_eq!(parent("/"), None);
            assert_eq!(parent("/data"), Some("/"));
            assert_eq!(parent("/data/file.csv"), Some("/data"));
            assert_eq!(base_name("/data/file.csv"), "file.csv");
            assert_eq!(base_name("/"), "");
        }

        #[test]
        fn test_join_and_starts_with() {
            assert_eq!(join("/", "a"), "/a");
            assert_eq!(join("/a", "b"), "/a/b");
            assert!(starts_with("/a/b", "/a"));
            assert!(starts_with("/a", "/a"));
            assert!(starts_with("/a", "/"));
            assert!(!starts_with("/ab", "/a"));
        }
    }
}

//! # Logical Path Handling
//!
//! Callers address files relative to a backend's configured root. These
//! helpers make `"a/b"`, `"/a/b/"` and `"a///b"` resolve to the same
//! normalized path before a backend translates it to a native one.

/// Normalize a relative path: collapse repeated separators and trim
/// leading/trailing ones. Root becomes the empty string.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a normalized base with a relative path, normalizing the result.
pub fn join(base: &str, path: &str) -> String {
    let base = normalize(base);
    let path = normalize(path);
    if base.is_empty() {
        path
    } else if path.is_empty() {
        base
    } else {
        format!("{}/{}", base, path)
    }
}

/// Render a normalized directory path in the form entities carry:
/// always `/`-wrapped, `/` for the root.
pub fn display_dir(path: &str) -> String {
    let path = normalize(path);
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", path)
    }
}

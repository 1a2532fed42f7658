//! Path string utilities shared by the matcher, resolver and inventory.
//!
//! Paths in the rule document are plain strings using `/` as separator. A
//! trailing separator marks a directory rule ("this whole subtree"), so these
//! helpers keep it intact unless asked otherwise.

/// Prefix segment older documents used to mirror the repository layout.
const HOME_SEGMENT: &str = "home/";

/// Convert every `\` to `/`.
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Normalize a declared path so it is relative to the live-tree root.
///
/// Strips any leading `./` and `home/` segments. Does not resolve `..` or
/// symlinks, and keeps a trailing separator.
pub fn normalize(path: &str) -> String {
    let mut rest = to_forward_slashes(path);
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped.to_string();
        } else if let Some(stripped) = rest.strip_prefix(HOME_SEGMENT) {
            rest = stripped.to_string();
        } else {
            break;
        }
    }
    rest
}

/// Whether a declared path denotes a directory subtree.
pub fn is_dir_rule(path: &str) -> bool {
    path.ends_with('/')
}

/// Remove trailing separators.
pub fn trim_dir(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Whether `path` equals `ancestor` or lies beneath it, comparing whole
/// segments. An empty ancestor contains everything.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let path = trim_dir(path);
    let ancestor = trim_dir(ancestor);
    if ancestor.is_empty() {
        return true;
    }
    path == ancestor || is_strictly_within(path, ancestor)
}

/// Whether `path` lies beneath `dir` without being `dir` itself.
pub fn is_strictly_within(path: &str, dir: &str) -> bool {
    let path = trim_dir(path);
    let dir = trim_dir(dir);
    if dir.is_empty() {
        return !path.is_empty();
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

//! Filesystem helpers for probing, copying and removing live-tree and
//! repository entries.
//!
//! Every helper reports failures as [`Error::PathAccess`] or
//! [`Error::Filesystem`] with the offending path in the message, so callers
//! that recover per path can record the error verbatim.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// What occupies a path, without following a final symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    File,
    Dir,
    Symlink,
}

impl EntryKind {
    pub fn is_present(self) -> bool {
        self != EntryKind::Missing
    }
}

/// Inspect `path` without following a final symlink.
pub fn probe(path: &Path) -> Result<EntryKind> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let file_type = meta.file_type();
            Ok(if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
        Err(e) => Err(Error::access(path, &e)),
    }
}

/// Whether `path` exists, following symlinks. A dangling symlink does not.
pub fn exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::access(path, &e)),
    }
}

/// Whether `link` is a symlink that resolves exactly to `expected`.
pub fn is_symlink_to(link: &Path, expected: &Path) -> Result<bool> {
    if probe(link)? != EntryKind::Symlink {
        return Ok(false);
    }
    let resolved = match fs::canonicalize(link) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::access(link, &e)),
    };
    match fs::canonicalize(expected) {
        Ok(target) => Ok(resolved == target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::access(expected, &e)),
    }
}

/// Copy `src` to `dst`, recursing into directories and recreating symlinks.
///
/// Parent directories of `dst` are created as needed. Returns the kind of
/// the copied entry.
pub fn copy_entry(src: &Path, dst: &Path) -> Result<EntryKind> {
    let kind = probe(src)?;
    match kind {
        EntryKind::Missing => {
            return Err(Error::Filesystem {
                message: format!("Source does not exist: {}", src.display()),
            })
        }
        EntryKind::Dir => copy_tree(src, dst)?,
        EntryKind::File => copy_file(src, dst)?,
        EntryKind::Symlink => copy_symlink(src, dst)?,
    }
    Ok(kind)
}

/// Whether `dst` holds a complete copy of `src`: it exists with the same
/// kind and, for regular files, the same length.
pub fn verify_copy(src: &Path, dst: &Path) -> bool {
    let (Ok(src_meta), Ok(dst_meta)) = (fs::symlink_metadata(src), fs::symlink_metadata(dst))
    else {
        return false;
    };
    if src_meta.file_type().is_file() {
        return dst_meta.file_type().is_file() && src_meta.len() == dst_meta.len();
    }
    src_meta.file_type().is_dir() == dst_meta.file_type().is_dir()
}

/// Remove whatever occupies `path`. Symlinks are removed, never followed.
pub fn remove_entry(path: &Path) -> Result<()> {
    let result = match probe(path)? {
        EntryKind::Missing => return Ok(()),
        EntryKind::Dir => fs::remove_dir_all(path),
        EntryKind::File | EntryKind::Symlink => fs::remove_file(path),
    };
    result.map_err(|e| Error::Filesystem {
        message: format!("Failed to remove '{}': {}", path.display(), e),
    })
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
            message: format!("Failed to create directory '{}': {}", parent.display(), e),
        })?;
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    create_parent(dst)?;
    fs::copy(src, dst).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to copy '{}' to '{}': {}",
            src.display(),
            dst.display(),
            e
        ),
    })?;
    Ok(())
}

fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    create_parent(dst)?;
    let target = fs::read_link(src).map_err(|e| Error::access(src, &e))?;
    if probe(dst)?.is_present() {
        remove_entry(dst)?;
    }
    make_symlink(&target, dst).map_err(|e| Error::Filesystem {
        message: format!("Failed to create symlink '{}': {}", dst.display(), e),
    })
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| Error::PathAccess {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf()),
            message: e.to_string(),
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
        let target: PathBuf = dst.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::Filesystem {
                message: format!("Failed to create directory '{}': {}", target.display(), e),
            })?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("symlinks are not supported here: {}", link.display()),
    ))
}

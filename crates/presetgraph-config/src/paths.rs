//! Lexical path helpers.
//!
//! Expanded directories are reported in forward-slash form and with `.` and
//! `..` components collapsed, without touching the filesystem.

use std::path::{Component, Path, PathBuf};

/// Join `path` onto `base` unless it is already absolute, then collapse it.
pub fn absolute_from(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        collapse(path)
    } else {
        collapse(&base.join(path))
    }
}

/// Remove `.` components and fold `..` into the preceding component.
pub fn collapse(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                None | Some(Component::ParentDir) => out.push(".."),
                Some(_) => {}
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Render a path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// The directory containing `path`, in slash form.
pub fn parent_dir(path: &Path) -> String {
    path.parent().map(to_slash).unwrap_or_default()
}

/// The last component of `path`.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

use crate::errors::{CnError, CnResult};
use std::path::{Path, PathBuf};

/// Rejects a raw repo-path string before any filesystem resolution happens:
/// no `..` segments, no NUL bytes. This runs ahead of `assert_under` so a
/// hostile path never reaches `canonicalize`.
pub fn preflight_repo_path(raw: &str) -> CnResult<()> {
    if raw.contains('\0') {
        return Err(CnError::InvalidArgument {
            field: "repoPath".to_string(),
            message: "path contains a NUL byte".to_string(),
        });
    }
    if Path::new(raw).components().any(|c| c.as_os_str() == "..") {
        return Err(CnError::InvalidArgument {
            field: "repoPath".to_string(),
            message: "path contains a '..' segment".to_string(),
        });
    }
    Ok(())
}

fn canonicalize_lenient(path: &Path) -> CnResult<PathBuf> {
    // `canonicalize` requires the path to exist. Targets we are about to
    // create do not exist yet, so we canonicalize the deepest existing
    // ancestor and rebuild the remaining components lexically.
    let mut existing = path;
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(canon) => {
                let mut result = canon;
                for part in remainder.into_iter().rev() {
                    result.push(part);
                }
                return Ok(normalize_case(&result));
            }
            Err(_) => match existing.parent() {
                Some(parent) => {
                    if let Some(name) = existing.file_name() {
                        remainder.push(name.to_os_string());
                    }
                    existing = parent;
                }
                None => {
                    // Reached the root without finding an existing ancestor;
                    // fall back to a lexical absolute-ise.
                    let mut abs = std::env::current_dir().unwrap_or_default();
                    abs.push(path);
                    return Ok(normalize_case(&lexically_normalize(&abs)));
                }
            },
        }
    }
}

fn lexically_normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(windows)]
fn normalize_case(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().to_lowercase())
}

#[cfg(not(windows))]
fn normalize_case(path: &Path) -> PathBuf {
    path.to_path_buf()
}

/// The single choke-point every file-writing component must call before
/// opening `target` for writing: `target` must canonicalise to `root`
/// itself, or to a path beginning with `root` followed by the platform
/// separator.
pub fn assert_under(root: &Path, target: &Path) -> CnResult<PathBuf> {
    let canon_root = canonicalize_lenient(root)?;
    let canon_target = canonicalize_lenient(target)?;

    let matches = canon_target == canon_root || canon_target.starts_with(&canon_root);

    if matches {
        Ok(canon_target)
    } else {
        Err(CnError::PathEscape {
            root: canon_root.display().to_string(),
            target: canon_target.display().to_string(),
        })
    }
}

/// Convenience: resolve the `.compliance/` root for a given repo path and
/// assert `target` lies under it.
pub fn assert_under_compliance_dir(repo_path: &Path, target: &Path) -> CnResult<PathBuf> {
    let compliance_root = repo_path.join(".compliance");
    assert_under(&compliance_root, target)
}

pub fn compliance_dir(repo_path: &Path) -> PathBuf {
    repo_path.join(".compliance")
}

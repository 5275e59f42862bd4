use std::env;
use std::path::{Component, Path, PathBuf};

/// Express `target` relative to `base_dir` using forward slashes, as used in
/// attribution links. Both paths are made absolute against the current
/// directory and normalised lexically first.
pub fn link_path(target: &Path, base_dir: &Path) -> String {
    let target = absolutize(target);
    let base_dir = absolutize(base_dir);

    match relative_path(&base_dir, &target) {
        Some(relative) => to_slash(&relative),
        None => to_slash(&target),
    }
}

/// Join `path` onto the current directory when relative, then normalise it.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path.to_path_buf());
    }
    match env::current_dir() {
        Ok(cwd) => normalize_path(cwd.join(path)),
        Err(_) => normalize_path(path.to_path_buf()),
    }
}

/// Canonicalise `.` and `..` path segments without touching the filesystem.
pub fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Compute a relative path from `from` to `to`. Returns `None` when the paths
/// reside on different filesystem roots (e.g., different Windows drives).
pub fn relative_path(from: &Path, to: &Path) -> Option<PathBuf> {
    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    if has_mismatched_prefix(&from_components, &to_components) {
        return None;
    }

    let mut common = 0usize;
    while common < from_components.len()
        && common < to_components.len()
        && from_components[common] == to_components[common]
    {
        common += 1;
    }

    let mut result = PathBuf::new();
    for component in from_components.iter().skip(common) {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            _ => result.push(".."),
        }
    }

    for component in to_components.iter().skip(common) {
        if *component != Component::CurDir {
            result.push(component.as_os_str());
        }
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }

    Some(result)
}

fn has_mismatched_prefix(from: &[Component<'_>], to: &[Component<'_>]) -> bool {
    match (from.first(), to.first()) {
        (Some(Component::Prefix(fp)), Some(Component::Prefix(tp))) => fp.kind() != tp.kind(),
        (Some(Component::Prefix(_)), _) | (_, Some(Component::Prefix(_))) => true,
        _ => false,
    }
}

fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

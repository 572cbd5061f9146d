/// Resolves a client path argument against the session's working directory.
///
/// The result is always absolute, uses `/` separators and never climbs above `/`:
/// `..` at the root is dropped rather than rejected, `.` and empty components vanish.
/// The driver maps the result onto its own storage.
pub fn resolve_path(current_dir: &str, arg: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !arg.starts_with('/') {
        parts.extend(current_dir.split('/').filter(|p| !p.is_empty() && *p != "."));
    }

    for component in arg.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_arguments_join_the_working_directory() {
        assert_eq!(resolve_path("/", "a"), "/a");
        assert_eq!(resolve_path("/a", "b/c.txt"), "/a/b/c.txt");
        assert_eq!(resolve_path("/a/b", ""), "/a/b");
        assert_eq!(resolve_path("/a/b", "."), "/a/b");
    }

    #[test]
    fn absolute_arguments_ignore_the_working_directory() {
        assert_eq!(resolve_path("/a/b", "/x"), "/x");
        assert_eq!(resolve_path("/a/b", "/"), "/");
        assert_eq!(resolve_path("/a", "//x//y/"), "/x/y");
    }

    #[test]
    fn parent_components_never_escape_the_root() {
        assert_eq!(resolve_path("/a/b", ".."), "/a");
        assert_eq!(resolve_path("/a/b", "../../.."), "/");
        assert_eq!(resolve_path("/", "../etc/passwd"), "/etc/passwd");
        assert_eq!(resolve_path("/a", "b/../../../c"), "/c");
    }
}
